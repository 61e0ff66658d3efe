//! # CRD Generator
//!
//! Prints the `Pattern` CustomResourceDefinition as YAML.
//!
//! ```bash
//! cargo run --bin crdgen > config/crd/pattern.yaml
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use kube::core::CustomResourceExt;
use patterns_operator::crd::Pattern;

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&Pattern::crd())?);
    Ok(())
}
