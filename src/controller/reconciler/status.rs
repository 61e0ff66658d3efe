//! # Status
//!
//! Records the outcome of each reconcile step in `status.lastStep` and
//! `status.lastError`.

use crate::crd::Pattern;
use kube::api::{Api, Patch, PatchParams};
use serde_json::{json, Value};
use tracing::debug;

/// Merge patch for a reconcile outcome. A `null` `lastError` clears a previous error.
#[must_use]
pub fn step_patch(step: &str, error: Option<&str>) -> Value {
    json!({
        "status": {
            "lastStep": step,
            "lastError": error,
        }
    })
}

/// Write a reconcile outcome to the Pattern's status subresource.
///
/// A Pattern deleted in the meantime is not an error.
pub async fn record_step(
    api: &Api<Pattern>,
    name: &str,
    step: &str,
    error: Option<&str>,
) -> Result<(), kube::Error> {
    let patch = step_patch(step, error);
    match api
        .patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
        .await
    {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(response)) if response.code == 404 => {
            debug!(pattern.name = name, "pattern deleted before status update");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_patch_sets_and_clears_error() {
        assert_eq!(
            step_patch("add pattern to git drift watcher", None),
            json!({"status": {"lastStep": "add pattern to git drift watcher", "lastError": null}})
        );
        assert_eq!(
            step_patch("validating git configuration", Some("bad url"))["status"]["lastError"],
            "bad url"
        );
    }
}
