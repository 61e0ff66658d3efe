//! # Pattern Spec
//!
//! Main CRD specification types and default values.

use serde::{Deserialize, Serialize};

pub const DEFAULT_CLUSTER_GROUP_NAME: &str = "default";

/// Pattern Custom Resource Definition
///
/// A Pattern points the operator at a git repository holding a GitOps pattern
/// and, optionally, at the upstream repository it was forked from. When both are
/// set the operator polls them and reports drift as a status condition.
///
/// # Example
///
/// ```yaml
/// apiVersion: gitops.hybrid-cloud-patterns.io/v1alpha1
/// kind: Pattern
/// metadata:
///   name: multicloud-gitops
///   namespace: openshift-operators
/// spec:
///   clusterGroupName: hub
///   gitSpec:
///     targetRepo: https://gitea.apps.example.com/org/multicloud-gitops
///     targetRevision: main
///     originRepo: https://github.com/validatedpatterns/multicloud-gitops
///     pollInterval: 300
/// ```
#[derive(kube::CustomResource, Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "Pattern",
    group = "gitops.hybrid-cloud-patterns.io",
    version = "v1alpha1",
    namespaced,
    status = "crate::crd::PatternStatus",
    shortname = "patt",
    printcolumn = r#"{"name":"Step", "type":"string", "jsonPath":".status.lastStep", "priority":1}, {"name":"Error", "type":"string", "jsonPath":".status.lastError", "priority":2}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PatternSpec {
    /// Cluster group to deploy from the pattern's values files
    #[serde(default = "default_cluster_group_name")]
    pub cluster_group_name: String,
    /// Git repositories the pattern is deployed from
    #[serde(default)]
    pub git_spec: GitConfig,
}

/// Git configuration of a Pattern
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GitConfig {
    /// Git repo containing the pattern to deploy. Must use https/http or git@ for ssh
    #[serde(default)]
    pub target_repo: String,
    /// Branch, tag or commit to deploy. Short SHAs are not supported. Default: HEAD
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target_revision: String,
    /// Upstream git repo the target was forked from
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub origin_repo: String,
    /// Branch in the upstream git repository. Default: HEAD
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub origin_revision: String,
    /// Seconds between drift checks of origin against target.
    /// Default: 180. `-1` disables drift checks.
    #[serde(default)]
    pub poll_interval: i64,
    /// FQDN of the git server when parsing it from `targetRepo` does not work
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hostname: String,
}

impl GitConfig {
    /// Both repositories are known and polling is not disabled
    #[must_use]
    pub fn qualifies_for_drift_watch(&self) -> bool {
        !self.origin_repo.is_empty()
            && !self.target_repo.is_empty()
            && self.poll_interval != crate::constants::POLL_INTERVAL_DISABLED
    }
}

/// Default cluster group name
pub fn default_cluster_group_name() -> String {
    DEFAULT_CLUSTER_GROUP_NAME.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_defaults_from_minimal_yaml() {
        let spec: PatternSpec = serde_yaml::from_str(
            "gitSpec:\n  targetRepo: https://github.com/org/pattern.git\n",
        )
        .unwrap();
        assert_eq!(spec.cluster_group_name, "default");
        assert_eq!(spec.git_spec.target_repo, "https://github.com/org/pattern.git");
        assert_eq!(spec.git_spec.poll_interval, 0);
        assert!(spec.git_spec.origin_repo.is_empty());
    }

    #[test]
    fn test_git_spec_uses_camel_case_keys() {
        let config = GitConfig {
            target_repo: "https://a/b".to_string(),
            origin_repo: "https://c/d".to_string(),
            poll_interval: -1,
            ..GitConfig::default()
        };
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["targetRepo"], "https://a/b");
        assert_eq!(value["originRepo"], "https://c/d");
        assert_eq!(value["pollInterval"], -1);
        assert!(value.get("targetRevision").is_none());
    }

    #[test]
    fn test_qualifies_for_drift_watch() {
        let mut config = GitConfig {
            target_repo: "https://a/b".to_string(),
            origin_repo: "https://c/d".to_string(),
            poll_interval: 0,
            ..GitConfig::default()
        };
        assert!(config.qualifies_for_drift_watch());

        config.poll_interval = -1;
        assert!(!config.qualifies_for_drift_watch());

        config.poll_interval = 180;
        config.origin_repo.clear();
        assert!(!config.qualifies_for_drift_watch());
    }

    #[test]
    fn test_crd_metadata() {
        use kube::core::CustomResourceExt;
        let crd = Pattern::crd();
        assert_eq!(crd.spec.group, "gitops.hybrid-cloud-patterns.io");
        assert_eq!(crd.spec.names.kind, "Pattern");
        assert_eq!(
            crd.spec.names.short_names.as_deref(),
            Some(&["patt".to_string()][..])
        );
    }
}
