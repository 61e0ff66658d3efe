//! # Defaults
//!
//! Fills in the values a Pattern may omit. Changes are made to a copy and never
//! written back to the cluster.

use crate::constants::POLL_INTERVAL_DISABLED;
use crate::crd::{PatternSpec, DEFAULT_CLUSTER_GROUP_NAME};
use crate::git::url::{extract_hostname, extract_repository_name, validate_repo_url};
use crate::git::UrlError;
use tracing::debug;

/// Qualified copy of `spec`.
///
/// - `pollInterval` below `min_poll_interval_secs` is raised to it; any negative
///   value is normalised to `-1` (drift watching off)
/// - an empty `hostname` is taken from `targetRepo` when it parses
/// - an empty `clusterGroupName` becomes `default`
#[must_use]
pub fn apply_defaults(spec: &PatternSpec, min_poll_interval_secs: i64) -> PatternSpec {
    let mut qualified = spec.clone();
    let git = &mut qualified.git_spec;

    if git.poll_interval < 0 {
        git.poll_interval = POLL_INTERVAL_DISABLED;
    } else if git.poll_interval < min_poll_interval_secs {
        git.poll_interval = min_poll_interval_secs;
    }

    if git.hostname.is_empty() {
        match extract_hostname(&git.target_repo) {
            Ok(hostname) => git.hostname = hostname,
            Err(e) => debug!(target_repo = %git.target_repo, error = %e, "hostname not derivable"),
        }
    }

    if qualified.cluster_group_name.is_empty() {
        qualified.cluster_group_name = DEFAULT_CLUSTER_GROUP_NAME.to_string();
    }

    qualified
}

/// Check both repository URLs. Returns the target repository's name.
pub fn validate_git_spec(spec: &PatternSpec) -> Result<String, UrlError> {
    let git = &spec.git_spec;
    validate_repo_url(&git.target_repo)?;
    if !git.origin_repo.is_empty() {
        validate_repo_url(&git.origin_repo)?;
    }
    extract_repository_name(&git.target_repo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::GitConfig;

    fn spec(poll_interval: i64) -> PatternSpec {
        PatternSpec {
            cluster_group_name: String::new(),
            git_spec: GitConfig {
                target_repo: "https://gitea.example.com/org/multicloud-gitops.git".to_string(),
                poll_interval,
                ..GitConfig::default()
            },
        }
    }

    #[test]
    fn test_poll_interval_floor() {
        assert_eq!(apply_defaults(&spec(0), 180).git_spec.poll_interval, 180);
        assert_eq!(apply_defaults(&spec(179), 180).git_spec.poll_interval, 180);
        assert_eq!(apply_defaults(&spec(180), 180).git_spec.poll_interval, 180);
        assert_eq!(apply_defaults(&spec(600), 180).git_spec.poll_interval, 600);
        assert_eq!(apply_defaults(&spec(30), 10).git_spec.poll_interval, 30);
    }

    #[test]
    fn test_negative_poll_interval_disables() {
        assert_eq!(apply_defaults(&spec(-1), 180).git_spec.poll_interval, -1);
        assert_eq!(apply_defaults(&spec(-30), 180).git_spec.poll_interval, -1);
    }

    #[test]
    fn test_hostname_and_cluster_group() {
        let qualified = apply_defaults(&spec(0), 180);
        assert_eq!(qualified.git_spec.hostname, "gitea.example.com");
        assert_eq!(qualified.cluster_group_name, "default");

        let mut explicit = spec(0);
        explicit.git_spec.hostname = "git.internal".to_string();
        explicit.cluster_group_name = "hub".to_string();
        let qualified = apply_defaults(&explicit, 180);
        assert_eq!(qualified.git_spec.hostname, "git.internal");
        assert_eq!(qualified.cluster_group_name, "hub");
    }

    #[test]
    fn test_unparseable_target_leaves_hostname_empty() {
        let mut bad = spec(0);
        bad.git_spec.target_repo = "not a url".to_string();
        assert!(apply_defaults(&bad, 180).git_spec.hostname.is_empty());
    }

    #[test]
    fn test_validate_git_spec() {
        let mut qualified = spec(0);
        assert_eq!(validate_git_spec(&qualified).unwrap(), "multicloud-gitops");

        qualified.git_spec.origin_repo = "ftp://example.com/org/repo".to_string();
        assert!(matches!(
            validate_git_spec(&qualified),
            Err(UrlError::UnsupportedScheme(_))
        ));

        qualified.git_spec.origin_repo = "git@github.com:org/multicloud-gitops.git".to_string();
        assert!(validate_git_spec(&qualified).is_ok());
    }
}
