//! # Pattern Status
//!
//! Status types for tracking reconciliation state and conditions.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const GIT_IN_SYNC_MESSAGE: &str = "Git repositories are in sync";
pub const GIT_OUT_OF_SYNC_MESSAGE: &str = "Git repositories are out of sync";

/// Status of the Pattern resource
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatternStatus {
    /// Last action related to the pattern
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_step: Option<String>,
    /// Last error encountered by the pattern
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Number of updates to the pattern
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    /// Conditions represent the latest available observations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<PatternCondition>,
}

/// A single typed, timestamped status condition
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatternCondition {
    /// Type of the condition
    #[serde(rename = "type")]
    pub condition_type: PatternConditionType,
    /// True, False or Unknown
    pub status: ConditionStatus,
    /// The last time this condition was updated (RFC3339)
    pub last_update_time: String,
    /// The last time the condition transitioned from one status to another (RFC3339)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_transition_time: String,
    /// Human readable message about the transition
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, schemars::JsonSchema)]
pub enum PatternConditionType {
    GitOutOfSync,
    GitInSync,
    Synced,
    OutOfSync,
    Unknown,
    Degraded,
    Progressing,
    Missing,
    Suspended,
}

impl PatternConditionType {
    /// Whether the type belongs to the git-sync family, of which at most one
    /// condition may be `True`
    #[must_use]
    pub fn is_git_sync(self) -> bool {
        matches!(self, Self::GitInSync | Self::GitOutOfSync)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GitOutOfSync => "GitOutOfSync",
            Self::GitInSync => "GitInSync",
            Self::Synced => "Synced",
            Self::OutOfSync => "OutOfSync",
            Self::Unknown => "Unknown",
            Self::Degraded => "Degraded",
            Self::Progressing => "Progressing",
            Self::Missing => "Missing",
            Self::Suspended => "Suspended",
        }
    }
}

impl fmt::Display for PatternConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_wire_shape() {
        let condition = PatternCondition {
            condition_type: PatternConditionType::GitInSync,
            status: ConditionStatus::True,
            last_update_time: "2024-05-01T10:00:00Z".to_string(),
            last_transition_time: "2024-05-01T10:00:00Z".to_string(),
            message: GIT_IN_SYNC_MESSAGE.to_string(),
        };
        let value = serde_json::to_value(&condition).unwrap();
        assert_eq!(value["type"], "GitInSync");
        assert_eq!(value["status"], "True");
        assert_eq!(value["lastUpdateTime"], "2024-05-01T10:00:00Z");
        assert_eq!(value["lastTransitionTime"], "2024-05-01T10:00:00Z");
        assert_eq!(value["message"], "Git repositories are in sync");
    }

    #[test]
    fn test_status_omits_empty_fields() {
        let value = serde_json::to_value(PatternStatus::default()).unwrap();
        assert_eq!(value, serde_json::json!({}));
    }

    #[test]
    fn test_git_sync_family() {
        assert!(PatternConditionType::GitInSync.is_git_sync());
        assert!(PatternConditionType::GitOutOfSync.is_git_sync());
        assert!(!PatternConditionType::Synced.is_git_sync());
        assert!(!PatternConditionType::Degraded.is_git_sync());
    }
}
