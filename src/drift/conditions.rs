//! # Git Sync Conditions
//!
//! Maintains the `GitInSync` / `GitOutOfSync` pair of conditions on a Pattern.
//! At most one of them is `True`. Switching flips the previous one to `False`
//! (touching only its `lastUpdateTime`) and activates the other with both
//! timestamps set. A repeated result only refreshes `lastUpdateTime`.

use crate::crd::{
    ConditionStatus, PatternCondition, PatternConditionType, GIT_IN_SYNC_MESSAGE,
    GIT_OUT_OF_SYNC_MESSAGE,
};
use chrono::{DateTime, SecondsFormat, Utc};

/// RFC3339 with second precision, the shape Kubernetes uses for condition times
#[must_use]
pub fn format_condition_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Index and value of the first condition with the given type
#[must_use]
pub fn condition_by_type(
    conditions: &[PatternCondition],
    condition_type: PatternConditionType,
) -> Option<(usize, &PatternCondition)> {
    conditions
        .iter()
        .enumerate()
        .find(|(_, c)| c.condition_type == condition_type)
}

/// Index and value of the git-sync condition currently carrying `status`
#[must_use]
pub fn git_condition_by_status(
    conditions: &[PatternCondition],
    status: ConditionStatus,
) -> Option<(usize, &PatternCondition)> {
    conditions
        .iter()
        .enumerate()
        .find(|(_, c)| c.condition_type.is_git_sync() && c.status == status)
}

/// Record a drift result in `conditions`. Returns whether anything changed.
pub fn set_git_condition(
    conditions: &mut Vec<PatternCondition>,
    drifted: bool,
    now: DateTime<Utc>,
) -> bool {
    let (new_type, message) = if drifted {
        (PatternConditionType::GitOutOfSync, GIT_OUT_OF_SYNC_MESSAGE)
    } else {
        (PatternConditionType::GitInSync, GIT_IN_SYNC_MESSAGE)
    };
    let timestamp = format_condition_time(now);

    if let Some((index, active)) = git_condition_by_status(conditions, ConditionStatus::True) {
        let active_type = active.condition_type;
        let active = &mut conditions[index];
        if active_type == new_type {
            let changed = active.last_update_time != timestamp;
            active.last_update_time = timestamp;
            return changed;
        }
        active.status = ConditionStatus::False;
        active.last_update_time.clone_from(&timestamp);
    }

    match condition_by_type(conditions, new_type).map(|(index, _)| index) {
        Some(index) => {
            let condition = &mut conditions[index];
            condition.status = ConditionStatus::True;
            condition.last_update_time.clone_from(&timestamp);
            condition.last_transition_time = timestamp;
            condition.message = message.to_string();
        }
        None => conditions.push(PatternCondition {
            condition_type: new_type,
            status: ConditionStatus::True,
            last_update_time: timestamp.clone(),
            last_transition_time: timestamp,
            message: message.to_string(),
        }),
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn active_count(conditions: &[PatternCondition]) -> usize {
        conditions
            .iter()
            .filter(|c| c.condition_type.is_git_sync() && c.status == ConditionStatus::True)
            .count()
    }

    #[test]
    fn test_first_result_adds_active_condition() {
        let mut conditions = Vec::new();
        assert!(set_git_condition(&mut conditions, false, at(0)));

        assert_eq!(conditions.len(), 1);
        let condition = &conditions[0];
        assert_eq!(condition.condition_type, PatternConditionType::GitInSync);
        assert_eq!(condition.status, ConditionStatus::True);
        assert_eq!(condition.last_update_time, format_condition_time(at(0)));
        assert_eq!(condition.last_transition_time, format_condition_time(at(0)));
        assert_eq!(condition.message, GIT_IN_SYNC_MESSAGE);
    }

    #[test]
    fn test_repeated_result_only_touches_update_time() {
        let mut conditions = Vec::new();
        set_git_condition(&mut conditions, false, at(0));
        assert!(set_git_condition(&mut conditions, false, at(10)));

        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].last_update_time, format_condition_time(at(10)));
        assert_eq!(conditions[0].last_transition_time, format_condition_time(at(0)));

        // Same instant again is not a change
        assert!(!set_git_condition(&mut conditions, false, at(10)));
    }

    #[test]
    fn test_switch_flips_previous_condition() {
        let mut conditions = Vec::new();
        set_git_condition(&mut conditions, false, at(0));
        set_git_condition(&mut conditions, true, at(5));

        assert_eq!(conditions.len(), 2);
        assert_eq!(active_count(&conditions), 1);

        let (_, in_sync) = condition_by_type(&conditions, PatternConditionType::GitInSync).unwrap();
        assert_eq!(in_sync.status, ConditionStatus::False);
        assert_eq!(in_sync.last_update_time, format_condition_time(at(5)));
        assert_eq!(in_sync.last_transition_time, format_condition_time(at(0)));

        let (_, out_of_sync) =
            condition_by_type(&conditions, PatternConditionType::GitOutOfSync).unwrap();
        assert_eq!(out_of_sync.status, ConditionStatus::True);
        assert_eq!(out_of_sync.last_transition_time, in_sync.last_update_time);
        assert_eq!(out_of_sync.message, GIT_OUT_OF_SYNC_MESSAGE);
    }

    #[test]
    fn test_switch_back_reuses_existing_entry() {
        let mut conditions = Vec::new();
        set_git_condition(&mut conditions, false, at(0));
        set_git_condition(&mut conditions, true, at(5));
        set_git_condition(&mut conditions, false, at(9));

        assert_eq!(conditions.len(), 2);
        assert_eq!(active_count(&conditions), 1);
        let (_, active) = git_condition_by_status(&conditions, ConditionStatus::True).unwrap();
        assert_eq!(active.condition_type, PatternConditionType::GitInSync);
        assert_eq!(active.last_transition_time, format_condition_time(at(9)));
    }

    #[test]
    fn test_unrelated_conditions_are_untouched() {
        let degraded = PatternCondition {
            condition_type: PatternConditionType::Degraded,
            status: ConditionStatus::True,
            last_update_time: "2023-01-01T00:00:00Z".to_string(),
            last_transition_time: "2023-01-01T00:00:00Z".to_string(),
            message: "argo application degraded".to_string(),
        };
        let mut conditions = vec![degraded.clone()];
        set_git_condition(&mut conditions, true, at(0));
        set_git_condition(&mut conditions, false, at(1));

        assert_eq!(conditions[0], degraded);
        assert_eq!(active_count(&conditions), 1);
    }
}
