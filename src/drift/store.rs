//! # Pattern Store
//!
//! What the drift watcher needs from the owning resource: read its git
//! configuration and read/write its conditions. [`KubePatternStore`] talks to
//! the API server; [`InMemoryPatternStore`] backs tests.

use super::conditions::set_git_condition;
use super::pair::PatternKey;
use crate::crd::{GitConfig, Pattern, PatternCondition};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kube::api::{Api, Patch, PatchParams};
use kube::Client;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("pattern {0} not found")]
    NotFound(PatternKey),
    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
    #[error("pattern store lock poisoned")]
    Poisoned,
}

#[async_trait]
pub trait PatternStore: Send + Sync {
    /// Current git configuration of the Pattern
    async fn git_config(&self, key: &PatternKey) -> Result<GitConfig, StoreError>;

    async fn conditions(&self, key: &PatternKey) -> Result<Vec<PatternCondition>, StoreError>;

    /// Replace the Pattern's condition list
    async fn write_conditions(
        &self,
        key: &PatternKey,
        conditions: Vec<PatternCondition>,
    ) -> Result<(), StoreError>;

    /// Persist a drift result as a git-sync condition
    async fn report_drift(
        &self,
        key: &PatternKey,
        drifted: bool,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut conditions = self.conditions(key).await?;
        if set_git_condition(&mut conditions, drifted, now) {
            self.write_conditions(key, conditions).await?;
        }
        Ok(())
    }
}

/// [`PatternStore`] backed by the Kubernetes API
#[derive(Clone)]
pub struct KubePatternStore {
    client: Client,
}

impl std::fmt::Debug for KubePatternStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubePatternStore").finish_non_exhaustive()
    }
}

impl KubePatternStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, key: &PatternKey) -> Api<Pattern> {
        Api::namespaced(self.client.clone(), &key.namespace)
    }

    async fn fetch(&self, key: &PatternKey) -> Result<Pattern, StoreError> {
        self.api(key)
            .get_opt(&key.name)
            .await?
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }
}

#[async_trait]
impl PatternStore for KubePatternStore {
    async fn git_config(&self, key: &PatternKey) -> Result<GitConfig, StoreError> {
        Ok(self.fetch(key).await?.spec.git_spec)
    }

    async fn conditions(&self, key: &PatternKey) -> Result<Vec<PatternCondition>, StoreError> {
        Ok(self
            .fetch(key)
            .await?
            .status
            .map(|status| status.conditions)
            .unwrap_or_default())
    }

    async fn write_conditions(
        &self,
        key: &PatternKey,
        conditions: Vec<PatternCondition>,
    ) -> Result<(), StoreError> {
        let patch = serde_json::json!({ "status": { "conditions": conditions } });
        self.api(key)
            .patch_status(&key.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
struct StoredPattern {
    git_config: GitConfig,
    conditions: Vec<PatternCondition>,
}

/// [`PatternStore`] kept in process memory
#[derive(Debug, Default)]
pub struct InMemoryPatternStore {
    patterns: Mutex<HashMap<PatternKey, StoredPattern>>,
}

impl InMemoryPatternStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a Pattern's git configuration, keeping its conditions
    pub fn set_git_config(&self, key: PatternKey, git_config: GitConfig) {
        if let Ok(mut patterns) = self.patterns.lock() {
            patterns.entry(key).or_default().git_config = git_config;
        }
    }

    pub fn remove(&self, key: &PatternKey) {
        if let Ok(mut patterns) = self.patterns.lock() {
            patterns.remove(key);
        }
    }

    /// Conditions currently stored for `key`; empty when unknown
    #[must_use]
    pub fn snapshot(&self, key: &PatternKey) -> Vec<PatternCondition> {
        self.patterns
            .lock()
            .ok()
            .and_then(|patterns| patterns.get(key).map(|p| p.conditions.clone()))
            .unwrap_or_default()
    }

    fn with_pattern<T>(
        &self,
        key: &PatternKey,
        f: impl FnOnce(&mut StoredPattern) -> T,
    ) -> Result<T, StoreError> {
        let mut patterns = self.patterns.lock().map_err(|_poisoned| StoreError::Poisoned)?;
        patterns
            .get_mut(key)
            .map(f)
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }
}

#[async_trait]
impl PatternStore for InMemoryPatternStore {
    async fn git_config(&self, key: &PatternKey) -> Result<GitConfig, StoreError> {
        self.with_pattern(key, |p| p.git_config.clone())
    }

    async fn conditions(&self, key: &PatternKey) -> Result<Vec<PatternCondition>, StoreError> {
        self.with_pattern(key, |p| p.conditions.clone())
    }

    async fn write_conditions(
        &self,
        key: &PatternKey,
        conditions: Vec<PatternCondition>,
    ) -> Result<(), StoreError> {
        self.with_pattern(key, |p| p.conditions = conditions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{ConditionStatus, PatternConditionType};
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_report_drift_writes_conditions() {
        let store = InMemoryPatternStore::new();
        let key = PatternKey::new("mcg", "patterns");
        store.set_git_config(key.clone(), GitConfig::default());

        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        store.report_drift(&key, true, now).await.unwrap();

        let conditions = store.snapshot(&key);
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].condition_type, PatternConditionType::GitOutOfSync);
        assert_eq!(conditions[0].status, ConditionStatus::True);
    }

    #[tokio::test]
    async fn test_unknown_pattern_is_not_found() {
        let store = InMemoryPatternStore::new();
        let key = PatternKey::new("missing", "patterns");
        assert!(matches!(
            store.git_config(&key).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(store.report_drift(&key, false, Utc::now()).await.is_err());
        assert!(store.snapshot(&key).is_empty());
    }

    #[tokio::test]
    async fn test_set_git_config_keeps_conditions() {
        let store = InMemoryPatternStore::new();
        let key = PatternKey::new("mcg", "patterns");
        store.set_git_config(key.clone(), GitConfig::default());
        store.report_drift(&key, false, Utc::now()).await.unwrap();

        let updated = GitConfig {
            target_revision: "v2".to_string(),
            ..GitConfig::default()
        };
        store.set_git_config(key.clone(), updated.clone());

        assert_eq!(store.git_config(&key).await.unwrap(), updated);
        assert_eq!(store.snapshot(&key).len(), 1);
    }
}
