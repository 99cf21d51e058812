//! In-memory experiment store implementation using `DashMap`.
//!
//! This is the default backend - data is lost on process restart. The
//! version check and write in `compare_and_put` happen under the map's
//! entry lock, so the conditional update is atomic even under concurrent
//! callers.

use super::{ExperimentStore, Versioned};
use crate::error::{Error, Result};
use crate::model::Experiment;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// In-memory experiment store using a lock-free concurrent hashmap.
///
/// Thread-safe; suitable for tests and single-process deployments. A
/// shared deployment would back [`ExperimentStore`] with an external
/// document store offering the same conditional-update primitive.
pub struct MemoryExperimentStore {
    store: DashMap<String, Versioned<Experiment>>,
}

impl MemoryExperimentStore {
    /// Create a new in-memory experiment store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: DashMap::new(),
        }
    }

    /// Create with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            store: DashMap::with_capacity(capacity),
        }
    }

    /// Get the number of stored experiments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.store.clear();
    }
}

impl Default for MemoryExperimentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ExperimentStore for MemoryExperimentStore {
    async fn get(&self, experiment_id: &str) -> Result<Option<Versioned<Experiment>>> {
        Ok(self.store.get(experiment_id).map(|v| v.value().clone()))
    }

    async fn insert(&self, experiment: Experiment) -> Result<()> {
        match self.store.entry(experiment.experiment_id().to_string()) {
            Entry::Occupied(_) => Err(Error::AlreadyExists(
                experiment.experiment_id().to_string(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(Versioned::new(1, experiment));
                Ok(())
            }
        }
    }

    async fn compare_and_put(
        &self,
        experiment_id: &str,
        expected_version: u64,
        experiment: Experiment,
    ) -> Result<bool> {
        match self.store.entry(experiment_id.to_string()) {
            Entry::Occupied(mut slot) if slot.get().version() == expected_version => {
                slot.insert(Versioned::new(expected_version + 1, experiment));
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove_if_version(&self, experiment_id: &str, expected_version: u64) -> Result<bool> {
        let removed = self
            .store
            .remove_if(experiment_id, |_, stored| {
                stored.version() == expected_version
            })
            .is_some();
        Ok(removed)
    }

    async fn list(&self) -> Result<Vec<Experiment>> {
        let mut experiments: Vec<Experiment> = self
            .store
            .iter()
            .map(|entry| entry.value().value().clone())
            .collect();

        // DashMap iteration order is nondeterministic; pin it down.
        experiments.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.experiment_id().cmp(b.experiment_id()))
        });

        Ok(experiments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn experiment(id: &str) -> Experiment {
        Experiment::new(id, "Title", "res-1", 4).unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemoryExperimentStore::new();
        store.insert(experiment("exp-1")).await.unwrap();

        let stored = store.get("exp-1").await.unwrap().unwrap();
        assert_eq!(stored.version(), 1);
        assert_eq!(stored.value().experiment_id(), "exp-1");
    }

    #[tokio::test]
    async fn test_insert_duplicate_rejected() {
        let store = MemoryExperimentStore::new();
        store.insert(experiment("exp-1")).await.unwrap();
        assert_eq!(
            store.insert(experiment("exp-1")).await.unwrap_err(),
            Error::AlreadyExists("exp-1".to_string())
        );
    }

    #[tokio::test]
    async fn test_compare_and_put_version_conflict() {
        let store = MemoryExperimentStore::new();
        store.insert(experiment("exp-1")).await.unwrap();

        assert!(store
            .compare_and_put("exp-1", 1, experiment("exp-1"))
            .await
            .unwrap());
        // Stale version loses.
        assert!(!store
            .compare_and_put("exp-1", 1, experiment("exp-1"))
            .await
            .unwrap());
        assert_eq!(store.get("exp-1").await.unwrap().unwrap().version(), 2);
    }

    #[tokio::test]
    async fn test_compare_and_put_missing_aggregate() {
        let store = MemoryExperimentStore::new();
        assert!(!store
            .compare_and_put("missing", 1, experiment("missing"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_remove_if_version_is_conditional() {
        let store = MemoryExperimentStore::new();
        assert!(!store.remove_if_version("missing", 1).await.unwrap());

        store.insert(experiment("exp-1")).await.unwrap();
        store
            .compare_and_put("exp-1", 1, experiment("exp-1"))
            .await
            .unwrap();

        // A stale version observes the concurrent write and backs off.
        assert!(!store.remove_if_version("exp-1", 1).await.unwrap());
        assert!(store.get("exp-1").await.unwrap().is_some());

        assert!(store.remove_if_version("exp-1", 2).await.unwrap());
        assert!(store.get("exp-1").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_list_order_is_deterministic() {
        let store = MemoryExperimentStore::new();
        for id in ["exp-c", "exp-a", "exp-b"] {
            let exp = Experiment::builder(id, "Title", "res-1")
                .max_participants(4)
                .created_at(chrono::Utc::now())
                .build()
                .unwrap();
            store.insert(exp).await.unwrap();
        }

        let first: Vec<String> = store
            .list()
            .await
            .unwrap()
            .iter()
            .map(|e| e.experiment_id().to_string())
            .collect();
        let second: Vec<String> = store
            .list()
            .await
            .unwrap()
            .iter()
            .map(|e| e.experiment_id().to_string())
            .collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }
}
