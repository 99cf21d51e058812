//! Experiment Store - versioned persistence for the experiment aggregate
//!
//! The store is a transactional document store keyed by experiment id.
//! Writes are conditional on the version observed at read time, so every
//! mutation in the crate is a single re-read / re-check / re-apply loop
//! ([`update`]) rather than a separate read followed by a blind write. Two
//! concurrent registrations for the last open spot resolve with at most one
//! winner; the loser re-checks against the fresh aggregate and observes
//! `SessionFull`, never a corrupted count.
//!
//! The trait may be backed by a shared external store accessed by multiple
//! stateless server instances; nothing here assumes a process-local lock.
//!
//! # Example
//!
//! ```rust,no_run
//! use labsched::model::Experiment;
//! use labsched::store::{self, ExperimentStore, MemoryExperimentStore};
//!
//! # async fn example() -> labsched::Result<()> {
//! let store = MemoryExperimentStore::new();
//! store.insert(Experiment::new("exp-1", "Title", "res-1", 8)?).await?;
//!
//! let updated = store::update(&store, "exp-1", |exp| {
//!     exp.transition_to(labsched::model::ExperimentStatus::PendingReview)
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

mod memory;

pub use memory::MemoryExperimentStore;

use crate::error::{Error, Result};
use crate::model::Experiment;
use std::future::Future;

/// Bounded retries for optimistic-concurrency conflicts before the
/// operation surfaces as retryable `StoreUnavailable`.
pub const MAX_CAS_RETRIES: u32 = 8;

/// An aggregate snapshot paired with the store version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    version: u64,
    value: T,
}

impl<T> Versioned<T> {
    /// Pair a value with its store version.
    #[must_use]
    pub const fn new(version: u64, value: T) -> Self {
        Self { version, value }
    }

    /// Get the store version this snapshot was read at.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Get the snapshot.
    #[must_use]
    pub const fn value(&self) -> &T {
        &self.value
    }

    /// Consume the snapshot.
    pub fn into_value(self) -> T {
        self.value
    }
}

/// Transactional document store for experiment aggregates.
pub trait ExperimentStore: Send + Sync {
    /// Read an aggregate together with its current version.
    ///
    /// Returns `None` if the experiment doesn't exist.
    fn get(
        &self,
        experiment_id: &str,
    ) -> impl Future<Output = Result<Option<Versioned<Experiment>>>> + Send;

    /// Insert a new aggregate.
    ///
    /// Fails with `AlreadyExists` on an id collision; never overwrites.
    fn insert(&self, experiment: Experiment) -> impl Future<Output = Result<()>> + Send;

    /// Write the aggregate only if its version is still `expected_version`.
    ///
    /// Returns `false` on a version conflict (or if the aggregate was
    /// removed); the caller re-reads and retries.
    fn compare_and_put(
        &self,
        experiment_id: &str,
        expected_version: u64,
        experiment: Experiment,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Remove the aggregate only if its version is still `expected_version`.
    ///
    /// Returns `false` on a version conflict or if the aggregate is already
    /// gone; the caller re-reads, re-checks its preconditions, and retries.
    /// Deletion goes through the same conditional discipline as writes so a
    /// status change landing between read and removal is never lost.
    fn remove_if_version(
        &self,
        experiment_id: &str,
        expected_version: u64,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Read all aggregates in a deterministic order (creation time, then id).
    fn list(&self) -> impl Future<Output = Result<Vec<Experiment>>> + Send;
}

/// Apply a mutation as one atomic conditional update with bounded retries.
///
/// `apply` re-evaluates its domain preconditions against the freshly read
/// aggregate on every attempt, so a precondition failure always reflects
/// current state and aborts before any write. On success returns the
/// updated aggregate as persisted.
///
/// # Errors
///
/// `ExperimentNotFound` for an unknown id, whatever `apply` returns when a
/// precondition blocks the mutation, and `StoreUnavailable` when the
/// version conflict retries are exhausted.
pub async fn update<S, F>(store: &S, experiment_id: &str, mut apply: F) -> Result<Experiment>
where
    S: ExperimentStore,
    F: FnMut(&mut Experiment) -> Result<()>,
{
    for attempt in 0..MAX_CAS_RETRIES {
        let versioned = store
            .get(experiment_id)
            .await?
            .ok_or_else(|| Error::ExperimentNotFound(experiment_id.to_string()))?;
        let version = versioned.version();
        let mut experiment = versioned.into_value();

        apply(&mut experiment)?;

        if store
            .compare_and_put(experiment_id, version, experiment.clone())
            .await?
        {
            return Ok(experiment);
        }
        tracing::debug!(experiment_id, attempt, "version conflict, retrying conditional update");
    }

    tracing::warn!(experiment_id, "conditional update retries exhausted");
    Err(Error::StoreUnavailable(format!(
        "conditional update contention on experiment {experiment_id}"
    )))
}
