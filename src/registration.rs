//! Registration Coordinator - register/cancel accounting over the store
//!
//! Each operation is one atomic conditional update ([`store::update`]):
//! preconditions are re-evaluated against the freshly read aggregate on
//! every attempt, so the capacity invariant holds even when multiple
//! stateless server instances race for the last spot.

use chrono::Utc;

use crate::caller::Caller;
use crate::error::{Error, Result};
use crate::model::{Experiment, ExperimentStatus, ParticipantStatus};
use crate::store::{self, ExperimentStore};

/// Register a user for a session.
///
/// Preconditions, checked in order against the fresh aggregate: parent
/// experiment is `open`, the session has spots left, and the user holds no
/// active record in it. On success a new `registered` participant record is
/// appended with its signup time set to now.
///
/// # Errors
///
/// `ExperimentNotOpen`, `SessionFull`, `AlreadyRegistered`,
/// `ExperimentNotFound`/`SessionNotFound` on lookup misses, and
/// `StoreUnavailable` on contention retry exhaustion.
pub async fn register<S: ExperimentStore>(
    store: &S,
    experiment_id: &str,
    session_id: &str,
    user_id: &str,
) -> Result<Experiment> {
    store::update(store, experiment_id, |exp| {
        if exp.status() != ExperimentStatus::Open {
            return Err(Error::ExperimentNotOpen(exp.status()));
        }
        let now = Utc::now();
        let session = exp
            .session_mut(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        session.register_user(user_id, now)?;
        exp.touch(now);
        Ok(())
    })
    .await
}

/// Cancel the user's active registration in a session.
///
/// The record is soft-retired to `cancelled` and stays in the participant
/// list. Cancellation is one-way per registration instance: with no active
/// record left, a second cancel is rejected rather than ignored.
///
/// # Errors
///
/// `NotRegistered` when the user holds no active record, plus the usual
/// lookup and store errors.
pub async fn cancel<S: ExperimentStore>(
    store: &S,
    experiment_id: &str,
    session_id: &str,
    user_id: &str,
) -> Result<Experiment> {
    store::update(store, experiment_id, |exp| {
        let session = exp
            .session_mut(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        session.cancel_user(user_id)?;
        exp.touch(Utc::now());
        Ok(())
    })
    .await
}

/// Set the status of a user's active participant record.
///
/// Restricted to the owning researcher (admins bypass ownership). Any of
/// the five participant status values is accepted; there is deliberately no
/// sub-state-machine among them. Only the user's latest active record is
/// addressable, so cancelled history can never be revived.
///
/// # Errors
///
/// `Forbidden` for non-owners, `ParticipantNotFound` when the user has no
/// active record, plus the usual lookup and store errors.
pub async fn set_participant_status<S: ExperimentStore>(
    store: &S,
    experiment_id: &str,
    session_id: &str,
    caller: &Caller,
    user_id: &str,
    new_status: ParticipantStatus,
) -> Result<Experiment> {
    store::update(store, experiment_id, |exp| {
        if !caller.owns(exp.owner_id()) {
            return Err(Error::Forbidden(
                "only the owning researcher may update participant status".to_string(),
            ));
        }
        let session = exp
            .session_mut(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        session.set_participant_status(user_id, new_status)?;
        exp.touch(Utc::now());
        Ok(())
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Session;
    use crate::store::MemoryExperimentStore;
    use chrono::Duration;

    async fn open_experiment(store: &MemoryExperimentStore, capacity: u32) {
        let mut exp = Experiment::new("exp-1", "Title", "res-1", capacity).unwrap();
        let start = Utc::now() + Duration::days(1);
        exp.add_session(
            Session::new("sess-1", start, start + Duration::hours(1), "Lab", capacity).unwrap(),
        )
        .unwrap();
        exp.transition_to(ExperimentStatus::PendingReview).unwrap();
        exp.transition_to(ExperimentStatus::Approved).unwrap();
        exp.transition_to(ExperimentStatus::Open).unwrap();
        store.insert(exp).await.unwrap();
    }

    #[tokio::test]
    async fn test_register_appends_participant() {
        let store = MemoryExperimentStore::new();
        open_experiment(&store, 2).await;

        let exp = register(&store, "exp-1", "sess-1", "sub-1").await.unwrap();
        let session = exp.session("sess-1").unwrap();
        assert_eq!(session.active_count(), 1);
        assert_eq!(
            session.participants()[0].status(),
            ParticipantStatus::Registered
        );
    }

    #[tokio::test]
    async fn test_register_requires_open_experiment() {
        let store = MemoryExperimentStore::new();
        let mut exp = Experiment::new("exp-1", "Title", "res-1", 2).unwrap();
        let start = Utc::now() + Duration::days(1);
        exp.add_session(Session::new("sess-1", start, start + Duration::hours(1), "Lab", 2).unwrap())
            .unwrap();
        store.insert(exp).await.unwrap();

        assert_eq!(
            register(&store, "exp-1", "sess-1", "sub-1").await.unwrap_err(),
            Error::ExperimentNotOpen(ExperimentStatus::Draft)
        );
    }

    #[tokio::test]
    async fn test_register_unknown_session() {
        let store = MemoryExperimentStore::new();
        open_experiment(&store, 2).await;
        assert_eq!(
            register(&store, "exp-1", "nope", "sub-1").await.unwrap_err(),
            Error::SessionNotFound("nope".to_string())
        );
    }

    #[tokio::test]
    async fn test_cancel_requires_active_record() {
        let store = MemoryExperimentStore::new();
        open_experiment(&store, 2).await;
        assert_eq!(
            cancel(&store, "exp-1", "sess-1", "sub-1").await.unwrap_err(),
            Error::NotRegistered
        );
    }

    #[tokio::test]
    async fn test_set_participant_status_requires_ownership() {
        let store = MemoryExperimentStore::new();
        open_experiment(&store, 2).await;
        register(&store, "exp-1", "sess-1", "sub-1").await.unwrap();

        let intruder = Caller::researcher("res-other");
        let err = set_participant_status(
            &store,
            "exp-1",
            "sess-1",
            &intruder,
            "sub-1",
            ParticipantStatus::Attended,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        let owner = Caller::researcher("res-1");
        let exp = set_participant_status(
            &store,
            "exp-1",
            "sess-1",
            &owner,
            "sub-1",
            ParticipantStatus::Attended,
        )
        .await
        .unwrap();
        assert_eq!(
            exp.session("sess-1").unwrap().participants()[0].status(),
            ParticipantStatus::Attended
        );
    }
}
