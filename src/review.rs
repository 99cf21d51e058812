//! Admin Review Gate - the `pending_review -> approved/rejected` edge
//!
//! Both operations are restricted to the Admin role by the caller; the gate
//! itself does not re-derive role. A decision is only valid on a
//! `pending_review` experiment: anything else, including a repeat of an
//! earlier decision, fails with `InvalidTransition` and leaves the stored
//! review record untouched.

use chrono::Utc;

use crate::error::{Error, Result};
use crate::model::{AdminReview, Experiment, ExperimentStatus};
use crate::store::{self, ExperimentStore};

/// Approve a pending experiment.
///
/// Sets status `approved` and records `{reviewer, review_date: now, notes}`.
///
/// # Errors
///
/// `InvalidTransition` unless the experiment is currently `pending_review`,
/// plus the usual lookup and store errors.
pub async fn approve<S: ExperimentStore>(
    store: &S,
    experiment_id: &str,
    reviewer: &str,
    notes: Option<String>,
) -> Result<Experiment> {
    decide(store, experiment_id, reviewer, ExperimentStatus::Approved, notes).await
}

/// Reject a pending experiment.
///
/// Rejection without a reason is refused: `notes` must be present and
/// non-blank.
///
/// # Errors
///
/// `NotesRequired` for missing or blank notes, `InvalidTransition` unless
/// the experiment is currently `pending_review`, plus the usual lookup and
/// store errors.
pub async fn reject<S: ExperimentStore>(
    store: &S,
    experiment_id: &str,
    reviewer: &str,
    notes: Option<String>,
) -> Result<Experiment> {
    match notes.as_deref() {
        Some(text) if !text.trim().is_empty() => {}
        _ => return Err(Error::NotesRequired),
    }
    decide(store, experiment_id, reviewer, ExperimentStatus::Rejected, notes).await
}

async fn decide<S: ExperimentStore>(
    store: &S,
    experiment_id: &str,
    reviewer: &str,
    decision: ExperimentStatus,
    notes: Option<String>,
) -> Result<Experiment> {
    store::update(store, experiment_id, |exp| {
        // transition_to treats a repeat of the current status as a no-op, so
        // an explicit gate is needed here: a second decision must fail, not
        // silently replace the original review record.
        if exp.status() != ExperimentStatus::PendingReview {
            return Err(Error::InvalidTransition {
                from: exp.status(),
                to: decision,
            });
        }
        exp.transition_to(decision)?;
        let now = Utc::now();
        exp.set_admin_review(AdminReview::new(reviewer, now, notes.clone()));
        exp.touch(now);
        Ok(())
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryExperimentStore;

    async fn pending_experiment(store: &MemoryExperimentStore) {
        let mut exp = Experiment::new("exp-1", "Title", "res-1", 4).unwrap();
        exp.transition_to(ExperimentStatus::PendingReview).unwrap();
        store.insert(exp).await.unwrap();
    }

    #[tokio::test]
    async fn test_approve_records_metadata() {
        let store = MemoryExperimentStore::new();
        pending_experiment(&store).await;

        let exp = approve(&store, "exp-1", "adm-1", Some("looks fine".to_string()))
            .await
            .unwrap();
        assert_eq!(exp.status(), ExperimentStatus::Approved);
        let review = exp.admin_review().unwrap();
        assert_eq!(review.reviewer(), "adm-1");
        assert_eq!(review.notes(), Some("looks fine"));
    }

    #[tokio::test]
    async fn test_reject_requires_notes() {
        let store = MemoryExperimentStore::new();
        pending_experiment(&store).await;

        assert_eq!(
            reject(&store, "exp-1", "adm-1", None).await.unwrap_err(),
            Error::NotesRequired
        );
        assert_eq!(
            reject(&store, "exp-1", "adm-1", Some("   ".to_string()))
                .await
                .unwrap_err(),
            Error::NotesRequired
        );

        let exp = reject(&store, "exp-1", "adm-1", Some("missing IRB".to_string()))
            .await
            .unwrap();
        assert_eq!(exp.status(), ExperimentStatus::Rejected);
    }

    #[tokio::test]
    async fn test_repeat_approve_rejected_and_record_kept() {
        let store = MemoryExperimentStore::new();
        pending_experiment(&store).await;
        approve(&store, "exp-1", "adm-first", Some("ok".to_string()))
            .await
            .unwrap();

        let err = approve(&store, "exp-1", "adm-second", Some("also ok".to_string()))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            Error::InvalidTransition {
                from: ExperimentStatus::Approved,
                to: ExperimentStatus::Approved,
            }
        );

        // The original decision record survives.
        let stored = store.get("exp-1").await.unwrap().unwrap();
        let review = stored.value().admin_review().unwrap();
        assert_eq!(review.reviewer(), "adm-first");
        assert_eq!(review.notes(), Some("ok"));
    }

    #[tokio::test]
    async fn test_decision_on_decided_experiment_fails() {
        let store = MemoryExperimentStore::new();
        pending_experiment(&store).await;
        approve(&store, "exp-1", "adm-1", None).await.unwrap();

        let err = reject(&store, "exp-1", "adm-1", Some("changed my mind".to_string()))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            Error::InvalidTransition {
                from: ExperimentStatus::Approved,
                to: ExperimentStatus::Rejected,
            }
        );
    }
}
