//! Visibility Filter - role-specific projections over the experiment set
//!
//! Read paths pull the aggregates from the store and push them through one
//! of these filters before returning to the caller. All three are pure
//! projections returning owned clones; ordering is deterministic so tests
//! can assert on it.

use chrono::{DateTime, Utc};

use crate::model::{Experiment, ExperimentStatus};

/// The subject's "available studies" view.
///
/// In order: keep only `open` experiments; drop any experiment the subject
/// is already committed to (an active record in *any* of its sessions, not
/// just the ones shown); within the rest keep only sessions that are in the
/// future and have spots left; drop experiments whose filtered session list
/// comes up empty. Input order is preserved.
///
/// The server applies this regardless of any client-supplied status filter.
#[must_use]
pub fn for_subject(
    experiments: &[Experiment],
    subject_id: &str,
    now: DateTime<Utc>,
) -> Vec<Experiment> {
    experiments
        .iter()
        .filter(|exp| exp.status() == ExperimentStatus::Open)
        .filter(|exp| !exp.has_active_participant(subject_id))
        .filter_map(|exp| {
            let mut visible = exp.clone();
            visible.retain_sessions(|s| s.start_time() > now && s.spots_left() > 0);
            (!visible.sessions().is_empty()).then_some(visible)
        })
        .collect()
}

/// The researcher's dashboard view: everything, priority-sorted.
///
/// Live experiments (`open`, `in_progress`) come first, then `approved`,
/// `rejected`, `pending_review`, `draft`, `completed`, with `cancelled`
/// last. Ties go to the most recently updated; equal timestamps keep input
/// order (the sort is stable).
#[must_use]
pub fn for_researcher(experiments: &[Experiment]) -> Vec<Experiment> {
    let mut sorted: Vec<Experiment> = experiments.to_vec();
    sorted.sort_by(|a, b| {
        priority(a.status())
            .cmp(&priority(b.status()))
            .then_with(|| b.updated_at().cmp(&a.updated_at()))
    });
    sorted
}

/// The admin review queue: only `pending_review`, input order preserved.
#[must_use]
pub fn for_admin_pending(experiments: &[Experiment]) -> Vec<Experiment> {
    experiments
        .iter()
        .filter(|exp| exp.status() == ExperimentStatus::PendingReview)
        .cloned()
        .collect()
}

const fn priority(status: ExperimentStatus) -> u8 {
    match status {
        ExperimentStatus::Open | ExperimentStatus::InProgress => 0,
        ExperimentStatus::Approved => 1,
        ExperimentStatus::Rejected => 2,
        ExperimentStatus::PendingReview => 3,
        ExperimentStatus::Draft => 4,
        ExperimentStatus::Completed => 5,
        ExperimentStatus::Cancelled => 6,
    }
}
