//! Status Transition Validator - the single source of truth for the
//! experiment lifecycle topology
//!
//! Every status comparison in the crate funnels through
//! [`can_transition`]; no handler does ad hoc status checks. The validator
//! is role-agnostic: it encodes which edges exist plus the session-count
//! guard, while [`requires_admin`] tells callers which edges only an admin
//! may drive.
//!
//! ## Transition table
//!
//! ```text
//! draft ──────────> pending_review ──┬──> approved ──> open ──┬──> completed ──> draft
//!   ^                    │  ^        └──> rejected ───┘       └──> in_progress ──> completed
//!   └────────────────────┘  └──────────────── (resubmission)
//! any ──> cancelled (administrative override)
//! ```
//!
//! `approved -> open` additionally requires at least one session.

use crate::error::{Error, Result};
use crate::model::ExperimentStatus;

/// Check whether `requested` is reachable from `current`.
///
/// A request for the current status is always a no-op success. Any pair
/// without a directed edge in the table is rejected, including attempts to
/// skip states (e.g. `draft -> open`).
///
/// # Errors
///
/// [`Error::NeedsSession`] for `approved -> open` with `session_count == 0`;
/// [`Error::InvalidTransition`] for every absent edge.
pub fn can_transition(
    current: ExperimentStatus,
    requested: ExperimentStatus,
    session_count: usize,
) -> Result<()> {
    use ExperimentStatus as S;

    if current == requested {
        return Ok(());
    }
    // Administrative override: reachable from every status.
    if requested == S::Cancelled {
        return Ok(());
    }
    // Publishing requires something to register for.
    if (current, requested) == (S::Approved, S::Open) {
        if session_count == 0 {
            return Err(Error::NeedsSession);
        }
        return Ok(());
    }

    let allowed = matches!(
        (current, requested),
        (S::Draft, S::PendingReview)                    // submit
            | (S::PendingReview, S::Draft)              // withdraw
            | (S::PendingReview, S::Approved | S::Rejected) // review decision
            | (S::Rejected, S::PendingReview)           // resubmission
            | (S::Open, S::InProgress | S::Completed)   // start / close
            | (S::InProgress, S::Completed)
            | (S::Completed, S::Draft)                  // reactivate
    );

    if allowed {
        Ok(())
    } else {
        Err(Error::InvalidTransition {
            from: current,
            to: requested,
        })
    }
}

/// Whether this edge may only be driven by an admin caller.
///
/// Covers the review decision (`pending_review -> approved/rejected`) and
/// the cancel override. Self-transitions are never admin-gated since they
/// change nothing.
#[must_use]
pub fn requires_admin(current: ExperimentStatus, requested: ExperimentStatus) -> bool {
    use ExperimentStatus as S;

    if current == requested {
        return false;
    }
    matches!(
        (current, requested),
        (S::PendingReview, S::Approved | S::Rejected) | (_, S::Cancelled)
    )
}
