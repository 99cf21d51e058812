//! Wire Contract - request/response shapes fixed by the deployed API
//!
//! Bodies use camelCase keys and RFC 3339 instants; status enum values are
//! snake_case. These shapes (and the enum wire names in [`crate::model`])
//! must be preserved bit-for-bit for compatibility. Success responses
//! serialize the full updated [`Experiment`](crate::model::Experiment);
//! failures serialize [`ErrorBody`].
//!
//! The subject list view applies `status == open` server-side regardless of
//! any client-supplied filter - that is
//! [`visibility::for_subject`](crate::visibility::for_subject).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::lifecycle::{ExperimentUpdate, SessionUpdate};
use crate::model::{ExperimentStatus, ParticipantStatus, Session};

/// `PATCH` body for a status change: the requested status plus any
/// editable fields riding along.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeRequest {
    /// Requested lifecycle status.
    pub status: ExperimentStatus,
    /// New title, if supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description, if supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Replacement requirements list, if supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<String>>,
    /// New default capacity suggestion, if supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<u32>,
    /// New compensation display text, if supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compensation: Option<String>,
}

impl StatusChangeRequest {
    /// Split into the requested status and the field update.
    #[must_use]
    pub fn into_parts(self) -> (ExperimentStatus, ExperimentUpdate) {
        (
            self.status,
            ExperimentUpdate {
                title: self.title,
                description: self.description,
                requirements: self.requirements,
                max_participants: self.max_participants,
                compensation: self.compensation,
            },
        )
    }
}

/// Body for adding a session to an experiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSessionRequest {
    /// Session window start (ISO 8601).
    pub start_time: DateTime<Utc>,
    /// Session window end; must be after the start.
    pub end_time: DateTime<Utc>,
    /// Free-text location.
    pub location: String,
    /// Session capacity.
    pub max_participants: u32,
    /// Researcher-facing notes, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl AddSessionRequest {
    /// Build the session under the given id.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSessionWindow`] / [`Error::InvalidCapacity`] when the
    /// body fails validation.
    pub fn into_session(self, session_id: impl Into<String>) -> Result<Session> {
        let mut session = Session::new(
            session_id,
            self.start_time,
            self.end_time,
            self.location,
            self.max_participants,
        )?;
        if let Some(notes) = self.notes {
            session.set_notes(notes);
        }
        Ok(session)
    }
}

/// Body for editing an existing session. Absent fields stay untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSessionRequest {
    /// New window start, if supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// New window end, if supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// New location, if supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// New capacity, if supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<u32>,
    /// New notes, if supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<UpdateSessionRequest> for SessionUpdate {
    fn from(req: UpdateSessionRequest) -> Self {
        Self {
            start_time: req.start_time,
            end_time: req.end_time,
            location: req.location,
            max_participants: req.max_participants,
            notes: req.notes,
        }
    }
}

/// Body for a researcher updating one participant's status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ParticipantStatusRequest {
    /// One of the five participant status values.
    pub status: ParticipantStatus,
}

/// Body for an admin review decision. Notes are mandatory for reject.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewRequest {
    /// Free-text review notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Failure body: `{"success": false, "error": "<message>"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Always `false`.
    pub success: bool,
    /// Human-readable message identifying the blocking invariant.
    pub error: String,
}

impl From<&Error> for ErrorBody {
    fn from(err: &Error) -> Self {
        Self {
            success: false,
            error: err.to_string(),
        }
    }
}

/// HTTP status for each error kind.
///
/// Domain-rule violations are 400, lookup misses 404, auth failures
/// 401/403, and store failures 503 (retryable at the transport layer).
#[must_use]
pub fn status_code(err: &Error) -> u16 {
    match err {
        Error::InvalidTransition { .. }
        | Error::NeedsSession
        | Error::SessionFull
        | Error::AlreadyRegistered
        | Error::NotRegistered
        | Error::NotesRequired
        | Error::ExperimentNotOpen(_)
        | Error::InvalidSessionWindow
        | Error::InvalidCapacity
        | Error::SessionsLocked(_)
        | Error::DeletionBlocked(_)
        | Error::AlreadyExists(_) => 400,
        Error::ExperimentNotFound(_)
        | Error::SessionNotFound(_)
        | Error::ParticipantNotFound(_) => 404,
        Error::Unauthorized => 401,
        Error::Forbidden(_) => 403,
        Error::StoreUnavailable(_) => 503,
    }
}
