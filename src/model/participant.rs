//! Participant Record - a subject's registration for one session

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a participant record.
///
/// These values are part of the wire contract and must not be renamed.
/// No ordering is enforced among them (see
/// [`Session::set_participant_status`](crate::model::Session::set_participant_status)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    /// Subject has registered and holds a spot.
    Registered,
    /// Subject confirmed attendance ahead of the session.
    Confirmed,
    /// Subject attended the session.
    Attended,
    /// Subject did not show up.
    NoShow,
    /// Registration was cancelled; the record no longer counts against capacity.
    Cancelled,
}

impl ParticipantStatus {
    /// Wire name of this status (snake_case, matches the serde representation).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Confirmed => "confirmed",
            Self::Attended => "attended",
            Self::NoShow => "no_show",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Participant Record represents one registration attempt by a user.
///
/// Records are append-only within a session: cancellation flips the status
/// to `Cancelled` but never removes the record, so a user that cancels and
/// re-registers leaves two records behind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    user_id: String,
    status: ParticipantStatus,
    signup_time: DateTime<Utc>,
}

impl Participant {
    /// Create a new participant record in `Registered` status.
    ///
    /// # Arguments
    ///
    /// * `user_id` - ID of the registering user
    /// * `signup_time` - Instant of registration; set once, never mutated
    #[must_use]
    pub fn new(user_id: impl Into<String>, signup_time: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            status: ParticipantStatus::Registered,
            signup_time,
        }
    }

    /// Get the user ID.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Get the current status.
    #[must_use]
    pub const fn status(&self) -> ParticipantStatus {
        self.status
    }

    /// Get the signup timestamp.
    #[must_use]
    pub const fn signup_time(&self) -> DateTime<Utc> {
        self.signup_time
    }

    /// Whether this record counts against session capacity.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status != ParticipantStatus::Cancelled
    }

    pub(crate) fn set_status(&mut self, status: ParticipantStatus) {
        self.status = status;
    }
}
