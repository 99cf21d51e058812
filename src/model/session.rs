//! Session Record - a scheduled, capacity-limited occurrence of an experiment

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Participant, ParticipantStatus};
use crate::error::{Error, Result};

/// Session represents one scheduled occurrence of an experiment at a
/// specific time and place, with a fixed participant capacity.
///
/// ## Capacity accounting
///
/// Capacity is never stored as a counter. `active_count`, `spots_left` and
/// `is_full` are pure projections over the participant list, recomputed on
/// demand, so they cannot go stale.
///
/// ## Participant list
///
/// The list is insertion-ordered and append-only. Cancellation flips a
/// record's status to `cancelled`; re-registration appends a fresh record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    session_id: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    location: String,
    max_participants: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    #[serde(default)]
    participants: Vec<Participant>,
}

impl Session {
    /// Create a new session with an empty participant list.
    ///
    /// # Arguments
    ///
    /// * `session_id` - Unique identifier within the parent experiment
    /// * `start_time` / `end_time` - Caller-supplied window; the end must be
    ///   strictly after the start
    /// * `location` - Free-text location
    /// * `max_participants` - Positive capacity, independent of the parent
    ///   experiment's suggested value
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSessionWindow`] if `end_time <= start_time`,
    /// or [`Error::InvalidCapacity`] if `max_participants` is zero.
    pub fn new(
        session_id: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        location: impl Into<String>,
        max_participants: u32,
    ) -> Result<Self> {
        if end_time <= start_time {
            return Err(Error::InvalidSessionWindow);
        }
        if max_participants == 0 {
            return Err(Error::InvalidCapacity);
        }
        Ok(Self {
            session_id: session_id.into(),
            start_time,
            end_time,
            location: location.into(),
            max_participants,
            notes: None,
            participants: Vec::new(),
        })
    }

    /// Get the session ID.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Get the start of the session window.
    #[must_use]
    pub const fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Get the end of the session window.
    #[must_use]
    pub const fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    /// Get the location.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Get the capacity.
    #[must_use]
    pub const fn max_participants(&self) -> u32 {
        self.max_participants
    }

    /// Get the researcher-facing notes, if any.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Attach researcher-facing notes.
    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = Some(notes.into());
    }

    /// Get the full participant list, insertion-ordered.
    #[must_use]
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Number of participants counting against capacity (status != cancelled).
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.participants.iter().filter(|p| p.is_active()).count()
    }

    /// Remaining capacity: `max_participants - active_count`, floored at zero.
    #[must_use]
    pub fn spots_left(&self) -> u32 {
        let active = u32::try_from(self.active_count()).unwrap_or(u32::MAX);
        self.max_participants.saturating_sub(active)
    }

    /// Whether the session has no spots left.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.spots_left() == 0
    }

    pub(crate) fn set_window(
        &mut self,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<()> {
        if end_time <= start_time {
            return Err(Error::InvalidSessionWindow);
        }
        self.start_time = start_time;
        self.end_time = end_time;
        Ok(())
    }

    pub(crate) fn set_location(&mut self, location: String) {
        self.location = location;
    }

    // Capacity may never drop below the current active count (that would
    // retroactively overbook the session).
    pub(crate) fn set_max_participants(&mut self, max_participants: u32) -> Result<()> {
        if max_participants == 0 {
            return Err(Error::InvalidCapacity);
        }
        let active = u32::try_from(self.active_count()).unwrap_or(u32::MAX);
        if max_participants < active {
            return Err(Error::InvalidCapacity);
        }
        self.max_participants = max_participants;
        Ok(())
    }

    /// Whether the user holds an active (non-cancelled) record here.
    #[must_use]
    pub fn has_active_participant(&self, user_id: &str) -> bool {
        self.active_participant(user_id).is_some()
    }

    fn active_participant(&self, user_id: &str) -> Option<usize> {
        // Latest record wins when a user has cancelled history.
        self.participants
            .iter()
            .rposition(|p| p.user_id() == user_id && p.is_active())
    }

    /// Append a new `registered` participant record for the user.
    ///
    /// Precondition order follows the registration contract: capacity first,
    /// then uniqueness. The parent experiment's `open` check belongs to the
    /// caller, which sees the whole aggregate.
    ///
    /// # Errors
    ///
    /// [`Error::SessionFull`] when no spots are left,
    /// [`Error::AlreadyRegistered`] when the user already holds an active
    /// record.
    pub fn register_user(&mut self, user_id: &str, now: DateTime<Utc>) -> Result<&Participant> {
        if self.is_full() {
            return Err(Error::SessionFull);
        }
        if self.has_active_participant(user_id) {
            return Err(Error::AlreadyRegistered);
        }
        self.participants.push(Participant::new(user_id, now));
        let idx = self.participants.len() - 1;
        Ok(&self.participants[idx])
    }

    /// Cancel the user's active registration.
    ///
    /// One-way per registration instance: the record stays in the list with
    /// status `cancelled`, and cancelling again is rejected because no
    /// active record remains.
    ///
    /// # Errors
    ///
    /// [`Error::NotRegistered`] when the user holds no active record.
    pub fn cancel_user(&mut self, user_id: &str) -> Result<()> {
        let idx = self
            .active_participant(user_id)
            .ok_or(Error::NotRegistered)?;
        self.participants[idx].set_status(ParticipantStatus::Cancelled);
        Ok(())
    }

    /// Set the status of the user's latest active record.
    ///
    /// Any of the five participant status values is accepted; no ordering is
    /// enforced among them (nothing stops `attended -> registered`). Only
    /// active records are addressable, so a cancelled record can never be
    /// revived through this path.
    ///
    /// # Errors
    ///
    /// [`Error::ParticipantNotFound`] when the user holds no active record.
    pub fn set_participant_status(
        &mut self,
        user_id: &str,
        status: ParticipantStatus,
    ) -> Result<()> {
        let idx = self
            .active_participant(user_id)
            .ok_or_else(|| Error::ParticipantNotFound(user_id.to_string()))?;
        self.participants[idx].set_status(status);
        Ok(())
    }
}
