//! Error types for labsched
//!
//! Every rejected precondition names the invariant that blocked the
//! operation; nothing is recovered and ignored.

use crate::model::ExperimentStatus;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// labsched error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Requested status is not reachable from the current status
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        /// Status the experiment currently holds
        from: ExperimentStatus,
        /// Status the caller requested
        to: ExperimentStatus,
    },

    /// Attempt to open an experiment that has no sessions
    #[error("cannot open an experiment with no sessions: add at least one session first")]
    NeedsSession,

    /// Registration into a session with no spots left
    #[error("session is full")]
    SessionFull,

    /// User already holds an active (non-cancelled) participant record
    #[error("user is already registered for this session")]
    AlreadyRegistered,

    /// Cancellation with no active participant record to cancel
    #[error("user has no active registration in this session")]
    NotRegistered,

    /// Rejection requires a reason
    #[error("rejection requires non-empty notes")]
    NotesRequired,

    /// Registration attempted while the parent experiment is not open
    #[error("experiment is not open for registration (status: {0})")]
    ExperimentNotOpen(ExperimentStatus),

    /// Session end time is not after its start time
    #[error("session end time must be after its start time")]
    InvalidSessionWindow,

    /// Session capacity must be a positive integer
    #[error("session capacity must be at least 1")]
    InvalidCapacity,

    /// Session create/edit/delete attempted on a finished experiment
    #[error("sessions cannot be modified while experiment is {0}")]
    SessionsLocked(ExperimentStatus),

    /// Experiment deletion attempted in a status with live commitments
    #[error("experiment cannot be deleted while {0}")]
    DeletionBlocked(ExperimentStatus),

    /// Experiment id collision on create
    #[error("experiment already exists: {0}")]
    AlreadyExists(String),

    /// Unknown experiment id
    #[error("experiment not found: {0}")]
    ExperimentNotFound(String),

    /// Unknown session id within the experiment
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// No matching participant record for the user
    #[error("participant not found for user: {0}")]
    ParticipantNotFound(String),

    /// Missing caller identity (produced by the auth boundary, respected here)
    #[error("authentication required")]
    Unauthorized,

    /// Caller role or ownership mismatch
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Store failure or CAS retry exhaustion; retryable at the transport layer
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}
