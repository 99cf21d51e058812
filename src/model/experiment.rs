//! Experiment Record - root aggregate for the study lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Session;
use crate::error::{Error, Result};
use crate::transition;

/// Status of an experiment in the review/publish lifecycle.
///
/// These values are part of the wire contract and must not be renamed.
/// Which transitions between them are legal is encoded once, in
/// [`transition::can_transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentStatus {
    /// Being drafted by the researcher; not yet submitted.
    Draft,
    /// Submitted and waiting for an admin decision.
    PendingReview,
    /// Approved by an admin; sessions can be published.
    Approved,
    /// Rejected by an admin; may be resubmitted.
    Rejected,
    /// Published; subjects may register for sessions.
    Open,
    /// Sessions are underway.
    InProgress,
    /// All sessions finished.
    Completed,
    /// Administratively cancelled.
    Cancelled,
}

impl ExperimentStatus {
    /// All status values, in wire-contract order.
    pub const ALL: [Self; 8] = [
        Self::Draft,
        Self::PendingReview,
        Self::Approved,
        Self::Rejected,
        Self::Open,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Wire name of this status (snake_case, matches the serde representation).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingReview => "pending_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ExperimentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// IRB document metadata. Only presence or absence matters to the core;
/// storage of the document itself is an external concern.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IrbDocument {
    file_name: String,
    uploaded_at: DateTime<Utc>,
}

impl IrbDocument {
    /// Record an uploaded IRB document.
    #[must_use]
    pub fn new(file_name: impl Into<String>, uploaded_at: DateTime<Utc>) -> Self {
        Self {
            file_name: file_name.into(),
            uploaded_at,
        }
    }

    /// Get the stored file name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Get the upload timestamp.
    #[must_use]
    pub const fn uploaded_at(&self) -> DateTime<Utc> {
        self.uploaded_at
    }
}

/// Review metadata attached when an admin approves or rejects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdminReview {
    reviewer: String,
    review_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

impl AdminReview {
    /// Create review metadata with the given decision timestamp.
    #[must_use]
    pub fn new(
        reviewer: impl Into<String>,
        review_date: DateTime<Utc>,
        notes: Option<String>,
    ) -> Self {
        Self {
            reviewer: reviewer.into(),
            review_date,
            notes,
        }
    }

    /// Get the reviewing admin's id.
    #[must_use]
    pub fn reviewer(&self) -> &str {
        &self.reviewer
    }

    /// Get the decision timestamp.
    #[must_use]
    pub const fn review_date(&self) -> DateTime<Utc> {
        self.review_date
    }

    /// Get the review notes, if any.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

/// Experiment is the root aggregate: a proposed study owned by one
/// researcher, progressing through the review/publish lifecycle, with its
/// sessions (and their participants) living and dying with it.
///
/// Ownership is set at creation and immutable. New experiments always start
/// in `draft`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    experiment_id: String,
    title: String,
    owner_id: String,
    status: ExperimentStatus,
    #[serde(default)]
    description: String,
    #[serde(default)]
    sessions: Vec<Session>,
    #[serde(default)]
    requirements: Vec<String>,
    max_participants: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    compensation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    irb_document: Option<IrbDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    admin_review: Option<AdminReview>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Experiment {
    /// Create a new experiment in `draft` status.
    ///
    /// # Arguments
    ///
    /// * `experiment_id` - Opaque unique identifier
    /// * `title` - Human-readable title
    /// * `owner_id` - The creating researcher; ownership never changes
    /// * `max_participants` - Positive default capacity suggestion for new
    ///   sessions
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] if `max_participants` is zero.
    pub fn new(
        experiment_id: impl Into<String>,
        title: impl Into<String>,
        owner_id: impl Into<String>,
        max_participants: u32,
    ) -> Result<Self> {
        Self::builder(experiment_id, title, owner_id)
            .max_participants(max_participants)
            .build()
    }

    /// Create a builder for constructing an experiment with optional fields.
    #[must_use]
    pub fn builder(
        experiment_id: impl Into<String>,
        title: impl Into<String>,
        owner_id: impl Into<String>,
    ) -> ExperimentBuilder {
        ExperimentBuilder::new(experiment_id, title, owner_id)
    }

    /// Get the experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Get the owning researcher's id.
    #[must_use]
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Get the current lifecycle status.
    #[must_use]
    pub const fn status(&self) -> ExperimentStatus {
        self.status
    }

    /// Get the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Get the sessions, in insertion order.
    #[must_use]
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Get the free-text eligibility requirements.
    #[must_use]
    pub fn requirements(&self) -> &[String] {
        &self.requirements
    }

    /// Get the default capacity suggestion for new sessions.
    #[must_use]
    pub const fn max_participants(&self) -> u32 {
        self.max_participants
    }

    /// Get the opaque compensation display field, if any.
    #[must_use]
    pub fn compensation(&self) -> Option<&str> {
        self.compensation.as_deref()
    }

    /// Get the IRB document metadata, if one was uploaded.
    #[must_use]
    pub const fn irb_document(&self) -> Option<&IrbDocument> {
        self.irb_document.as_ref()
    }

    /// Get the admin review metadata, if a decision was made.
    #[must_use]
    pub const fn admin_review(&self) -> Option<&AdminReview> {
        self.admin_review.as_ref()
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Get the last-mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Find a session by id.
    #[must_use]
    pub fn session(&self, session_id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.session_id() == session_id)
    }

    pub(crate) fn session_mut(&mut self, session_id: &str) -> Option<&mut Session> {
        self.sessions
            .iter_mut()
            .find(|s| s.session_id() == session_id)
    }

    /// Whether the user holds an active participant record in any session.
    #[must_use]
    pub fn has_active_participant(&self, user_id: &str) -> bool {
        self.sessions
            .iter()
            .any(|s| s.has_active_participant(user_id))
    }

    /// Move to the requested status, validating the edge against the
    /// transition table. A request for the current status is a no-op
    /// success.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidTransition`] for an edge absent from the table,
    /// [`Error::NeedsSession`] when entering `open` with zero sessions.
    pub fn transition_to(&mut self, requested: ExperimentStatus) -> Result<()> {
        transition::can_transition(self.status, requested, self.sessions.len())?;
        self.status = requested;
        Ok(())
    }

    /// Append a session.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyExists`] on a duplicate session id within this
    /// experiment.
    pub fn add_session(&mut self, session: Session) -> Result<()> {
        if self.session(session.session_id()).is_some() {
            return Err(Error::AlreadyExists(session.session_id().to_string()));
        }
        self.sessions.push(session);
        Ok(())
    }

    /// Remove a session by id, applying the open-experiment fallback:
    /// removing the last session of an `open` experiment drops the status
    /// back to `approved`, so an experiment is never open with nothing to
    /// register for.
    ///
    /// # Errors
    ///
    /// [`Error::SessionNotFound`] when no session has the given id.
    pub fn remove_session(&mut self, session_id: &str) -> Result<Session> {
        let idx = self
            .sessions
            .iter()
            .position(|s| s.session_id() == session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        let removed = self.sessions.remove(idx);
        if self.status == ExperimentStatus::Open && self.sessions.is_empty() {
            self.status = ExperimentStatus::Approved;
        }
        Ok(removed)
    }

    pub(crate) fn retain_sessions(&mut self, f: impl FnMut(&Session) -> bool) {
        self.sessions.retain(f);
    }

    pub(crate) fn set_title(&mut self, title: String) {
        self.title = title;
    }

    pub(crate) fn set_description(&mut self, description: String) {
        self.description = description;
    }

    pub(crate) fn set_requirements(&mut self, requirements: Vec<String>) {
        self.requirements = requirements;
    }

    pub(crate) fn set_max_participants(&mut self, max_participants: u32) {
        self.max_participants = max_participants;
    }

    pub(crate) fn set_compensation(&mut self, compensation: Option<String>) {
        self.compensation = compensation;
    }

    pub(crate) fn set_admin_review(&mut self, review: AdminReview) {
        self.admin_review = Some(review);
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

/// Builder for `Experiment`.
#[derive(Debug)]
pub struct ExperimentBuilder {
    experiment_id: String,
    title: String,
    owner_id: String,
    description: String,
    requirements: Vec<String>,
    max_participants: u32,
    compensation: Option<String>,
    irb_document: Option<IrbDocument>,
    created_at: DateTime<Utc>,
}

impl ExperimentBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(
        experiment_id: impl Into<String>,
        title: impl Into<String>,
        owner_id: impl Into<String>,
    ) -> Self {
        Self {
            experiment_id: experiment_id.into(),
            title: title.into(),
            owner_id: owner_id.into(),
            description: String::new(),
            requirements: Vec::new(),
            max_participants: 1,
            compensation: None,
            irb_document: None,
            created_at: Utc::now(),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the free-text eligibility requirements.
    #[must_use]
    pub fn requirements(mut self, requirements: Vec<String>) -> Self {
        self.requirements = requirements;
        self
    }

    /// Set the default capacity suggestion for new sessions.
    #[must_use]
    pub const fn max_participants(mut self, max_participants: u32) -> Self {
        self.max_participants = max_participants;
        self
    }

    /// Set the opaque compensation display field.
    #[must_use]
    pub fn compensation(mut self, compensation: impl Into<String>) -> Self {
        self.compensation = Some(compensation.into());
        self
    }

    /// Attach IRB document metadata.
    #[must_use]
    pub fn irb_document(mut self, doc: IrbDocument) -> Self {
        self.irb_document = Some(doc);
        self
    }

    /// Set a custom creation timestamp (useful for deserialization/testing).
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Build the `Experiment` in `draft` status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] if `max_participants` is zero.
    pub fn build(self) -> Result<Experiment> {
        if self.max_participants == 0 {
            return Err(Error::InvalidCapacity);
        }
        Ok(Experiment {
            experiment_id: self.experiment_id,
            title: self.title,
            owner_id: self.owner_id,
            status: ExperimentStatus::Draft,
            description: self.description,
            sessions: Vec::new(),
            requirements: self.requirements,
            max_participants: self.max_participants,
            compensation: self.compensation,
            irb_document: self.irb_document,
            admin_review: None,
            created_at: self.created_at,
            updated_at: self.created_at,
        })
    }
}
