//! Experiment Lifecycle - researcher-facing intents over the store
//!
//! Create/delete experiments, drive researcher status changes, and manage
//! sessions. Role and ownership are enforced here, against the
//! already-authenticated [`Caller`], so the transition validator stays
//! role-agnostic. Every mutation is one conditional update against the
//! stored aggregate.

use chrono::{DateTime, Utc};

use crate::caller::{Caller, Role};
use crate::error::{Error, Result};
use crate::model::{Experiment, ExperimentStatus, Session};
use crate::store::{self, ExperimentStore};
use crate::transition;

/// Editable fields that may ride along with a status change request.
///
/// `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ExperimentUpdate {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// Replacement requirements list.
    pub requirements: Option<Vec<String>>,
    /// New default capacity suggestion (must stay positive).
    pub max_participants: Option<u32>,
    /// New compensation display text.
    pub compensation: Option<String>,
}

/// Session fields editable after creation. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    /// New window start; validated together with the end.
    pub start_time: Option<DateTime<Utc>>,
    /// New window end.
    pub end_time: Option<DateTime<Utc>>,
    /// New location.
    pub location: Option<String>,
    /// New capacity (must stay positive and cover the current active count).
    pub max_participants: Option<u32>,
    /// New researcher-facing notes.
    pub notes: Option<String>,
}

/// Create a new experiment in `draft` status, owned by the caller.
///
/// # Errors
///
/// `Forbidden` for subject callers or when the aggregate names a different
/// owner, `AlreadyExists` on an id collision.
pub async fn create<S: ExperimentStore>(
    store: &S,
    caller: &Caller,
    experiment: Experiment,
) -> Result<Experiment> {
    if caller.role() == Role::Subject {
        return Err(Error::Forbidden(
            "subjects cannot create experiments".to_string(),
        ));
    }
    if !caller.owns(experiment.owner_id()) {
        return Err(Error::Forbidden(
            "experiments are owned by their creator".to_string(),
        ));
    }
    store.insert(experiment.clone()).await?;
    Ok(experiment)
}

/// Change an experiment's status, optionally updating editable fields in
/// the same transaction.
///
/// Ownership is required (admins bypass it); the review decision edges and
/// the cancel override additionally require the Admin role. The requested
/// edge is validated against the transition table with the current session
/// count, then the status and any supplied fields are applied atomically.
///
/// # Errors
///
/// `Forbidden` on role/ownership mismatch, `InvalidTransition`/
/// `NeedsSession` from the validator, `InvalidCapacity` for a zero
/// `max_participants`, plus the usual lookup and store errors.
pub async fn change_status<S: ExperimentStore>(
    store: &S,
    experiment_id: &str,
    caller: &Caller,
    requested: ExperimentStatus,
    update: ExperimentUpdate,
) -> Result<Experiment> {
    if caller.role() == Role::Subject {
        return Err(Error::Forbidden(
            "subjects cannot modify experiments".to_string(),
        ));
    }
    store::update(store, experiment_id, |exp| {
        if !caller.owns(exp.owner_id()) {
            return Err(Error::Forbidden(
                "only the owning researcher may modify this experiment".to_string(),
            ));
        }
        if transition::requires_admin(exp.status(), requested) && !caller.is_admin() {
            return Err(Error::Forbidden(format!(
                "transition {} -> {} requires an admin",
                exp.status(),
                requested
            )));
        }
        exp.transition_to(requested)?;
        apply_update(exp, &update)?;
        exp.touch(Utc::now());
        Ok(())
    })
    .await
}

fn apply_update(exp: &mut Experiment, update: &ExperimentUpdate) -> Result<()> {
    if let Some(title) = &update.title {
        exp.set_title(title.clone());
    }
    if let Some(description) = &update.description {
        exp.set_description(description.clone());
    }
    if let Some(requirements) = &update.requirements {
        exp.set_requirements(requirements.clone());
    }
    if let Some(max) = update.max_participants {
        if max == 0 {
            return Err(Error::InvalidCapacity);
        }
        exp.set_max_participants(max);
    }
    if let Some(compensation) = &update.compensation {
        exp.set_compensation(Some(compensation.clone()));
    }
    Ok(())
}

/// Add a session to an experiment.
///
/// Owning-researcher-only; sessions are frozen once the experiment is
/// `completed` or `cancelled`.
///
/// # Errors
///
/// `Forbidden`, `SessionsLocked`, `AlreadyExists` on a duplicate session
/// id, plus the usual lookup and store errors.
pub async fn add_session<S: ExperimentStore>(
    store: &S,
    experiment_id: &str,
    caller: &Caller,
    session: Session,
) -> Result<Experiment> {
    store::update(store, experiment_id, |exp| {
        check_session_edit(exp, caller)?;
        exp.add_session(session.clone())?;
        exp.touch(Utc::now());
        Ok(())
    })
    .await
}

/// Edit a session's schedule, location, capacity or notes.
///
/// Capacity can never drop below the session's current active participant
/// count.
///
/// # Errors
///
/// `Forbidden`, `SessionsLocked`, `SessionNotFound`,
/// `InvalidSessionWindow`, `InvalidCapacity`, plus the usual lookup and
/// store errors.
pub async fn update_session<S: ExperimentStore>(
    store: &S,
    experiment_id: &str,
    session_id: &str,
    caller: &Caller,
    update: SessionUpdate,
) -> Result<Experiment> {
    store::update(store, experiment_id, |exp| {
        check_session_edit(exp, caller)?;
        let session = exp
            .session_mut(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        if update.start_time.is_some() || update.end_time.is_some() {
            let start = update.start_time.unwrap_or_else(|| session.start_time());
            let end = update.end_time.unwrap_or_else(|| session.end_time());
            session.set_window(start, end)?;
        }
        if let Some(location) = &update.location {
            session.set_location(location.clone());
        }
        if let Some(max) = update.max_participants {
            session.set_max_participants(max)?;
        }
        if let Some(notes) = &update.notes {
            session.set_notes(notes.clone());
        }
        exp.touch(Utc::now());
        Ok(())
    })
    .await
}

/// Remove a session.
///
/// Removing the last session of an `open` experiment drops the experiment
/// back to `approved` in the same transaction, so an open experiment never
/// ends up with nothing to register for.
///
/// # Errors
///
/// `Forbidden`, `SessionsLocked`, `SessionNotFound`, plus the usual lookup
/// and store errors.
pub async fn remove_session<S: ExperimentStore>(
    store: &S,
    experiment_id: &str,
    session_id: &str,
    caller: &Caller,
) -> Result<Experiment> {
    store::update(store, experiment_id, |exp| {
        check_session_edit(exp, caller)?;
        exp.remove_session(session_id)?;
        exp.touch(Utc::now());
        Ok(())
    })
    .await
}

fn check_session_edit(exp: &Experiment, caller: &Caller) -> Result<()> {
    if !caller.owns(exp.owner_id()) {
        return Err(Error::Forbidden(
            "only the owning researcher may manage sessions".to_string(),
        ));
    }
    match exp.status() {
        ExperimentStatus::Completed | ExperimentStatus::Cancelled => {
            Err(Error::SessionsLocked(exp.status()))
        }
        _ => Ok(()),
    }
}

/// Delete an experiment.
///
/// Only permitted while in `draft`, `rejected`, `approved` or `completed`;
/// a `pending_review`, `open` or `in_progress` experiment carries live
/// commitments and cannot be destroyed. Removal is conditional on the
/// version observed when the status gate was checked, retried like any
/// other mutation, so a concurrent status change can never slip between the
/// check and the removal.
///
/// # Errors
///
/// `Forbidden`, `DeletionBlocked`, `ExperimentNotFound`, `StoreUnavailable`
/// when the conditional-removal retries are exhausted, plus store errors.
pub async fn delete<S: ExperimentStore>(
    store: &S,
    experiment_id: &str,
    caller: &Caller,
) -> Result<()> {
    for attempt in 0..store::MAX_CAS_RETRIES {
        let versioned = store
            .get(experiment_id)
            .await?
            .ok_or_else(|| Error::ExperimentNotFound(experiment_id.to_string()))?;
        let exp = versioned.value();
        if !caller.owns(exp.owner_id()) {
            return Err(Error::Forbidden(
                "only the owning researcher may delete this experiment".to_string(),
            ));
        }
        match exp.status() {
            ExperimentStatus::Draft
            | ExperimentStatus::Rejected
            | ExperimentStatus::Approved
            | ExperimentStatus::Completed => {}
            status => return Err(Error::DeletionBlocked(status)),
        }
        if store
            .remove_if_version(experiment_id, versioned.version())
            .await?
        {
            return Ok(());
        }
        tracing::debug!(experiment_id, attempt, "version conflict, retrying conditional removal");
    }

    tracing::warn!(experiment_id, "conditional removal retries exhausted");
    Err(Error::StoreUnavailable(format!(
        "conditional removal contention on experiment {experiment_id}"
    )))
}
