//! Scheduling Schema
//!
//! Data structures for the experiment/session/participant aggregate.
//!
//! ## Schema Overview
//!
//! ```text
//! Experiment (1) ──< Session (N)
//!                        │
//!                        └──< Participant (N) [append-only]
//! ```
//!
//! The whole tree is one aggregate: sessions live and die with their
//! experiment, participants with their session. Mutations go through the
//! store as a single conditional update (see [`crate::store`]).
//!
//! ## Usage
//!
//! ```rust
//! use chrono::{Duration, Utc};
//! use labsched::model::{Experiment, ExperimentStatus, Session};
//!
//! # fn main() -> labsched::Result<()> {
//! let mut experiment = Experiment::new("exp-001", "Working memory study", "res-001", 8)?;
//!
//! let start = Utc::now() + Duration::days(3);
//! experiment.add_session(Session::new("sess-001", start, start + Duration::hours(1), "Lab 4", 8)?)?;
//!
//! experiment.transition_to(ExperimentStatus::PendingReview)?;
//! # Ok(())
//! # }
//! ```

mod experiment;
mod participant;
mod session;

pub use experiment::{AdminReview, Experiment, ExperimentBuilder, ExperimentStatus, IrbDocument};
pub use participant::{Participant, ParticipantStatus};
pub use session::Session;
