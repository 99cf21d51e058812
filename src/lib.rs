//! # labsched: Scheduling Core for Research Study Sessions
//!
//! labsched coordinates timed study sessions for research experiments:
//! researchers propose experiments, administrators gate them through
//! review, and subjects reserve capacity-limited time slots.
//!
//! ## Design Principles
//!
//! - **One transition table**: every status check funnels through
//!   [`transition::can_transition`]; no ad hoc status comparisons
//! - **Capacity is computed, never stored**: `active_count`/`spots_left`
//!   are projections over the participant list, so they cannot go stale
//! - **One conditional update per mutation**: preconditions and writes are
//!   applied atomically against the versioned store, so concurrent
//!   registrations cannot overbook the last spot
//! - **Pure core, external auth**: role and ownership checks trust an
//!   already-validated [`caller::Caller`]; credential handling lives
//!   outside the crate
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use labsched::caller::Caller;
//! use labsched::model::{Experiment, ExperimentStatus};
//! use labsched::store::{ExperimentStore, MemoryExperimentStore};
//! use labsched::{lifecycle, registration};
//!
//! # async fn example() -> labsched::Result<()> {
//! let store = MemoryExperimentStore::new();
//! let researcher = Caller::researcher("res-001");
//!
//! let experiment = Experiment::new("exp-001", "Working memory study", "res-001", 8)?;
//! lifecycle::create(&store, &researcher, experiment).await?;
//! lifecycle::change_status(
//!     &store,
//!     "exp-001",
//!     &researcher,
//!     ExperimentStatus::PendingReview,
//!     Default::default(),
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod api;
pub mod caller;
pub mod error;
pub mod kv;
pub mod lifecycle;
pub mod model;
pub mod registration;
pub mod review;
pub mod store;
pub mod transition;
pub mod visibility;

pub use error::{Error, Result};
