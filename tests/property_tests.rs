//! Property-based tests for labsched
//!
//! Invariants under arbitrary operation sequences:
//! - Capacity: active participants never exceed a session's maximum
//! - Uniqueness: at most one active record per user per session
//! - Open experiments always have at least one session
//! - Status transitions are deterministic and table-driven
//!
//! Run with ProptestConfig::with_cases(100).

use chrono::{Duration, Utc};
use labsched::model::{Experiment, ExperimentStatus, ParticipantStatus, Session};
use labsched::transition;
use proptest::prelude::*;
use std::collections::HashSet;

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

#[derive(Debug, Clone)]
enum SessionOp {
    Register(usize),
    Cancel(usize),
    SetStatus(usize, ParticipantStatus),
}

fn arb_participant_status() -> impl Strategy<Value = ParticipantStatus> {
    prop::sample::select(vec![
        ParticipantStatus::Registered,
        ParticipantStatus::Confirmed,
        ParticipantStatus::Attended,
        ParticipantStatus::NoShow,
        ParticipantStatus::Cancelled,
    ])
}

fn arb_session_op(users: usize) -> impl Strategy<Value = SessionOp> {
    prop_oneof![
        (0..users).prop_map(SessionOp::Register),
        (0..users).prop_map(SessionOp::Cancel),
        ((0..users), arb_participant_status()).prop_map(|(u, s)| SessionOp::SetStatus(u, s)),
    ]
}

fn arb_experiment_status() -> impl Strategy<Value = ExperimentStatus> {
    prop::sample::select(ExperimentStatus::ALL.to_vec())
}

#[derive(Debug, Clone)]
enum ExperimentOp {
    AddSession,
    RemoveOldestSession,
    Transition(ExperimentStatus),
}

fn arb_experiment_op() -> impl Strategy<Value = ExperimentOp> {
    prop_oneof![
        Just(ExperimentOp::AddSession),
        Just(ExperimentOp::RemoveOldestSession),
        arb_experiment_status().prop_map(ExperimentOp::Transition),
    ]
}

fn fresh_session(id: usize) -> Session {
    let start = Utc::now() + Duration::days(1);
    Session::new(
        format!("sess-{id}"),
        start,
        start + Duration::hours(1),
        "Lab",
        3,
    )
    .unwrap()
}

fn user_name(idx: usize) -> String {
    format!("user-{idx}")
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ========================================================================
    // Capacity and Uniqueness Invariants
    // ========================================================================

    /// Property: active_count never exceeds max_participants, after every op
    #[test]
    fn prop_capacity_never_exceeded(
        capacity in 1u32..5,
        ops in prop::collection::vec(arb_session_op(6), 0..40)
    ) {
        let start = Utc::now() + Duration::days(1);
        let mut session =
            Session::new("sess-1", start, start + Duration::hours(1), "Lab", capacity).unwrap();

        for op in ops {
            // Domain errors are expected; corrupted state is not.
            let _ = match op {
                SessionOp::Register(u) => session.register_user(&user_name(u), Utc::now()).map(|_| ()),
                SessionOp::Cancel(u) => session.cancel_user(&user_name(u)),
                SessionOp::SetStatus(u, s) => session.set_participant_status(&user_name(u), s),
            };
            prop_assert!(
                session.active_count() <= capacity as usize,
                "active {} > capacity {}",
                session.active_count(),
                capacity
            );
        }
    }

    /// Property: at most one active record per user, after every op
    #[test]
    fn prop_at_most_one_active_record_per_user(
        ops in prop::collection::vec(arb_session_op(4), 0..40)
    ) {
        let start = Utc::now() + Duration::days(1);
        let mut session =
            Session::new("sess-1", start, start + Duration::hours(1), "Lab", 10).unwrap();

        for op in ops {
            let _ = match op {
                SessionOp::Register(u) => session.register_user(&user_name(u), Utc::now()).map(|_| ()),
                SessionOp::Cancel(u) => session.cancel_user(&user_name(u)),
                SessionOp::SetStatus(u, s) => session.set_participant_status(&user_name(u), s),
            };

            let mut seen = HashSet::new();
            for p in session.participants().iter().filter(|p| p.is_active()) {
                prop_assert!(
                    seen.insert(p.user_id().to_string()),
                    "user {} holds two active records",
                    p.user_id()
                );
            }
        }
    }

    /// Property: participant records are never removed, only appended
    #[test]
    fn prop_participant_history_is_append_only(
        ops in prop::collection::vec(arb_session_op(4), 0..40)
    ) {
        let start = Utc::now() + Duration::days(1);
        let mut session =
            Session::new("sess-1", start, start + Duration::hours(1), "Lab", 4).unwrap();

        let mut last_len = 0;
        for op in ops {
            let _ = match op {
                SessionOp::Register(u) => session.register_user(&user_name(u), Utc::now()).map(|_| ()),
                SessionOp::Cancel(u) => session.cancel_user(&user_name(u)),
                SessionOp::SetStatus(u, s) => session.set_participant_status(&user_name(u), s),
            };
            prop_assert!(session.participants().len() >= last_len);
            last_len = session.participants().len();
        }
    }

    // ========================================================================
    // Lifecycle Invariants
    // ========================================================================

    /// Property: an open experiment always has at least one session
    #[test]
    fn prop_open_implies_sessions(
        ops in prop::collection::vec(arb_experiment_op(), 0..40)
    ) {
        let mut exp = Experiment::new("exp-1", "Study", "res-1", 4).unwrap();
        let mut next_session = 0usize;

        for op in ops {
            let _ = match op {
                ExperimentOp::AddSession => {
                    next_session += 1;
                    exp.add_session(fresh_session(next_session))
                }
                ExperimentOp::RemoveOldestSession => {
                    let id = exp.sessions().first().map(|s| s.session_id().to_string());
                    match id {
                        Some(id) => exp.remove_session(&id).map(|_| ()),
                        None => Ok(()),
                    }
                }
                ExperimentOp::Transition(status) => exp.transition_to(status),
            };
            prop_assert!(
                exp.status() != ExperimentStatus::Open || !exp.sessions().is_empty(),
                "experiment is open with zero sessions"
            );
        }
    }

    // ========================================================================
    // Transition Table Properties
    // ========================================================================

    /// Property: the validator is deterministic
    #[test]
    fn prop_transitions_deterministic(
        from in arb_experiment_status(),
        to in arb_experiment_status(),
        sessions in 0usize..4
    ) {
        let first = transition::can_transition(from, to, sessions);
        let second = transition::can_transition(from, to, sessions);
        prop_assert_eq!(first, second);
    }

    /// Property: no transition outside the table ever succeeds
    #[test]
    fn prop_only_table_edges_succeed(
        from in arb_experiment_status(),
        to in arb_experiment_status(),
        sessions in 0usize..4
    ) {
        use ExperimentStatus as S;

        let in_table = from == to
            || to == S::Cancelled
            || matches!(
                (from, to),
                (S::Draft, S::PendingReview)
                    | (S::PendingReview, S::Draft | S::Approved | S::Rejected)
                    | (S::Approved, S::Open)
                    | (S::Rejected, S::PendingReview)
                    | (S::Open, S::InProgress | S::Completed)
                    | (S::InProgress, S::Completed)
                    | (S::Completed, S::Draft)
            );

        match transition::can_transition(from, to, sessions) {
            Ok(()) => prop_assert!(in_table, "{from} -> {to} succeeded off-table"),
            Err(_) => {
                // The only in-table rejection is the session-count guard.
                let guard_blocked = (from, to) == (S::Approved, S::Open) && sessions == 0;
                prop_assert!(!in_table || guard_blocked, "{from} -> {to} rejected in-table");
            }
        }
    }
}
