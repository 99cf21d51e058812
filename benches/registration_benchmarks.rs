//! Registration hot-path benchmarks
//!
//! Benchmarks for the conditional-update pipeline:
//! - Register into a fresh session (CAS happy path)
//! - Visibility filtering over a populated experiment set

use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use labsched::model::{Experiment, ExperimentStatus, Session};
use labsched::store::{ExperimentStore, MemoryExperimentStore};
use labsched::{registration, visibility};
use rand::Rng;

fn open_experiment(id: &str, sessions: u32, capacity: u32) -> Experiment {
    let mut exp = Experiment::new(id, "Benchmark study", "res-1", capacity).unwrap();
    for i in 0..sessions {
        let start = Utc::now() + Duration::days(1) + Duration::hours(i64::from(i));
        exp.add_session(
            Session::new(
                format!("sess-{i}"),
                start,
                start + Duration::hours(1),
                "Lab",
                capacity,
            )
            .unwrap(),
        )
        .unwrap();
    }
    exp.transition_to(ExperimentStatus::PendingReview).unwrap();
    exp.transition_to(ExperimentStatus::Approved).unwrap();
    exp.transition_to(ExperimentStatus::Open).unwrap();
    exp
}

fn bench_register(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("register");

    for participants in [10u32, 100, 1000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(participants),
            &participants,
            |b, &participants| {
                b.to_async(&runtime).iter(|| async move {
                    let store = MemoryExperimentStore::new();
                    store
                        .insert(open_experiment("exp-1", 1, participants))
                        .await
                        .unwrap();
                    for i in 0..participants {
                        let user = format!("sub-{i}");
                        registration::register(&store, "exp-1", "sess-0", &user)
                            .await
                            .unwrap();
                    }
                    black_box(store)
                });
            },
        );
    }
    group.finish();
}

fn bench_subject_view(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut rng = rand::thread_rng();

    let store = MemoryExperimentStore::new();
    runtime.block_on(async {
        for i in 0..200 {
            let capacity = rng.gen_range(1..12);
            store
                .insert(open_experiment(&format!("exp-{i}"), 4, capacity))
                .await
                .unwrap();
        }
    });
    let experiments = runtime.block_on(store.list()).unwrap();

    c.bench_function("for_subject_200_experiments", |b| {
        b.iter(|| {
            black_box(visibility::for_subject(
                black_box(&experiments),
                "sub-1",
                Utc::now(),
            ))
        });
    });
}

criterion_group!(benches, bench_register, bench_subject_view);
criterion_main!(benches);
