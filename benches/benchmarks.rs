// benches/benchmarks.rs — Performance benchmarks (criterion)
//
// Per-request work outside the capability calls:
//   1. Intent classification of typical queries
//   2. Reasoning context assembly from a long session
//   3. Session log load from disk

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use calai::core::classifier::classify;
use calai::core::context::build_request;
use calai::core::types::{CalorieEstimate, Intent, Turn, TurnResult};
use calai::session::store::SessionStore;
use calai::session::{Session, SessionId};

// ─── Helpers ────────────────────────────────────────────────────────────────

fn estimate(i: usize) -> CalorieEstimate {
    let volume = 150.0 + (i % 7) as f64 * 40.0;
    CalorieEstimate {
        volume_ml: volume,
        mass_g: volume,
        calories_kcal: volume * 1.5,
        confidence: Some(0.7),
        note: "bench".into(),
    }
}

/// A session alternating estimates and follow-up questions.
fn populated_session(n: usize) -> Session {
    let mut session = Session::empty(SessionId::parse("bench").expect("valid id"));
    for i in 0..n {
        let turn = if i % 2 == 0 {
            Turn::new(
                None,
                Some(format!("/meals/meal-{i}.jpg").as_str()),
                Intent::EstimateOnly,
                TurnResult::CalorieEstimate(estimate(i)),
            )
        } else {
            Turn::new(
                Some(format!("Was meal {} too heavy for lunch?", i - 1).as_str()),
                None,
                Intent::GeneralQuestion,
                TurnResult::answer("It was on the heavier side; balance it with a light dinner."),
            )
        };
        session.turns.push(turn.expect("turn has content"));
    }
    session
}

// ─── Benchmarks ─────────────────────────────────────────────────────────────

fn bench_classify(c: &mut Criterion) {
    let queries = [
        "Calculate calories",
        "  HOW MANY CALORIES ARE IN THIS?? ",
        "Is this a balanced dinner for someone training for a marathon?",
        "",
    ];
    c.bench_function("classify_mixed_queries", |b| {
        b.iter(|| {
            for q in &queries {
                black_box(classify(Some(black_box(*q)), true));
                black_box(classify(Some(black_box(*q)), false));
            }
        })
    });
}

fn bench_context(c: &mut Criterion) {
    let session = populated_session(500);
    c.bench_function("build_request_500_turns", |b| {
        b.iter(|| {
            black_box(build_request(
                black_box(&session),
                10,
                "How does today compare to last week?",
                Some(estimate(3)),
                None,
            ))
        })
    });
}

fn bench_session_load(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let dir = tempfile::tempdir().expect("temp dir");
    let store = SessionStore::new(dir.path());
    let id = SessionId::parse("bench").expect("valid id");

    rt.block_on(async {
        for turn in populated_session(200).turns {
            store.append(&id, &turn).await.expect("append");
        }
    });

    c.bench_function("session_load_200_turns", |b| {
        b.iter(|| black_box(rt.block_on(store.load(&id))))
    });
}

criterion_group!(benches, bench_classify, bench_context, bench_session_load);
criterion_main!(benches);
