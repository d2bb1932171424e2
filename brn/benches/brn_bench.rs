use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use burst_brn::{accrued_checked, AccrualPeriod, BrnEngine, BrnWalletState};
use burst_governance::ParamSchedule;
use burst_types::{Timestamp, WalletAddress};

fn make_schedule_with_segments(n: usize) -> ParamSchedule {
    let mut history = ParamSchedule::new(100, Timestamp::new(0));
    for i in 1..n {
        history
            .push(100 + i as u128, Timestamp::new(i as u64 * 1000))
            .unwrap();
    }
    history
}

fn bench_brn_balance_computation(c: &mut Criterion) {
    let mut group = c.benchmark_group("brn_balance");
    let state = BrnWalletState::new(Timestamp::new(0));

    for segment_count in [1, 10, 100, 1000] {
        let history = make_schedule_with_segments(segment_count);
        let now = Timestamp::new(segment_count as u64 * 1000 + 500);

        group.bench_with_input(
            BenchmarkId::new("available_balance", segment_count),
            &segment_count,
            |b, _| {
                b.iter(|| black_box(state.available_balance(black_box(&history), black_box(now))));
            },
        );
    }

    group.finish();
}

fn bench_brn_accrual_periods(c: &mut Criterion) {
    let mut group = c.benchmark_group("brn_accrual_periods");
    let history = make_schedule_with_segments(100);
    let now = Timestamp::new(100_500);

    for period_count in [1u64, 10, 50] {
        let step = 100_000 / period_count;
        let periods: Vec<AccrualPeriod> = (0..period_count)
            .map(|i| AccrualPeriod {
                start: Timestamp::new(i * step),
                end: Some(Timestamp::new(i * step + step / 2)),
            })
            .collect();

        group.bench_with_input(
            BenchmarkId::new("accrued_checked", period_count),
            &period_count,
            |b, _| {
                b.iter(|| black_box(accrued_checked(black_box(&periods), &history, black_box(now))));
            },
        );
    }

    group.finish();
}

fn bench_brn_engine_burn(c: &mut Criterion) {
    let rates = ParamSchedule::new(1_000_000, Timestamp::new(0));
    let wallet = WalletAddress::new("brst_bench");

    c.bench_function("engine_record_burn", |b| {
        b.iter_batched(
            || {
                let mut engine = BrnEngine::new();
                engine.start_accrual(&wallet, Timestamp::new(0)).unwrap();
                engine
            },
            |mut engine| {
                let _ = black_box(engine.record_burn(&wallet, 100, &rates, Timestamp::new(10_000)));
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_brn_balance_computation,
    bench_brn_accrual_periods,
    bench_brn_engine_burn,
);
criterion_main!(benches);
