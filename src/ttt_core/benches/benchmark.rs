use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use ttt_core::pacing::{compute_pacing, target_power_band};
use ttt_core::{
    EffortLevel, MultiplierTable, Options, ReferenceMetric, Rider, RiderField, Riders,
    ScalarMultiplier,
};

fn create_team(count: usize, seed: u64) -> Riders {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let riders = (0..count)
        .map(|i| {
            Rider::new(i)
                .with_name(format!("Rider{}", i))
                .with_power(rng.gen_range(220..380))
                .with_weight(rng.gen_range(58.0..90.0))
        })
        .collect();
    Riders::from_riders(riders).unwrap()
}

fn create_table() -> MultiplierTable {
    let mut table = MultiplierTable::new();
    for remaining in 1..=8 {
        for effort in EffortLevel::ALL {
            let m = effort.multiplier() + (remaining as f64 - 1.0) * 0.02;
            table.insert(remaining, effort.key(), m).unwrap();
        }
    }
    table
}

fn bench_stats(c: &mut Criterion) {
    let riders = create_team(8, 42);

    c.bench_function("stats_power_8_riders", |b| {
        b.iter(|| black_box(&riders).stats(RiderField::Power))
    });

    c.bench_function("stats_wkg_8_riders", |b| {
        b.iter(|| black_box(&riders).stats(RiderField::Wkg))
    });
}

fn bench_power_band(c: &mut Criterion) {
    let riders = create_team(8, 7);
    let stats = riders.stats(RiderField::Power).unwrap();
    let table = create_table();

    c.bench_function("power_band_scalar", |b| {
        b.iter(|| target_power_band(black_box(&stats), 8, EffortLevel::Medium, &ScalarMultiplier))
    });

    c.bench_function("power_band_table", |b| {
        b.iter(|| target_power_band(black_box(&stats), 8, EffortLevel::Medium, &table))
    });
}

fn bench_compute_pacing(c: &mut Criterion) {
    let riders = create_team(8, 1234);
    let table = create_table();
    let options = Options {
        reference_metric: ReferenceMetric::Wkg,
        ..Options::default()
    };

    c.bench_function("compute_pacing_8_riders_table", |b| {
        b.iter(|| compute_pacing(black_box(&riders), black_box(&options), &table))
    });
}

criterion_group!(benches, bench_stats, bench_power_band, bench_compute_pacing);
criterion_main!(benches);
