// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use bcp_core::{ExecutionContext, ReturnSeries};
use bcp_mcmc::{ChangePointModel, Sampler, SamplerConfig};
use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn lcg_next(state: &mut u64) -> u64 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    *state
}

/// Two-regime price path with deterministic pseudo-noise.
fn generate_series(n: usize) -> ReturnSeries {
    let start = NaiveDate::from_ymd_opt(2015, 1, 5).expect("valid date");
    let mut state = 0xfeed_f00d_dead_beef_u64;
    let mut price = 100.0;
    let mut records = vec![(start, price)];
    for t in 0..n {
        let mean = if t < n / 2 { 0.005 } else { 0.03 };
        let noise = ((lcg_next(&mut state) >> 11) as f64 / (1u64 << 53) as f64 - 0.5) * 0.01;
        price *= (mean + noise).exp();
        records.push((start + chrono::Days::new(t as u64 + 1), price));
    }
    ReturnSeries::from_prices(&records).expect("benchmark series should be valid")
}

fn benchmark_sampler(c: &mut Criterion) {
    let mut group = c.benchmark_group("sampler");
    group.sample_size(10);

    for n in [100usize, 1_000] {
        let series = generate_series(n);
        let model = ChangePointModel::new(&series).expect("model should build");
        let config = SamplerConfig {
            tune: 200,
            draws: 400,
            chains: 2,
            target_accept: 0.9,
            seed: 7,
            cancel_check_every: 64,
        };
        let sampler = Sampler::new(model.clone(), config).expect("config should be valid");
        let ctx = ExecutionContext::new();

        group.bench_function(format!("log_posterior_n{n}"), |b| {
            let state = [n as f64 / 2.0, 0.005, 0.03, 0.01];
            b.iter(|| black_box(model.log_posterior(black_box(&state))))
        });

        group.bench_function(format!("run_2_chains_n{n}"), |b| {
            b.iter(|| {
                sampler
                    .run(black_box(&ctx))
                    .expect("benchmark run should succeed")
            })
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_sampler);
criterion_main!(benches);
