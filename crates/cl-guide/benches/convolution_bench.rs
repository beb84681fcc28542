// Convolution 8x8 ⊛ 3x3: host reference vs. one full device launch
// (build, upload, kernel, read-back) per iteration.

use criterion::{Criterion, criterion_group, criterion_main};
use cl_guide::{ComputeEnv, DeviceSelection, convolution::{self, INPUT_SIGNAL, MASK}};

use std::{hint::black_box, time::Duration};

fn bench_convolution(c: &mut Criterion) {
    let mut g = c.benchmark_group("convolve_8x8_3x3");

    g.bench_function("host", |b| {
        b.iter(|| convolution::reference(black_box(&INPUT_SIGNAL), black_box(&MASK)));
    });

    if let Ok(env) = ComputeEnv::open(DeviceSelection::AnyPlatformCpu) {
        let src = include_str!("../kernels/Convolution.cl");
        g.bench_function("device", |b| {
            b.iter(|| {
                let out = convolution::run(&env, src, &INPUT_SIGNAL, &MASK).unwrap();
                assert_eq!(out[0][0], 22);
            });
        });
    }

    g.finish();
}

// ─────────────────────────────────────────────────────────── Criterion config ──
fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(Duration::from_secs(1))
        .measurement_time(Duration::from_secs(5))
        .sample_size(30)
        .configure_from_args()
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_convolution
}
criterion_main!(benches);
