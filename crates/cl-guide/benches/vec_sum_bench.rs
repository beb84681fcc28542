use criterion::{Criterion, criterion_group, criterion_main};
use cl_guide::{ComputeEnv, DeviceSelection, vec_sum};

fn bench_vec_sum(c: &mut Criterion) {
    let (a, b) = vec_sum::inputs();

    c.bench_function("vec_sum_host_1000", |bch| {
        bch.iter(|| vec_sum::reference(&a, &b));
    });

    // ohne OpenCL‑Gerät nur die Host‑Referenz
    let Ok(env) = ComputeEnv::open(DeviceSelection::GpuThenCpu) else { return };
    let src = include_str!("../kernels/HelloWorld.cl");

    c.bench_function("vec_sum_device_1000", |bch| {
        bch.iter(|| {
            let out = vec_sum::run(&env, src, &a, &b).unwrap();
            assert_eq!(out[999], 2997.0);
        });
    });
}

// Diese Zeilen sind notwendig, damit Criterion den Benchmark ausführt
criterion_group!(benches, bench_vec_sum);
criterion_main!(benches);
