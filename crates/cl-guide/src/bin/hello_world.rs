// 2025 Thomas Bicanic – MIT License

use std::process::ExitCode;

use cl_guide::{ClError, ComputeEnv, DeviceSelection, load_source, vec_sum};

fn run() -> Result<(), ClError> {
    /* ---------- 1. Gerät, Kontext & Queue ------------------------ */
    let env = ComputeEnv::open(DeviceSelection::GpuThenCpu)?;
    if env.gpu_fallback().is_some() {
        println!("Could not create GPU context, trying CPU...");
    }

    /* ---------- 2. Kernel-Quelle aus dem Arbeitsverzeichnis ------ */
    let source = load_source(vec_sum::SOURCE_FILE)?;

    /* ---------- 3. Hostdaten, Lauf & Rücklesen ------------------- */
    let (a, b) = vec_sum::inputs();
    let result = vec_sum::run(&env, &source, &a, &b)?;

    /* ---------- 4. Ausgabe --------------------------------------- */
    println!("{}", vec_sum::format_result(&result));
    println!("Executed program successfully.");
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let status = cl_guide::exit_status(run());

    #[cfg(feature = "metrics")]
    cl_guide::metrics::summary();

    ExitCode::from(status)
}
