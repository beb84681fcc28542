// 2025 Thomas Bicanic – MIT License

use std::process::ExitCode;

use cl_guide::{ClError, ComputeEnv, DeviceSelection, convolution, load_source};

fn run() -> Result<(), ClError> {
    /* ---------- 1. erste Plattform mit CPU-Gerät ----------------- */
    let env = ComputeEnv::open(DeviceSelection::AnyPlatformCpu)?;

    /* ---------- 2. Kernel-Quelle aus dem Arbeitsverzeichnis ------ */
    let source = load_source(convolution::SOURCE_FILE)?;

    /* ---------- 3. Faltung auf dem Gerät ------------------------- */
    let output = convolution::run(&env, &source, &convolution::INPUT_SIGNAL, &convolution::MASK)?;

    /* ---------- 4. Ausgabe --------------------------------------- */
    print!("{}", convolution::format_grid(&output));
    println!();
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
