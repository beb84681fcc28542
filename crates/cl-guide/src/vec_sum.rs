//! "Hello World": element-wise sum of two vectors.

use std::fmt::Write as _;

use log::info;

use crate::{CallContext, ClError, ComputeEnv, DeviceBuffer, KernelProgram, NdRange, Output, Pending, dispatch};

pub const ARRAY_SIZE: usize = 1000;
pub const SOURCE_FILE: &str = "HelloWorld.cl";
pub const KERNEL_NAME: &str = "hello_kernel";

/// `a[i] = i`, `b[i] = 2i`
pub fn inputs() -> (Vec<f32>, Vec<f32>) {
    let a = (0..ARRAY_SIZE).map(|i| i as f32).collect();
    let b = (0..ARRAY_SIZE).map(|i| (i * 2) as f32).collect();
    (a, b)
}

/// Host-Referenz des Kernels.
pub fn reference(a: &[f32], b: &[f32]) -> Vec<f32> {
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

/// Runs `hello_kernel` once over `a` and `b` and returns the device result.
pub fn run(env: &ComputeEnv, source: &str, a: &[f32], b: &[f32]) -> Result<Vec<f32>, ClError> {
    if a.len() != b.len() {
        return Err(ClError::LengthMismatch { left: a.len(), right: b.len() });
    }

    let program = KernelProgram::build(env, source)?;
    let kernel = program.kernel(KERNEL_NAME)?;

    let buf_a = DeviceBuffer::from_host(&env.context, a)?;
    let buf_b = DeviceBuffer::from_host(&env.context, b)?;
    let result = DeviceBuffer::<f32, Pending>::output(&env.context, a.len(), Output::ReadWrite)?;

    // SAFETY: argument order and types match hello_kernel(a, b, result)
    unsafe {
        kernel.set_arg(0, buf_a.raw()).during("clSetKernelArg")?;
        kernel.set_arg(1, buf_b.raw()).during("clSetKernelArg")?;
        kernel.set_arg(2, result.raw()).during("clSetKernelArg")?;
    }

    let range = NdRange::unit_groups(&[a.len()])?;
    let evt = dispatch::launch(&env.queue, &kernel, &range)?;
    let out = result.complete(evt)?.read(&env.queue)?;
    info!("{KERNEL_NAME}: {} results read back", out.len());
    Ok(out)
}

/// Every value followed by a tab, on one line.
pub fn format_result(result: &[f32]) -> String {
    let mut line = String::with_capacity(result.len() * 6);
    for v in result {
        let _ = write!(line, "{v}\t");
    }
    line
}
