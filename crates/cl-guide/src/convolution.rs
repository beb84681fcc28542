//! 2D convolution of a fixed 8x8 signal with a 3x3 mask.

use std::fmt::Write as _;

use bytemuck::cast_slice;
use log::info;
use opencl3::types::cl_uint;

use crate::{CallContext, ClError, ComputeEnv, DeviceBuffer, KernelProgram, NdRange, Output, Pending, dispatch};

pub const SOURCE_FILE: &str = "Convolution.cl";
pub const KERNEL_NAME: &str = "convolve";

pub const INPUT_WIDTH: usize = 8;
pub const INPUT_HEIGHT: usize = 8;
pub const MASK_WIDTH: usize = 3;
pub const MASK_HEIGHT: usize = 3;
pub const OUTPUT_WIDTH: usize = INPUT_WIDTH - MASK_WIDTH + 1;
pub const OUTPUT_HEIGHT: usize = INPUT_HEIGHT - MASK_HEIGHT + 1;

pub type InputSignal = [[cl_uint; INPUT_WIDTH]; INPUT_HEIGHT];
pub type Mask = [[cl_uint; MASK_WIDTH]; MASK_HEIGHT];
pub type OutputSignal = [[cl_uint; OUTPUT_WIDTH]; OUTPUT_HEIGHT];

/// Zeilenweise, `INPUT_SIGNAL[y][x]`
pub const INPUT_SIGNAL: InputSignal = [
    [3, 1, 1, 4, 8, 2, 1, 3],
    [4, 2, 1, 1, 2, 1, 2, 3],
    [4, 4, 4, 4, 3, 2, 2, 2],
    [9, 8, 3, 8, 9, 0, 0, 0],
    [9, 3, 3, 9, 0, 0, 0, 0],
    [0, 9, 0, 8, 0, 0, 0, 0],
    [3, 0, 8, 8, 9, 4, 4, 4],
    [5, 9, 8, 1, 8, 1, 1, 1],
];

pub const MASK: Mask = [
    [1, 1, 1],
    [1, 0, 1],
    [1, 1, 1],
];

/// `out[y][x] = Σ mask[r][c] * input[y + r][x + c]`
pub fn reference(input: &InputSignal, mask: &Mask) -> OutputSignal {
    let mut out = [[0; OUTPUT_WIDTH]; OUTPUT_HEIGHT];
    for (y, row) in out.iter_mut().enumerate() {
        for (x, cell) in row.iter_mut().enumerate() {
            *cell = (0..MASK_HEIGHT)
                .flat_map(|r| (0..MASK_WIDTH).map(move |c| (r, c)))
                .map(|(r, c)| mask[r][c] * input[y + r][x + c])
                .sum();
        }
    }
    out
}

/// Runs `convolve` once, one work-item per output cell, and returns the grid.
pub fn run(
    env: &ComputeEnv,
    source: &str,
    input: &InputSignal,
    mask: &Mask,
) -> Result<OutputSignal, ClError> {
    let program = KernelProgram::build(env, source)?;
    let kernel = program.kernel(KERNEL_NAME)?;

    let input_buf = DeviceBuffer::from_host(&env.context, cast_slice::<_, cl_uint>(input))?;
    let mask_buf = DeviceBuffer::from_host(&env.context, cast_slice::<_, cl_uint>(mask))?;
    let output_buf = DeviceBuffer::<cl_uint, Pending>::output(
        &env.context,
        OUTPUT_WIDTH * OUTPUT_HEIGHT,
        Output::WriteOnly,
    )?;

    let input_width = INPUT_WIDTH as cl_uint;
    let mask_width = MASK_WIDTH as cl_uint;
    // SAFETY: argument order and types match
    // convolve(input, mask, output, uint inputWidth, uint maskWidth)
    unsafe {
        kernel.set_arg(0, input_buf.raw()).during("clSetKernelArg")?;
        kernel.set_arg(1, mask_buf.raw()).during("clSetKernelArg")?;
        kernel.set_arg(2, output_buf.raw()).during("clSetKernelArg")?;
        kernel.set_arg(3, &input_width).during("clSetKernelArg")?;
        kernel.set_arg(4, &mask_width).during("clSetKernelArg")?;
    }

    // x läuft über Spalten, y über Zeilen
    let range = NdRange::unit_groups(&[OUTPUT_WIDTH, OUTPUT_HEIGHT])?;
    let evt = dispatch::launch(&env.queue, &kernel, &range)?;
    let flat = output_buf.complete(evt)?.read(&env.queue)?;
    info!("{KERNEL_NAME}: {}x{} grid read back", OUTPUT_WIDTH, OUTPUT_HEIGHT);

    let mut out = [[0; OUTPUT_WIDTH]; OUTPUT_HEIGHT];
    for (row, chunk) in out.iter_mut().zip(flat.chunks_exact(OUTPUT_WIDTH)) {
        row.copy_from_slice(chunk);
    }
    Ok(out)
}

/// One line per row, each value followed by a space.
pub fn format_grid(grid: &OutputSignal) -> String {
    let mut text = String::new();
    for row in grid {
        for v in row {
            let _ = write!(text, "{v} ");
        }
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPECTED: OutputSignal = [
        [22, 21, 27, 25, 22, 16],
        [35, 31, 31, 27, 19, 10],
        [39, 43, 35, 26, 16, 6],
        [41, 48, 31, 34, 9, 0],
        [26, 48, 37, 38, 17, 12],
        [42, 43, 42, 30, 23, 11],
    ];

    #[test]
    fn output_is_six_by_six() {
        assert_eq!((OUTPUT_WIDTH, OUTPUT_HEIGHT), (6, 6));
    }

    #[test]
    fn reference_matches_hand_computed_grid() {
        assert_eq!(reference(&INPUT_SIGNAL, &MASK), EXPECTED);
    }

    #[test]
    fn ring_mask_skips_the_center() {
        // top-left window: 3+1+1 + 4+1 + 4+4+4, center 2 not counted
        let out = reference(&INPUT_SIGNAL, &MASK);
        assert_eq!(out[0][0], 22);

        let mut center_only = [[0; MASK_WIDTH]; MASK_HEIGHT];
        center_only[1][1] = 1;
        let out = reference(&INPUT_SIGNAL, &center_only);
        for y in 0..OUTPUT_HEIGHT {
            for x in 0..OUTPUT_WIDTH {
                assert_eq!(out[y][x], INPUT_SIGNAL[y + 1][x + 1]);
            }
        }
    }

    #[test]
    fn flattening_is_row_major() {
        let flat: &[cl_uint] = cast_slice(&INPUT_SIGNAL);
        assert_eq!(flat.len(), INPUT_WIDTH * INPUT_HEIGHT);
        assert_eq!(&flat[..INPUT_WIDTH], &INPUT_SIGNAL[0]);
        assert_eq!(flat[3 * INPUT_WIDTH + 4], INPUT_SIGNAL[3][4]);
    }

    #[test]
    fn grid_prints_row_per_line() {
        let text = format_grid(&EXPECTED);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), OUTPUT_HEIGHT);
        assert_eq!(lines[0], "22 21 27 25 22 16 ");
        assert_eq!(lines[3], "41 48 31 34 9 0 ");
    }
}
