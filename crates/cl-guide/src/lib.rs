// ─── Feature‑Module ───────────────────────────────────────────────────
#[cfg(feature = "metrics")]
pub mod metrics;

// ─── Pipeline‑Module ──────────────────────────────────────────────────
pub mod buffer;
pub mod convolution;
pub mod device;
pub mod dispatch;
pub mod program;
pub mod vec_sum;

pub use buffer::{DeviceBuffer, Input, Output, Pending, Ready};
pub use device::{ComputeEnv, DeviceKind, DeviceSelection};
pub use dispatch::NdRange;
pub use program::{load_source, KernelProgram};

use std::path::PathBuf;

// ─── Fehler‑Typ ───────────────────────────────────────────────────────
#[derive(thiserror::Error, Debug)]
pub enum ClError {
    #[error("OpenCL error code {0}")]
    Api(i32),

    /// Status einer benannten API‑Funktion, Ausgabe wie `ERROR: clCreateBuffer(-61)`
    #[error("ERROR: {call}({code})")]
    Call { call: &'static str, code: i32 },

    #[error("Failed to find any OpenCL platforms")]
    NoPlatform,

    #[error("No {0} device found")]
    NoDevice(DeviceKind),

    #[error("Failed to create an OpenCL GPU or CPU context...")]
    NoGpuOrCpu,

    #[error("Failed to open File for Reading: {}", path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error in kernel:\n{0}")]
    Build(String),

    #[error("invalid NDRange: {0}")]
    Dispatch(String),

    #[error("input lengths differ: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
}

impl ClError {
    /// Prozess‑Status für `main`: die CPU‑Suche endet mit −1, alles andere mit 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            ClError::NoDevice(DeviceKind::Cpu) => 255,
            _ => 1,
        }
    }
}

impl From<opencl3::error_codes::ClError> for ClError {
    fn from(err: opencl3::error_codes::ClError) -> Self {
        ClError::Api(err.0)
    }
}

impl From<i32> for ClError {
    fn from(code: i32) -> Self {
        ClError::Api(code)
    }
}

/// Ende eines Programms: Fehler nach stderr, Rückgabe ist der Prozess‑Status.
pub fn exit_status(result: Result<(), ClError>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{e}");
            e.exit_code()
        }
    }
}

/// Hängt den Namen des OpenCL‑Aufrufs an einen Fehlerstatus.
pub(crate) trait CallContext<T> {
    fn during(self, call: &'static str) -> Result<T, ClError>;
}

impl<T> CallContext<T> for Result<T, opencl3::error_codes::ClError> {
    #[inline]
    fn during(self, call: &'static str) -> Result<T, ClError> {
        self.map_err(|err| ClError::Call { call, code: err.0 })
    }
}
