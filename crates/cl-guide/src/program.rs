//! Kernel source loading and program compilation.

use std::{fs, path::Path};

use log::{debug, info};
use opencl3::{kernel::Kernel, program::Program};

#[cfg(feature = "metrics")]
use std::time::Instant;

use crate::{CallContext, ClError, ComputeEnv};

/// Liest eine Kernel‑Quelle relativ zum Arbeitsverzeichnis.
pub fn load_source(path: impl AsRef<Path>) -> Result<String, ClError> {
    let path = path.as_ref();
    let src = fs::read_to_string(path).map_err(|source| ClError::Source {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("read {} bytes of kernel source from {}", src.len(), path.display());
    Ok(src)
}

/// A program built for every device of a [`ComputeEnv`].
pub struct KernelProgram {
    program: Program,
}

impl KernelProgram {
    /// Compiles `source`. On failure the driver's build log becomes the error.
    pub fn build(env: &ComputeEnv, source: &str) -> Result<Self, ClError> {
        #[cfg(feature = "metrics")]
        let t = Instant::now();

        let program = Program::create_and_build_from_source(&env.context, source, "")
            .map_err(|log| ClError::Build(log.to_string()))?;
        info!("program built");

        #[cfg(feature = "metrics")]
        crate::metrics::record("build", t);

        Ok(Self { program })
    }

    pub fn kernel(&self, name: &str) -> Result<Kernel, ClError> {
        let kernel = Kernel::create(&self.program, name).during("clCreateKernel")?;
        debug!("kernel `{name}` created");
        Ok(kernel)
    }
}
