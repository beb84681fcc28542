//! One-shot kernel launch over an explicit NDRange.

use std::ptr;

use log::debug;
use opencl3::{command_queue::CommandQueue, event::Event, kernel::Kernel};

#[cfg(feature = "metrics")]
use std::time::Instant;

use crate::{CallContext, ClError};

/// Global and local work sizes of one launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NdRange {
    global: Vec<usize>,
    local: Vec<usize>,
}

impl NdRange {
    /// Work-group size 1 in every dimension of `global`.
    pub fn unit_groups(global: &[usize]) -> Result<Self, ClError> {
        Self::new(global, &vec![1; global.len()])
    }

    pub fn new(global: &[usize], local: &[usize]) -> Result<Self, ClError> {
        if global.is_empty() || global.len() > 3 {
            return Err(ClError::Dispatch(format!(
                "{} dimensions, expected 1 to 3",
                global.len()
            )));
        }
        if global.len() != local.len() {
            return Err(ClError::Dispatch(format!(
                "global has {} dimensions, local has {}",
                global.len(),
                local.len()
            )));
        }
        for (dim, (&g, &l)) in global.iter().zip(local).enumerate() {
            if g == 0 || l == 0 {
                return Err(ClError::Dispatch(format!("zero size in dimension {dim}")));
            }
            if g % l != 0 {
                return Err(ClError::Dispatch(format!(
                    "global size {g} is not a multiple of local size {l} in dimension {dim}"
                )));
            }
        }
        Ok(Self { global: global.to_vec(), local: local.to_vec() })
    }

    pub fn dims(&self) -> u32 {
        self.global.len() as u32
    }

    pub fn global(&self) -> &[usize] {
        &self.global
    }

    pub fn local(&self) -> &[usize] {
        &self.local
    }

    /// Gesamtzahl der Work‑Items
    pub fn work_items(&self) -> usize {
        self.global.iter().product()
    }
}

/// Reiht `kernel` einmal ein und wartet, bis die Queue leer ist.
///
/// The kernel arguments must already be set.
pub fn launch(queue: &CommandQueue, kernel: &Kernel, range: &NdRange) -> Result<Event, ClError> {
    #[cfg(feature = "metrics")]
    let t = Instant::now();

    debug!("enqueue {:?} / {:?}", range.global(), range.local());
    // SAFETY: both size arrays hold `dims()` entries and outlive the call
    let evt = unsafe {
        queue.enqueue_nd_range_kernel(
            kernel.get(),
            range.dims(),
            ptr::null(),
            range.global().as_ptr(),
            range.local().as_ptr(),
            &[],
        )
    }
    .during("clEnqueueNDRangeKernel")?;
    queue.finish().during("clFinish")?;

    #[cfg(feature = "metrics")]
    crate::metrics::record("kernel", t);

    Ok(evt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_groups_have_local_size_one() {
        let r = NdRange::unit_groups(&[6, 6]).unwrap();
        assert_eq!(r.dims(), 2);
        assert_eq!(r.local(), &[1, 1]);
        assert_eq!(r.work_items(), 36);
    }

    #[test]
    fn rejects_bad_dimensionality() {
        assert!(matches!(NdRange::unit_groups(&[]), Err(ClError::Dispatch(_))));
        assert!(matches!(NdRange::unit_groups(&[1, 1, 1, 1]), Err(ClError::Dispatch(_))));
        assert!(matches!(NdRange::new(&[8, 8], &[1]), Err(ClError::Dispatch(_))));
    }

    #[test]
    fn rejects_zero_and_uneven_sizes() {
        let err = NdRange::new(&[1000], &[0]).unwrap_err();
        assert_eq!(err.to_string(), "invalid NDRange: zero size in dimension 0");
        let err = NdRange::new(&[1000], &[64]).unwrap_err();
        assert!(err.to_string().contains("not a multiple"));
        assert!(NdRange::new(&[1000], &[8]).is_ok());
    }
}
