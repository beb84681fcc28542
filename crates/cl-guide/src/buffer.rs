//! Device buffers with their lifecycle in the type.
//!
//! Inputs are created from host memory and only ever read by a kernel.
//! Outputs start out `Pending`; a kernel can write them, and only after
//! the writing launch has completed do they become `Ready` and readable.

use std::{ffi::c_void, marker::PhantomData, mem::size_of, ptr};

use bytemuck::{Pod, Zeroable};
use log::debug;
use opencl3::{
    context::Context,
    event::Event,
    memory::{Buffer, CL_MEM_COPY_HOST_PTR, CL_MEM_READ_ONLY, CL_MEM_READ_WRITE, CL_MEM_WRITE_ONLY},
    types::{CL_BLOCKING, cl_mem_flags},
};

#[cfg(feature = "metrics")]
use std::time::Instant;

use crate::{CallContext, ClError};

// ─── Typ‑State‑Marker ────────────────────────────────────────────────
mod sealed {
    pub trait Sealed {}
}

pub trait State: sealed::Sealed {}

/// Read-only copy of host memory.
pub struct Input;
impl sealed::Sealed for Input {}
impl State for Input {}

/// Output a kernel may still be writing.
pub struct Pending;
impl sealed::Sealed for Pending {}
impl State for Pending {}

/// Output whose writer has finished.
pub struct Ready;
impl sealed::Sealed for Ready {}
impl State for Ready {}

/// Kernel‑seitiger Zugriff auf einen Ausgabepuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    ReadWrite,
    WriteOnly,
}

impl Output {
    fn flags(self) -> cl_mem_flags {
        match self {
            Output::ReadWrite => CL_MEM_READ_WRITE,
            Output::WriteOnly => CL_MEM_WRITE_ONLY,
        }
    }
}

pub struct DeviceBuffer<T, S: State> {
    buf: Buffer<T>,
    len: usize,
    _state: PhantomData<S>,
}

impl<T: Pod> DeviceBuffer<T, Input> {
    /// Kopiert `host` beim Anlegen auf das Gerät (`CL_MEM_COPY_HOST_PTR`).
    pub fn from_host(context: &Context, host: &[T]) -> Result<Self, ClError> {
        #[cfg(feature = "metrics")]
        let t = Instant::now();

        // SAFETY: with COPY_HOST_PTR the driver only reads `host.len()` elements
        // during this call and keeps no reference afterwards.
        let buf = unsafe {
            Buffer::<T>::create(
                context,
                CL_MEM_READ_ONLY | CL_MEM_COPY_HOST_PTR,
                host.len(),
                host.as_ptr() as *mut c_void,
            )
        }
        .during("clCreateBuffer")?;
        let input = Self { buf, len: host.len(), _state: PhantomData };
        debug!("input buffer: {} bytes", input.size_bytes());

        #[cfg(feature = "metrics")]
        {
            crate::metrics::count_alloc(input.size_bytes());
            crate::metrics::record("upload", t);
        }

        Ok(input)
    }
}

impl<T: Pod> DeviceBuffer<T, Pending> {
    /// legt einen Ausgabepuffer ohne Host‑Zeiger an
    pub fn output(context: &Context, len: usize, access: Output) -> Result<Self, ClError> {
        // SAFETY: no host pointer is handed to the driver
        let buf = unsafe { Buffer::<T>::create(context, access.flags(), len, ptr::null_mut()) }
            .during("clCreateBuffer")?;
        let output = Self { buf, len, _state: PhantomData };
        debug!("output buffer ({access:?}): {} bytes", output.size_bytes());

        #[cfg(feature = "metrics")]
        crate::metrics::count_alloc(output.size_bytes());

        Ok(output)
    }

    /// Wartet auf den schreibenden Kernel und überführt in den Ready‑State.
    pub fn complete(self, writer: Event) -> Result<DeviceBuffer<T, Ready>, ClError> {
        writer.wait().during("clWaitForEvents")?;
        Ok(DeviceBuffer { buf: self.buf, len: self.len, _state: PhantomData })
    }
}

impl<T: Pod> DeviceBuffer<T, Ready> {
    /// Blocking read of the whole buffer.
    pub fn read(mut self, queue: &opencl3::command_queue::CommandQueue) -> Result<Vec<T>, ClError> {
        #[cfg(feature = "metrics")]
        let t = Instant::now();

        let mut host = vec![T::zeroed(); self.len];
        // SAFETY: `host` holds exactly `len` elements and the read is blocking
        unsafe { queue.enqueue_read_buffer(&mut self.buf, CL_BLOCKING, 0, &mut host, &[]) }
            .during("clEnqueueReadBuffer")?;

        #[cfg(feature = "metrics")]
        crate::metrics::record("read_back", t);

        Ok(host)
    }
}

// ── Accessors (alle States) ──────────────────────────────────────────
impl<T, S: State> DeviceBuffer<T, S> {
    /// Zugriff auf die interne OpenCL Buffer-Referenz, z. B. für `set_arg`
    pub fn raw(&self) -> &Buffer<T> {
        &self.buf
    }

    pub fn size_bytes(&self) -> usize {
        byte_len::<T>(self.len)
    }
}

/// Bytes für `len` Elemente vom Typ `T`
const fn byte_len<T>(len: usize) -> usize {
    len * size_of::<T>()
}
