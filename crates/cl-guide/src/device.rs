//! Platform and device discovery, context and command queue.

use std::{
    ffi::{CStr, c_char, c_void},
    fmt, ptr,
};

use log::{debug, error, info, warn};
use opencl3::{
    command_queue::CommandQueue,
    context::Context,
    device::{CL_DEVICE_TYPE_CPU, CL_DEVICE_TYPE_GPU, Device},
    error_codes::CL_DEVICE_NOT_FOUND,
    platform::{Platform, get_platforms},
    types::{cl_context_properties, cl_device_id, cl_device_type},
};

#[cfg(feature = "metrics")]
use std::time::Instant;

use crate::{CallContext, ClError};

/// `CL_CONTEXT_PLATFORM` aus `cl.h`
const CL_CONTEXT_PLATFORM: cl_context_properties = 0x1084;
/// ICD‑Loader ohne installierte Plattform
const CL_PLATFORM_NOT_FOUND_KHR: i32 = -1001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Gpu,
    Cpu,
}

impl DeviceKind {
    fn cl_type(self) -> cl_device_type {
        match self {
            DeviceKind::Gpu => CL_DEVICE_TYPE_GPU,
            DeviceKind::Cpu => CL_DEVICE_TYPE_CPU,
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Gpu => write!(f, "GPU"),
            DeviceKind::Cpu => write!(f, "CPU"),
        }
    }
}

/// How a program picks its devices. Neither rule looks past the first match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceSelection {
    /// First platform only: its GPU devices, or its CPU devices if the GPU attempt fails.
    GpuThenCpu,
    /// First platform, in enumeration order, that exposes any CPU device.
    AnyPlatformCpu,
}

/// Everything a one-shot launch needs. Dropping it releases queue, then context.
pub struct ComputeEnv {
    pub queue: CommandQueue,
    pub context: Context,
    pub kind: DeviceKind,
    devices: Vec<cl_device_id>,
    gpu_error: Option<ClError>,
}

impl ComputeEnv {
    pub fn open(selection: DeviceSelection) -> Result<Self, ClError> {
        #[cfg(feature = "metrics")]
        let t = Instant::now();

        let platforms = match get_platforms() {
            Err(e) if e.0 == CL_PLATFORM_NOT_FOUND_KHR => return Err(ClError::NoPlatform),
            other => other.during("clGetPlatformIDs")?,
        };
        debug!("{} OpenCL platform(s) available", platforms.len());

        let (mut env, gpu_error) = select(
            &platforms,
            selection,
            |platform: &Platform, kind: DeviceKind| platform.get_devices(kind.cl_type()).map_err(|e| e.0),
            Self::on_devices,
        )?;
        env.gpu_error = gpu_error;

        #[cfg(feature = "metrics")]
        crate::metrics::record("device", t);

        Ok(env)
    }

    /// Context über alle `devices`, Queue auf dem ersten.
    fn on_devices(
        platform: Platform,
        kind: DeviceKind,
        devices: Vec<cl_device_id>,
    ) -> Result<Self, ClError> {
        let first = *devices.first().ok_or(ClError::NoDevice(kind))?;

        info!(
            "platform: {}",
            platform.name().unwrap_or_else(|_| "<unknown>".into())
        );
        info!(
            "{} device: {}",
            kind,
            Device::new(first).name().unwrap_or_else(|_| "<unknown>".into())
        );

        let properties = [
            CL_CONTEXT_PLATFORM,
            platform.id() as cl_context_properties,
            0,
        ];
        let context = Context::from_devices(
            &devices,
            &properties,
            Some(context_notify),
            ptr::null_mut(),
        )
        .during("clCreateContext")?;

        #[allow(deprecated)]
        let queue = CommandQueue::create(&context, first, 0)
            .during("clCreateCommandQueue")?;

        Ok(Self { queue, context, kind, devices, gpu_error: None })
    }

    /// Warum der GPU‑Versuch scheiterte, falls auf die CPU ausgewichen wurde.
    pub fn gpu_fallback(&self) -> Option<&ClError> {
        self.gpu_error.as_ref()
    }

    /// Das Gerät, auf dem die Queue liegt.
    pub fn device(&self) -> Device {
        Device::new(self.devices[0])
    }

    pub fn device_ids(&self) -> &[cl_device_id] {
        &self.devices
    }
}

/// Applies `selection` to `platforms`.
///
/// `query` lists the devices of one kind on a platform (raw status on error),
/// `open` turns a platform and its devices into a usable environment. For
/// `GpuThenCpu` any failure of the GPU attempt, listing or opening, falls back
/// to the CPU; the GPU error is returned next to the environment.
pub(crate) fn select<P, D, E>(
    platforms: &[P],
    selection: DeviceSelection,
    query: impl Fn(&P, DeviceKind) -> Result<Vec<D>, i32>,
    mut open: impl FnMut(P, DeviceKind, Vec<D>) -> Result<E, ClError>,
) -> Result<(E, Option<ClError>), ClError>
where
    P: Copy,
{
    match selection {
        DeviceSelection::GpuThenCpu => {
            let platform = *platforms.first().ok_or(ClError::NoPlatform)?;
            let mut attempt = |kind: DeviceKind| -> Result<E, ClError> {
                devices_of(&query, &platform, kind)?
                    .ok_or(ClError::NoDevice(kind))
                    .and_then(|ids| open(platform, kind, ids))
            };

            match attempt(DeviceKind::Gpu) {
                Ok(env) => Ok((env, None)),
                Err(gpu_err) => {
                    warn!("GPU context failed ({gpu_err}), trying CPU");
                    match attempt(DeviceKind::Cpu) {
                        Ok(env) => Ok((env, Some(gpu_err))),
                        Err(cpu_err) => {
                            warn!("CPU context failed ({cpu_err})");
                            Err(ClError::NoGpuOrCpu)
                        }
                    }
                }
            }
        }
        DeviceSelection::AnyPlatformCpu => {
            for &platform in platforms {
                if let Some(ids) = devices_of(&query, &platform, DeviceKind::Cpu)? {
                    return open(platform, DeviceKind::Cpu, ids).map(|env| (env, None));
                }
            }
            Err(ClError::NoDevice(DeviceKind::Cpu))
        }
    }
}

/// `Ok(None)` wenn die Plattform keinen Treffer meldet.
fn devices_of<P, D>(
    query: &impl Fn(&P, DeviceKind) -> Result<Vec<D>, i32>,
    platform: &P,
    kind: DeviceKind,
) -> Result<Option<Vec<D>>, ClError> {
    match query(platform, kind) {
        Ok(ids) if ids.is_empty() => Ok(None),
        Ok(ids) => Ok(Some(ids)),
        Err(code) if code == CL_DEVICE_NOT_FOUND => Ok(None),
        Err(code) => Err(ClError::Call { call: "clGetDeviceIDs", code }),
    }
}

/// Asynchrone Fehlermeldungen des Treibers für den Context.
extern "C" fn context_notify(
    errinfo: *const c_char,
    _private_info: *const c_void,
    _cb: usize,
    _user_data: *mut c_void,
) {
    if errinfo.is_null() {
        error!("Error occurred during context use");
        return;
    }
    // SAFETY: der Treiber übergibt einen nullterminierten String
    let msg = unsafe { CStr::from_ptr(errinfo) };
    error!("Error occurred during context use: {}", msg.to_string_lossy());
}
