//! Device context and kernel launch.
//!
//! A `GpuContext` owns a device description and executes kernels on it.
//! Kernels are plain closures invoked once per [`WorkItem`]; a launch
//! returns once every work item has run.
//!
//! ```rust
//! use batchrot_gpu::{default_device, LaunchConfig};
//!
//! let ctx = default_device().unwrap();
//! ctx.launch("noop", LaunchConfig::for_elements(64, 64), |_| {}).unwrap();
//! assert_eq!(ctx.launch_count(), 1);
//! ```

use crate::device::{DeviceId, DeviceInfo, DeviceKind};
use crate::kernel::{LaunchConfig, WorkItem};
use crate::{available_devices, GpuError, GpuResult};
use rayon::prelude::*;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};

/// Context that owns device state.
///
/// `GpuContext` is `Send + Sync` and can be shared across threads.
pub struct GpuContext {
    /// Device info.
    device: DeviceInfo,

    /// Number of successful launches.
    launches: AtomicU64,
}

impl GpuContext {
    /// Create a new context for the given device.
    ///
    /// # Errors
    ///
    /// Returns `GpuError::InvalidDevice` if no device has that ID.
    pub fn new(device_id: DeviceId) -> GpuResult<Self> {
        let device = available_devices()
            .into_iter()
            .find(|d| d.id == device_id)
            .ok_or(GpuError::InvalidDevice(device_id))?;

        Ok(Self::from_info(device))
    }

    /// Create a context from an explicit device description.
    #[must_use]
    pub fn from_info(device: DeviceInfo) -> Self {
        Self {
            device,
            launches: AtomicU64::new(0),
        }
    }

    /// Get the device info.
    #[must_use]
    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    /// Get the device ID.
    #[must_use]
    pub fn device_id(&self) -> DeviceId {
        self.device.id
    }

    /// Number of launches that completed successfully.
    #[must_use]
    pub fn launch_count(&self) -> u64 {
        self.launches.load(Ordering::Relaxed)
    }

    /// Launch a kernel.
    ///
    /// `kernel` is called once for every thread of the grid, including
    /// threads past the end of the problem; kernels bound-check their own
    /// indices. Work items may run concurrently and in any order.
    ///
    /// # Errors
    ///
    /// Returns `GpuError::InvalidConfig` if the geometry is rejected by the
    /// device, or `GpuError::LaunchError` if a work item panics.
    pub fn launch<F>(&self, name: &str, config: LaunchConfig, kernel: F) -> GpuResult<()>
    where
        F: Fn(WorkItem) + Sync,
    {
        config.validate(&self.device)?;

        tracing::trace!(
            kernel = name,
            device = %self.device.id,
            grid = ?config.grid_dim,
            block = ?config.block_dim,
            "kernel launch"
        );

        let run = || match self.device.kind {
            DeviceKind::Parallel => run_parallel(config, &kernel),
            DeviceKind::Serial => run_serial(config, &kernel),
        };

        panic::catch_unwind(AssertUnwindSafe(run)).map_err(|payload| {
            let message = panic_message(payload.as_ref());
            tracing::error!(kernel = name, %message, "kernel panicked");
            GpuError::LaunchError(format!("{name}: {message}"))
        })?;

        self.launches.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

fn block_coords(linear: u64, grid: (u32, u32, u32)) -> (u32, u32, u32) {
    let gx = u64::from(grid.0);
    let gy = u64::from(grid.1);
    // Each coordinate is bounded by its grid dimension, so the casts are lossless.
    #[allow(clippy::cast_possible_truncation)]
    let coords = (
        (linear % gx) as u32,
        ((linear / gx) % gy) as u32,
        (linear / (gx * gy)) as u32,
    );
    coords
}

fn run_block<F>(block_idx: (u32, u32, u32), block_dim: (u32, u32, u32), kernel: &F)
where
    F: Fn(WorkItem),
{
    for tz in 0..block_dim.2 {
        for ty in 0..block_dim.1 {
            for tx in 0..block_dim.0 {
                kernel(WorkItem {
                    block_idx,
                    thread_idx: (tx, ty, tz),
                    block_dim,
                });
            }
        }
    }
}

fn run_parallel<F>(config: LaunchConfig, kernel: &F)
where
    F: Fn(WorkItem) + Sync,
{
    (0..config.total_blocks()).into_par_iter().for_each(|linear| {
        run_block(block_coords(linear, config.grid_dim), config.block_dim, kernel);
    });
}

fn run_serial<F>(config: LaunchConfig, kernel: &F)
where
    F: Fn(WorkItem),
{
    for linear in 0..config.total_blocks() {
        run_block(block_coords(linear, config.grid_dim), config.block_dim, kernel);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl std::fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuContext")
            .field("device", &self.device)
            .field("launches", &self.launch_count())
            .finish()
    }
}
