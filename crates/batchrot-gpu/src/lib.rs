//! # batchrot execution substrate
//!
//! The launch primitive that batchrot kernels run on: a device description,
//! grid/block launch geometry and a context that executes a kernel closure
//! once per thread of a 2-D grid.
//!
//! ## Execution model
//!
//! ```text
//!   grid_dim.y  ──▶  batch items
//!   grid_dim.x  ──▶  blocks of `block_dim.x` elements
//!
//!   ┌────────┬────────┬────────┐
//!   │ (0,0)  │ (1,0)  │ (2,0)  │   batch 0
//!   ├────────┼────────┼────────┤
//!   │ (0,1)  │ (1,1)  │ (2,1)  │   batch 1
//!   └────────┴────────┴────────┘
//! ```
//!
//! Blocks are independent units of work. On a [`DeviceKind::Parallel`]
//! device they are scheduled on the rayon thread pool; on a
//! [`DeviceKind::Serial`] device they run in order on the calling thread.
//! A launch is blocking: it returns after every thread has run.
//!
//! ## Usage
//!
//! ```rust
//! use batchrot_gpu::{default_device, LaunchConfig};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let ctx = default_device().unwrap();
//! let hits = AtomicUsize::new(0);
//! let config = LaunchConfig::for_2d(1000, 3, 256, 1);
//! ctx.launch("count", config, |item| {
//!     if item.global_x() < 1000 {
//!         hits.fetch_add(1, Ordering::Relaxed);
//!     }
//! })
//! .unwrap();
//! assert_eq!(hits.into_inner(), 3000);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod context;
pub mod device;
pub mod kernel;

use thiserror::Error;

pub use context::GpuContext;
pub use device::{DeviceId, DeviceInfo, DeviceKind};
pub use kernel::{LaunchConfig, WorkItem};

/// Errors that can occur during launches.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GpuError {
    /// No devices available.
    #[error("no devices available")]
    NoDevicesAvailable,

    /// Invalid device ID.
    #[error("invalid device ID: {0}")]
    InvalidDevice(DeviceId),

    /// Launch geometry rejected by the device.
    #[error("invalid launch configuration: {0}")]
    InvalidConfig(String),

    /// A kernel failed while executing.
    #[error("kernel launch failed: {0}")]
    LaunchError(String),
}

/// Result type for launch operations.
pub type GpuResult<T> = Result<T, GpuError>;

/// Enumerate the available devices.
///
/// Device 0 is the parallel host device and device 1 the serial one; both
/// are always present.
#[must_use]
pub fn available_devices() -> Vec<DeviceInfo> {
    vec![DeviceInfo::parallel(), DeviceInfo::serial()]
}

/// Select a device and create a context for it.
///
/// # Errors
///
/// Returns `GpuError::InvalidDevice` if the device ID is not valid.
pub fn select_device(id: DeviceId) -> GpuResult<GpuContext> {
    let devices = available_devices();

    if id.0 as usize >= devices.len() {
        return Err(GpuError::InvalidDevice(id));
    }

    GpuContext::new(id)
}

/// Select the default device.
///
/// # Errors
///
/// Returns `GpuError::NoDevicesAvailable` if no devices are detected.
pub fn default_device() -> GpuResult<GpuContext> {
    let devices = available_devices();

    if devices.is_empty() {
        return Err(GpuError::NoDevicesAvailable);
    }

    select_device(DeviceId(0))
}

/// Select the first device of the given kind.
///
/// # Errors
///
/// Returns `GpuError::NoDevicesAvailable` if no device of that kind exists.
pub fn device_of_kind(kind: DeviceKind) -> GpuResult<GpuContext> {
    available_devices()
        .into_iter()
        .find(|d| d.kind == kind)
        .map(GpuContext::from_info)
        .ok_or(GpuError::NoDevicesAvailable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_enumeration() {
        let devices = available_devices();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].kind, DeviceKind::Parallel);
        assert_eq!(devices[1].kind, DeviceKind::Serial);
    }

    #[test]
    fn test_select_invalid_device() {
        let err = select_device(DeviceId(7)).unwrap_err();
        assert_eq!(err, GpuError::InvalidDevice(DeviceId(7)));
    }

    #[test]
    fn test_device_of_kind() {
        let ctx = device_of_kind(DeviceKind::Serial).unwrap();
        assert_eq!(ctx.device().kind, DeviceKind::Serial);
    }

    #[test]
    fn test_error_display() {
        let err = GpuError::InvalidConfig("grid y 70000 exceeds 65535".to_string());
        assert!(err.to_string().contains("70000"));

        let err = GpuError::InvalidDevice(DeviceId(3));
        assert!(err.to_string().contains("DEV:3"));
    }
}
