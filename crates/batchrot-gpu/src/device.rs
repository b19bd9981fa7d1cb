//! Device enumeration and information.
//!
//! # Device Discovery
//!
//! ```rust
//! let devices = batchrot_gpu::available_devices();
//!
//! for device in &devices {
//!     println!("{}: {} ({} compute units)", device.id, device.name, device.compute_units);
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique identifier for a device.
///
/// Device IDs are assigned based on the order devices are enumerated
/// and are stable within a single program execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub u32);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DEV:{}", self.0)
    }
}

/// How a device executes the blocks of a launch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Blocks run concurrently on the rayon thread pool.
    #[default]
    Parallel,
    /// Blocks run in grid order on the calling thread.
    Serial,
}

impl DeviceKind {
    /// Get the display name for this device kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Parallel => "parallel",
            Self::Serial => "serial",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Information about a device.
///
/// The limits mirror those of common accelerators so that launch
/// geometry valid here is also valid on real hardware.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device identifier.
    pub id: DeviceId,

    /// How blocks are executed.
    pub kind: DeviceKind,

    /// Human-readable device name.
    pub name: String,

    /// Maximum threads per block.
    pub max_threads_per_block: u32,

    /// Maximum block dimensions (x, y, z).
    pub max_block_dim: (u32, u32, u32),

    /// Maximum grid dimensions (x, y, z).
    pub max_grid_dim: (u32, u32, u32),

    /// Number of workers blocks are spread over.
    pub compute_units: u32,
}

impl DeviceInfo {
    /// The parallel host device.
    #[must_use]
    pub fn parallel() -> Self {
        let workers = u32::try_from(rayon::current_num_threads()).unwrap_or(u32::MAX);
        Self {
            id: DeviceId(0),
            kind: DeviceKind::Parallel,
            name: "Host (rayon)".to_string(),
            compute_units: workers.max(1),
            ..Self::limits()
        }
    }

    /// The serial host device.
    #[must_use]
    pub fn serial() -> Self {
        Self {
            id: DeviceId(1),
            kind: DeviceKind::Serial,
            name: "Host (serial)".to_string(),
            compute_units: 1,
            ..Self::limits()
        }
    }

    fn limits() -> Self {
        Self {
            id: DeviceId(0),
            kind: DeviceKind::Parallel,
            name: String::new(),
            max_threads_per_block: 1024,
            max_block_dim: (1024, 1024, 64),
            max_grid_dim: (2_147_483_647, 65535, 65535),
            compute_units: 1,
        }
    }

    /// Override the maximum grid dimensions.
    #[must_use]
    pub fn with_max_grid_dim(mut self, dims: (u32, u32, u32)) -> Self {
        self.max_grid_dim = dims;
        self
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {} compute units)",
            self.name, self.kind, self.compute_units
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_display() {
        let id = DeviceId(3);
        assert_eq!(format!("{}", id), "DEV:3");
    }

    #[test]
    fn test_device_kind_name() {
        assert_eq!(DeviceKind::Parallel.name(), "parallel");
        assert_eq!(DeviceKind::Serial.to_string(), "serial");
        assert_eq!(DeviceKind::default(), DeviceKind::Parallel);
    }

    #[test]
    fn test_host_devices() {
        let parallel = DeviceInfo::parallel();
        assert_eq!(parallel.id, DeviceId(0));
        assert!(parallel.compute_units >= 1);

        let serial = DeviceInfo::serial();
        assert_eq!(serial.id, DeviceId(1));
        assert_eq!(serial.compute_units, 1);
        assert_eq!(serial.max_grid_dim, parallel.max_grid_dim);
    }

    #[test]
    fn test_kind_serde() {
        let kind: DeviceKind = serde_json::from_str("\"serial\"").unwrap();
        assert_eq!(kind, DeviceKind::Serial);
        assert_eq!(serde_json::to_string(&DeviceKind::Parallel).unwrap(), "\"parallel\"");
    }
}
