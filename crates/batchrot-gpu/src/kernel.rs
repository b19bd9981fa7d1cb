//! Launch geometry.
//!
//! Kernels are launched over a grid of blocks, each block holding
//! `block_dim` threads:
//!
//! ```rust
//! use batchrot_gpu::LaunchConfig;
//!
//! // 10_000 elements per row, 8 rows, 512 threads per block
//! let config = LaunchConfig::for_2d(10_000, 8, 512, 1);
//! assert_eq!(config.grid_dim, (20, 8, 1));
//! ```

use crate::device::DeviceInfo;
use crate::{GpuError, GpuResult};
use serde::{Deserialize, Serialize};

/// Launch configuration for kernel execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Grid dimensions (blocks in x, y, z).
    pub grid_dim: (u32, u32, u32),
    /// Block dimensions (threads in x, y, z).
    pub block_dim: (u32, u32, u32),
}

fn blocks_for(extent: usize, block: u32) -> u32 {
    u32::try_from(extent.div_ceil(block.max(1) as usize)).unwrap_or(u32::MAX)
}

impl LaunchConfig {
    /// Create a 1D launch configuration for a given number of elements.
    #[must_use]
    pub fn for_elements(n: usize, block_size: u32) -> Self {
        Self {
            grid_dim: (blocks_for(n, block_size), 1, 1),
            block_dim: (block_size, 1, 1),
        }
    }

    /// Create a 2D launch configuration.
    #[must_use]
    pub fn for_2d(width: usize, height: usize, block_x: u32, block_y: u32) -> Self {
        Self {
            grid_dim: (blocks_for(width, block_x), blocks_for(height, block_y), 1),
            block_dim: (block_x, block_y, 1),
        }
    }

    /// Get total number of threads.
    #[must_use]
    pub const fn total_threads(&self) -> u64 {
        self.total_blocks() * self.threads_per_block() as u64
    }

    /// Get total number of blocks.
    #[must_use]
    pub const fn total_blocks(&self) -> u64 {
        (self.grid_dim.0 as u64) * (self.grid_dim.1 as u64) * (self.grid_dim.2 as u64)
    }

    /// Get threads per block.
    #[must_use]
    pub const fn threads_per_block(&self) -> u32 {
        self.block_dim.0 * self.block_dim.1 * self.block_dim.2
    }

    /// Check this configuration against a device's limits.
    ///
    /// # Errors
    ///
    /// Returns `GpuError::InvalidConfig` for zero dimensions or dimensions
    /// beyond the device limits.
    pub fn validate(&self, device: &DeviceInfo) -> GpuResult<()> {
        let (gx, gy, gz) = self.grid_dim;
        let (bx, by, bz) = self.block_dim;

        if gx == 0 || gy == 0 || gz == 0 || bx == 0 || by == 0 || bz == 0 {
            return Err(GpuError::InvalidConfig(format!(
                "zero dimension in grid {:?} block {:?}",
                self.grid_dim, self.block_dim
            )));
        }

        let (mgx, mgy, mgz) = device.max_grid_dim;
        if gx > mgx || gy > mgy || gz > mgz {
            return Err(GpuError::InvalidConfig(format!(
                "grid {:?} exceeds device limit {:?}",
                self.grid_dim, device.max_grid_dim
            )));
        }

        let (mbx, mby, mbz) = device.max_block_dim;
        if bx > mbx || by > mby || bz > mbz || self.threads_per_block() > device.max_threads_per_block
        {
            return Err(GpuError::InvalidConfig(format!(
                "block {:?} exceeds device limit {:?} / {} threads",
                self.block_dim, device.max_block_dim, device.max_threads_per_block
            )));
        }

        Ok(())
    }
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            grid_dim: (1, 1, 1),
            block_dim: (256, 1, 1),
        }
    }
}

/// The coordinates of one thread within a launch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkItem {
    /// Block index within the grid.
    pub block_idx: (u32, u32, u32),
    /// Thread index within the block.
    pub thread_idx: (u32, u32, u32),
    /// Block dimensions of the launch.
    pub block_dim: (u32, u32, u32),
}

impl WorkItem {
    /// Global thread index along x.
    #[inline]
    #[must_use]
    pub const fn global_x(&self) -> usize {
        self.block_idx.0 as usize * self.block_dim.0 as usize + self.thread_idx.0 as usize
    }

    /// Global thread index along y.
    #[inline]
    #[must_use]
    pub const fn global_y(&self) -> usize {
        self.block_idx.1 as usize * self.block_dim.1 as usize + self.thread_idx.1 as usize
    }

    /// Global thread index along z.
    #[inline]
    #[must_use]
    pub const fn global_z(&self) -> usize {
        self.block_idx.2 as usize * self.block_dim.2 as usize + self.thread_idx.2 as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_config_1d() {
        let config = LaunchConfig::for_elements(1000, 256);
        assert_eq!(config.grid_dim, (4, 1, 1));
        assert_eq!(config.block_dim, (256, 1, 1));
        assert_eq!(config.total_threads(), 1024);
    }

    #[test]
    fn test_launch_config_2d() {
        let config = LaunchConfig::for_2d(100, 100, 16, 16);
        assert_eq!(config.grid_dim, (7, 7, 1));
        assert_eq!(config.block_dim, (16, 16, 1));
    }

    #[test]
    fn test_launch_config_threads() {
        let config = LaunchConfig {
            grid_dim: (10, 20, 1),
            block_dim: (32, 8, 1),
        };
        assert_eq!(config.total_blocks(), 200);
        assert_eq!(config.threads_per_block(), 256);
        assert_eq!(config.total_threads(), 51200);
    }

    #[test]
    fn test_validate_limits() {
        let device = DeviceInfo::parallel();
        assert!(LaunchConfig::for_2d(4096, 65535, 512, 1).validate(&device).is_ok());

        let err = LaunchConfig::for_2d(4096, 65536, 512, 1)
            .validate(&device)
            .unwrap_err();
        assert!(matches!(err, GpuError::InvalidConfig(_)));

        let err = LaunchConfig::for_elements(10, 2048).validate(&device).unwrap_err();
        assert!(err.to_string().contains("block"));
    }

    #[test]
    fn test_validate_rejects_empty_grid() {
        let device = DeviceInfo::serial();
        let config = LaunchConfig::for_2d(0, 4, 512, 1);
        assert_eq!(config.grid_dim.0, 0);
        assert!(config.validate(&device).is_err());
    }

    #[test]
    fn test_work_item_indices() {
        let item = WorkItem {
            block_idx: (3, 2, 0),
            thread_idx: (17, 0, 0),
            block_dim: (512, 1, 1),
        };
        assert_eq!(item.global_x(), 3 * 512 + 17);
        assert_eq!(item.global_y(), 2);
        assert_eq!(item.global_z(), 0);
    }
}
