//! NaN and infinity scans over batched vectors.
//!
//! A scan only reads. Whether a non-finite result is merely reported or
//! ends the call is decided by the handle's
//! [`CheckNumericsMode`](crate::CheckNumericsMode).

use crate::handle::{CheckNumericsMode, Handle};
use crate::rot::{for_each_batch_chunk, BatchDescriptor, BatchedVectors};
use crate::{BlasError, BlasResult};
use batchrot_gpu::{GpuContext, GpuResult, LaunchConfig};
use batchrot_numeric::Element;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Threads per block for scans.
pub const CHECK_BLOCK_SIZE: u32 = 256;

/// Whether a scan runs before or after the rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckPhase {
    /// Before compute.
    Input,
    /// After compute.
    Output,
}

impl fmt::Display for CheckPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Input => "input",
            Self::Output => "output",
        })
    }
}

/// Classification counts gathered by one scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NumericsSummary {
    /// Elements that are NaN (either component, for complex).
    pub nan: u64,
    /// Elements that are infinite.
    pub inf: u64,
    /// Elements equal to zero.
    pub zero: u64,
}

impl NumericsSummary {
    /// Whether the scan found NaN or infinity.
    #[must_use]
    pub const fn has_non_finite(&self) -> bool {
        self.nan > 0 || self.inf > 0
    }

    /// The verdict for this summary.
    #[must_use]
    pub const fn outcome(&self) -> ValidationOutcome {
        if self.has_non_finite() {
            ValidationOutcome::ContainsNonFinite
        } else {
            ValidationOutcome::Clean
        }
    }
}

impl fmt::Display for NumericsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} NaN, {} inf, {} zero", self.nan, self.inf, self.zero)
    }
}

/// Verdict of a scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValidationOutcome {
    /// Every element is finite.
    Clean,
    /// At least one element is NaN or infinite.
    ContainsNonFinite,
}

/// Count NaN, infinite and zero elements over the first `batch_count` batch
/// items of `x`, `n` logical elements each.
///
/// # Errors
///
/// Returns the launch error if the device rejects or fails the scan.
pub fn check_numerics_vector<T: Element>(
    ctx: &GpuContext,
    label: &str,
    n: i32,
    x: &BatchedVectors<'_, T>,
    batch_count: i32,
    phase: CheckPhase,
) -> GpuResult<NumericsSummary> {
    let desc = BatchDescriptor {
        n,
        incx: 0,
        incy: 0,
        batch_count,
    };
    if desc.is_empty() {
        return Ok(NumericsSummary::default());
    }
    let n = desc.len();

    let nan = AtomicU64::new(0);
    let inf = AtomicU64::new(0);
    let zero = AtomicU64::new(0);

    for_each_batch_chunk(ctx, desc.batches(), |first, chunk| {
        let config = LaunchConfig::for_2d(n, chunk, CHECK_BLOCK_SIZE, 1);
        ctx.launch("check_numerics", config, |item| {
            let i = item.global_x();
            if i >= n {
                return;
            }
            // SAFETY: indices are in range and scans never run alongside a
            // writer of the same vectors.
            let value = unsafe { x.read(first + item.global_y(), i, n) };
            if value.is_nan_value() {
                nan.fetch_add(1, Ordering::Relaxed);
            } else if value.is_inf_value() {
                inf.fetch_add(1, Ordering::Relaxed);
            } else if value.is_zero_value() {
                zero.fetch_add(1, Ordering::Relaxed);
            }
        })
    })?;

    let summary = NumericsSummary {
        nan: nan.into_inner(),
        inf: inf.into_inner(),
        zero: zero.into_inner(),
    };
    tracing::trace!(label, %phase, %summary, "numeric scan");
    Ok(summary)
}

/// Scan `x` and then `y` and apply the handle's checking policy.
///
/// Does nothing when checking is off.
///
/// # Errors
///
/// With [`CheckNumericsMode::FAIL`] set, returns [`BlasError::NonFinite`]
/// for the first vector found to contain NaN or infinity. Launch failures
/// are returned as [`BlasError::Gpu`].
pub fn rot_check_numerics<T: Element>(
    handle: &Handle,
    function: &str,
    n: i32,
    x: &BatchedVectors<'_, T>,
    y: &BatchedVectors<'_, T>,
    batch_count: i32,
    phase: CheckPhase,
) -> BlasResult<()> {
    let mode = handle.check_numerics();
    if !mode.is_enabled() {
        return Ok(());
    }

    for (vector, data) in [("x", x), ("y", y)] {
        let summary = check_numerics_vector(handle.context(), function, n, data, batch_count, phase)?;

        if mode.contains(CheckNumericsMode::INFO) {
            tracing::info!(function, vector, %phase, %summary, "check numerics");
        }
        if summary.outcome() == ValidationOutcome::ContainsNonFinite {
            if mode.contains(CheckNumericsMode::WARN) {
                tracing::warn!(function, vector, %phase, %summary, "non-finite values found");
            }
            if mode.contains(CheckNumericsMode::FAIL) {
                return Err(BlasError::NonFinite {
                    phase,
                    vector,
                    summary,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use batchrot_gpu::{default_device, DeviceInfo};
    use batchrot_numeric::Complex64;

    #[test]
    fn test_summary_counts() {
        let ctx = default_device().unwrap();
        // Logical [1, NaN, 0, inf] stored with increment -2.
        let mut buf = [f64::INFINITY, 9.0, 0.0, 9.0, f64::NAN, 9.0, 1.0];
        let mut other = [f64::NEG_INFINITY; 4];
        let ptrs = [buf.as_mut_ptr(), other.as_mut_ptr()];
        let x = unsafe { BatchedVectors::new(&ptrs, -2) };

        let summary = check_numerics_vector(&ctx, "x", 4, &x, 1, CheckPhase::Input).unwrap();
        assert_eq!(
            summary,
            NumericsSummary {
                nan: 1,
                inf: 1,
                zero: 1
            },
            "only batch item 0 is scanned"
        );
        assert_eq!(summary.outcome(), ValidationOutcome::ContainsNonFinite);
    }

    #[test]
    fn test_clean_complex_vector() {
        let ctx = GpuContext::from_info(DeviceInfo::serial().with_max_grid_dim((64, 1, 1)));
        let mut a = [Complex64::new(1.0, 2.0), Complex64::new(0.0, 0.0)];
        let mut b = [Complex64::new(3.0, -1.0), Complex64::new(0.5, 0.5)];
        let ptrs = [a.as_mut_ptr(), b.as_mut_ptr()];
        let x = unsafe { BatchedVectors::new(&ptrs, 1) };

        let summary = check_numerics_vector(&ctx, "x", 2, &x, 2, CheckPhase::Output).unwrap();
        assert_eq!(summary.zero, 1);
        assert_eq!(summary.outcome(), ValidationOutcome::Clean);
        assert_eq!(ctx.launch_count(), 2, "one launch per batch item with grid-y 1");
    }

    #[test]
    fn test_policy() {
        let mut handle = Handle::new().unwrap();
        let mut xb = [1.0f32, 2.0];
        let mut yb = [f32::NAN, 2.0];
        let xp = [xb.as_mut_ptr()];
        let yp = [yb.as_mut_ptr()];
        let x = unsafe { BatchedVectors::new(&xp, 1) };
        let y = unsafe { BatchedVectors::new(&yp, 1) };

        rot_check_numerics(&handle, "srot_batched", 2, &x, &y, 1, CheckPhase::Input).unwrap();

        handle.set_check_numerics(CheckNumericsMode::WARN);
        rot_check_numerics(&handle, "srot_batched", 2, &x, &y, 1, CheckPhase::Input).unwrap();

        handle.set_check_numerics(CheckNumericsMode::FAIL);
        let err = rot_check_numerics(&handle, "srot_batched", 2, &x, &y, 1, CheckPhase::Output)
            .unwrap_err();
        match err {
            BlasError::NonFinite {
                phase,
                vector,
                summary,
            } => {
                assert_eq!(phase, CheckPhase::Output);
                assert_eq!(vector, "y");
                assert_eq!(summary.nan, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_summary_display() {
        let summary = NumericsSummary {
            nan: 2,
            inf: 0,
            zero: 5,
        };
        assert_eq!(summary.to_string(), "2 NaN, 0 inf, 5 zero");
        assert_eq!(CheckPhase::Input.to_string(), "input");
    }
}
