//! Caller-visible status codes and the boundary adapter.
//!
//! Internally the pipeline returns [`BlasResult`]; at every external entry
//! point [`status_boundary`] turns the result into a [`Status`] and
//! contains any panic so it never unwinds into foreign code.

use crate::check_numerics::CheckPhase;
use crate::{BlasError, BlasResult};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Status returned by every entry point.
#[repr(C)]
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// The call completed.
    Success = 0,
    /// The execution context is missing or unusable.
    InvalidHandle = 1,
    /// A required pointer is null while there is work to do.
    InvalidPointer = 2,
    /// A size, increment or buffer length is inconsistent.
    InvalidSize = 3,
    /// Numeric checking found NaN or infinity in the inputs.
    NonFiniteInput = 4,
    /// Numeric checking found NaN or infinity in the outputs.
    NonFiniteOutput = 5,
    /// The execution substrate failed during compute.
    InternalError = 6,
}

impl Status {
    /// Whether this is [`Status::Success`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Stable string name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "batchrot_status_success",
            Self::InvalidHandle => "batchrot_status_invalid_handle",
            Self::InvalidPointer => "batchrot_status_invalid_pointer",
            Self::InvalidSize => "batchrot_status_invalid_size",
            Self::NonFiniteInput => "batchrot_status_non_finite_input",
            Self::NonFiniteOutput => "batchrot_status_non_finite_output",
            Self::InternalError => "batchrot_status_internal_error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&BlasError> for Status {
    fn from(err: &BlasError) -> Self {
        match err {
            BlasError::InvalidHandle => Self::InvalidHandle,
            BlasError::NullPointer { .. } | BlasError::NullBatchPointer { .. } => {
                Self::InvalidPointer
            }
            BlasError::ZeroIncrement { .. }
            | BlasError::BatchCountMismatch { .. }
            | BlasError::BufferTooShort { .. } => Self::InvalidSize,
            BlasError::NonFinite { phase, .. } => match phase {
                CheckPhase::Input => Self::NonFiniteInput,
                CheckPhase::Output => Self::NonFiniteOutput,
            },
            BlasError::Gpu(_) | BlasError::Config(_) => Self::InternalError,
        }
    }
}

impl<T> From<BlasResult<T>> for Status {
    fn from(result: BlasResult<T>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(ref err) => Self::from(err),
        }
    }
}

/// Run `f` and translate its outcome into a [`Status`].
///
/// Errors map through `Status::from`; a panic anywhere inside `f` becomes
/// [`Status::InternalError`].
pub fn status_boundary<F>(f: F) -> Status
where
    F: FnOnce() -> BlasResult<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => Status::Success,
        Ok(Err(err)) => {
            let status = Status::from(&err);
            tracing::debug!(error = %err, %status, "call failed");
            status
        }
        Err(_) => {
            tracing::error!("panic caught at the entry point boundary");
            Status::InternalError
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check_numerics::NumericsSummary;
    use batchrot_gpu::GpuError;

    #[test]
    fn test_status_codes_are_stable() {
        assert_eq!(Status::Success as i32, 0);
        assert_eq!(Status::InvalidHandle as i32, 1);
        assert_eq!(Status::InvalidPointer as i32, 2);
        assert_eq!(Status::InvalidSize as i32, 3);
        assert_eq!(Status::NonFiniteInput as i32, 4);
        assert_eq!(Status::NonFiniteOutput as i32, 5);
        assert_eq!(Status::InternalError as i32, 6);
    }

    #[test]
    fn test_error_mapping() {
        assert_eq!(Status::from(&BlasError::InvalidHandle), Status::InvalidHandle);
        assert_eq!(
            Status::from(&BlasError::NullPointer { arg: "c" }),
            Status::InvalidPointer
        );
        assert_eq!(
            Status::from(&BlasError::ZeroIncrement { arg: "incx" }),
            Status::InvalidSize
        );
        assert_eq!(
            Status::from(&BlasError::Gpu(GpuError::LaunchError("x".into()))),
            Status::InternalError
        );

        let summary = NumericsSummary {
            nan: 1,
            inf: 0,
            zero: 0,
        };
        let input = BlasError::NonFinite {
            phase: CheckPhase::Input,
            vector: "x",
            summary,
        };
        let output = BlasError::NonFinite {
            phase: CheckPhase::Output,
            vector: "y",
            summary,
        };
        assert_eq!(Status::from(&input), Status::NonFiniteInput);
        assert_eq!(Status::from(&output), Status::NonFiniteOutput);
    }

    #[test]
    fn test_boundary_passes_results_through() {
        assert_eq!(status_boundary(|| Ok(())), Status::Success);
        assert_eq!(
            status_boundary(|| Err(BlasError::NullPointer { arg: "x" })),
            Status::InvalidPointer
        );
    }

    #[test]
    fn test_boundary_contains_panics() {
        let status = status_boundary(|| panic!("unexpected failure"));
        assert_eq!(status, Status::InternalError);
    }

    #[test]
    fn test_status_from_result() {
        let ok: BlasResult<u32> = Ok(3);
        assert!(Status::from(ok).is_success());
        assert_eq!(Status::InvalidSize.to_string(), "batchrot_status_invalid_size");
    }
}
