//! # batchrot BLAS routines
//!
//! Batched Givens rotations: for every batch item `b` and every logical
//! index `i < n`,
//!
//! ```text
//! x[b][i] = c * x[b][i] + s * y[b][i]
//! y[b][i] = c * y[b][i] - conj(s) * x[b][i]      (right-hand sides: values before the call)
//! ```
//!
//! over strided vectors whose increments may be negative.
//!
//! ## Call pipeline
//!
//! ```text
//!  entry point ──▶ handle check ──▶ size query? ──▶ logging ──▶ argument checks
//!                                       │                          │
//!                                    success                   zero work? ──▶ success
//!                                                                  │
//!           status ◀── post-check ◀── rotation kernel ◀── pre-check
//! ```
//!
//! The pre- and post-checks scan both vectors for NaN and infinity and run
//! only when numeric checking is enabled on the [`Handle`].
//!
//! ## Entry points
//!
//! - [`rot_batched`]: generic C-shaped entry point over pointer arrays,
//!   instantiated by the six `extern "C"` symbols in [`ffi`].
//! - [`rot_batched_slices`]: safe entry point over borrowed slices, which
//!   also accepts one (cosine, sine) pair per batch item.
//!
//! ```rust
//! use batchrot_blas::{rot_batched_slices, Handle, RotationScalars};
//!
//! let handle = Handle::new().unwrap();
//! let mut x0 = vec![1.0f64, 2.0];
//! let mut y0 = vec![3.0f64, 4.0];
//! let mut x: Vec<&mut [f64]> = vec![&mut x0];
//! let mut y: Vec<&mut [f64]> = vec![&mut y0];
//!
//! let scalars = RotationScalars::Shared { c: 0.0, s: 1.0 };
//! rot_batched_slices(&handle, 2, &mut x, 1, &mut y, 1, &scalars).unwrap();
//!
//! assert_eq!(x0, [3.0, 4.0]);
//! assert_eq!(y0, [-1.0, -2.0]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod check_numerics;
pub mod config;
pub mod ffi;
pub mod handle;
pub mod logging;
pub mod rot;
pub mod rot_batched;
pub mod status;

use batchrot_gpu::GpuError;
use thiserror::Error;

pub use check_numerics::{
    check_numerics_vector, rot_check_numerics, CheckPhase, NumericsSummary, ValidationOutcome,
};
pub use config::{ConfigError, HandleConfig};
pub use handle::{CheckNumericsMode, Handle, LayerMode};
pub use logging::{LogRecord, LogSink, MemorySink, ProfileKey, TracingSink};
pub use rot::{rot_template, BatchDescriptor, BatchedVectors, RotationScalars, ROT_BLOCK_SIZE};
pub use rot_batched::{rot_batched, rot_batched_slices};
pub use status::{status_boundary, Status};

/// Errors produced by the rotation pipeline.
///
/// Every variant maps onto one [`Status`] through `Status::from`.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum BlasError {
    /// No handle was supplied.
    #[error("invalid or missing handle")]
    InvalidHandle,

    /// A required pointer argument is null.
    #[error("null pointer for argument '{arg}'")]
    NullPointer {
        /// Argument name.
        arg: &'static str,
    },

    /// One batch item's buffer pointer is null.
    #[error("null pointer for argument '{arg}' at batch item {batch}")]
    NullBatchPointer {
        /// Argument name.
        arg: &'static str,
        /// Batch item index.
        batch: usize,
    },

    /// An increment is zero while there is work to do.
    #[error("increment '{arg}' must be nonzero when n > 0")]
    ZeroIncrement {
        /// Argument name.
        arg: &'static str,
    },

    /// An array does not hold exactly one entry per batch item.
    #[error("'{arg}' holds {actual} batch entries, expected {expected}")]
    BatchCountMismatch {
        /// Argument name.
        arg: &'static str,
        /// Required entry count.
        expected: usize,
        /// Supplied entry count.
        actual: usize,
    },

    /// A buffer is shorter than `n` and its increment require.
    #[error("buffer '{arg}' of batch item {batch} holds {actual} elements, {required} required")]
    BufferTooShort {
        /// Argument name.
        arg: &'static str,
        /// Batch item index.
        batch: usize,
        /// Minimum element count.
        required: usize,
        /// Supplied element count.
        actual: usize,
    },

    /// Numeric checking found NaN or infinite values.
    #[error("non-finite values in '{vector}' on {phase}: {summary}")]
    NonFinite {
        /// Whether the scan ran before or after the rotation.
        phase: CheckPhase,
        /// Which vector array contained them.
        vector: &'static str,
        /// Counts gathered by the scan.
        summary: NumericsSummary,
    },

    /// The execution substrate failed.
    #[error("device error: {0}")]
    Gpu(#[from] GpuError),

    /// Handle configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for the rotation pipeline.
pub type BlasResult<T> = Result<T, BlasError>;
