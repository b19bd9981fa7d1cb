//! # batchrot numeric type model
//!
//! The closed set of element and rotation-scalar types that the batched
//! rotation routines are instantiated for, and the arithmetic rules each
//! combination follows.
//!
//! ## Type combinations
//!
//! | Element `T` | Sine `V`  | Routine         |
//! |-------------|-----------|-----------------|
//! | `f32`       | `f32`     | `srot_batched`  |
//! | `f64`       | `f64`     | `drot_batched`  |
//! | `Complex32` | `Complex32` | `crot_batched`  |
//! | `Complex32` | `f32`     | `csrot_batched` |
//! | `Complex64` | `Complex64` | `zrot_batched`  |
//! | `Complex64` | `f64`     | `zdrot_batched` |
//!
//! The cosine is always the real type of the element's precision.
//!
//! ## Update rule
//!
//! ```text
//! x' = c * x + s * y
//! y' = c * y - conj(s) * x
//! ```
//!
//! Both outputs are computed from the same input snapshot. Only the
//! y-update conjugates the sine, and only when the sine is complex.
//!
//! ```rust
//! use batchrot_numeric::{rotate, Complex32};
//!
//! let (x, y) = rotate(0.0f32, 1.0f32, Complex32::new(1.0, 2.0), Complex32::new(3.0, 4.0));
//! assert_eq!(x, Complex32::new(3.0, 4.0));
//! assert_eq!(y, Complex32::new(-1.0, -2.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod element;
pub mod sine;
pub mod variant;

pub use element::{Element, Precision, PrecisionParseError};
pub use num_complex::{Complex32, Complex64};
pub use sine::{rotate, SineScalar};
pub use variant::RotVariant;
