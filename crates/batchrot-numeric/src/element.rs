//! Vector element types.
//!
//! An [`Element`] is one entry of a rotated vector. Real elements are their
//! own cosine type; complex elements use the real type of the same
//! precision.

use num_complex::{Complex32, Complex64};
use num_traits::Float;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;
use thiserror::Error;

/// Storage precision of a value, as printed in bench and trace logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Precision {
    /// 32-bit real.
    #[serde(rename = "f32_r")]
    F32Real,
    /// 64-bit real.
    #[serde(rename = "f64_r")]
    F64Real,
    /// 32-bit complex (two `f32` components).
    #[serde(rename = "f32_c")]
    F32Complex,
    /// 64-bit complex (two `f64` components).
    #[serde(rename = "f64_c")]
    F64Complex,
}

impl Precision {
    /// Short name used on bench command lines (`f32_r`, `f64_c`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::F32Real => "f32_r",
            Self::F64Real => "f64_r",
            Self::F32Complex => "f32_c",
            Self::F64Complex => "f64_c",
        }
    }

    /// Whether values of this precision carry an imaginary part.
    #[must_use]
    pub const fn is_complex(self) -> bool {
        matches!(self, Self::F32Complex | Self::F64Complex)
    }

    /// The real precision with the same component width.
    #[must_use]
    pub const fn real(self) -> Self {
        match self {
            Self::F32Real | Self::F32Complex => Self::F32Real,
            Self::F64Real | Self::F64Complex => Self::F64Real,
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a precision name is not recognized.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown precision '{0}', expected one of f32_r, f64_r, f32_c, f64_c")]
pub struct PrecisionParseError(pub String);

impl FromStr for Precision {
    type Err = PrecisionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "f32_r" | "s" => Ok(Self::F32Real),
            "f64_r" | "d" => Ok(Self::F64Real),
            "f32_c" | "c" => Ok(Self::F32Complex),
            "f64_c" | "z" => Ok(Self::F64Complex),
            other => Err(PrecisionParseError(other.to_string())),
        }
    }
}

/// A vector element type.
///
/// Implemented for `f32`, `f64`, [`Complex32`] and [`Complex64`]. The set is
/// closed: the rotation routines are only instantiated for these four.
pub trait Element:
    Copy
    + Send
    + Sync
    + PartialEq
    + fmt::Debug
    + fmt::Display
    + Add<Output = Self>
    + Sub<Output = Self>
    + 'static
{
    /// The real type of the same precision (the cosine type).
    type Real: Float + Send + Sync + fmt::Debug + fmt::Display + 'static;

    /// Precision tag of this element type.
    const PRECISION: Precision;

    /// Multiply by a real scalar.
    fn scale(self, c: Self::Real) -> Self;

    /// True if any component is NaN.
    fn is_nan_value(self) -> bool;

    /// True if any component is infinite.
    fn is_inf_value(self) -> bool;

    /// True if every component is zero.
    fn is_zero_value(self) -> bool;

    /// True if every component is finite.
    fn is_finite_value(self) -> bool {
        !self.is_nan_value() && !self.is_inf_value()
    }
}

macro_rules! impl_real_element {
    ($t:ty, $precision:expr) => {
        impl Element for $t {
            type Real = $t;

            const PRECISION: Precision = $precision;

            #[inline]
            fn scale(self, c: Self::Real) -> Self {
                self * c
            }

            #[inline]
            fn is_nan_value(self) -> bool {
                self.is_nan()
            }

            #[inline]
            fn is_inf_value(self) -> bool {
                self.is_infinite()
            }

            #[inline]
            fn is_zero_value(self) -> bool {
                self == 0.0
            }
        }
    };
}

macro_rules! impl_complex_element {
    ($t:ty, $real:ty, $precision:expr) => {
        impl Element for $t {
            type Real = $real;

            const PRECISION: Precision = $precision;

            #[inline]
            fn scale(self, c: Self::Real) -> Self {
                self * c
            }

            #[inline]
            fn is_nan_value(self) -> bool {
                self.re.is_nan() || self.im.is_nan()
            }

            #[inline]
            fn is_inf_value(self) -> bool {
                self.re.is_infinite() || self.im.is_infinite()
            }

            #[inline]
            fn is_zero_value(self) -> bool {
                self.re == 0.0 && self.im == 0.0
            }
        }
    };
}

impl_real_element!(f32, Precision::F32Real);
impl_real_element!(f64, Precision::F64Real);
impl_complex_element!(Complex32, f32, Precision::F32Complex);
impl_complex_element!(Complex64, f64, Precision::F64Complex);
