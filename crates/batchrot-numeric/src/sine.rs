//! Rotation sine scalars and the element update rule.

use crate::element::{Element, Precision};
use crate::variant::RotVariant;
use num_complex::{Complex32, Complex64};
use std::fmt;
use std::ops::Neg;

/// A sine type that can rotate vectors of element type `T`.
///
/// Implemented for exactly the six supported combinations. A real sine
/// applied to complex elements behaves as a complex sine with zero
/// imaginary part, so conjugation has no effect for it.
pub trait SineScalar<T: Element>:
    Copy + Send + Sync + Neg<Output = Self> + fmt::Debug + fmt::Display + 'static
{
    /// Precision tag of the sine type.
    const PRECISION: Precision;

    /// The routine this (element, sine) pair instantiates.
    const VARIANT: RotVariant;

    /// `s * x`
    fn mul(self, x: T) -> T;

    /// `conj(s) * x`
    fn conj_mul(self, x: T) -> T;
}

macro_rules! impl_same_type_sine {
    ($t:ty, $variant:expr) => {
        impl SineScalar<$t> for $t {
            const PRECISION: Precision = <$t as Element>::PRECISION;
            const VARIANT: RotVariant = $variant;

            #[inline]
            fn mul(self, x: $t) -> $t {
                self * x
            }

            #[inline]
            fn conj_mul(self, x: $t) -> $t {
                self * x
            }
        }
    };
}

macro_rules! impl_complex_sine {
    ($t:ty, $variant:expr) => {
        impl SineScalar<$t> for $t {
            const PRECISION: Precision = <$t as Element>::PRECISION;
            const VARIANT: RotVariant = $variant;

            #[inline]
            fn mul(self, x: $t) -> $t {
                self * x
            }

            #[inline]
            fn conj_mul(self, x: $t) -> $t {
                self.conj() * x
            }
        }
    };
}

macro_rules! impl_real_sine_on_complex {
    ($t:ty, $real:ty, $variant:expr) => {
        impl SineScalar<$t> for $real {
            const PRECISION: Precision = <$real as Element>::PRECISION;
            const VARIANT: RotVariant = $variant;

            #[inline]
            fn mul(self, x: $t) -> $t {
                x * self
            }

            #[inline]
            fn conj_mul(self, x: $t) -> $t {
                x * self
            }
        }
    };
}

impl_same_type_sine!(f32, RotVariant::Srot);
impl_same_type_sine!(f64, RotVariant::Drot);
impl_complex_sine!(Complex32, RotVariant::Crot);
impl_complex_sine!(Complex64, RotVariant::Zrot);
impl_real_sine_on_complex!(Complex32, f32, RotVariant::Csrot);
impl_real_sine_on_complex!(Complex64, f64, RotVariant::Zdrot);

/// Rotate one element pair.
///
/// Returns `(c*x + s*y, c*y - conj(s)*x)`, both evaluated from the inputs
/// as given.
#[inline]
pub fn rotate<T, V>(c: T::Real, s: V, x: T, y: T) -> (T, T)
where
    T: Element,
    V: SineScalar<T>,
{
    let new_x = x.scale(c) + s.mul(y);
    let new_y = y.scale(c) - s.conj_mul(x);
    (new_x, new_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_rotation() {
        // 90 degree rotation swaps with a sign flip
        let (x, y) = rotate(0.0f64, 1.0f64, 2.0f64, 5.0f64);
        assert_eq!(x, 5.0);
        assert_eq!(y, -2.0);

        let (x, y) = rotate(0.6f32, 0.8f32, 1.0f32, 1.0f32);
        assert!((x - 1.4).abs() < 1e-6);
        assert!((y - (-0.2)).abs() < 1e-6);
    }

    #[test]
    fn test_complex_sine_conjugated_only_in_y_update() {
        let c = 0.5f64;
        let s = Complex64::new(0.0, 1.0);
        let x = Complex64::new(1.0, 0.0);
        let y = Complex64::new(2.0, 0.0);

        let (nx, ny) = rotate(c, s, x, y);

        // x' = 0.5*1 + i*2
        assert_eq!(nx, Complex64::new(0.5, 2.0));
        // y' = 0.5*2 - (-i)*1 = 1 + i
        assert_eq!(ny, Complex64::new(1.0, 1.0));
    }

    #[test]
    fn test_real_sine_on_complex_elements() {
        let x = Complex32::new(1.0, -1.0);
        let y = Complex32::new(0.0, 2.0);
        let (nx, ny) = rotate(0.0f32, 2.0f32, x, y);
        assert_eq!(nx, Complex32::new(0.0, 4.0));
        assert_eq!(ny, Complex32::new(-2.0, 2.0));
    }

    #[test]
    fn test_real_sine_matches_promoted_complex_sine() {
        let x = Complex64::new(0.3, -1.7);
        let y = Complex64::new(2.5, 0.25);
        let real = rotate(0.8f64, 0.6f64, x, y);
        let promoted = rotate(0.8f64, Complex64::new(0.6, 0.0), x, y);
        assert_eq!(real, promoted);
    }

    #[test]
    fn test_inverse_rotation_restores_inputs() {
        let (c, s) = (0.6f64, 0.8f64);
        let (x, y) = (3.25f64, -1.5f64);
        let (rx, ry) = rotate(c, s, x, y);
        let (bx, by) = rotate(c, -s, rx, ry);
        assert!((bx - x).abs() < 1e-12);
        assert!((by - y).abs() < 1e-12);
    }

    #[test]
    fn test_variant_constants() {
        assert_eq!(<f32 as SineScalar<f32>>::VARIANT, RotVariant::Srot);
        assert_eq!(<f32 as SineScalar<Complex32>>::VARIANT, RotVariant::Csrot);
        assert_eq!(<Complex64 as SineScalar<Complex64>>::VARIANT, RotVariant::Zrot);
        assert_eq!(<f64 as SineScalar<Complex64>>::PRECISION, Precision::F64Real);
    }
}
