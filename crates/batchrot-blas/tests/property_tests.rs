//! Property tests for batched rotations
//!
//! Random shapes, increments and values; every element is compared with a
//! scalar reference evaluation of the rotation.

use batchrot_blas::{rot_batched_slices, Handle, RotationScalars};
use batchrot_numeric::Complex64;
use proptest::prelude::*;

fn offset(i: usize, n: usize, inc: i32) -> usize {
    let step = inc.unsigned_abs() as usize;
    if inc >= 0 {
        i * step
    } else {
        (n - 1 - i) * step
    }
}

fn len_for(n: usize, inc: i32) -> usize {
    1 + (n - 1) * inc.unsigned_abs() as usize
}

fn nonzero_inc() -> impl Strategy<Value = i32> {
    prop_oneof![-4i32..=-1, 1i32..=4]
}

fn shape() -> impl Strategy<Value = (usize, i32, i32, usize)> {
    (1usize..80, nonzero_inc(), nonzero_inc(), 1usize..6)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Real rotation matches the scalar formula at every logical index.
    #[test]
    fn drot_matches_reference(
        (n, incx, incy, batches) in shape(),
        theta in 0.0f64..std::f64::consts::TAU,
        seed in any::<u64>(),
    ) {
        let handle = Handle::new().unwrap();
        let (c, s) = (theta.cos(), theta.sin());
        #[allow(clippy::cast_precision_loss)]
        let gen = |b: usize, i: usize, k: u64| {
            let h = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add((b * 977 + i) as u64 + k);
            ((h >> 11) as f64 / (1u64 << 53) as f64) * 20.0 - 10.0
        };

        let mut xs: Vec<Vec<f64>> = (0..batches)
            .map(|b| (0..len_for(n, incx)).map(|i| gen(b, i, 1)).collect())
            .collect();
        let mut ys: Vec<Vec<f64>> = (0..batches)
            .map(|b| (0..len_for(n, incy)).map(|i| gen(b, i, 2)).collect())
            .collect();
        let (x0, y0) = (xs.clone(), ys.clone());

        {
            let mut x: Vec<&mut [f64]> = xs.iter_mut().map(Vec::as_mut_slice).collect();
            let mut y: Vec<&mut [f64]> = ys.iter_mut().map(Vec::as_mut_slice).collect();
            let scalars = RotationScalars::Shared { c, s };
            let n = i32::try_from(n).unwrap();
            prop_assert!(rot_batched_slices(&handle, n, &mut x, incx, &mut y, incy, &scalars).is_ok());
        }

        for b in 0..batches {
            for i in 0..n {
                let (ox, oy) = (offset(i, n, incx), offset(i, n, incy));
                let want_x = c * x0[b][ox] + s * y0[b][oy];
                let want_y = c * y0[b][oy] - s * x0[b][ox];
                prop_assert!((xs[b][ox] - want_x).abs() < 1e-12);
                prop_assert!((ys[b][oy] - want_y).abs() < 1e-12);
            }
        }
    }

    // A unitary rotation preserves |x_i|^2 + |y_i|^2 for complex data.
    #[test]
    fn zrot_preserves_pair_norm(
        (n, incx, incy, batches) in shape(),
        theta in 0.0f64..std::f64::consts::TAU,
        phase in 0.0f64..std::f64::consts::TAU,
        re in -5.0f64..5.0,
        im in -5.0f64..5.0,
    ) {
        let handle = Handle::new().unwrap();
        let c = theta.cos();
        let s = Complex64::from_polar(theta.sin(), phase);

        #[allow(clippy::cast_precision_loss)]
        let value = |b: usize, i: usize| Complex64::new(re + i as f64 * 0.25, im - b as f64);
        let mut xs: Vec<Vec<Complex64>> = (0..batches)
            .map(|b| (0..len_for(n, incx)).map(|i| value(b, i)).collect())
            .collect();
        let mut ys: Vec<Vec<Complex64>> = (0..batches)
            .map(|b| (0..len_for(n, incy)).map(|i| value(b + 3, i).conj()).collect())
            .collect();
        let (x0, y0) = (xs.clone(), ys.clone());

        {
            let mut x: Vec<&mut [Complex64]> = xs.iter_mut().map(Vec::as_mut_slice).collect();
            let mut y: Vec<&mut [Complex64]> = ys.iter_mut().map(Vec::as_mut_slice).collect();
            let scalars = RotationScalars::Shared { c, s };
            let n = i32::try_from(n).unwrap();
            prop_assert!(rot_batched_slices(&handle, n, &mut x, incx, &mut y, incy, &scalars).is_ok());
        }

        for b in 0..batches {
            for i in 0..n {
                let (ox, oy) = (offset(i, n, incx), offset(i, n, incy));
                let before = x0[b][ox].norm_sqr() + y0[b][oy].norm_sqr();
                let after = xs[b][ox].norm_sqr() + ys[b][oy].norm_sqr();
                prop_assert!((before - after).abs() < 1e-9 * before.max(1.0));
            }
        }
    }

    // Elements between strided positions are never written.
    #[test]
    fn padding_is_untouched(
        n in 1usize..40,
        incx in nonzero_inc(),
        theta in 0.0f64..std::f64::consts::TAU,
    ) {
        let handle = Handle::new().unwrap();
        let step = incx.unsigned_abs() as usize;
        let mut xb = vec![f32::NAN; len_for(n, incx)];
        for i in 0..n {
            xb[i * step] = 1.0;
        }
        let mut yb = vec![2.0f32; n];

        {
            let mut x: Vec<&mut [f32]> = vec![&mut xb];
            let mut y: Vec<&mut [f32]> = vec![&mut yb];
            #[allow(clippy::cast_possible_truncation)]
            let scalars = RotationScalars::Shared { c: theta.cos() as f32, s: theta.sin() as f32 };
            let n = i32::try_from(n).unwrap();
            prop_assert!(rot_batched_slices(&handle, n, &mut x, incx, &mut y, 1, &scalars).is_ok());
        }

        for (k, v) in xb.iter().enumerate() {
            prop_assert_eq!(k % step == 0, !v.is_nan(), "index {}", k);
        }
    }
}
