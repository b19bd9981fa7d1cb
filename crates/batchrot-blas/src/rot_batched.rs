//! Batched rotation entry points.
//!
//! Both entry points run the same sequence:
//!
//! 1. handle check
//! 2. device-memory-size query: return success, nothing is touched
//! 3. logging for every enabled layer
//! 4. `n <= 0` or `batch_count <= 0`: return success
//! 5. argument checks (null pointers, zero increments, buffer lengths)
//! 6. input scan, rotation, output scan
//!
//! Logging happens before any argument is inspected, so an invalid call is
//! still logged.

use crate::check_numerics::{rot_check_numerics, CheckPhase};
use crate::handle::{Handle, LayerMode};
use crate::logging::{LogRecord, ProfileKey};
use crate::rot::{rot_template, BatchDescriptor, BatchedVectors, RotationScalars};
use crate::status::{status_boundary, Status};
use crate::{BlasError, BlasResult};
use batchrot_numeric::{Element, SineScalar};
use std::fmt;

/// # Safety
///
/// `p` must be null or valid for one read.
unsafe fn scalar_arg<P: fmt::Display>(p: *const P) -> String {
    match unsafe { p.as_ref() } {
        Some(value) => value.to_string(),
        None => "null".to_string(),
    }
}

/// Hand one record per enabled layer to the handle's sink.
fn log_call<T, V>(handle: &Handle, desc: &BatchDescriptor, trace_args: impl FnOnce() -> Vec<String>)
where
    T: Element,
    V: SineScalar<T>,
{
    let mode = handle.layer_mode();
    if mode.is_empty() {
        return;
    }

    let variant = V::VARIANT;
    let sink = handle.log_sink();

    if mode.contains(LayerMode::LOG_TRACE) {
        sink.record(LogRecord::Trace {
            function: variant.name(),
            args: trace_args(),
        });
    }
    if mode.contains(LayerMode::LOG_BENCH) {
        sink.record(LogRecord::Bench {
            a_type: variant.element_precision(),
            b_type: variant.cosine_precision(),
            c_type: variant.sine_precision(),
            n: desc.n,
            incx: desc.incx,
            incy: desc.incy,
            batch_count: desc.batch_count,
        });
    }
    if mode.contains(LayerMode::LOG_PROFILE) {
        sink.record(LogRecord::Profile(ProfileKey {
            function: variant.name(),
            n: desc.n,
            incx: desc.incx,
            incy: desc.incy,
            batch_count: desc.batch_count,
        }));
    }
}

/// Shared tail of both entry points: increment and buffer checks, then
/// scan, rotate, scan.
fn rot_batched_checked<T, V>(
    handle: &Handle,
    desc: &BatchDescriptor,
    x: &BatchedVectors<'_, T>,
    y: &BatchedVectors<'_, T>,
    scalars: &RotationScalars<'_, T::Real, V>,
) -> BlasResult<()>
where
    T: Element,
    V: SineScalar<T>,
{
    if desc.incx == 0 {
        return Err(BlasError::ZeroIncrement { arg: "incx" });
    }
    if desc.incy == 0 {
        return Err(BlasError::ZeroIncrement { arg: "incy" });
    }
    if let Some(batch) = x.first_null() {
        return Err(BlasError::NullBatchPointer { arg: "x", batch });
    }
    if let Some(batch) = y.first_null() {
        return Err(BlasError::NullBatchPointer { arg: "y", batch });
    }

    let function = V::VARIANT.name();
    rot_check_numerics(handle, function, desc.n, x, y, desc.batch_count, CheckPhase::Input)?;
    rot_template(handle.context(), desc.n, x, y, scalars, desc.batch_count)?;
    rot_check_numerics(handle, function, desc.n, x, y, desc.batch_count, CheckPhase::Output)?;
    Ok(())
}

/// Batched rotation over C-shaped arguments, returning the pipeline error.
///
/// # Safety
///
/// See [`rot_batched`].
#[allow(clippy::too_many_arguments)]
pub(crate) unsafe fn rot_batched_impl<T, V>(
    handle: Option<&Handle>,
    n: i32,
    x: *const *mut T,
    incx: i32,
    y: *const *mut T,
    incy: i32,
    c: *const T::Real,
    s: *const V,
    batch_count: i32,
) -> BlasResult<()>
where
    T: Element,
    V: SineScalar<T>,
{
    let handle = handle.ok_or(BlasError::InvalidHandle)?;
    if handle.is_device_memory_size_query() {
        return Ok(());
    }

    let desc = BatchDescriptor {
        n,
        incx,
        incy,
        batch_count,
    };
    log_call::<T, V>(handle, &desc, || {
        // SAFETY: non-null scalar pointers are valid for reads by this
        // function's contract.
        let (c, s) = unsafe { (scalar_arg(c), scalar_arg(s)) };
        vec![
            n.to_string(),
            format!("{x:p}"),
            incx.to_string(),
            format!("{y:p}"),
            incy.to_string(),
            c,
            s,
            batch_count.to_string(),
        ]
    });

    if desc.is_empty() {
        return Ok(());
    }
    if x.is_null() {
        return Err(BlasError::NullPointer { arg: "x" });
    }
    if y.is_null() {
        return Err(BlasError::NullPointer { arg: "y" });
    }
    if c.is_null() {
        return Err(BlasError::NullPointer { arg: "c" });
    }
    if s.is_null() {
        return Err(BlasError::NullPointer { arg: "s" });
    }

    let batches = desc.batches();
    // SAFETY: the caller guarantees that non-null `x`, `y`, `c` and `s` are
    // valid for `batch_count` pointer reads and one scalar read respectively,
    // and that the buffers they address satisfy `BatchedVectors::new`.
    let (x, y, scalars) = unsafe {
        (
            BatchedVectors::new(std::slice::from_raw_parts(x, batches), i64::from(incx)),
            BatchedVectors::new(std::slice::from_raw_parts(y, batches), i64::from(incy)),
            RotationScalars::Shared {
                c: c.read(),
                s: s.read(),
            },
        )
    };
    rot_batched_checked(handle, &desc, &x, &y, &scalars)
}

/// Apply the rotation `(c, s)` to `batch_count` vector pairs.
///
/// For each batch item `b` and logical index `i < n`:
///
/// ```text
/// x[b][i] = c * x[b][i] + s * y[b][i]
/// y[b][i] = c * y[b][i] - conj(s) * x[b][i]
/// ```
///
/// with both right-hand sides taken from the values before the call.
/// Never panics or unwinds; every outcome is a [`Status`].
///
/// # Safety
///
/// `handle` must be null or point to a live [`Handle`]. When `n > 0` and
/// `batch_count > 0`, each of `x` and `y` must be null or point to
/// `batch_count` buffer pointers; each non-null buffer must be valid for
/// reads and writes of `1 + (n - 1) * |inc|` elements and must not overlap
/// any other buffer of the call; `c` and `s` must be null or valid for
/// one read.
#[allow(clippy::too_many_arguments)]
pub unsafe fn rot_batched<T, V>(
    handle: *const Handle,
    n: i32,
    x: *const *mut T,
    incx: i32,
    y: *const *mut T,
    incy: i32,
    c: *const T::Real,
    s: *const V,
    batch_count: i32,
) -> Status
where
    T: Element,
    V: SineScalar<T>,
{
    status_boundary(|| {
        // SAFETY: forwarded from this function's contract.
        unsafe {
            rot_batched_impl::<T, V>(handle.as_ref(), n, x, incx, y, incy, c, s, batch_count)
        }
    })
}

/// Apply a rotation to every pair `(x[b], y[b])` of borrowed vectors.
///
/// `n`, `incx` and `incy` are interpreted as in [`rot_batched`]; the batch
/// count is `x.len()`. [`RotationScalars::PerBatch`] applies a distinct
/// (cosine, sine) pair to every batch item.
///
/// # Errors
///
/// - [`BlasError::BatchCountMismatch`] if `y` or per-batch scalars do not
///   hold exactly `x.len()` entries
/// - [`BlasError::ZeroIncrement`] for a zero increment with work to do
/// - [`BlasError::BufferTooShort`] if a buffer is shorter than
///   `1 + (n - 1) * |inc|`
/// - [`BlasError::NonFinite`] and [`BlasError::Gpu`] as for [`rot_batched`]
pub fn rot_batched_slices<T, V>(
    handle: &Handle,
    n: i32,
    x: &mut [&mut [T]],
    incx: i32,
    y: &mut [&mut [T]],
    incy: i32,
    scalars: &RotationScalars<'_, T::Real, V>,
) -> BlasResult<()>
where
    T: Element,
    V: SineScalar<T>,
{
    if handle.is_device_memory_size_query() {
        return Ok(());
    }

    let batches = x.len();
    if y.len() != batches {
        return Err(BlasError::BatchCountMismatch {
            arg: "y",
            expected: batches,
            actual: y.len(),
        });
    }
    let batch_count = i32::try_from(batches).map_err(|_| BlasError::BatchCountMismatch {
        arg: "x",
        expected: i32::MAX as usize,
        actual: batches,
    })?;

    let desc = BatchDescriptor {
        n,
        incx,
        incy,
        batch_count,
    };
    log_call::<T, V>(handle, &desc, || {
        let (c, s) = match scalars {
            RotationScalars::Shared { c, s } => (c.to_string(), s.to_string()),
            RotationScalars::PerBatch { c, s } => {
                (format!("{:p}", c.as_ptr()), format!("{:p}", s.as_ptr()))
            }
        };
        vec![
            n.to_string(),
            format!("{:p}", x.as_ptr()),
            incx.to_string(),
            format!("{:p}", y.as_ptr()),
            incy.to_string(),
            c,
            s,
            batch_count.to_string(),
        ]
    });

    if desc.is_empty() {
        return Ok(());
    }

    if let RotationScalars::PerBatch { c, s } = scalars {
        for (arg, len) in [("c", c.len()), ("s", s.len())] {
            if len != batches {
                return Err(BlasError::BatchCountMismatch {
                    arg,
                    expected: batches,
                    actual: len,
                });
            }
        }
    }

    for (arg, bufs, inc) in [("x", &*x, incx), ("y", &*y, incy)] {
        let required = desc.required_len(inc);
        if let Some((batch, buf)) = bufs.iter().enumerate().find(|(_, b)| b.len() < required) {
            return Err(BlasError::BufferTooShort {
                arg,
                batch,
                required,
                actual: buf.len(),
            });
        }
    }

    let x_ptrs: Vec<*mut T> = x.iter_mut().map(|b| b.as_mut_ptr()).collect();
    let y_ptrs: Vec<*mut T> = y.iter_mut().map(|b| b.as_mut_ptr()).collect();
    // SAFETY: every buffer is an exclusively borrowed slice covering the
    // required length, and distinct `&mut` slices never overlap.
    let (xv, yv) = unsafe {
        (
            BatchedVectors::new(&x_ptrs, i64::from(incx)),
            BatchedVectors::new(&y_ptrs, i64::from(incy)),
        )
    };
    rot_batched_checked(handle, &desc, &xv, &yv, scalars)
}
