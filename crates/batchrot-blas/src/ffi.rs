//! C ABI entry points.
//!
//! All functions use the C calling convention and are `no_mangle` so that
//! the `cdylib` exports stable symbol names. No function unwinds: every
//! body runs inside [`status_boundary`](crate::status_boundary) or
//! `catch_unwind`.
//!
//! | Symbol                   | x, y         | c        | s            |
//! |--------------------------|--------------|----------|--------------|
//! | `batchrot_srot_batched`  | `float`      | `float`  | `float`      |
//! | `batchrot_drot_batched`  | `double`     | `double` | `double`     |
//! | `batchrot_crot_batched`  | `complex64`  | `float`  | `complex64`  |
//! | `batchrot_csrot_batched` | `complex64`  | `float`  | `float`      |
//! | `batchrot_zrot_batched`  | `complex128` | `double` | `complex128` |
//! | `batchrot_zdrot_batched` | `complex128` | `double` | `double`     |
//!
//! Complex values are laid out as `{ re, im }` pairs. Handles are opaque to
//! C callers.

#![allow(improper_ctypes_definitions)]

use crate::handle::{CheckNumericsMode, Handle, LayerMode};
use crate::rot_batched::rot_batched;
use crate::status::Status;
use batchrot_numeric::{Complex32, Complex64};
use std::ffi::c_int;
use std::panic::{self, AssertUnwindSafe};

macro_rules! rot_batched_entry {
    ($(#[$doc:meta])* $name:ident, $t:ty, $c:ty, $s:ty) => {
        $(#[$doc])*
        ///
        /// # Safety
        ///
        /// The pointer requirements of [`rot_batched`] apply.
        #[no_mangle]
        pub unsafe extern "C" fn $name(
            handle: *const Handle,
            n: c_int,
            x: *const *mut $t,
            incx: c_int,
            y: *const *mut $t,
            incy: c_int,
            c: *const $c,
            s: *const $s,
            batch_count: c_int,
        ) -> Status {
            unsafe { rot_batched::<$t, $s>(handle, n, x, incx, y, incy, c, s, batch_count) }
        }
    };
}

rot_batched_entry!(
    /// Batched rotation of `float` vectors with real sine.
    batchrot_srot_batched, f32, f32, f32
);
rot_batched_entry!(
    /// Batched rotation of `double` vectors with real sine.
    batchrot_drot_batched, f64, f64, f64
);
rot_batched_entry!(
    /// Batched rotation of single-precision complex vectors with complex sine.
    batchrot_crot_batched, Complex32, f32, Complex32
);
rot_batched_entry!(
    /// Batched rotation of single-precision complex vectors with real sine.
    batchrot_csrot_batched, Complex32, f32, f32
);
rot_batched_entry!(
    /// Batched rotation of double-precision complex vectors with complex sine.
    batchrot_zrot_batched, Complex64, f64, Complex64
);
rot_batched_entry!(
    /// Batched rotation of double-precision complex vectors with real sine.
    batchrot_zdrot_batched, Complex64, f64, f64
);

/// Create a handle configured from the `BATCHROT_*` environment variables.
///
/// Writes the new handle to `*out`. Release it with
/// [`batchrot_destroy_handle`].
///
/// # Safety
///
/// `out` must be null or valid for one pointer write.
#[no_mangle]
pub unsafe extern "C" fn batchrot_create_handle(out: *mut *mut Handle) -> Status {
    if out.is_null() {
        return Status::InvalidPointer;
    }
    match panic::catch_unwind(Handle::from_env) {
        Ok(Ok(handle)) => {
            // SAFETY: `out` is non-null and valid for writes.
            unsafe { out.write(Box::into_raw(Box::new(handle))) };
            Status::Success
        }
        Ok(Err(err)) => {
            tracing::error!(error = %err, "handle creation failed");
            Status::from(&err)
        }
        Err(_) => Status::InternalError,
    }
}

/// Destroy a handle created by [`batchrot_create_handle`].
///
/// # Safety
///
/// `handle` must be null or a pointer returned by `batchrot_create_handle`
/// that has not been destroyed yet.
#[no_mangle]
pub unsafe extern "C" fn batchrot_destroy_handle(handle: *mut Handle) -> Status {
    if handle.is_null() {
        return Status::InvalidHandle;
    }
    // SAFETY: the pointer came from `Box::into_raw` and is released once.
    let handle = unsafe { Box::from_raw(handle) };
    match panic::catch_unwind(AssertUnwindSafe(move || drop(handle))) {
        Ok(()) => Status::Success,
        Err(_) => Status::InternalError,
    }
}

/// Set the logging layer bits. Unknown bits are ignored.
///
/// # Safety
///
/// `handle` must be null or a live handle not used concurrently.
#[no_mangle]
pub unsafe extern "C" fn batchrot_set_layer_mode(handle: *mut Handle, mode: u32) -> Status {
    // SAFETY: forwarded from this function's contract.
    match unsafe { handle.as_mut() } {
        Some(handle) => {
            handle.set_layer_mode(LayerMode::from_bits_truncate(mode));
            Status::Success
        }
        None => Status::InvalidHandle,
    }
}

/// Set the numeric checking bits. Unknown bits are ignored.
///
/// # Safety
///
/// `handle` must be null or a live handle not used concurrently.
#[no_mangle]
pub unsafe extern "C" fn batchrot_set_check_numerics_mode(handle: *mut Handle, mode: u32) -> Status {
    // SAFETY: forwarded from this function's contract.
    match unsafe { handle.as_mut() } {
        Some(handle) => {
            handle.set_check_numerics(CheckNumericsMode::from_bits_truncate(mode));
            Status::Success
        }
        None => Status::InvalidHandle,
    }
}

/// Enter device-memory-size query mode.
///
/// # Safety
///
/// `handle` must be null or a live handle not used concurrently.
#[no_mangle]
pub unsafe extern "C" fn batchrot_start_device_memory_size_query(handle: *mut Handle) -> Status {
    // SAFETY: forwarded from this function's contract.
    match unsafe { handle.as_mut() } {
        Some(handle) => {
            handle.start_device_memory_size_query();
            Status::Success
        }
        None => Status::InvalidHandle,
    }
}

/// Leave device-memory-size query mode and write the required byte count
/// to `*size`.
///
/// # Safety
///
/// `handle` must be null or a live handle not used concurrently; `size`
/// must be null or valid for one write.
#[no_mangle]
pub unsafe extern "C" fn batchrot_stop_device_memory_size_query(
    handle: *mut Handle,
    size: *mut usize,
) -> Status {
    // SAFETY: forwarded from this function's contract.
    let Some(handle) = (unsafe { handle.as_mut() }) else {
        return Status::InvalidHandle;
    };
    if size.is_null() {
        return Status::InvalidPointer;
    }
    let bytes = handle.stop_device_memory_size_query();
    // SAFETY: `size` is non-null and valid for writes.
    unsafe { size.write(bytes) };
    Status::Success
}
