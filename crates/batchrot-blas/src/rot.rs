//! The batched rotation kernel.
//!
//! Work is laid out on a 2-D grid: `grid.x` covers the `n` logical
//! elements in blocks of [`ROT_BLOCK_SIZE`], `grid.y` covers the batch
//! items. Each work item owns exactly one (batch item, element) pair, so no
//! two work items touch the same memory.
//!
//! ```text
//!   incx =  2:  x[0] x[1] x[2] ...   at offsets 0, 2, 4, ...
//!   incx = -2:  x[0] x[1] x[2] ...   at offsets 2(n-1), 2(n-2), ..., 0
//! ```

use batchrot_gpu::{GpuContext, GpuResult, LaunchConfig};
use batchrot_numeric::{rotate, Element, SineScalar};
use std::fmt;

/// Threads per block along the element dimension.
pub const ROT_BLOCK_SIZE: u32 = 512;

/// Shape of one batched call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchDescriptor {
    /// Logical length of every vector.
    pub n: i32,
    /// Stride between consecutive logical elements of `x`.
    pub incx: i32,
    /// Stride between consecutive logical elements of `y`.
    pub incy: i32,
    /// Number of independent vector pairs.
    pub batch_count: i32,
}

impl BatchDescriptor {
    /// Whether the call has nothing to do.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.n <= 0 || self.batch_count <= 0
    }

    /// `n` as a length; zero when `n` is not positive.
    #[must_use]
    pub fn len(&self) -> usize {
        usize::try_from(self.n).unwrap_or(0)
    }

    /// `batch_count` as a count; zero when not positive.
    #[must_use]
    pub fn batches(&self) -> usize {
        usize::try_from(self.batch_count).unwrap_or(0)
    }

    /// Minimum element count of a buffer addressed with increment `inc`.
    #[must_use]
    pub fn required_len(&self, inc: i32) -> usize {
        match self.len() {
            0 => 0,
            n => 1 + (n - 1) * inc.unsigned_abs() as usize,
        }
    }
}

/// An array of strided vectors, one per batch item.
///
/// Holds raw element pointers so that concurrent work items can update
/// disjoint elements of the same buffer.
pub struct BatchedVectors<'a, T> {
    ptrs: &'a [*mut T],
    inc: i64,
}

// SAFETY: work items only access distinct elements, and the constructor's
// contract rules out any other access while the value is alive.
unsafe impl<T: Send> Send for BatchedVectors<'_, T> {}
unsafe impl<T: Send> Sync for BatchedVectors<'_, T> {}

impl<'a, T: Element> BatchedVectors<'a, T> {
    /// Wrap an array of buffer pointers.
    ///
    /// # Safety
    ///
    /// For as long as the value is alive, every non-null entry of `ptrs`
    /// must point to a buffer that is valid for reads and writes of
    /// `1 + (n - 1) * |inc|` elements, for every `n` the vectors are used
    /// with, and that is not accessed through any other path. Buffers of
    /// `x` and `y` in the same call must not overlap.
    #[must_use]
    pub unsafe fn new(ptrs: &'a [*mut T], inc: i64) -> Self {
        Self { ptrs, inc }
    }

    /// Number of batch items.
    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.ptrs.len()
    }

    /// Element increment.
    #[must_use]
    pub fn inc(&self) -> i64 {
        self.inc
    }

    /// Index of the first null buffer pointer, if any.
    #[must_use]
    pub fn first_null(&self) -> Option<usize> {
        self.ptrs.iter().position(|p| p.is_null())
    }

    /// Memory offset of logical element `i` of a vector of length `n`.
    #[must_use]
    pub fn offset(&self, i: usize, n: usize) -> usize {
        let step = self.inc.unsigned_abs() as usize;
        if self.inc >= 0 {
            i * step
        } else {
            (n - 1 - i) * step
        }
    }

    /// # Safety
    ///
    /// `batch < batch_count()`, `i < n`, and no other work item may access
    /// the same element concurrently.
    pub(crate) unsafe fn read(&self, batch: usize, i: usize, n: usize) -> T {
        self.ptrs[batch].add(self.offset(i, n)).read()
    }

    /// # Safety
    ///
    /// Same as [`Self::read`].
    pub(crate) unsafe fn write(&self, batch: usize, i: usize, n: usize, value: T) {
        self.ptrs[batch].add(self.offset(i, n)).write(value);
    }
}

impl<T> fmt::Debug for BatchedVectors<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchedVectors")
            .field("batch_count", &self.ptrs.len())
            .field("inc", &self.inc)
            .finish()
    }
}

/// Cosine and sine of the rotation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RotationScalars<'a, R, V> {
    /// One pair for every batch item.
    Shared {
        /// Cosine.
        c: R,
        /// Sine.
        s: V,
    },
    /// A pair per batch item; both slices hold `batch_count` entries.
    PerBatch {
        /// Cosines.
        c: &'a [R],
        /// Sines.
        s: &'a [V],
    },
}

impl<R: Copy, V: Copy> RotationScalars<'_, R, V> {
    /// The (cosine, sine) pair applied to batch item `batch`.
    ///
    /// # Panics
    ///
    /// Panics if per-batch slices are shorter than `batch + 1`.
    #[must_use]
    pub fn get(&self, batch: usize) -> (R, V) {
        match self {
            Self::Shared { c, s } => (*c, *s),
            Self::PerBatch { c, s } => (c[batch], s[batch]),
        }
    }
}

/// Run `f(first_batch, batch_chunk)` over consecutive chunks of at most the
/// device's grid-y limit.
pub(crate) fn for_each_batch_chunk<F>(ctx: &GpuContext, batches: usize, mut f: F) -> GpuResult<()>
where
    F: FnMut(usize, usize) -> GpuResult<()>,
{
    let max_chunk = (ctx.device().max_grid_dim.1 as usize).max(1);
    let mut start = 0;
    while start < batches {
        let chunk = (batches - start).min(max_chunk);
        f(start, chunk)?;
        start += chunk;
    }
    Ok(())
}

/// Rotate every batch item of `x` and `y` in place.
///
/// Does nothing when `n <= 0` or `batch_count <= 0`. Callers guarantee that
/// `x` and `y` hold at least `batch_count` non-null buffers and, for
/// [`RotationScalars::PerBatch`], that the slices cover every batch item.
///
/// # Errors
///
/// Returns the launch error if the device rejects or fails a launch.
pub fn rot_template<T, V>(
    ctx: &GpuContext,
    n: i32,
    x: &BatchedVectors<'_, T>,
    y: &BatchedVectors<'_, T>,
    scalars: &RotationScalars<'_, T::Real, V>,
    batch_count: i32,
) -> GpuResult<()>
where
    T: Element,
    V: SineScalar<T>,
{
    let desc = BatchDescriptor {
        n,
        incx: 0,
        incy: 0,
        batch_count,
    };
    if desc.is_empty() {
        return Ok(());
    }
    let n = desc.len();

    for_each_batch_chunk(ctx, desc.batches(), |first, chunk| {
        let config = LaunchConfig::for_2d(n, chunk, ROT_BLOCK_SIZE, 1);
        ctx.launch(V::VARIANT.name(), config, |item| {
            let i = item.global_x();
            if i >= n {
                return;
            }
            let batch = first + item.global_y();
            let (c, s) = scalars.get(batch);
            // SAFETY: `batch` and `i` are in range, and this work item is the
            // only one touching element `i` of batch item `batch`.
            unsafe {
                let (new_x, new_y) = rotate(c, s, x.read(batch, i, n), y.read(batch, i, n));
                x.write(batch, i, n, new_x);
                y.write(batch, i, n, new_y);
            }
        })
    })
}
