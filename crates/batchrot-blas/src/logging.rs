//! Call logging.
//!
//! Each enabled [`LayerMode`](crate::LayerMode) bit makes an entry point
//! produce one [`LogRecord`], handed to the handle's [`LogSink`]:
//!
//! - trace: `srot_batched,10,0x7ff..,1,0x7ff..,1,0.5,0.25,3`
//! - bench: `./batchrot-bench -f rot_batched --a_type f32_r --b_type f32_r --c_type f32_r -n 10 --incx 1 --incy 1 --batch_count 3`
//! - profile: `{function: srot_batched, N: 10, incx: 1, incy: 1, batch_count: 3}`
//!
//! Profile records are not emitted one by one; [`TracingSink`] counts calls
//! per distinct record and reports the totals when it is dropped.

use batchrot_numeric::Precision;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt;

/// Shape of a call as the profile layer sees it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ProfileKey {
    /// Routine name, e.g. `csrot_batched`.
    pub function: &'static str,
    /// Vector length.
    pub n: i32,
    /// Increment of `x`.
    pub incx: i32,
    /// Increment of `y`.
    pub incy: i32,
    /// Number of batch items.
    pub batch_count: i32,
}

impl fmt::Display for ProfileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{function: {}, N: {}, incx: {}, incy: {}, batch_count: {}}}",
            self.function, self.n, self.incx, self.incy, self.batch_count
        )
    }
}

/// One log record produced by an entry point.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum LogRecord {
    /// Every argument of the call, in order.
    Trace {
        /// Routine name.
        function: &'static str,
        /// Arguments rendered as text.
        args: Vec<String>,
    },
    /// A bench command that replays the call.
    Bench {
        /// Element type of `x` and `y`.
        a_type: Precision,
        /// Cosine type.
        b_type: Precision,
        /// Sine type.
        c_type: Precision,
        /// Vector length.
        n: i32,
        /// Increment of `x`.
        incx: i32,
        /// Increment of `y`.
        incy: i32,
        /// Number of batch items.
        batch_count: i32,
    },
    /// Call shape for aggregation.
    Profile(ProfileKey),
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trace { function, args } => {
                write!(f, "{function}")?;
                for arg in args {
                    write!(f, ",{arg}")?;
                }
                Ok(())
            }
            Self::Bench {
                a_type,
                b_type,
                c_type,
                n,
                incx,
                incy,
                batch_count,
            } => write!(
                f,
                "./batchrot-bench -f rot_batched --a_type {a_type} --b_type {b_type} \
                 --c_type {c_type} -n {n} --incx {incx} --incy {incy} --batch_count {batch_count}"
            ),
            Self::Profile(key) => write!(f, "{key}"),
        }
    }
}

/// Destination for log records.
pub trait LogSink: Send + Sync {
    /// Accept one record.
    fn record(&self, record: LogRecord);
}

/// Default sink: trace and bench records become `tracing` events, profile
/// records are counted.
#[derive(Default)]
pub struct TracingSink {
    profile: Mutex<FxHashMap<ProfileKey, u64>>,
}

impl TracingSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Call counts per profile record so far, ordered by record.
    #[must_use]
    pub fn profile_counts(&self) -> Vec<(ProfileKey, u64)> {
        let mut counts: Vec<_> = self
            .profile
            .lock()
            .iter()
            .map(|(key, count)| (key.clone(), *count))
            .collect();
        counts.sort();
        counts
    }
}

impl LogSink for TracingSink {
    fn record(&self, record: LogRecord) {
        match record {
            LogRecord::Trace { .. } => {
                tracing::info!(target: "batchrot::trace", "{record}");
            }
            LogRecord::Bench { .. } => {
                tracing::info!(target: "batchrot::bench", "{record}");
            }
            LogRecord::Profile(key) => {
                *self.profile.lock().entry(key).or_insert(0) += 1;
            }
        }
    }
}

impl Drop for TracingSink {
    fn drop(&mut self) {
        for (key, count) in self.profile_counts() {
            tracing::info!(target: "batchrot::profile", calls = count, "{key}");
        }
    }
}

impl fmt::Debug for TracingSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracingSink")
            .field("profiled_shapes", &self.profile.lock().len())
            .finish()
    }
}

/// Sink that keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the records received so far.
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Remove and return the records received so far.
    pub fn take(&self) -> Vec<LogRecord> {
        std::mem::take(&mut *self.records.lock())
    }
}

impl LogSink for MemorySink {
    fn record(&self, record: LogRecord) {
        self.records.lock().push(record);
    }
}
