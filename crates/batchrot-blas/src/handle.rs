//! The execution context passed to every routine.
//!
//! A [`Handle`] bundles the device context with the per-caller settings the
//! routines consult: which logging layers are on, how numeric checking
//! behaves and whether calls are only sizing device memory. Routines take
//! `&Handle` and never modify it; the setters are for the caller.
//!
//! ```rust
//! use batchrot_blas::{CheckNumericsMode, Handle, LayerMode};
//!
//! let mut handle = Handle::new().unwrap();
//! handle.set_layer_mode(LayerMode::LOG_BENCH);
//! handle.set_check_numerics(CheckNumericsMode::FAIL);
//! assert!(handle.check_numerics().is_enabled());
//! ```

use crate::config::HandleConfig;
use crate::logging::{LogSink, TracingSink};
use crate::BlasResult;
use batchrot_gpu::{device_of_kind, GpuContext};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

bitflags! {
    /// Logging layers enabled on a handle.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct LayerMode: u32 {
        /// One record per call with every argument.
        const LOG_TRACE = 0b0000_0001;
        /// A bench command line that replays the call.
        const LOG_BENCH = 0b0000_0010;
        /// Aggregated per-shape call counts.
        const LOG_PROFILE = 0b0000_0100;
    }
}

bitflags! {
    /// Numeric checking behavior.
    ///
    /// Any set bit enables the scans before and after compute. `FAIL` makes
    /// a non-finite scan terminate the call with an error status; `INFO`
    /// and `WARN` only report.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CheckNumericsMode: u32 {
        /// Log a summary of every scan.
        const INFO = 0b0000_0001;
        /// Log scans that found NaN or infinity.
        const WARN = 0b0000_0010;
        /// Fail the call when a scan finds NaN or infinity.
        const FAIL = 0b0000_0100;
    }
}

impl CheckNumericsMode {
    /// Whether any scan runs at all.
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        !self.is_empty()
    }
}

/// Execution context for the rotation routines.
pub struct Handle {
    ctx: Arc<GpuContext>,
    layer_mode: LayerMode,
    check_numerics: CheckNumericsMode,
    memory_size_query: bool,
    sink: Arc<dyn LogSink>,
}

impl Handle {
    /// Create a handle on the default device with logging and numeric
    /// checking off.
    ///
    /// # Errors
    ///
    /// Fails if no device is available.
    pub fn new() -> BlasResult<Self> {
        Self::with_config(&HandleConfig::default())
    }

    /// Create a handle from explicit settings.
    ///
    /// # Errors
    ///
    /// Fails if no device of the configured kind is available.
    pub fn with_config(config: &HandleConfig) -> BlasResult<Self> {
        let ctx = device_of_kind(config.device)?;
        let mut handle = Self::with_context(Arc::new(ctx));
        handle.layer_mode = config.layer_mode;
        handle.check_numerics = config.check_numerics;
        Ok(handle)
    }

    /// Create a handle from the `BATCHROT_*` environment variables.
    ///
    /// # Errors
    ///
    /// Fails if a variable is malformed or the device is unavailable.
    pub fn from_env() -> BlasResult<Self> {
        let config = HandleConfig::from_env()?;
        tracing::debug!(?config, "handle configuration from environment");
        Self::with_config(&config)
    }

    /// Create a handle on an existing device context.
    #[must_use]
    pub fn with_context(ctx: Arc<GpuContext>) -> Self {
        Self {
            ctx,
            layer_mode: LayerMode::empty(),
            check_numerics: CheckNumericsMode::empty(),
            memory_size_query: false,
            sink: Arc::new(TracingSink::new()),
        }
    }

    /// The device context routines launch on.
    #[must_use]
    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    /// Enabled logging layers.
    #[must_use]
    pub fn layer_mode(&self) -> LayerMode {
        self.layer_mode
    }

    /// Replace the enabled logging layers.
    pub fn set_layer_mode(&mut self, mode: LayerMode) {
        self.layer_mode = mode;
    }

    /// Numeric checking behavior.
    #[must_use]
    pub fn check_numerics(&self) -> CheckNumericsMode {
        self.check_numerics
    }

    /// Replace the numeric checking behavior.
    pub fn set_check_numerics(&mut self, mode: CheckNumericsMode) {
        self.check_numerics = mode;
    }

    /// The sink that receives log records.
    #[must_use]
    pub fn log_sink(&self) -> &dyn LogSink {
        self.sink.as_ref()
    }

    /// Route log records to a different sink.
    pub fn set_log_sink(&mut self, sink: Arc<dyn LogSink>) {
        self.sink = sink;
    }

    /// Enter memory-size query mode. Routines called in this mode report
    /// their scratch requirement and return without touching data.
    pub fn start_device_memory_size_query(&mut self) {
        self.memory_size_query = true;
    }

    /// Leave memory-size query mode and return the largest scratch size
    /// requested while it was on. The rotation routines need no scratch
    /// memory, so this is zero.
    pub fn stop_device_memory_size_query(&mut self) -> usize {
        self.memory_size_query = false;
        0
    }

    /// Whether calls are currently only sizing device memory.
    #[must_use]
    pub fn is_device_memory_size_query(&self) -> bool {
        self.memory_size_query
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("device", self.ctx.device())
            .field("layer_mode", &self.layer_mode)
            .field("check_numerics", &self.check_numerics)
            .field("memory_size_query", &self.memory_size_query)
            .finish_non_exhaustive()
    }
}
