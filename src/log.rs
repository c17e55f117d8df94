//! Diagnostic output for pool-internal decisions.
//!
//! The teacher crate this pool is descended from has no logging of its own;
//! it only offers an `ErrorSink` for out-of-band factory errors. This pool's
//! source design additionally requires emitting messages at creation,
//! dispense, reap, and programmer-error (double/foreign release) points, so
//! the logging surface is a bit richer: by default those events are emitted
//! as `tracing` events tagged with the pool's name, and callers who would
//! rather not adopt `tracing` can supply a plain callback instead.

use std::fmt;
use std::sync::Arc;

/// Severity of a single pool diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    /// Fine-grained detail, useful when debugging the pool itself.
    Verbose,
    /// Routine lifecycle events (creation, dispense, reap).
    Info,
    /// Reserved for callers; the pool itself never emits at this level.
    Warn,
    /// Failures and programmer errors (factory errors, timeouts,
    /// double/foreign release).
    Error,
}

type LogCallback = dyn Fn(&str, LogLevel) + Send + Sync;

/// Where a pool's diagnostic messages go.
#[derive(Clone)]
pub enum LogConfig {
    /// Discard every message. The default.
    Off,
    /// Emit `tracing` events, one per message, tagged with the pool's name.
    Tracing,
    /// Hand raw messages to a user-supplied callback instead of `tracing`.
    Callback(Arc<LogCallback>),
}

impl LogConfig {
    /// Wraps a plain closure as a [`LogConfig::Callback`].
    pub fn callback<Cb>(f: Cb) -> Self
    where
        Cb: Fn(&str, LogLevel) + Send + Sync + 'static,
    {
        LogConfig::Callback(Arc::new(f))
    }

    pub(crate) fn emit(&self, pool_name: &str, level: LogLevel, message: &str) {
        match self {
            LogConfig::Off => {}
            LogConfig::Tracing => match level {
                LogLevel::Verbose => tracing::trace!(pool = pool_name, "{}", message),
                LogLevel::Info => tracing::info!(pool = pool_name, "{}", message),
                LogLevel::Warn => tracing::warn!(pool = pool_name, "{}", message),
                LogLevel::Error => tracing::error!(pool = pool_name, "{}", message),
            },
            LogConfig::Callback(cb) => cb(message, level),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig::Off
    }
}

impl fmt::Debug for LogConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogConfig::Off => f.write_str("Off"),
            LogConfig::Tracing => f.write_str("Tracing"),
            LogConfig::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}
