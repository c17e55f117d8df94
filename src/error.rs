//! The pool's error taxonomy.

use thiserror::Error;

/// Raised synchronously when a [`Builder`](crate::Builder) is turned into a
/// [`Pool`](crate::Pool).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// `min` was greater than `max`; the floor cannot exceed the ceiling.
    #[error("`min` ({min}) must not exceed `max` ({max})")]
    MinExceedsMax {
        /// The configured floor.
        min: u32,
        /// The configured ceiling.
        max: u32,
    },
}

/// Raised from [`Pool::acquire`](crate::Pool::acquire) when a handle cannot
/// be dispensed to the caller.
#[derive(Debug, Error)]
pub enum PoolError<E> {
    /// The pool is draining; no new waiters are being accepted.
    #[error("pool is draining")]
    Draining,
    /// The acquire deadline elapsed before a handle was dispensed.
    #[error("timed out waiting for a resource")]
    Timeout,
    /// The factory failed to create the resource assigned to this waiter.
    #[error(transparent)]
    Factory(#[from] E),
    /// The pool was dropped while this acquire was still waiting.
    #[error("pool was dropped while waiting for a resource")]
    Closed,
}
