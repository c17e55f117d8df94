//! The factory capability record: how the pool creates, destroys, and
//! validates the handles it manages.

use async_trait::async_trait;

/// Produces, tears down, and validates the handles a [`Pool`](crate::Pool) manages.
///
/// This is the pool's only external collaborator. Implementors decide what a
/// "handle" is (a database connection, a socket, a worker thread) and how to
/// create, destroy, and validate one; the pool never inspects a handle's
/// contents and never shares one between two callers at once.
#[async_trait]
pub trait Factory: Send + Sync + 'static {
    /// The resource type this factory produces.
    type Handle: Send + 'static;
    /// The error type returned by a failed [`Factory::create`].
    type Error: std::error::Error + Send + Sync + 'static;

    /// Attempts to create a new handle.
    ///
    /// Failures are delivered to the waiter whose turn triggered the
    /// creation; they never poison the pool or leak its internal counters.
    async fn create(&self) -> Result<Self::Handle, Self::Error>;

    /// Tears down a handle.
    ///
    /// Best-effort: this cannot fail from the pool's point of view. If the
    /// underlying teardown can fail, swallow the error here (and log it
    /// through your own means) rather than propagating it.
    async fn destroy(&self, handle: Self::Handle);

    /// Checks whether a handle is still usable before it is dispensed to a
    /// caller.
    ///
    /// The originating design distinguishes a synchronous `validate` from an
    /// asynchronous `validateAsync`; under `async`/`await` that distinction
    /// collapses into a single method, since a validator that never truly
    /// suspends resolves on first poll and behaves exactly like the
    /// synchronous case. See `DESIGN.md` for the full reasoning.
    ///
    /// Defaults to `true` (every handle is considered valid).
    async fn validate(&self, handle: &mut Self::Handle) -> bool {
        let _ = handle;
        true
    }
}
