//! The public pool handle: `acquire`/`release`/`destroy`/`drain`/
//! `destroy_all_now`, and read-only introspection.

use std::fmt;
use std::sync::Arc;

use crate::config::Builder;
use crate::error::PoolError;
use crate::factory::Factory;
use crate::guard::{Checkout, PooledHandle};
use crate::internals::{self, Shared, State};

/// A generic, asynchronous resource pool.
///
/// Cloning a `Pool` is cheap and shares the same underlying state (it is an
/// `Arc` handle, the way the teacher crate's `Pool<M>` is), so it is the
/// usual way to hand the pool to many concurrent tasks.
pub struct Pool<F: Factory> {
    pub(crate) shared: Arc<Shared<F>>,
}

impl<F: Factory> Clone for Pool<F> {
    fn clone(&self) -> Self {
        Pool {
            shared: self.shared.clone(),
        }
    }
}

impl<F: Factory> fmt::Debug for Pool<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("name", &self.shared.config.name)
            .field("ptr", &Arc::as_ptr(&self.shared))
            .finish()
    }
}

impl<F: Factory> Pool<F> {
    /// Returns a [`Builder`] to configure a new pool.
    pub fn builder() -> Builder<F> {
        Builder::new()
    }

    /// Retrieves a resource from the pool.
    ///
    /// Resolves once a handle is dispensed, the acquire deadline expires
    /// ([`PoolError::Timeout`]), the factory fails the creation assigned to
    /// this call ([`PoolError::Factory`]), or the pool is draining
    /// ([`PoolError::Draining`]).
    pub async fn acquire(&self) -> Result<PooledHandle<F>, PoolError<F::Error>> {
        let checkout = internals::acquire(&self.shared).await?;
        Ok(PooledHandle::new(self.clone(), checkout))
    }

    /// Returns a previously detached [`Checkout`] to the pool.
    ///
    /// Most callers never need this directly — dropping the
    /// [`PooledHandle`](crate::PooledHandle) from [`Pool::acquire`] does it
    /// automatically. This is the explicit, spec-mandated operation for
    /// callers managing a raw handle themselves. A double release, or a
    /// release of a handle this pool never checked out, is logged and
    /// otherwise ignored.
    pub async fn release(&self, checkout: Checkout<F::Handle>) {
        internals::release(&self.shared, checkout).await;
    }

    /// Destroys a checked-out resource instead of returning it to the pool.
    pub async fn destroy(&self, checkout: Checkout<F::Handle>) {
        internals::destroy(&self.shared, checkout).await;
    }

    /// Initiates an orderly shutdown.
    ///
    /// No new waiters are accepted once this is called (subsequent
    /// `acquire`s fail with [`PoolError::Draining`]); in-flight acquires,
    /// creations, and validations are allowed to finish. Resolves once every
    /// live resource is back in the available set, the waiter queue is
    /// empty, and nothing remains under validation.
    pub async fn drain(&self) {
        internals::drain(&self.shared).await;
    }

    /// Forcibly destroys every idle resource immediately.
    ///
    /// Does not wait for in-use resources, and does not prevent subsequent
    /// creations triggered by the minimum floor unless `min_idle` was set to
    /// zero beforehand.
    pub async fn destroy_all_now(&self) {
        internals::destroy_all_now(&self.shared).await;
    }

    /// Returns a snapshot of the pool's current counts.
    pub async fn state(&self) -> State {
        internals::state(&self.shared).await
    }

    /// The configured ceiling (`max_size`).
    pub fn max_size(&self) -> u32 {
        self.shared.config.max
    }

    /// The configured floor (`min_idle`).
    pub fn min_size(&self) -> u32 {
        self.shared.config.min
    }

    /// The pool's diagnostic label.
    pub fn name(&self) -> &str {
        &self.shared.config.name
    }
}
