//! Public handle types: the RAII guard callers get back from
//! [`Pool::acquire`](crate::Pool::acquire), and the detached [`Checkout`] it
//! can be unwrapped into for the explicit `release`/`destroy` operations the
//! source specification describes as first-class pool operations.

use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::factory::Factory;
use crate::pool::Pool;

/// A resource detached from its pool guard.
///
/// Obtained via [`PooledHandle::into_checkout`], a `Checkout` is the raw unit
/// [`Pool::release`](crate::Pool::release) and
/// [`Pool::destroy`](crate::Pool::destroy) operate on — the closest analogue
/// to the source specification's duck-typed "handle" passed directly to
/// `release(handle)`/`destroy(handle)`.
///
/// Only `Clone` when the underlying handle is: this is deliberate. Most
/// handle types cannot be duplicated, which makes a double `release`/
/// `destroy` a compile error rather than a runtime one. When the handle
/// *is* `Clone`, the pool still detects and logs a double or foreign
/// release at runtime, matching the source specification's behaviour.
pub struct Checkout<H> {
    pub(crate) id: u64,
    /// The underlying resource handle produced by the factory.
    pub handle: H,
}

impl<H> Checkout<H> {
    pub(crate) fn new(id: u64, handle: H) -> Self {
        Checkout { id, handle }
    }

    pub(crate) fn into_parts(self) -> (u64, H) {
        (self.id, self.handle)
    }
}

impl<H: Clone> Clone for Checkout<H> {
    fn clone(&self) -> Self {
        Checkout {
            id: self.id,
            handle: self.handle.clone(),
        }
    }
}

impl<H: fmt::Debug> fmt::Debug for Checkout<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Checkout")
            .field("id", &self.id)
            .field("handle", &self.handle)
            .finish()
    }
}

/// A smart pointer wrapping a checked-out resource.
///
/// Returned by [`Pool::acquire`](crate::Pool::acquire). Dereferences to the
/// factory's `Handle` type; dropping it releases the resource back to the
/// pool automatically, the way the teacher crate's `PooledConnection` does.
/// Unlike the teacher crate, this guard owns a cloned `Pool` handle rather
/// than borrowing one, so it is not tied to the lifetime of the `&Pool` that
/// produced it and can be moved into a spawned task — the ownership style
/// the wider connection-pool ecosystem (e.g. `deadpool`) settled on.
pub struct PooledHandle<F: Factory> {
    pool: Pool<F>,
    checkout: Option<Checkout<F::Handle>>,
}

impl<F: Factory> PooledHandle<F> {
    pub(crate) fn new(pool: Pool<F>, checkout: Checkout<F::Handle>) -> Self {
        PooledHandle {
            pool,
            checkout: Some(checkout),
        }
    }

    /// Detaches the handle from automatic release, returning the raw
    /// [`Checkout`] for manual [`Pool::release`](crate::Pool::release) or
    /// [`Pool::destroy`](crate::Pool::destroy).
    pub fn into_checkout(mut self) -> Checkout<F::Handle> {
        self.checkout.take().expect("checkout taken twice")
    }

    /// Destroys the underlying resource instead of returning it to the pool.
    pub async fn destroy(mut self) {
        if let Some(checkout) = self.checkout.take() {
            self.pool.destroy(checkout).await;
        }
    }
}

impl<F: Factory> Deref for PooledHandle<F> {
    type Target = F::Handle;

    fn deref(&self) -> &F::Handle {
        &self.checkout.as_ref().expect("handle already taken").handle
    }
}

impl<F: Factory> DerefMut for PooledHandle<F> {
    fn deref_mut(&mut self) -> &mut F::Handle {
        &mut self.checkout.as_mut().expect("handle already taken").handle
    }
}

impl<F: Factory> fmt::Debug for PooledHandle<F>
where
    F::Handle: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.checkout.as_ref().unwrap().handle, f)
    }
}

impl<F: Factory> Drop for PooledHandle<F> {
    fn drop(&mut self) {
        if let Some(checkout) = self.checkout.take() {
            let pool = self.pool.clone();
            futures::executor::block_on(async move {
                pool.release(checkout).await;
            });
        }
    }
}
