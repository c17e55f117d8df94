//! A small in-memory factory double used across the integration tests,
//! standing in for a real backend the way the teacher crate's downstream
//! crates (e.g. `bb8-redis`) wrap a concrete connection type.

use async_trait::async_trait;
use respool::Factory;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use thiserror::Error;

/// The handle this factory produces: just an id, assigned sequentially.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conn {
    pub id: u32,
}

/// The error a [`ScriptedFactory`] returns while it is scripted to fail.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("create failed for attempt {0}")]
pub struct CreateError(pub u32);

/// A factory whose behaviour can be scripted up front: fail the first N
/// creations, then succeed; optionally reject handles whose id is zero on
/// validation, to exercise the dispenser's validate-and-discard path.
pub struct ScriptedFactory {
    next_id: AtomicU32,
    remaining_failures: AtomicU32,
    reject_zero_id: AtomicBool,
    destroyed: Mutex<Vec<u32>>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        ScriptedFactory {
            next_id: AtomicU32::new(0),
            remaining_failures: AtomicU32::new(0),
            reject_zero_id: AtomicBool::new(false),
            destroyed: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(n: u32) -> Self {
        let f = Self::new();
        f.remaining_failures.store(n, Ordering::SeqCst);
        f
    }

    pub fn rejecting_zero_id() -> Self {
        let f = Self::new();
        f.reject_zero_id.store(true, Ordering::SeqCst);
        f
    }

    pub fn destroyed_order(&self) -> Vec<u32> {
        self.destroyed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Factory for ScriptedFactory {
    type Handle = Conn;
    type Error = CreateError;

    async fn create(&self) -> Result<Conn, CreateError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        if self.remaining_failures.load(Ordering::SeqCst) > 0 {
            self.remaining_failures.fetch_sub(1, Ordering::SeqCst);
            return Err(CreateError(id));
        }
        Ok(Conn { id })
    }

    async fn destroy(&self, handle: Conn) {
        self.destroyed.lock().unwrap().push(handle.id);
    }

    async fn validate(&self, handle: &mut Conn) -> bool {
        if self.reject_zero_id.load(Ordering::SeqCst) {
            handle.id != 0
        } else {
            true
        }
    }
}
