//! The pool state machine: counters, membership sets, the waiter queue, the
//! dispenser, the creation pipeline, and the idle reaper.
//!
//! Everything in this module runs behind a single `tokio::sync::Mutex`,
//! generalising the teacher crate's `SharedPool`/`PoolInternals` split:
//! immutable configuration and the factory live outside the lock, mutable
//! state lives inside it, and the lock is always dropped before `.await`ing
//! a suspending operation (`create`, `validate`, waiter delivery). This is
//! the single point where satisfaction decisions are made; every externally
//! triggered event ends by calling [`dispense`].

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::factory::Factory;
use crate::guard::Checkout;
use crate::log::LogLevel;

/// How often `drain` polls for quiescence.
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(20);

struct IdleSlot<H> {
    id: u64,
    handle: H,
    expires_at: Instant,
}

struct Waiter<H, E> {
    tx: oneshot::Sender<Result<(u64, H), PoolError<E>>>,
}

/// The pool data that must be protected by a lock.
struct PoolInternals<H, E> {
    available: VecDeque<IdleSlot<H>>,
    available_ids: HashSet<u64>,
    in_use: HashSet<u64>,
    under_validation: u32,
    waiters: VecDeque<Waiter<H, E>>,
    /// Resources alive or being born: available + in_use + under_validation +
    /// in-flight creates. The last term is never stored explicitly; it falls
    /// out of `count` minus the other three.
    count: u32,
    next_id: u64,
    draining: bool,
    reaper_handle: Option<JoinHandle<()>>,
}

impl<H, E> PoolInternals<H, E> {
    fn new() -> Self {
        PoolInternals {
            available: VecDeque::new(),
            available_ids: HashSet::new(),
            in_use: HashSet::new(),
            under_validation: 0,
            waiters: VecDeque::new(),
            count: 0,
            next_id: 0,
            draining: false,
            reaper_handle: None,
        }
    }

    fn prune_cancelled_waiters(&mut self) {
        self.waiters.retain(|w| !w.tx.is_closed());
    }
}

/// The guts of a `Pool`, shared behind an `Arc` the way the teacher crate
/// shares its `SharedPool<M>`.
pub(crate) struct Shared<F: Factory> {
    pub(crate) factory: F,
    pub(crate) config: PoolConfig,
    internals: Mutex<PoolInternals<F::Handle, F::Error>>,
}

impl<F: Factory> fmt::Debug for Shared<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shared").field("name", &self.config.name).finish()
    }
}

impl<F: Factory> Shared<F> {
    pub(crate) fn new(config: PoolConfig, factory: F) -> Arc<Shared<F>> {
        Arc::new(Shared {
            factory,
            config,
            internals: Mutex::new(PoolInternals::new()),
        })
    }

    fn log(&self, level: LogLevel, message: &str) {
        self.config.log.emit(&self.config.name, level, message);
    }
}

/// A read-only snapshot of a pool's current counts.
pub struct State {
    /// Resources currently alive or being born.
    pub size: u32,
    /// Idle resources ready to be dispensed.
    pub available: u32,
    /// Resources currently checked out by callers.
    pub using: u32,
    /// Pending `acquire` calls.
    pub waiting: u32,
    _p: (),
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("size", &self.size)
            .field("available", &self.available)
            .field("using", &self.using)
            .field("waiting", &self.waiting)
            .finish()
    }
}

pub(crate) async fn state<F: Factory>(shared: &Arc<Shared<F>>) -> State {
    let guard = shared.internals.lock().await;
    State {
        size: guard.count,
        available: guard.available.len() as u32,
        using: guard.in_use.len() as u32,
        waiting: guard.waiters.len() as u32,
        _p: (),
    }
}

fn push_available<H, E>(
    guard: &mut PoolInternals<H, E>,
    config: &PoolConfig,
    id: u64,
    handle: H,
) {
    let expires_at = Instant::now() + config.idle_timeout;
    guard.available_ids.insert(id);
    let slot = IdleSlot { id, handle, expires_at };
    if config.return_to_head {
        guard.available.push_front(slot);
    } else {
        guard.available.push_back(slot);
    }
}

/// Enqueues a waiter and invokes the dispenser, per the lifecycle
/// controller's `acquire` contract.
pub(crate) async fn acquire<F: Factory>(
    shared: &Arc<Shared<F>>,
) -> Result<Checkout<F::Handle>, PoolError<F::Error>> {
    let (tx, rx) = oneshot::channel();
    {
        let mut guard = shared.internals.lock().await;
        if guard.draining {
            return Err(PoolError::Draining);
        }
        guard.waiters.push_back(Waiter { tx });
    }
    dispense(shared.clone()).await;

    let outcome = match shared.config.acquire_timeout {
        Some(deadline) => match tokio::time::timeout(deadline, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(PoolError::Closed),
            Err(_elapsed) => {
                // The receiver is dropped here, which marks the sender as
                // closed; the next dispense pass will prune it from the
                // queue. Run one now so introspection reflects it promptly.
                dispense(shared.clone()).await;
                Err(PoolError::Timeout)
            }
        },
        None => rx.await.unwrap_or(Err(PoolError::Closed)),
    };

    outcome.map(|(id, handle)| Checkout::new(id, handle))
}

/// The central decision procedure: on every state change, try to satisfy
/// waiters from available resources (validating as we go) or, failing that,
/// kick off at most one creation.
pub(crate) async fn dispense<F: Factory>(shared: Arc<Shared<F>>) {
    loop {
        let mut guard = shared.internals.lock().await;
        guard.prune_cancelled_waiters();
        if guard.waiters.is_empty() {
            return;
        }

        if let Some(slot) = guard.available.pop_front() {
            guard.available_ids.remove(&slot.id);
            guard.under_validation += 1;
            drop(guard);

            let IdleSlot { id, mut handle, .. } = slot;
            let valid = shared.factory.validate(&mut handle).await;

            let mut guard = shared.internals.lock().await;
            guard.under_validation -= 1;

            if !valid {
                drop(guard);
                shared.log(LogLevel::Info, "discarding invalid idle resource before dispense");
                destroy_handle(&shared, id, handle).await;
                continue;
            }

            guard.prune_cancelled_waiters();
            if let Some(waiter) = guard.waiters.pop_front() {
                guard.in_use.insert(id);
                drop(guard);
                shared.log(LogLevel::Verbose, "dispensing idle resource to waiter");
                let _ = waiter.tx.send(Ok((id, handle)));
                continue;
            } else {
                push_available(&mut guard, &shared.config, id, handle);
                drop(guard);
                arm_reaper(&shared).await;
                continue;
            }
        }

        if guard.count < shared.config.max {
            // Reserve the slot before releasing the lock: two overlapping
            // dispense passes (e.g. two concurrent acquires) must never both
            // see the pre-increment count and each spawn a creation.
            guard.count += 1;
            drop(guard);
            spawn_create(shared.clone());
        }
        return;
    }
}

fn spawn_create<F: Factory>(shared: Arc<Shared<F>>) {
    tokio::spawn(async move {
        create_one(shared).await;
    });
}

/// Drives a single creation. The caller has already incremented `count` to
/// reserve this slot.
async fn create_one<F: Factory>(shared: Arc<Shared<F>>) {
    shared.log(LogLevel::Verbose, "creating resource");

    match shared.factory.create().await {
        Ok(handle) => {
            let mut guard = shared.internals.lock().await;
            guard.next_id += 1;
            let id = guard.next_id;
            guard.prune_cancelled_waiters();
            if let Some(waiter) = guard.waiters.pop_front() {
                guard.in_use.insert(id);
                drop(guard);
                let _ = waiter.tx.send(Ok((id, handle)));
            } else {
                push_available(&mut guard, &shared.config, id, handle);
                drop(guard);
                arm_reaper(&shared).await;
            }
            dispense(shared).await;
        }
        Err(err) => {
            let mut guard = shared.internals.lock().await;
            guard.count = guard.count.saturating_sub(1);
            guard.prune_cancelled_waiters();
            let waiter = guard.waiters.pop_front();
            drop(guard);

            if let Some(waiter) = waiter {
                let _ = waiter.tx.send(Err(PoolError::Factory(err)));
            } else {
                shared.log(LogLevel::Error, "factory create failed with no waiter present");
            }

            // Deferred dispense on the next scheduling turn, so any other
            // waiters get a fresh creation attempt.
            tokio::task::yield_now().await;
            dispense(shared).await;
        }
    }
}

/// Removes a handle from whichever set it is in, decrements `count`, runs
/// the factory's teardown, and re-engages the minimum floor.
async fn destroy_handle<F: Factory>(shared: &Arc<Shared<F>>, id: u64, handle: F::Handle) {
    {
        let mut guard = shared.internals.lock().await;
        guard.in_use.remove(&id);
        if guard.available_ids.remove(&id) {
            guard.available.retain(|s| s.id != id);
        }
        guard.count = guard.count.saturating_sub(1);
    }
    shared.factory.destroy(handle).await;
    ensure_minimum(shared).await;
}

/// If not draining and `count < min`, schedules `min - count` creations.
async fn ensure_minimum<F: Factory>(shared: &Arc<Shared<F>>) {
    let deficit = {
        let mut guard = shared.internals.lock().await;
        let deficit = if guard.draining {
            0
        } else {
            shared.config.min.saturating_sub(guard.count)
        };
        // Reserve every slot up front, while still holding the lock, so a
        // concurrent dispense or ensure_minimum call can't double-count the
        // same deficit.
        guard.count += deficit;
        deficit
    };
    for _ in 0..deficit {
        spawn_create(shared.clone());
    }
}

/// Arms the idle reaper if it is not already pending. Only one timer may be
/// pending at a time.
async fn arm_reaper<F: Factory>(shared: &Arc<Shared<F>>) {
    let mut guard = shared.internals.lock().await;
    if guard.reaper_handle.is_some() {
        return;
    }
    let shared2 = shared.clone();
    let handle = tokio::spawn(async move {
        tokio::time::sleep(shared2.config.reap_interval).await;
        reap_sweep(shared2).await;
    });
    guard.reaper_handle = Some(handle);
}

async fn reap_sweep<F: Factory>(shared: Arc<Shared<F>>) {
    let doomed = {
        let mut guard = shared.internals.lock().await;
        guard.reaper_handle = None;

        if !shared.config.refresh_idle {
            return;
        }

        let max_removable = guard.count.saturating_sub(shared.config.min) as usize;
        if max_removable == 0 {
            let still_nonempty = !guard.available.is_empty();
            drop(guard);
            if still_nonempty {
                arm_reaper(&shared).await;
            }
            return;
        }

        let now = Instant::now();
        let mut keep = VecDeque::with_capacity(guard.available.len());
        let mut doomed = Vec::new();
        while let Some(slot) = guard.available.pop_front() {
            if doomed.len() < max_removable && slot.expires_at <= now {
                guard.available_ids.remove(&slot.id);
                doomed.push(slot);
            } else {
                keep.push_back(slot);
            }
        }
        guard.available = keep;
        doomed
    };

    if doomed.is_empty() {
        let guard = shared.internals.lock().await;
        let still_nonempty = !guard.available.is_empty();
        drop(guard);
        if still_nonempty {
            arm_reaper(&shared).await;
        }
        return;
    }

    for slot in doomed {
        shared.log(LogLevel::Info, "reaping idle resource past its timeout");
        destroy_handle(&shared, slot.id, slot.handle).await;
    }

    let guard = shared.internals.lock().await;
    let still_nonempty = !guard.available.is_empty();
    drop(guard);
    if still_nonempty {
        arm_reaper(&shared).await;
    }
}

/// Returns a checked-out handle to the pool.
pub(crate) async fn release<F: Factory>(shared: &Arc<Shared<F>>, checkout: Checkout<F::Handle>) {
    let (id, handle) = checkout.into_parts();
    let mut guard = shared.internals.lock().await;

    if guard.available_ids.contains(&id) {
        drop(guard);
        shared.log(LogLevel::Error, "double release of an already-available resource");
        return;
    }
    if !guard.in_use.remove(&id) {
        drop(guard);
        shared.log(LogLevel::Error, "release of a resource the pool did not check out");
        return;
    }

    push_available(&mut guard, &shared.config, id, handle);
    drop(guard);
    arm_reaper(shared).await;
    dispense(shared.clone()).await;
}

/// Destroys a held handle instead of returning it.
pub(crate) async fn destroy<F: Factory>(shared: &Arc<Shared<F>>, checkout: Checkout<F::Handle>) {
    let (id, handle) = checkout.into_parts();
    destroy_handle(shared, id, handle).await;
    dispense(shared.clone()).await;
}

/// Initiates shutdown and waits for quiescence: no waiters, nothing under
/// validation, and every live resource back in the available set.
pub(crate) async fn drain<F: Factory>(shared: &Arc<Shared<F>>) {
    {
        let mut guard = shared.internals.lock().await;
        guard.draining = true;
    }
    loop {
        {
            let guard = shared.internals.lock().await;
            let quiescent = guard.waiters.is_empty()
                && guard.under_validation == 0
                && guard.available.len() as u32 == guard.count;
            if quiescent {
                return;
            }
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}

/// Forcibly destroys every idle resource right now. Does not wait for
/// in-use resources, and does not purge resources currently under
/// asynchronous validation (see `DESIGN.md` for why).
pub(crate) async fn destroy_all_now<F: Factory>(shared: &Arc<Shared<F>>) {
    let (snapshot, timer) = {
        let mut guard = shared.internals.lock().await;
        let timer = guard.reaper_handle.take();
        let snapshot: Vec<IdleSlot<F::Handle>> = guard.available.drain(..).collect();
        guard.available_ids.clear();
        (snapshot, timer)
    };

    if let Some(timer) = timer {
        timer.abort();
    }

    for slot in snapshot {
        destroy_handle(shared, slot.id, slot.handle).await;
    }
}
