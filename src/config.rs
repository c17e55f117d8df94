//! Builder-style configuration, mirroring the teacher crate's `Builder<M>`:
//! chained setters with a `Default` impl supplying the documented defaults,
//! `assert!`-based panics for caller mistakes that are independent of the
//! factory (`max_size == 0`), and a `Result`-returning `build` for the one
//! cross-field check that needs both fields at once (`min <= max`).

use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

use crate::error::ConfigError;
use crate::factory::Factory;
use crate::internals::Shared;
use crate::log::LogConfig;
use crate::pool::Pool;

const DEFAULT_MAX: u32 = 10;
const DEFAULT_IDLE_TIMEOUT_MILLIS: u64 = 30_000;
const DEFAULT_REAP_INTERVAL_MILLIS: u64 = 1_000;

/// Plain configuration data, stripped of the factory-typed `Builder` once
/// construction succeeds.
pub(crate) struct PoolConfig {
    pub(crate) name: String,
    pub(crate) min: u32,
    pub(crate) max: u32,
    pub(crate) idle_timeout: Duration,
    pub(crate) reap_interval: Duration,
    pub(crate) acquire_timeout: Option<Duration>,
    pub(crate) refresh_idle: bool,
    pub(crate) return_to_head: bool,
    pub(crate) log: LogConfig,
}

/// Builds a [`Pool`].
///
/// Parameters are initialized with the defaults documented on each setter
/// below; only `min` and `max` typically need to be set explicitly.
pub struct Builder<F: Factory> {
    name: String,
    min: u32,
    max: u32,
    idle_timeout: Duration,
    reap_interval: Duration,
    acquire_timeout: Option<Duration>,
    refresh_idle: bool,
    return_to_head: bool,
    log: LogConfig,
    _factory: PhantomData<F>,
}

impl<F: Factory> fmt::Debug for Builder<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("name", &self.name)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("idle_timeout", &self.idle_timeout)
            .field("reap_interval", &self.reap_interval)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("refresh_idle", &self.refresh_idle)
            .field("return_to_head", &self.return_to_head)
            .field("log", &self.log)
            .finish()
    }
}

impl<F: Factory> Default for Builder<F> {
    fn default() -> Self {
        Builder {
            name: String::new(),
            min: 0,
            max: DEFAULT_MAX,
            idle_timeout: Duration::from_millis(DEFAULT_IDLE_TIMEOUT_MILLIS),
            reap_interval: Duration::from_millis(DEFAULT_REAP_INTERVAL_MILLIS),
            acquire_timeout: None,
            refresh_idle: true,
            return_to_head: false,
            log: LogConfig::Off,
            _factory: PhantomData,
        }
    }
}

impl<F: Factory> Builder<F> {
    /// Constructs a new `Builder`, with every parameter set to its default.
    pub fn new() -> Builder<F> {
        Default::default()
    }

    /// Sets a diagnostic label for the pool. Purely informational; surfaced
    /// through [`Pool::name`](crate::Pool::name) and attached to every log
    /// message when [`LogConfig::Tracing`] is in use.
    ///
    /// Defaults to the empty string.
    pub fn name(mut self, name: impl Into<String>) -> Builder<F> {
        self.name = name.into();
        self
    }

    /// Sets the floor: the pool eagerly maintains at least this many
    /// resources once the floor has been engaged for the first time (see
    /// `DESIGN.md` for why the floor is not pre-warmed at construction).
    ///
    /// Defaults to 0.
    pub fn min_idle(mut self, min: u32) -> Builder<F> {
        self.min = min;
        self
    }

    /// Sets the ceiling: the hard cap on the number of resources alive or
    /// being born at once.
    ///
    /// Defaults to 10.
    pub fn max_size(mut self, max: u32) -> Builder<F> {
        assert!(max > 0, "max_size must be greater than zero!");
        self.max = max;
        self
    }

    /// Sets how long an available resource may sit idle before becoming
    /// eligible for reaping.
    ///
    /// Defaults to 30 seconds.
    pub fn idle_timeout(mut self, idle_timeout: Duration) -> Builder<F> {
        assert!(
            idle_timeout > Duration::from_secs(0),
            "idle_timeout must be greater than zero!"
        );
        self.idle_timeout = idle_timeout;
        self
    }

    /// Sets the period between reaper sweeps once the reaper has been armed.
    ///
    /// Defaults to 1 second.
    pub fn reap_interval(mut self, reap_interval: Duration) -> Builder<F> {
        assert!(
            reap_interval > Duration::from_secs(0),
            "reap_interval must be greater than zero!"
        );
        self.reap_interval = reap_interval;
        self
    }

    /// Sets the maximum time an `acquire` may remain queued before failing
    /// with [`PoolError::Timeout`](crate::PoolError::Timeout).
    ///
    /// Defaults to `None` (wait forever).
    pub fn acquire_timeout(mut self, acquire_timeout: Option<Duration>) -> Builder<F> {
        if let Some(d) = acquire_timeout {
            assert!(
                d > Duration::from_secs(0),
                "acquire_timeout must be greater than zero!"
            );
        }
        self.acquire_timeout = acquire_timeout;
        self
    }

    /// If `false`, suppresses reaping that would drop the live count below
    /// `min`.
    ///
    /// Defaults to `true`.
    pub fn refresh_idle(mut self, refresh_idle: bool) -> Builder<F> {
        self.refresh_idle = refresh_idle;
        self
    }

    /// If `true`, released resources are inserted at the head of the
    /// available list (LIFO reuse) rather than the tail (FIFO reuse).
    ///
    /// Defaults to `false`.
    pub fn return_to_head(mut self, return_to_head: bool) -> Builder<F> {
        self.return_to_head = return_to_head;
        self
    }

    /// Sets the sink for the pool's diagnostic messages.
    ///
    /// Defaults to [`LogConfig::Off`].
    pub fn log(mut self, log: LogConfig) -> Builder<F> {
        self.log = log;
        self
    }

    fn into_config(self) -> PoolConfig {
        PoolConfig {
            name: self.name,
            min: self.min,
            max: self.max,
            idle_timeout: self.idle_timeout,
            reap_interval: self.reap_interval,
            acquire_timeout: self.acquire_timeout,
            refresh_idle: self.refresh_idle,
            return_to_head: self.return_to_head,
            log: self.log,
        }
    }

    /// Consumes the builder, validating cross-field constraints and
    /// returning a ready-to-use pool.
    ///
    /// Unlike the teacher crate's `Builder::build`, this does not wait for
    /// `min_idle` resources to be established first: the source
    /// specification's floor is engaged lazily, the first time a resource is
    /// destroyed (see `DESIGN.md`).
    pub fn build(self, factory: F) -> Result<Pool<F>, ConfigError> {
        if self.min > self.max {
            return Err(ConfigError::MinExceedsMax {
                min: self.min,
                max: self.max,
            });
        }
        let config = self.into_config();
        Ok(Pool {
            shared: Shared::new(config, factory),
        })
    }
}
