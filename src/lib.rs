//! A generic, asynchronous resource pool: a reusable component that
//! mediates access to a bounded collection of expensive, reusable resources
//! (database connections, network sockets, worker handles, ...) between many
//! concurrent callers.
//!
//! This is descended from `bb8`, a tokio-based connection pool, generalised
//! from "database connection" to any resource a user-supplied [`Factory`]
//! knows how to create, destroy, and validate. On top of what `bb8` offers,
//! this pool enforces a minimum floor of warm resources, reaps idle
//! resources past a configurable timeout, and supports an orderly drain.
//!
//! # Example
//!
//! ```ignore
//! use respool::{Factory, Pool};
//!
//! struct FooFactory;
//!
//! #[async_trait::async_trait]
//! impl Factory for FooFactory {
//!     type Handle = FooConnection;
//!     type Error = FooError;
//!
//!     async fn create(&self) -> Result<FooConnection, FooError> {
//!         FooConnection::connect("localhost:1234").await
//!     }
//!
//!     async fn destroy(&self, conn: FooConnection) {
//!         conn.close().await;
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let pool = Pool::builder().max_size(10).build(FooFactory).unwrap();
//!
//!     let conn = pool.acquire().await.unwrap();
//!     // use `conn`; it is returned to the pool when it falls out of scope.
//! }
//! ```
#![deny(missing_docs, missing_debug_implementations)]

mod config;
mod error;
mod factory;
mod guard;
mod internals;
mod log;
mod pool;

pub use config::Builder;
pub use error::{ConfigError, PoolError};
pub use factory::Factory;
pub use guard::{Checkout, PooledHandle};
pub use internals::State;
pub use log::{LogConfig, LogLevel};
pub use pool::Pool;
