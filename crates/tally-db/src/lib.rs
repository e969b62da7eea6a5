//! Database layer for Tally.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization
//! and embedded SQL migrations. The pool is created once by the hosting
//! process and shared by every caller; nothing in the event store opens or
//! closes pools on its own.
//!
//! # Store requirements
//!
//! - **Atomic upsert**: the event store relies on
//!   `INSERT ... ON CONFLICT (...) DO UPDATE SET count = count + excluded.count`
//!   resolving each key conflict in one indivisible step. The bundled SQLite
//!   supports it; a store without a native equivalent must emulate it with a
//!   serializable transaction and explicit conflict handling.
//! - **WAL mode**: concurrent readers with a single writer at a time; other
//!   writers wait up to `busy_timeout_ms`.
//! - **Embedded migrations**: SQL files are compiled into the binary via
//!   `include_str!` so the schema cannot drift from the queries using it.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
