//! # storage-adapters
//!
//! Implementations of the persistence and blob-store ports from `domains`.
//!
//! The in-memory store is always compiled: it backs the test suites and
//! keeps the adapters honest about which invariants belong to storage
//! (like/share uniqueness, the reply parent CHECK). Postgres lives behind
//! the `db-postgres` feature, the local blob store behind `media-local`.

pub mod memory;

#[cfg(feature = "db-postgres")]
pub mod postgres;

#[cfg(feature = "media-local")]
pub mod media_local;

pub use memory::MemoryStore;

#[cfg(feature = "db-postgres")]
pub use postgres::PgStore;

#[cfg(feature = "media-local")]
pub use media_local::LocalBlobStore;
