//! # domains
//!
//! The central domain model and interface definitions for Campus-Board.
//! No I/O lives here: entities, the error taxonomy, and the port traits
//! that adapters implement.

pub mod error;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use ports::*;
