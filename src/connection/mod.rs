//! Session management.
//!
//! This module provides session configuration parsing and the [`Session`]
//! that owns a driver connection, its statement cache and the vendor typing
//! strategy.

pub mod params;
pub mod session;

pub use params::{SessionConfig, DEFAULT_STATEMENT_LIMIT};
pub use session::Session;
