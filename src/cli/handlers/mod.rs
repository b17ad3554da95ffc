//! Command handlers for CLI operations
//!
//! This module contains handlers for different CLI commands,
//! separating command execution logic from parsing and validation.

pub mod derive_uuid;
pub mod serve;

pub use derive_uuid::DeriveUuidCommandHandler;
pub use serve::ServeCommandHandler;
