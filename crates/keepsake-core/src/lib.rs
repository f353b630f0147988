//! # keepsake-core
//!
//! Core types, traits, and configuration for the keepsake backend.
//!
//! This crate provides the foundational data structures that the other
//! keepsake crates depend on: the shared error type, domain row models,
//! environment configuration, and the repository traits used to keep
//! handler logic testable without a live store.

pub mod config;
pub mod error;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use config::Config;
pub use error::{Error, Result};
pub use models::*;
pub use traits::TagRepository;
