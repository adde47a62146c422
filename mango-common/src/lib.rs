//! Shared types for the SuperMango services
//!
//! Provides the common error taxonomy and TOML configuration loading used
//! by the severity analysis service.

pub mod config;
pub mod error;

pub use error::{Error, Result};
