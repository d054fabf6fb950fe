//! Core types, errors, and configuration for chatlens
//!
//! This crate provides the record and score types shared by the transcript
//! pipeline, together with the error type and the TOML configuration model.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

// Re-exports for convenience
pub use config::ChatlensConfig;
pub use error::{Error, Result};
pub use types::*;
