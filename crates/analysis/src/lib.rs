//! Transcript parsing and emoji-sentiment analysis for chatlens.
//!
//! This crate turns exported chat transcripts into featured records and
//! derives per-sender word, emoji and sentiment tables from them.

#![deny(missing_docs, unsafe_code)]

/// Natural language processing utilities.
pub mod nlp;

/// Machine learning models and inference.
pub mod ml;

/// Chat transcript parsers.
pub mod parsers;

/// Temporal feature derivation.
pub mod features;

/// Emoji segmentation.
pub mod emoji;

/// Memoized emoji sentiment scoring.
pub mod sentiment;

/// Per-sender and corpus-wide summary tables.
pub mod aggregate;

/// Run-level orchestration.
pub mod pipeline;

/// Error types for analysis operations.
pub mod error;

pub use pipeline::{Pipeline, RunReport};
