//! Command-line interface for chatlens.
//!
//! This crate wires the transcript analysis pipeline to a small CLI that
//! reads an export from disk and prints the summary tables.

#![deny(missing_docs, unsafe_code)]

/// CLI command definitions and parsing.
pub mod commands;

/// CLI application entry point and configuration.
pub mod app;

/// Error types for CLI operations.
pub mod error;
