//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the optional TOML file, falls back to
//! defaults when it does not exist, and can write the effective settings
//! back out.

pub mod config;
