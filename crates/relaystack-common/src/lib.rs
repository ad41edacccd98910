//! # relaystack-common
//!
//! Shared types, error definitions, configuration loading, and constants
//! used across the entire relaystack workspace.
//!
//! This crate is the leaf of the dependency graph. It depends on no other
//! internal crate and provides the primitives that the synthesizer, the
//! composition units and the CLI build upon.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
