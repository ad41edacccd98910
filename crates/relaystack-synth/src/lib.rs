//! # relaystack-synth
//!
//! The declaration side of a provisioning engine.
//!
//! Handles:
//! - **Engine**: The `declare` / `reference` / `output` interface composition
//!   units are written against, plus [`Deferred`](engine::Deferred) values.
//! - **Property**: Property trees whose structural references carry the
//!   dependency information.
//! - **Graph**: Dependency graph construction and topological resolution.
//! - **Synthesizer**: An in-memory engine that records declarations and
//!   renders them into a deterministic template.

pub mod engine;
pub mod graph;
pub mod property;
pub mod synthesizer;
pub mod template;
