//! # relaystack-units
//!
//! Composition units for the LiteLLM proxy deployment.
//!
//! Provides three units, instantiated top-down by [`root::compose`]:
//! - [`network`]: A two-zone network with one public subnet per zone.
//! - [`compute`]: Access role, firewall, bootstrap script and the instance.
//! - [`root`]: Wires the two together and publishes the instance address.
//!
//! # Example
//!
//! ```rust,no_run
//! use relaystack_common::types::{Region, SecretKey};
//! use relaystack_synth::synthesizer::Synthesizer;
//!
//! let region = Region::new("us-east-1").expect("region");
//! let secret = SecretKey::new("sk-test").expect("key");
//! let mut engine = Synthesizer::new(region);
//! let outputs = relaystack_units::root::compose(&mut engine, &secret);
//! ```

pub mod bootstrap;
pub mod compute;
pub mod firewall;
pub mod network;
pub mod role;
pub mod root;
