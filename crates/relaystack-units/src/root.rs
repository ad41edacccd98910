//! Root unit: the single entry point of a composition.

use relaystack_common::config::DeploymentConfig;
use relaystack_common::constants::DEFAULT_MAX_ZONES;
use relaystack_common::error::Result;
use relaystack_common::types::SecretKey;
use relaystack_synth::engine::{Deferred, Engine, Scope};
use relaystack_synth::synthesizer::Synthesizer;

use crate::compute::{ComputeOptions, create_compute};
use crate::network::create_network;

/// Scope of the network unit.
pub const NETWORK_SCOPE: &str = "Network";
/// Scope of the compute unit.
pub const COMPUTE_SCOPE: &str = "Litellm";
/// Output carrying the instance's public address.
pub const PUBLIC_IP_OUTPUT: &str = "publicIp";
/// Output carrying the instance's public DNS name.
pub const PUBLIC_DNS_OUTPUT: &str = "publicDns";

/// Outputs of the whole composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootOutputs {
    /// Public IPv4 address of the proxy.
    pub public_ip: Deferred<String>,
    /// Public DNS name of the proxy.
    pub public_dns: Deferred<String>,
}

/// Declares the reference deployment.
///
/// # Errors
///
/// Propagates declaration and engine failures unchanged.
pub fn compose<E: Engine>(engine: &mut E, secret: &SecretKey) -> Result<RootOutputs> {
    compose_with(engine, secret, &ComputeOptions::default())
}

/// Declares the deployment with explicit compute options.
///
/// # Errors
///
/// Propagates declaration and engine failures unchanged.
pub fn compose_with<E: Engine>(
    engine: &mut E,
    secret: &SecretKey,
    options: &ComputeOptions,
) -> Result<RootOutputs> {
    let span = tracing::info_span!("compose", region = %engine.region());
    let _guard = span.enter();
    if secret.is_placeholder() {
        tracing::warn!("composing with the insecure placeholder master key");
    }

    let root = Scope::root();
    let network = create_network(engine, &root.child(NETWORK_SCOPE), DEFAULT_MAX_ZONES)?;
    let compute = create_compute(engine, &root.child(COMPUTE_SCOPE), &network, secret, options)?;

    engine.output(
        PUBLIC_IP_OUTPUT,
        "Public IP address of the EC2 instance",
        &compute.public_address,
    )?;
    engine.output(
        PUBLIC_DNS_OUTPUT,
        "Public DNS name of the EC2 instance",
        &compute.public_dns,
    )?;

    Ok(RootOutputs {
        public_ip: compute.public_address,
        public_dns: compute.public_dns,
    })
}

/// Composes into a fresh [`Synthesizer`] for `config`.
///
/// # Errors
///
/// Propagates declaration failures.
pub fn synthesize(config: &DeploymentConfig, options: &ComputeOptions) -> Result<Synthesizer> {
    let mut engine = Synthesizer::new(config.region.clone());
    let _ = compose_with(&mut engine, &config.secret_key, options)?;
    tracing::info!(resources = engine.resources().len(), "composition synthesized");
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use relaystack_common::types::Region;
    use relaystack_synth::engine::ResourceKind;

    use super::*;

    #[test]
    fn publishes_both_outputs() {
        let mut engine = Synthesizer::new(Region::new("us-east-1").expect("region"));
        let outputs = compose(&mut engine, &SecretKey::new("sk-test").expect("key")).expect("compose");
        assert_eq!(outputs.public_ip.attribute(), "PublicIp");
        assert_eq!(outputs.public_dns.attribute(), "PublicDnsName");
        assert_eq!(engine.outputs()[PUBLIC_IP_OUTPUT].value, outputs.public_ip);
        assert_eq!(engine.outputs()[PUBLIC_DNS_OUTPUT].value, outputs.public_dns);
    }

    #[test]
    fn synthesize_uses_configured_region() {
        let config = DeploymentConfig {
            region: Region::new("eu-north-1").expect("region"),
            secret_key: SecretKey::new("sk-test").expect("key"),
        };
        let engine = synthesize(&config, &ComputeOptions::default()).expect("synth");
        assert_eq!(engine.region().as_str(), "eu-north-1");
        assert_eq!(engine.count(ResourceKind::Instance), 1);
    }
}
