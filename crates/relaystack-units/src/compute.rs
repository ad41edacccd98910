//! Compute unit: role, firewall, bootstrap script and the proxy instance.

use relaystack_common::error::Result;
use relaystack_common::types::SecretKey;
use relaystack_synth::engine::{Deferred, Engine, ResourceKind, ResourceRef, Scope};
use relaystack_synth::property::{Properties, PropertyValue};

use crate::bootstrap::generate_bootstrap_script;
use crate::firewall::{EgressPolicy, FirewallRuleSet, declare_firewall};
use crate::network::{NetworkHandle, SubnetType};
use crate::role::{AccessRole, bind_role};

/// Instance size class.
pub const INSTANCE_TYPE: &str = "t3.large";
/// Parameter holding the latest Amazon Linux 2023 image id.
pub const IMAGE_PARAMETER: &str =
    "/aws/service/ami-amazon-linux-latest/al2023-ami-kernel-default-x86_64";
/// Root device name.
pub const ROOT_DEVICE: &str = "/dev/xvda";
/// Root volume size in GiB.
pub const ROOT_VOLUME_GIB: i64 = 8;
/// Root volume performance tier.
pub const ROOT_VOLUME_TYPE: &str = "gp3";
/// Name tag of the instance.
pub const INSTANCE_NAME: &str = "litellm Instance";

/// Tunables of the compute unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComputeOptions {
    egress: EgressPolicy,
}

impl ComputeOptions {
    /// Options matching the reference deployment.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            egress: EgressPolicy::Unrestricted,
        }
    }

    /// Sets the outbound firewall policy.
    #[must_use]
    pub const fn egress(mut self, egress: EgressPolicy) -> Self {
        self.egress = egress;
        self
    }

    /// The outbound firewall policy.
    #[must_use]
    pub const fn egress_policy(&self) -> EgressPolicy {
        self.egress
    }
}

/// Everything the compute unit declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeUnit {
    /// The instance.
    pub instance: ResourceRef,
    /// Role attached to the instance.
    pub role: AccessRole,
    /// Firewall attached to the instance.
    pub firewall: FirewallRuleSet,
    /// Public IPv4 address, known after provisioning.
    pub public_address: Deferred<String>,
    /// Public DNS name, known after provisioning.
    pub public_dns: Deferred<String>,
}

/// Declares the compute unit inside `network`.
///
/// Logical ids are validated and the bootstrap script, role and firewall are
/// built before the instance, so a failure in any of them leaves no instance
/// declared. Once the instance exists only an engine rejection of the
/// trailing `depend_on`, `reference` or `output` calls can fail, and that
/// leaves the instance recorded.
///
/// # Errors
///
/// Propagates declaration and engine failures unchanged.
pub fn create_compute<E: Engine>(
    engine: &mut E,
    scope: &Scope,
    network: &NetworkHandle,
    secret: &SecretKey,
    options: &ComputeOptions,
) -> Result<ComputeUnit> {
    let region = engine.region().clone();
    tracing::info!(scope = %scope.path(), %region, "declaring compute unit");

    let instance_id = scope.logical_id("Instance")?;
    let output_id = scope.logical_id("InstancePublicIp")?;
    let script = generate_bootstrap_script(&region, secret);
    let role = bind_role(engine, scope)?;
    let firewall = declare_firewall(engine, scope, network, options.egress_policy())?;
    let subnet = network.placement(SubnetType::Public)?;

    let root_volume = Properties::new()
        .with("DeviceName", ROOT_DEVICE)
        .with(
            "Ebs",
            Properties::new()
                .with("VolumeSize", ROOT_VOLUME_GIB)
                .with("VolumeType", ROOT_VOLUME_TYPE),
        );
    let name_tag = Properties::new()
        .with("Key", "Name")
        .with("Value", INSTANCE_NAME);

    let instance = engine.declare(
        ResourceKind::Instance,
        &instance_id,
        Properties::new()
            .with("InstanceType", INSTANCE_TYPE)
            .with("ImageId", PropertyValue::SsmParameter(IMAGE_PARAMETER.into()))
            .with("SubnetId", subnet)
            .with("SecurityGroupIds", vec![firewall.group.to_ref()])
            .with("IamInstanceProfile", &role.instance_profile)
            .with("BlockDeviceMappings", vec![root_volume])
            .with("UserData", script.to_user_data())
            .with("Tags", vec![name_tag]),
    )?;
    engine.depend_on(&instance, &role.role)?;

    let public_address: Deferred<String> = engine.reference(&instance, "PublicIp")?;
    let public_dns: Deferred<String> = engine.reference(&instance, "PublicDnsName")?;
    engine.output(
        output_id.as_str(),
        "Public IP address of the EC2 instance",
        &public_address,
    )?;
    tracing::info!(instance = %instance.logical_id(), "compute unit declared");

    Ok(ComputeUnit {
        instance,
        role,
        firewall,
        public_address,
        public_dns,
    })
}
