//! Access role assumed by the proxy instance.

use relaystack_common::error::Result;
use relaystack_common::types::Region;
use relaystack_synth::engine::{Engine, ResourceKind, ResourceRef, Scope};
use relaystack_synth::property::{Properties, PropertyValue};
use relaystack_synth::synthesizer::ref_list;

/// Managed permission sets attached to the role: model inference and remote
/// management.
pub const PERMISSION_SETS: [&str; 2] = ["AmazonBedrockFullAccess", "AmazonSSMManagedInstanceCore"];

/// The only principal allowed to assume the role.
pub const TRUSTED_SERVICE: &str = "ec2.amazonaws.com";

/// Role name for `region`. Role names are account-wide, hence the suffix.
#[must_use]
pub fn role_name(region: &Region) -> String {
    format!("litellm-ec2-{region}")
}

/// Region name prefixes of the partitions other than `aws`.
const PARTITION_PREFIXES: [(&str, &str); 6] = [
    ("us-gov-", "aws-us-gov"),
    ("us-isob-", "aws-iso-b"),
    ("us-isof-", "aws-iso-f"),
    ("eu-isoe-", "aws-iso-e"),
    ("us-iso-", "aws-iso"),
    ("cn-", "aws-cn"),
];

/// Partition that owns `region`.
#[must_use]
pub fn partition(region: &Region) -> &'static str {
    let name = region.as_str();
    PARTITION_PREFIXES
        .iter()
        .find(|&&(prefix, _)| name.starts_with(prefix))
        .map_or("aws", |&(_, partition)| partition)
}

/// ARN of a provider-managed permission set.
#[must_use]
pub fn managed_policy_arn(region: &Region, policy: &str) -> String {
    format!("arn:{}:iam::aws:policy/{policy}", partition(region))
}

/// A declared role and the instance profile carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRole {
    /// The role.
    pub role: ResourceRef,
    /// Profile attached to the instance.
    pub instance_profile: ResourceRef,
    /// Physical role name.
    pub name: String,
}

/// Declares the role and its instance profile.
///
/// # Errors
///
/// Propagates engine failures unchanged, including rejection of the managed
/// permission set names.
pub fn bind_role<E: Engine>(engine: &mut E, scope: &Scope) -> Result<AccessRole> {
    let region = engine.region().clone();
    let name = role_name(&region);

    let trust_policy = Properties::new()
        .with("Version", "2012-10-17")
        .with(
            "Statement",
            vec![
                Properties::new()
                    .with("Action", "sts:AssumeRole")
                    .with("Effect", "Allow")
                    .with("Principal", Properties::new().with("Service", TRUSTED_SERVICE)),
            ],
        );
    let policy_arns: Vec<PropertyValue> = PERMISSION_SETS
        .iter()
        .map(|p| managed_policy_arn(&region, p).into())
        .collect();

    let role = engine.declare(
        ResourceKind::Role,
        &scope.logical_id("Role")?,
        Properties::new()
            .with("RoleName", name.as_str())
            .with("AssumeRolePolicyDocument", trust_policy)
            .with("ManagedPolicyArns", policy_arns),
    )?;
    let instance_profile = engine.declare(
        ResourceKind::InstanceProfile,
        &scope.logical_id("InstanceProfile")?,
        Properties::new().with("Roles", ref_list([&role])),
    )?;
    tracing::debug!(role = %name, "declared access role");

    Ok(AccessRole {
        role,
        instance_profile,
        name,
    })
}

#[cfg(test)]
mod tests {
    use relaystack_synth::synthesizer::Synthesizer;

    use super::*;

    fn region(name: &str) -> Region {
        Region::new(name).expect("region")
    }

    #[test]
    fn name_is_derived_from_region() {
        assert_eq!(role_name(&region("us-east-1")), "litellm-ec2-us-east-1");
        assert_ne!(role_name(&region("us-east-1")), role_name(&region("us-west-2")));
    }

    #[test]
    fn partitions() {
        assert_eq!(partition(&region("us-east-1")), "aws");
        assert_eq!(partition(&region("cn-north-1")), "aws-cn");
        assert_eq!(partition(&region("us-gov-west-1")), "aws-us-gov");
        assert_eq!(partition(&region("us-iso-east-1")), "aws-iso");
        assert_eq!(partition(&region("us-isob-east-1")), "aws-iso-b");
        assert_eq!(partition(&region("us-isof-south-1")), "aws-iso-f");
        assert_eq!(partition(&region("eu-isoe-west-1")), "aws-iso-e");
        assert_eq!(
            managed_policy_arn(&region("cn-north-1"), "AmazonBedrockFullAccess"),
            "arn:aws-cn:iam::aws:policy/AmazonBedrockFullAccess"
        );
        assert_eq!(
            managed_policy_arn(&region("us-isob-east-1"), "AmazonSSMManagedInstanceCore"),
            "arn:aws-iso-b:iam::aws:policy/AmazonSSMManagedInstanceCore"
        );
    }

    #[test]
    fn role_has_exactly_the_two_permission_sets() {
        let mut engine = Synthesizer::new(region("eu-west-1"));
        let role = bind_role(&mut engine, &Scope::root().child("Litellm")).expect("role");
        assert_eq!(role.name, "litellm-ec2-eu-west-1");

        let template = engine.template().expect("template");
        let props = &template.resources[role.role.logical_id().as_str()].properties;
        assert_eq!(
            props["ManagedPolicyArns"],
            serde_json::json!([
                "arn:aws:iam::aws:policy/AmazonBedrockFullAccess",
                "arn:aws:iam::aws:policy/AmazonSSMManagedInstanceCore"
            ])
        );
        let statements = props["AssumeRolePolicyDocument"]["Statement"]
            .as_array()
            .expect("statements");
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0]["Principal"]["Service"], "ec2.amazonaws.com");
    }

    #[test]
    fn profile_depends_on_role() {
        let mut engine = Synthesizer::new(region("us-east-1"));
        let role = bind_role(&mut engine, &Scope::root().child("Litellm")).expect("role");
        assert_eq!(
            engine.dependencies_of(role.instance_profile.logical_id()),
            vec![role.role.logical_id().clone()]
        );
    }
}
