//! Firewall rule set for the proxy instance.
//!
//! Inbound traffic is limited to HTTP. Outbound traffic is unrestricted by
//! default: the proxy has to reach the model-inference endpoint and the
//! container registry. That relaxation is a configuration choice
//! ([`EgressPolicy`]) and is logged whenever it is in effect.

use std::fmt;

use relaystack_common::error::Result;
use relaystack_synth::engine::{Engine, ResourceKind, ResourceRef, Scope};
use relaystack_synth::property::{Properties, PropertyValue};

use crate::network::{ANY_IPV4, NetworkHandle};

/// Description attached to the security group. Must match the deployed
/// group verbatim; a different description replaces it.
pub const GROUP_DESCRIPTION: &str = "Litellm Broswer Security Group";

/// Traffic direction of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Traffic reaching the instance.
    Inbound,
    /// Traffic leaving the instance.
    Outbound,
}

/// Protocol matched by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// TCP on a single port.
    Tcp(u16),
    /// Every protocol and port.
    All,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp(port) => write!(f, "tcp/{port}"),
            Self::All => f.write_str("all"),
        }
    }
}

/// A single (direction, protocol, port, source) tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FirewallRule {
    /// Direction.
    pub direction: Direction,
    /// Protocol and port.
    pub protocol: Protocol,
    /// Peer address range: the source for inbound rules, the destination
    /// for outbound ones.
    pub peer: String,
    /// Human-readable description.
    pub description: String,
}

impl FirewallRule {
    fn new(direction: Direction, protocol: Protocol, description: &str) -> Self {
        Self {
            direction,
            protocol,
            peer: ANY_IPV4.to_string(),
            description: description.to_string(),
        }
    }

    fn to_property(&self) -> PropertyValue {
        let props = Properties::new()
            .with("CidrIp", self.peer.as_str())
            .with("Description", self.description.as_str());
        let props = match self.protocol {
            Protocol::Tcp(port) => props
                .with("IpProtocol", "tcp")
                .with("FromPort", i64::from(port))
                .with("ToPort", i64::from(port)),
            Protocol::All => props.with("IpProtocol", "-1"),
        };
        props.into()
    }
}

/// Outbound policy of the rule set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EgressPolicy {
    /// Any destination, any protocol.
    #[default]
    Unrestricted,
    /// HTTP and HTTPS only.
    WebOnly,
}

/// Rules for `egress`, inbound first.
///
/// Inbound TCP/80 from any source is always present.
#[must_use]
pub fn plan_rules(egress: EgressPolicy) -> Vec<FirewallRule> {
    let mut rules = vec![FirewallRule::new(
        Direction::Inbound,
        Protocol::Tcp(80),
        "allow http access",
    )];
    match egress {
        EgressPolicy::Unrestricted => rules.push(FirewallRule::new(
            Direction::Outbound,
            Protocol::All,
            "Allow all outbound traffic by default",
        )),
        EgressPolicy::WebOnly => {
            rules.push(FirewallRule::new(
                Direction::Outbound,
                Protocol::Tcp(80),
                "allow outbound http",
            ));
            rules.push(FirewallRule::new(
                Direction::Outbound,
                Protocol::Tcp(443),
                "allow outbound https",
            ));
        }
    }
    rules
}

/// A declared rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirewallRuleSet {
    /// The security group.
    pub group: ResourceRef,
    rules: Vec<FirewallRule>,
}

impl FirewallRuleSet {
    /// All rules, inbound first.
    #[must_use]
    pub fn rules(&self) -> &[FirewallRule] {
        &self.rules
    }

    /// Whether inbound traffic with `protocol` from anywhere is allowed.
    #[must_use]
    pub fn allows_inbound_from_anywhere(&self, protocol: Protocol) -> bool {
        self.rules.iter().any(|r| {
            r.direction == Direction::Inbound && r.protocol == protocol && r.peer == ANY_IPV4
        })
    }

    /// Whether every outbound destination and protocol is allowed.
    #[must_use]
    pub fn egress_unrestricted(&self) -> bool {
        self.rules
            .iter()
            .any(|r| r.direction == Direction::Outbound && r.protocol == Protocol::All)
    }
}

/// Declares the rule set inside `network`.
///
/// # Errors
///
/// Propagates engine failures unchanged.
pub fn declare_firewall<E: Engine>(
    engine: &mut E,
    scope: &Scope,
    network: &NetworkHandle,
    egress: EgressPolicy,
) -> Result<FirewallRuleSet> {
    let rules = plan_rules(egress);
    if egress == EgressPolicy::Unrestricted {
        tracing::warn!(
            scope = %scope.path(),
            "outbound traffic is unrestricted; the proxy needs the inference endpoint and container registry"
        );
    }

    let render = |direction: Direction| -> Vec<PropertyValue> {
        rules
            .iter()
            .filter(|r| r.direction == direction)
            .map(FirewallRule::to_property)
            .collect()
    };
    let group = engine.declare(
        ResourceKind::SecurityGroup,
        &scope.logical_id("SecurityGroup")?,
        Properties::new()
            .with("GroupDescription", GROUP_DESCRIPTION)
            .with("VpcId", network.vpc())
            .with("SecurityGroupIngress", render(Direction::Inbound))
            .with("SecurityGroupEgress", render(Direction::Outbound)),
    )?;
    tracing::debug!(group = %group.logical_id(), rules = rules.len(), "declared firewall");

    Ok(FirewallRuleSet { group, rules })
}
