//! Network unit: an isolated network with one public subnet per zone.

use relaystack_common::constants::MAX_ZONES_LIMIT;
use relaystack_common::error::{RelayError, Result};
use relaystack_synth::engine::{Engine, ResourceKind, ResourceRef, Scope};
use relaystack_synth::property::{Properties, PropertyValue};

/// Address range of the network.
pub const VPC_CIDR: &str = "10.0.0.0/16";
/// Mask of every public subnet.
pub const SUBNET_MASK: u8 = 24;
/// Destination of the default route.
pub const ANY_IPV4: &str = "0.0.0.0/0";

/// Subnet tiers a placement can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubnetType {
    /// Routed to the internet gateway; instances get public addresses.
    Public,
}

/// One public subnet and its routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicSubnet {
    /// The subnet.
    pub subnet: ResourceRef,
    /// Its route table.
    pub route_table: ResourceRef,
    /// Zone index within the region.
    pub zone_index: usize,
    /// Address range.
    pub cidr: String,
}

/// Handle to a declared network.
///
/// Only [`create_network`] builds one, so every handle spans at least one
/// zone with exactly one public subnet per zone. Compute units borrow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkHandle {
    vpc: ResourceRef,
    internet_gateway: ResourceRef,
    public_subnets: Vec<PublicSubnet>,
}

impl NetworkHandle {
    /// The network resource.
    #[must_use]
    pub const fn vpc(&self) -> &ResourceRef {
        &self.vpc
    }

    /// The internet gateway.
    #[must_use]
    pub const fn internet_gateway(&self) -> &ResourceRef {
        &self.internet_gateway
    }

    /// Public subnets, one per zone, in zone order.
    #[must_use]
    pub fn public_subnets(&self) -> &[PublicSubnet] {
        &self.public_subnets
    }

    /// Number of zones the network spans.
    #[must_use]
    pub fn zone_count(&self) -> usize {
        self.public_subnets.len()
    }

    /// Subnets of the given tier.
    #[must_use]
    pub fn subnets(&self, subnet_type: SubnetType) -> Vec<&ResourceRef> {
        match subnet_type {
            SubnetType::Public => self.public_subnets.iter().map(|s| &s.subnet).collect(),
        }
    }

    /// The subnet an instance of the given tier is placed in: the first one.
    ///
    /// # Errors
    ///
    /// Returns a declaration error if the tier has no subnet.
    pub fn placement(&self, subnet_type: SubnetType) -> Result<&ResourceRef> {
        self.subnets(subnet_type)
            .into_iter()
            .next()
            .ok_or_else(|| RelayError::declaration(format!("network has no {subnet_type:?} subnet")))
    }
}

fn name_tag(scope: &Scope, name: &str) -> PropertyValue {
    vec![PropertyValue::from(
        Properties::new()
            .with("Key", "Name")
            .with("Value", format!("{}/{name}", scope.path())),
    )]
    .into()
}

/// Declares the network.
///
/// # Errors
///
/// Returns a declaration error if `max_zones` is zero or above the supported
/// limit, and propagates engine failures unchanged.
pub fn create_network<E: Engine>(
    engine: &mut E,
    scope: &Scope,
    max_zones: u8,
) -> Result<NetworkHandle> {
    if max_zones == 0 || max_zones > MAX_ZONES_LIMIT {
        return Err(RelayError::declaration(format!(
            "max_zones must be between 1 and {MAX_ZONES_LIMIT}, got {max_zones}"
        )));
    }
    tracing::info!(scope = %scope.path(), max_zones, "declaring network unit");

    let vpc = engine.declare(
        ResourceKind::Vpc,
        &scope.logical_id("Vpc")?,
        Properties::new()
            .with("CidrBlock", VPC_CIDR)
            .with("EnableDnsHostnames", true)
            .with("EnableDnsSupport", true)
            .with("InstanceTenancy", "default")
            .with("Tags", name_tag(scope, "Vpc")),
    )?;
    let internet_gateway = engine.declare(
        ResourceKind::InternetGateway,
        &scope.logical_id("InternetGateway")?,
        Properties::new().with("Tags", name_tag(scope, "InternetGateway")),
    )?;
    let attachment = engine.declare(
        ResourceKind::VpcGatewayAttachment,
        &scope.logical_id("GatewayAttachment")?,
        Properties::new()
            .with("VpcId", &vpc)
            .with("InternetGatewayId", &internet_gateway),
    )?;

    let mut public_subnets = Vec::with_capacity(usize::from(max_zones));
    for zone_index in 0..usize::from(max_zones) {
        let name = format!("PublicSubnet{}", zone_index + 1);
        let cidr = format!("10.0.{zone_index}.0/{SUBNET_MASK}");
        let subnet = engine.declare(
            ResourceKind::Subnet,
            &scope.logical_id(&name)?,
            Properties::new()
                .with("VpcId", &vpc)
                .with("CidrBlock", cidr.as_str())
                .with("AvailabilityZone", PropertyValue::AvailabilityZone(zone_index))
                .with("MapPublicIpOnLaunch", true)
                .with("Tags", name_tag(scope, &name)),
        )?;
        let route_table = engine.declare(
            ResourceKind::RouteTable,
            &scope.logical_id(&format!("{name}RouteTable"))?,
            Properties::new()
                .with("VpcId", &vpc)
                .with("Tags", name_tag(scope, &name)),
        )?;
        let _ = engine.declare(
            ResourceKind::SubnetRouteTableAssociation,
            &scope.logical_id(&format!("{name}RouteTableAssociation"))?,
            Properties::new()
                .with("RouteTableId", &route_table)
                .with("SubnetId", &subnet),
        )?;
        let route = engine.declare(
            ResourceKind::Route,
            &scope.logical_id(&format!("{name}DefaultRoute"))?,
            Properties::new()
                .with("RouteTableId", &route_table)
                .with("DestinationCidrBlock", ANY_IPV4)
                .with("GatewayId", &internet_gateway),
        )?;
        engine.depend_on(&route, &attachment)?;
        tracing::debug!(subnet = %subnet.logical_id(), %cidr, zone_index, "declared public subnet");

        public_subnets.push(PublicSubnet {
            subnet,
            route_table,
            zone_index,
            cidr,
        });
    }

    Ok(NetworkHandle {
        vpc,
        internet_gateway,
        public_subnets,
    })
}

#[cfg(test)]
mod tests {
    use relaystack_common::types::Region;
    use relaystack_synth::synthesizer::Synthesizer;

    use super::*;

    fn synth() -> Synthesizer {
        Synthesizer::new(Region::new("us-east-1").expect("region"))
    }

    #[test]
    fn two_zones_give_two_public_subnets() {
        let mut engine = synth();
        let network =
            create_network(&mut engine, &Scope::root().child("Network"), 2).expect("network");
        assert_eq!(network.zone_count(), 2);
        assert_eq!(engine.count(ResourceKind::Vpc), 1);
        assert_eq!(engine.count(ResourceKind::Subnet), 2);
        assert_eq!(engine.count(ResourceKind::Route), 2);

        let cidrs: Vec<&str> = network.public_subnets().iter().map(|s| s.cidr.as_str()).collect();
        assert_eq!(cidrs, vec!["10.0.0.0/24", "10.0.1.0/24"]);
        let zones: Vec<usize> = network.public_subnets().iter().map(|s| s.zone_index).collect();
        assert_eq!(zones, vec![0, 1]);
    }

    #[test]
    fn subnets_reference_the_network() {
        let mut engine = synth();
        let network = create_network(&mut engine, &Scope::root().child("Network"), 2).expect("network");
        for subnet in network.subnets(SubnetType::Public) {
            assert_eq!(
                engine.dependencies_of(subnet.logical_id()),
                vec![network.vpc().logical_id().clone()]
            );
        }
        assert_eq!(
            network.placement(SubnetType::Public).expect("placement"),
            &network.public_subnets()[0].subnet
        );
    }

    #[test]
    fn default_routes_wait_for_the_gateway_attachment() {
        let mut engine = synth();
        let _ = create_network(&mut engine, &Scope::root().child("Network"), 1).expect("network");
        let template = engine.template().expect("template");
        let route = &template.resources["NetworkPublicSubnet1DefaultRoute"];
        assert_eq!(route.depends_on, vec!["NetworkGatewayAttachment"]);
        assert_eq!(
            route.properties["GatewayId"],
            serde_json::json!({ "Ref": "NetworkInternetGateway" })
        );
    }

    #[test]
    fn zero_zones_is_a_declaration_error() {
        let mut engine = synth();
        let err = create_network(&mut engine, &Scope::root(), 0).expect_err("zero zones");
        assert!(matches!(err, RelayError::Declaration { .. }));
        assert!(engine.resources().is_empty(), "nothing declared before validation");
    }

    #[test]
    fn too_many_zones_is_a_declaration_error() {
        let mut engine = synth();
        assert!(create_network(&mut engine, &Scope::root(), MAX_ZONES_LIMIT + 1).is_err());
    }
}
