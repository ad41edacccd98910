//! The interface between composition units and a provisioning engine.
//!
//! Units never create infrastructure themselves. They hand resource kinds and
//! property trees to an [`Engine`], receive [`ResourceRef`] handles back, and
//! wire those handles into later declarations. Attributes that only exist
//! after real provisioning are exposed as [`Deferred`] values.

use std::fmt;
use std::marker::PhantomData;

use relaystack_common::error::{RelayError, Result};
use relaystack_common::types::Region;
use serde::{Deserialize, Serialize};

use crate::property::{Properties, PropertyValue};

/// The resource types this workspace knows how to declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Virtual private network.
    Vpc,
    /// Internet gateway for public routing.
    InternetGateway,
    /// Attachment of a gateway to a network.
    VpcGatewayAttachment,
    /// Subnet inside a network.
    Subnet,
    /// Route table.
    RouteTable,
    /// Association of a subnet with a route table.
    SubnetRouteTableAssociation,
    /// Single route entry.
    Route,
    /// Access role.
    Role,
    /// Binds a role to compute instances.
    InstanceProfile,
    /// Firewall rule set.
    SecurityGroup,
    /// Compute instance.
    Instance,
}

impl ResourceKind {
    /// Provider type name used in rendered templates.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Vpc => "AWS::EC2::VPC",
            Self::InternetGateway => "AWS::EC2::InternetGateway",
            Self::VpcGatewayAttachment => "AWS::EC2::VPCGatewayAttachment",
            Self::Subnet => "AWS::EC2::Subnet",
            Self::RouteTable => "AWS::EC2::RouteTable",
            Self::SubnetRouteTableAssociation => "AWS::EC2::SubnetRouteTableAssociation",
            Self::Route => "AWS::EC2::Route",
            Self::Role => "AWS::IAM::Role",
            Self::InstanceProfile => "AWS::IAM::InstanceProfile",
            Self::SecurityGroup => "AWS::EC2::SecurityGroup",
            Self::Instance => "AWS::EC2::Instance",
        }
    }

    /// Attributes that become available once the resource exists.
    #[must_use]
    pub const fn attributes(self) -> &'static [&'static str] {
        match self {
            Self::Vpc => &["CidrBlock", "DefaultSecurityGroup", "VpcId"],
            Self::InternetGateway => &["InternetGatewayId"],
            Self::Subnet => &["AvailabilityZone", "CidrBlock", "SubnetId", "VpcId"],
            Self::RouteTable => &["RouteTableId"],
            Self::Role => &["Arn", "RoleId"],
            Self::InstanceProfile => &["Arn"],
            Self::SecurityGroup => &["GroupId", "VpcId"],
            Self::Instance => &[
                "AvailabilityZone",
                "PrivateDnsName",
                "PrivateIp",
                "PublicDnsName",
                "PublicIp",
            ],
            Self::VpcGatewayAttachment | Self::SubnetRouteTableAssociation | Self::Route => &[],
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Identifier of a resource within one synthesized template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LogicalId(String);

impl LogicalId {
    /// Longest identifier the template format accepts.
    pub const MAX_LEN: usize = 255;

    /// Creates a logical id.
    ///
    /// # Errors
    ///
    /// Returns a declaration error unless `id` is 1 to 255 ASCII
    /// alphanumeric characters.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() || id.len() > Self::MAX_LEN || !id.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(RelayError::declaration(format!(
                "logical id \"{id}\" must be 1-{} ASCII alphanumeric characters",
                Self::MAX_LEN
            )));
        }
        Ok(Self(id))
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A naming scope for nested composition units.
///
/// Logical ids are the concatenation of every scope segment and the local
/// name, with non-alphanumeric characters dropped, so the same tree always
/// yields the same ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    path: Vec<String>,
}

impl Scope {
    /// The top-level scope.
    #[must_use]
    pub const fn root() -> Self {
        Self { path: Vec::new() }
    }

    /// A nested scope named `name`.
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        let mut path = self.path.clone();
        path.push(sanitize(name));
        Self { path }
    }

    /// Slash-separated path, for logging.
    #[must_use]
    pub fn path(&self) -> String {
        if self.path.is_empty() {
            "/".into()
        } else {
            self.path.join("/")
        }
    }

    /// The logical id of `name` inside this scope.
    ///
    /// # Errors
    ///
    /// Returns a declaration error if the resulting id is empty or too long.
    pub fn logical_id(&self, name: &str) -> Result<LogicalId> {
        let mut id = self.path.concat();
        id.push_str(&sanitize(name));
        LogicalId::new(id)
    }
}

fn sanitize(segment: &str) -> String {
    segment.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Handle to a declared resource.
///
/// Passing a `ResourceRef` into another declaration's properties records a
/// dependency; copying one of its resolved values would not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceRef {
    logical_id: LogicalId,
    kind: ResourceKind,
}

impl ResourceRef {
    /// Creates a handle. Engines call this from [`Engine::declare`].
    #[must_use]
    pub const fn new(logical_id: LogicalId, kind: ResourceKind) -> Self {
        Self { logical_id, kind }
    }

    /// Logical id of the resource.
    #[must_use]
    pub const fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    /// Kind of the resource.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// A property value referring to this resource's primary identifier.
    #[must_use]
    pub fn to_ref(&self) -> PropertyValue {
        PropertyValue::Ref(self.clone())
    }
}

/// An attribute that is only known after the engine has provisioned the
/// resource.
///
/// There is deliberately no accessor for the value. A `Deferred` can only be
/// passed on: into another declaration or into an output.
pub struct Deferred<T> {
    resource: ResourceRef,
    attribute: String,
    _value: PhantomData<fn() -> T>,
}

impl<T> Deferred<T> {
    /// Creates a deferred value. Engines call this from [`Engine::reference`].
    #[must_use]
    pub fn new(resource: ResourceRef, attribute: impl Into<String>) -> Self {
        Self {
            resource,
            attribute: attribute.into(),
            _value: PhantomData,
        }
    }

    /// Resource the value will be read from.
    #[must_use]
    pub const fn resource(&self) -> &ResourceRef {
        &self.resource
    }

    /// Attribute name on that resource.
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// A property value that resolves to this attribute at apply time.
    #[must_use]
    pub fn to_property(&self) -> PropertyValue {
        PropertyValue::GetAtt {
            resource: self.resource.clone(),
            attribute: self.attribute.clone(),
        }
    }
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self::new(self.resource.clone(), self.attribute.clone())
    }
}

impl<T> PartialEq for Deferred<T> {
    fn eq(&self, other: &Self) -> bool {
        self.resource == other.resource && self.attribute == other.attribute
    }
}

impl<T> Eq for Deferred<T> {}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Deferred({}.{})", self.resource.logical_id, self.attribute)
    }
}

/// Declaration API of a provisioning engine.
///
/// Implementations own the declared-state graph. Composition units only
/// ever talk to this trait; plan and apply are driven elsewhere.
pub trait Engine {
    /// Region the declarations target.
    fn region(&self) -> &Region;

    /// Declares a resource and returns a handle to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the declaration is invalid or the engine rejects
    /// it. Engine diagnostics must be surfaced unchanged.
    fn declare(
        &mut self,
        kind: ResourceKind,
        logical_id: &LogicalId,
        properties: Properties,
    ) -> Result<ResourceRef>;

    /// Records an ordering constraint not expressed through properties.
    ///
    /// # Errors
    ///
    /// Returns an error if either resource is unknown to the engine.
    fn depend_on(&mut self, dependent: &ResourceRef, dependency: &ResourceRef) -> Result<()>;

    /// Returns a deferred handle on a runtime attribute of `resource`.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource is unknown or does not expose
    /// `attribute`.
    fn reference<T>(&self, resource: &ResourceRef, attribute: &str) -> Result<Deferred<T>>;

    /// Publishes a deferred value as a named output of the composition.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or already taken.
    fn output(&mut self, name: &str, description: &str, value: &Deferred<String>) -> Result<()>;
}
