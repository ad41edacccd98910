//! In-memory provisioning engine.
//!
//! Records declarations in order, infers dependency edges from the
//! references inside each property tree, and renders the result as a
//! [`Template`]. It never contacts a cloud provider; plan and apply belong to
//! whatever consumes the template.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use relaystack_common::constants::APP_NAME;
use relaystack_common::error::{RelayError, Result};
use relaystack_common::types::Region;

use crate::engine::{Deferred, Engine, LogicalId, ResourceKind, ResourceRef};
use crate::graph::DependencyGraph;
use crate::property::{Properties, PropertyValue};
use crate::template::{FORMAT_VERSION, OutputEntry, ResourceEntry, Template};

/// A resource as recorded by the synthesizer.
#[derive(Debug, Clone)]
pub struct DeclaredResource {
    /// Handle returned to the declaring unit.
    pub reference: ResourceRef,
    /// Declared properties.
    pub properties: Properties,
    /// Explicit ordering constraints added through [`Engine::depend_on`].
    pub depends_on: BTreeSet<LogicalId>,
}

/// A published output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredOutput {
    /// Human-readable description.
    pub description: String,
    /// Deferred value the output resolves to.
    pub value: Deferred<String>,
}

/// Records declarations and renders them into a template.
#[derive(Debug)]
pub struct Synthesizer {
    region: Region,
    description: String,
    resources: Vec<DeclaredResource>,
    positions: HashMap<LogicalId, usize>,
    graph: DependencyGraph,
    outputs: BTreeMap<String, DeclaredOutput>,
}

impl Synthesizer {
    /// Creates an empty synthesizer targeting `region`.
    #[must_use]
    pub fn new(region: Region) -> Self {
        Self {
            region,
            description: format!("{APP_NAME} model-routing proxy"),
            resources: Vec::new(),
            positions: HashMap::new(),
            graph: DependencyGraph::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Declared resources in declaration order.
    #[must_use]
    pub fn resources(&self) -> &[DeclaredResource] {
        &self.resources
    }

    /// Looks up a declared resource.
    #[must_use]
    pub fn resource(&self, id: &LogicalId) -> Option<&DeclaredResource> {
        self.positions.get(id).map(|&i| &self.resources[i])
    }

    /// Declared resources of one kind, in declaration order.
    pub fn resources_of(&self, kind: ResourceKind) -> impl Iterator<Item = &DeclaredResource> {
        self.resources
            .iter()
            .filter(move |r| r.reference.kind() == kind)
    }

    /// Number of declared resources of `kind`.
    #[must_use]
    pub fn count(&self, kind: ResourceKind) -> usize {
        self.resources_of(kind).count()
    }

    /// Resource counts per kind.
    #[must_use]
    pub fn summary(&self) -> BTreeMap<ResourceKind, usize> {
        let mut counts = BTreeMap::new();
        for r in &self.resources {
            *counts.entry(r.reference.kind()).or_insert(0) += 1;
        }
        counts
    }

    /// Published outputs by name.
    #[must_use]
    pub const fn outputs(&self) -> &BTreeMap<String, DeclaredOutput> {
        &self.outputs
    }

    /// Direct dependencies of `id`, both inferred and explicit.
    #[must_use]
    pub fn dependencies_of(&self, id: &LogicalId) -> Vec<LogicalId> {
        self.graph.dependencies_of(id)
    }

    /// The order an engine must create resources in.
    ///
    /// # Errors
    ///
    /// Returns an error if explicit dependencies introduced a cycle.
    pub fn apply_order(&self) -> Result<Vec<LogicalId>> {
        self.graph.resolve_order()
    }

    /// Renders all declarations.
    ///
    /// # Errors
    ///
    /// Returns an error if the declarations contain a dependency cycle.
    pub fn template(&self) -> Result<Template> {
        let _ = self.apply_order()?;
        let resources = self
            .resources
            .iter()
            .map(|r| {
                (
                    r.reference.logical_id().to_string(),
                    ResourceEntry {
                        kind: r.reference.kind().type_name().to_string(),
                        properties: r.properties.to_json(),
                        depends_on: r.depends_on.iter().map(ToString::to_string).collect(),
                    },
                )
            })
            .collect();
        let outputs = self
            .outputs
            .iter()
            .map(|(name, out)| {
                (
                    name.clone(),
                    OutputEntry {
                        description: out.description.clone(),
                        value: out.value.to_property().to_json(),
                    },
                )
            })
            .collect();
        Ok(Template {
            format_version: FORMAT_VERSION.to_string(),
            description: self.description.clone(),
            resources,
            outputs,
        })
    }

    fn known(&self, resource: &ResourceRef) -> Result<()> {
        match self.resource(resource.logical_id()) {
            Some(declared) if declared.reference.kind() == resource.kind() => Ok(()),
            _ => Err(RelayError::NotFound {
                kind: "resource",
                id: format!("{} ({})", resource.logical_id(), resource.kind()),
            }),
        }
    }
}

impl Engine for Synthesizer {
    fn region(&self) -> &Region {
        &self.region
    }

    fn declare(
        &mut self,
        kind: ResourceKind,
        logical_id: &LogicalId,
        properties: Properties,
    ) -> Result<ResourceRef> {
        if self.positions.contains_key(logical_id) {
            return Err(RelayError::declaration(format!(
                "logical id {logical_id} is declared twice"
            )));
        }
        let references = properties.references();
        for dependency in &references {
            self.known(dependency)?;
        }

        let node = self.graph.add_resource(logical_id);
        for dependency in references {
            if let Some(dep) = self.graph.node(dependency.logical_id()) {
                self.graph.add_dependency(node, dep);
            }
        }

        let reference = ResourceRef::new(logical_id.clone(), kind);
        tracing::debug!(%logical_id, %kind, "declared resource");
        let _ = self.positions.insert(logical_id.clone(), self.resources.len());
        self.resources.push(DeclaredResource {
            reference: reference.clone(),
            properties,
            depends_on: BTreeSet::new(),
        });
        Ok(reference)
    }

    fn depend_on(&mut self, dependent: &ResourceRef, dependency: &ResourceRef) -> Result<()> {
        self.known(dependent)?;
        self.known(dependency)?;
        if dependent == dependency {
            return Err(RelayError::declaration(format!(
                "{} cannot depend on itself",
                dependent.logical_id()
            )));
        }
        let from = self.graph.add_resource(dependent.logical_id());
        let to = self.graph.add_resource(dependency.logical_id());
        self.graph.add_dependency(from, to);
        if let Some(&i) = self.positions.get(dependent.logical_id()) {
            let _ = self.resources[i]
                .depends_on
                .insert(dependency.logical_id().clone());
        }
        Ok(())
    }

    fn reference<T>(&self, resource: &ResourceRef, attribute: &str) -> Result<Deferred<T>> {
        self.known(resource)?;
        if !resource.kind().attributes().contains(&attribute) {
            return Err(RelayError::declaration(format!(
                "{} does not expose attribute {attribute}",
                resource.kind()
            )));
        }
        Ok(Deferred::new(resource.clone(), attribute))
    }

    fn output(&mut self, name: &str, description: &str, value: &Deferred<String>) -> Result<()> {
        let name = LogicalId::new(name)?;
        self.known(value.resource())?;
        if self.outputs.contains_key(name.as_str()) {
            return Err(RelayError::declaration(format!(
                "output {name} is published twice"
            )));
        }
        tracing::debug!(output = %name, source = ?value, "published output");
        let _ = self.outputs.insert(
            name.to_string(),
            DeclaredOutput {
                description: description.to_string(),
                value: value.clone(),
            },
        );
        Ok(())
    }
}

/// Convenience for rendering a reference list.
#[must_use]
pub fn ref_list<'a>(resources: impl IntoIterator<Item = &'a ResourceRef>) -> PropertyValue {
    PropertyValue::List(resources.into_iter().map(ResourceRef::to_ref).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synth() -> Synthesizer {
        Synthesizer::new(Region::new("us-east-1").expect("region"))
    }

    fn id(name: &str) -> LogicalId {
        LogicalId::new(name).expect("valid id")
    }

    #[test]
    fn declare_records_in_order() {
        let mut s = synth();
        let vpc = s
            .declare(ResourceKind::Vpc, &id("Vpc"), Properties::new())
            .expect("vpc");
        let _ = s
            .declare(
                ResourceKind::SecurityGroup,
                &id("Sg"),
                Properties::new().with("VpcId", &vpc),
            )
            .expect("sg");
        let ids: Vec<&str> = s
            .resources()
            .iter()
            .map(|r| r.reference.logical_id().as_str())
            .collect();
        assert_eq!(ids, vec!["Vpc", "Sg"]);
        assert_eq!(s.dependencies_of(&id("Sg")), vec![id("Vpc")]);
    }

    #[test]
    fn duplicate_logical_id_is_rejected() {
        let mut s = synth();
        let _ = s
            .declare(ResourceKind::Vpc, &id("Vpc"), Properties::new())
            .expect("first");
        let err = s
            .declare(ResourceKind::Vpc, &id("Vpc"), Properties::new())
            .expect_err("second");
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn references_to_foreign_resources_are_rejected() {
        let mut s = synth();
        let foreign = ResourceRef::new(id("Elsewhere"), ResourceKind::Vpc);
        let err = s
            .declare(
                ResourceKind::Subnet,
                &id("Subnet"),
                Properties::new().with("VpcId", &foreign),
            )
            .expect_err("unknown reference");
        assert!(matches!(err, RelayError::NotFound { .. }));
        assert!(s.resources().is_empty());
    }

    #[test]
    fn reference_checks_attribute_names() {
        let mut s = synth();
        let instance = s
            .declare(ResourceKind::Instance, &id("Instance"), Properties::new())
            .expect("instance");
        let ip: Deferred<String> = s.reference(&instance, "PublicIp").expect("ip");
        assert_eq!(ip.attribute(), "PublicIp");
        assert!(s.reference::<String>(&instance, "PublicIP").is_err());
    }

    #[test]
    fn explicit_dependencies_are_rendered_and_ordered() {
        let mut s = synth();
        let route = s
            .declare(ResourceKind::Route, &id("Route"), Properties::new())
            .expect("route");
        let attachment = s
            .declare(
                ResourceKind::VpcGatewayAttachment,
                &id("Attachment"),
                Properties::new(),
            )
            .expect("attachment");
        s.depend_on(&route, &attachment).expect("depend");
        assert!(s.depend_on(&route, &route).is_err());

        let order = s.apply_order().expect("order");
        let pos = |n: &str| order.iter().position(|i| i.as_str() == n).expect(n);
        assert!(pos("Attachment") < pos("Route"));

        let template = s.template().expect("template");
        assert_eq!(template.resources["Route"].depends_on, vec!["Attachment"]);
    }

    #[test]
    fn cyclic_explicit_dependencies_fail_rendering() {
        let mut s = synth();
        let a = s
            .declare(ResourceKind::Role, &id("A"), Properties::new())
            .expect("a");
        let b = s
            .declare(ResourceKind::InstanceProfile, &id("B"), Properties::new().with("Roles", ref_list([&a])))
            .expect("b");
        s.depend_on(&a, &b).expect("edge is recorded");
        assert!(s.template().is_err());
    }

    #[test]
    fn outputs_are_unique_and_rendered() {
        let mut s = synth();
        let instance = s
            .declare(ResourceKind::Instance, &id("Instance"), Properties::new())
            .expect("instance");
        let dns: Deferred<String> = s.reference(&instance, "PublicDnsName").expect("dns");
        s.output("publicDns", "Public DNS", &dns).expect("output");
        assert!(s.output("publicDns", "again", &dns).is_err());
        assert!(s.output("public-dns", "bad name", &dns).is_err());

        let template = s.template().expect("template");
        assert_eq!(
            template.outputs["publicDns"].value,
            serde_json::json!({ "Fn::GetAtt": ["Instance", "PublicDnsName"] })
        );
    }

    #[test]
    fn summary_counts_kinds() {
        let mut s = synth();
        for name in ["A", "B"] {
            let _ = s
                .declare(ResourceKind::Subnet, &id(name), Properties::new())
                .expect("subnet");
        }
        assert_eq!(s.count(ResourceKind::Subnet), 2);
        assert_eq!(s.summary().get(&ResourceKind::Subnet), Some(&2));
        assert_eq!(s.count(ResourceKind::Instance), 0);
    }
}
