//! Property trees attached to declarations.
//!
//! Literal values and structural references live in the same tree. Engines
//! walk the tree to find [`ResourceRef`]s and derive apply order from them.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Value, json};

use crate::engine::ResourceRef;

/// A single property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// Literal string.
    String(String),
    /// Literal integer.
    Integer(i64),
    /// Literal boolean.
    Bool(bool),
    /// Ordered list.
    List(Vec<PropertyValue>),
    /// Nested object.
    Map(Properties),
    /// Primary identifier of another resource.
    Ref(ResourceRef),
    /// Runtime attribute of another resource.
    GetAtt {
        /// Resource the attribute belongs to.
        resource: ResourceRef,
        /// Attribute name.
        attribute: String,
    },
    /// Base64 encoding applied by the engine at apply time.
    Base64(Box<PropertyValue>),
    /// The `index`-th availability zone of the target region.
    AvailabilityZone(usize),
    /// Value of a public parameter-store entry, resolved at apply time.
    SsmParameter(String),
    /// A value that must not appear in logs.
    Sensitive(Sensitive),
}

/// Wrapper whose `Debug` output never shows the wrapped value.
#[derive(Clone, PartialEq, Eq)]
pub struct Sensitive(Box<PropertyValue>);

impl Sensitive {
    /// Wraps `value`.
    #[must_use]
    pub fn new(value: PropertyValue) -> Self {
        Self(Box::new(value))
    }
}

impl fmt::Debug for Sensitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl PropertyValue {
    /// Renders the value in template JSON form.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Integer(i) => json!(i),
            Self::Bool(b) => Value::Bool(*b),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(props) => props.to_json(),
            Self::Ref(resource) => json!({ "Ref": resource.logical_id().as_str() }),
            Self::GetAtt {
                resource,
                attribute,
            } => json!({ "Fn::GetAtt": [resource.logical_id().as_str(), attribute] }),
            Self::Base64(inner) => json!({ "Fn::Base64": inner.to_json() }),
            Self::AvailabilityZone(index) => {
                json!({ "Fn::Select": [index, { "Fn::GetAZs": "" }] })
            }
            Self::SsmParameter(name) => Value::String(format!("{{{{resolve:ssm:{name}}}}}")),
            Self::Sensitive(inner) => inner.0.to_json(),
        }
    }

    /// Appends every resource this value refers to.
    pub fn collect_references<'a>(&'a self, out: &mut Vec<&'a ResourceRef>) {
        match self {
            Self::Ref(resource) | Self::GetAtt { resource, .. } => out.push(resource),
            Self::List(items) => {
                for item in items {
                    item.collect_references(out);
                }
            }
            Self::Map(props) => {
                for value in props.0.values() {
                    value.collect_references(out);
                }
            }
            Self::Base64(inner) => inner.collect_references(out),
            Self::Sensitive(inner) => inner.0.collect_references(out),
            Self::String(_)
            | Self::Integer(_)
            | Self::Bool(_)
            | Self::AvailabilityZone(_)
            | Self::SsmParameter(_) => {}
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&ResourceRef> for PropertyValue {
    fn from(value: &ResourceRef) -> Self {
        value.to_ref()
    }
}

impl From<Properties> for PropertyValue {
    fn from(value: Properties) -> Self {
        Self::Map(value)
    }
}

impl<T: Into<Self>> From<Vec<T>> for PropertyValue {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

/// An ordered set of named properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties(BTreeMap<String, PropertyValue>);

impl Properties {
    /// Creates an empty property set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property, replacing any previous value under `key`.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        let _ = self.0.insert(key.into(), value.into());
        self
    }

    /// Returns the property under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.0.get(key)
    }

    /// Iterates over properties in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.0.iter()
    }

    /// Every resource referenced anywhere in the tree, in key order.
    #[must_use]
    pub fn references(&self) -> Vec<&ResourceRef> {
        let mut out = Vec::new();
        for value in self.0.values() {
            value.collect_references(&mut out);
        }
        out
    }

    /// Renders the set as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{LogicalId, ResourceKind};

    fn vpc() -> ResourceRef {
        ResourceRef::new(LogicalId::new("Vpc").expect("id"), ResourceKind::Vpc)
    }

    #[test]
    fn references_are_found_at_any_depth() {
        let vpc = vpc();
        let props = Properties::new()
            .with("Name", "literal")
            .with("VpcId", &vpc)
            .with(
                "Nested",
                Properties::new().with(
                    "List",
                    vec![PropertyValue::GetAtt {
                        resource: vpc.clone(),
                        attribute: "CidrBlock".into(),
                    }],
                ),
            );
        let refs = props.references();
        assert_eq!(refs.len(), 2);
        assert!(refs.iter().all(|r| **r == vpc));
    }

    #[test]
    fn literals_carry_no_references() {
        let props = Properties::new()
            .with("Size", 8_i64)
            .with("Enabled", true)
            .with("Zone", PropertyValue::AvailabilityZone(0));
        assert!(props.references().is_empty());
    }

    #[test]
    fn intrinsics_render_in_template_form() {
        let props = Properties::new()
            .with("VpcId", &vpc())
            .with("Zone", PropertyValue::AvailabilityZone(1))
            .with("Image", PropertyValue::SsmParameter("/aws/service/x".into()))
            .with("Data", PropertyValue::Base64(Box::new("echo hi".into())));
        assert_eq!(
            props.to_json(),
            json!({
                "Data": { "Fn::Base64": "echo hi" },
                "Image": "{{resolve:ssm:/aws/service/x}}",
                "VpcId": { "Ref": "Vpc" },
                "Zone": { "Fn::Select": [1, { "Fn::GetAZs": "" }] }
            })
        );
    }

    #[test]
    fn sensitive_values_are_redacted_in_debug_only() {
        let value = PropertyValue::Sensitive(Sensitive::new("sk-hidden".into()));
        assert!(!format!("{value:?}").contains("sk-hidden"));
        assert_eq!(value.to_json(), json!("sk-hidden"));
    }
}
