//! Rendered template model.
//!
//! Maps are ordered by key and nothing time- or host-dependent is included,
//! so the same declarations always render to the same bytes.

use std::collections::BTreeMap;

use relaystack_common::error::Result;
use relaystack_common::types::Sha256Hash;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Template format version understood by the provisioning engine.
pub const FORMAT_VERSION: &str = "2010-09-09";

/// A synthesized template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    /// Format version marker.
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,
    /// Human-readable description.
    pub description: String,
    /// Declared resources by logical id.
    pub resources: BTreeMap<String, ResourceEntry>,
    /// Published outputs by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, OutputEntry>,
}

/// One resource in a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceEntry {
    /// Provider type name.
    #[serde(rename = "Type")]
    pub kind: String,
    /// Rendered properties.
    pub properties: serde_json::Value,
    /// Explicit ordering constraints.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

/// One output in a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OutputEntry {
    /// Human-readable description.
    pub description: String,
    /// Rendered deferred value.
    pub value: serde_json::Value,
}

impl Template {
    /// Renders the template as pretty-printed JSON with a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }

    /// SHA-256 of the rendered JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn fingerprint(&self) -> Result<Sha256Hash> {
        let digest = Sha256::digest(self.to_json_pretty()?.as_bytes());
        Ok(Sha256Hash::from_hex(format!("{digest:x}"))?)
    }
}
