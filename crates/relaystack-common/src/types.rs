//! Domain primitive types used across the relaystack workspace.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A validated cloud region name such as `us-east-1` or `us-gov-west-1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Region(String);

impl Region {
    /// Creates a region after checking its shape.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] unless the name is made of at least
    /// three dash-separated parts: lowercase words followed by a number.
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        let parts: Vec<&str> = name.split('-').collect();
        let well_formed = parts.len() >= 3
            && parts.iter().all(|p| !p.is_empty())
            && parts[..parts.len() - 1]
                .iter()
                .all(|p| p.chars().all(|c| c.is_ascii_lowercase()))
            && parts[parts.len() - 1].chars().all(|c| c.is_ascii_digit());
        if !well_formed {
            return Err(ConfigError::Invalid {
                key: crate::constants::REGION_KEY_NAME,
                message: format!("\"{name}\" is not a region name"),
            });
        }
        Ok(Self(name))
    }

    /// Returns the region name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Region {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Region {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Region> for String {
    fn from(region: Region) -> Self {
        region.0
    }
}

/// Characters that would terminate or expand inside a double-quoted shell
/// string.
const SHELL_UNSAFE: [char; 7] = ['"', '\\', '$', '`', '\n', '\r', '\0'];

/// The proxy master key.
///
/// Opaque apart from being embeddable in a double-quoted shell assignment.
/// Neither `Debug` nor any other formatting reveals the value; call
/// [`SecretKey::expose`] where the plaintext is genuinely needed.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(String);

impl SecretKey {
    /// Wraps a master key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the key is empty or contains a
    /// character that cannot be written into the bootstrap script verbatim.
    pub fn new(value: impl Into<String>) -> Result<Self, ConfigError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ConfigError::Invalid {
                key: crate::constants::SECRET_KEY_NAME,
                message: "key is empty".into(),
            });
        }
        if let Some(bad) = value.chars().find(|c| SHELL_UNSAFE.contains(c)) {
            return Err(ConfigError::Invalid {
                key: crate::constants::SECRET_KEY_NAME,
                message: format!(
                    "key contains {bad:?}, which cannot be embedded in a double-quoted shell string"
                ),
            });
        }
        Ok(Self(value))
    }

    /// Returns the plaintext key.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether this is the non-functional development placeholder.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.0 == crate::constants::INSECURE_PLACEHOLDER_KEY
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

/// SHA-256 digest used to fingerprint synthesized artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sha256Hash(String);

impl Sha256Hash {
    /// Creates a hash from a hex-encoded string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a valid 64-character hex string.
    pub fn from_hex(hex: impl Into<String>) -> Result<Self, ConfigError> {
        let hex = hex.into();
        if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ConfigError::Invalid {
                key: "sha256",
                message: format!("invalid SHA-256 hex string: {hex}"),
            });
        }
        Ok(Self(hex.to_ascii_lowercase()))
    }

    /// Returns the hex-encoded hash string.
    #[must_use]
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sha256:{}", self.0)
    }
}
