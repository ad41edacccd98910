//! Deployment configuration loaded from a `.env` style key-value file.
//!
//! The file is read once at startup. A missing master key is an error unless
//! the caller opts into the insecure development placeholder.

use std::collections::BTreeMap;
use std::path::Path;

use crate::constants::{
    INSECURE_PLACEHOLDER_KEY, REGION_ENV_FALLBACKS, REGION_KEY_NAME, SECRET_KEY_NAME,
};
use crate::error::{ConfigError, RelayError, Result};
use crate::types::{Region, SecretKey};

/// Parsed contents of a `.env` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    entries: BTreeMap<String, String>,
}

impl EnvFile {
    /// Parses `KEY=VALUE` lines.
    ///
    /// Blank lines and lines starting with `#` are skipped, as are lines
    /// without a key or without `=`. Only the first `=` separates key from
    /// value, so values may themselves contain `=`. Later duplicates win.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut entries = BTreeMap::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            let _ = entries.insert(key.to_string(), value.trim().to_string());
        }
        Self { entries }
    }

    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSource`] if the file does not exist and
    /// [`RelayError::Io`] if it cannot be read.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "loading configuration file");
        if !path.exists() {
            return Err(ConfigError::MissingSource {
                path: path.to_path_buf(),
            }
            .into());
        }
        let content = std::fs::read_to_string(path).map_err(|source| RelayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let env = Self::parse(&content);
        tracing::debug!(keys = env.entries.len(), "configuration loaded");
        Ok(env)
    }

    /// Returns the value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the file had no usable entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What to do when the master key is not configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SecretPolicy {
    /// Fail with [`ConfigError::MissingKey`].
    #[default]
    Required,
    /// Fall back to a non-functional placeholder and warn. Development only.
    AllowInsecurePlaceholder,
}

/// Resolves the master key from configuration.
///
/// An empty value counts as missing.
///
/// # Errors
///
/// Returns [`ConfigError::MissingKey`] when the key is absent under
/// [`SecretPolicy::Required`], or [`ConfigError::Invalid`] when the
/// configured value cannot be embedded in the bootstrap script.
pub fn resolve_secret(
    env: &EnvFile,
    policy: SecretPolicy,
) -> std::result::Result<SecretKey, ConfigError> {
    match env.get(SECRET_KEY_NAME).filter(|v| !v.is_empty()) {
        Some(value) => SecretKey::new(value),
        None => match policy {
            SecretPolicy::Required => Err(ConfigError::MissingKey(SECRET_KEY_NAME)),
            SecretPolicy::AllowInsecurePlaceholder => {
                tracing::warn!(
                    key = SECRET_KEY_NAME,
                    "master key not configured; using the insecure development placeholder"
                );
                SecretKey::new(INSECURE_PLACEHOLDER_KEY)
            }
        },
    }
}

/// Fully resolved inputs of a composition.
#[derive(Debug, Clone)]
pub struct DeploymentConfig {
    /// Region the stack is synthesized for.
    pub region: Region,
    /// Proxy master key.
    pub secret_key: SecretKey,
}

impl DeploymentConfig {
    /// Resolves configuration, consulting the process environment for the
    /// region when neither an override nor the file provides one.
    ///
    /// # Errors
    ///
    /// See [`DeploymentConfig::resolve_with`].
    pub fn resolve(
        env: &EnvFile,
        region_override: Option<&str>,
        policy: SecretPolicy,
    ) -> std::result::Result<Self, ConfigError> {
        Self::resolve_with(env, region_override, policy, |name| std::env::var(name).ok())
    }

    /// Resolves configuration with an explicit process-environment lookup.
    ///
    /// Region precedence: `region_override`, then `AWS_REGION` in the file,
    /// then `CDK_DEFAULT_REGION` and `AWS_REGION` from `lookup`. An empty
    /// value at any source is skipped.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the secret or the region is missing or
    /// malformed.
    pub fn resolve_with(
        env: &EnvFile,
        region_override: Option<&str>,
        policy: SecretPolicy,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> std::result::Result<Self, ConfigError> {
        let secret_key = resolve_secret(env, policy)?;
        let region_name = region_override
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .or_else(|| {
                env.get(REGION_KEY_NAME)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
            })
            .or_else(|| {
                REGION_ENV_FALLBACKS
                    .into_iter()
                    .find_map(|key| lookup(key).filter(|name| !name.is_empty()))
            })
            .ok_or(ConfigError::MissingKey(REGION_KEY_NAME))?;
        let region = Region::new(region_name)?;
        tracing::info!(%region, "deployment configuration resolved");
        Ok(Self { region, secret_key })
    }
}
