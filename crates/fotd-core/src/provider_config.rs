use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ProviderConfigError;

/// Opaque per-store option map handed to a provider at construction.
///
/// Nothing is validated here. Providers read the keys they care about on
/// first use and report problems as [`ProviderConfigError`]; unknown keys
/// are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderConfig(BTreeMap<String, Value>);

impl ProviderConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Reads an unsigned integer. JSON numbers and numeric strings are both
    /// accepted; `null` counts as absent.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderConfigError::Invalid`] for any other value.
    pub fn get_u64(&self, key: &str) -> Result<Option<u64>, ProviderConfigError> {
        let invalid = |reason: String| ProviderConfigError::Invalid {
            key: key.to_string(),
            reason,
        };
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .map(Some)
                .ok_or_else(|| invalid(format!("expected a non-negative integer, got {n}"))),
            Some(Value::String(s)) => s
                .trim()
                .parse::<u64>()
                .map(Some)
                .map_err(|e| invalid(format!("\"{s}\": {e}"))),
            Some(other) => Err(invalid(format!("expected a number, got {other}"))),
        }
    }

    /// Reads a non-empty string.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderConfigError::Invalid`] for non-string values or
    /// blank strings.
    pub fn get_str(&self, key: &str) -> Result<Option<&str>, ProviderConfigError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(Some(s.trim())),
            Some(Value::String(_)) => Err(ProviderConfigError::Invalid {
                key: key.to_string(),
                reason: "must not be empty".to_string(),
            }),
            Some(other) => Err(ProviderConfigError::Invalid {
                key: key.to_string(),
                reason: format!("expected a string, got {other}"),
            }),
        }
    }

    /// # Errors
    ///
    /// Returns [`ProviderConfigError::Missing`] when the key is absent, or
    /// the errors of [`ProviderConfig::get_str`].
    pub fn require_str(&self, key: &str) -> Result<&str, ProviderConfigError> {
        self.get_str(key)?
            .ok_or_else(|| ProviderConfigError::Missing(key.to_string()))
    }
}

impl FromIterator<(String, Value)> for ProviderConfig {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
