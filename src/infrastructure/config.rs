use crate::domain::gateway::Credentials;
use crate::domain::ports::ConfigProvider;
use crate::error::{PaymentError, Result};
use chrono_tz::Tz;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Configuration backed by a JSON document.
///
/// Nested objects are addressed with dotted keys, so `{"mellat": {"terminal_id": 1}}`
/// answers `get("mellat.terminal_id")` with `"1"`. Scalars are stringified;
/// `null`, arrays and objects read as absent.
#[derive(Debug, Clone, Default)]
pub struct JsonConfig {
    root: Value,
}

impl JsonConfig {
    /// Loads the file at `path`, or an empty configuration when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let raw = fs::read_to_string(path)?;
                Self::parse(&raw)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(raw)
            .map_err(|e| PaymentError::Config(format!("Malformed configuration: {}", e)))?;
        if !root.is_object() {
            return Err(PaymentError::Config(
                "Configuration root must be an object".to_string(),
            ));
        }
        Ok(Self { root })
    }
}

impl ConfigProvider for JsonConfig {
    fn get(&self, key: &str) -> Option<String> {
        let value = key
            .split('.')
            .try_fold(&self.root, |node, segment| node.get(segment))?;
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// Flat in-memory configuration.
#[derive(Debug, Clone, Default)]
pub struct MapConfig {
    values: HashMap<String, String>,
}

impl MapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl ConfigProvider for MapConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Typed accessors over a [`ConfigProvider`].
pub struct Settings<'a> {
    config: &'a dyn ConfigProvider,
}

impl<'a> Settings<'a> {
    pub fn new(config: &'a dyn ConfigProvider) -> Self {
        Self { config }
    }

    /// The configured `timezone`, validated against the IANA database.
    ///
    /// Applying it is up to the hosting application at startup.
    pub fn timezone(&self) -> Result<Option<Tz>> {
        self.config
            .get("timezone")
            .map(|name| {
                name.parse::<Tz>()
                    .map_err(|_| PaymentError::Config(format!("Unknown timezone: {}", name)))
            })
            .transpose()
    }

    /// Reads `<prefix>.<key>` for every key, failing on the first one missing.
    pub fn credentials(&self, prefix: &str, keys: &[&str]) -> Result<Credentials> {
        keys.iter()
            .map(|key| {
                let full = format!("{}.{}", prefix, key);
                self.config
                    .get(&full)
                    .filter(|value| !value.is_empty())
                    .map(|value| (key.to_string(), value))
                    .ok_or_else(|| PaymentError::Config(format!("Missing setting `{}`", full)))
            })
            .collect()
    }

    pub fn optional(&self, prefix: &str, key: &str) -> Option<String> {
        self.config.get(&format!("{}.{}", prefix, key))
    }

    pub fn flag(&self, prefix: &str, key: &str) -> bool {
        self.optional(prefix, key)
            .is_some_and(|value| matches!(value.as_str(), "true" | "1" | "yes"))
    }
}
