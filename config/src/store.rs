//! Key/value store behind the console's `env`, `get` and `set` commands

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use toml::Value;

/// String-keyed, dynamically typed settings. Keys are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration {
    values: BTreeMap<String, Value>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from environment variables starting with `prefix`.
    /// `APP_LOG_LEVEL=debug` with prefix `APP_` becomes `log_level = "debug"`.
    pub fn from_env(prefix: &str) -> Self {
        let mut configuration = Self::new();
        for (key, value) in std::env::vars() {
            if let Some(key) = key.strip_prefix(prefix)
                && !key.is_empty()
            {
                configuration.set_str(key, &value);
            }
        }
        configuration
    }

    /// Read a TOML document. Nested tables become dotted keys.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let table: toml::Table = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))?;

        let mut configuration = Self::new();
        flatten(&mut configuration, "", table);
        Ok(configuration)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, content).with_context(|| format!("Failed to write settings to {}", path.display()))?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(&normalize(key))
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(normalize(key), value.into());
    }

    /// Store `raw` as a bool, integer or float when it reads as one,
    /// otherwise as a string
    pub fn set_str(&mut self, key: &str, raw: &str) {
        self.set(key, infer(raw));
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(&normalize(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(&normalize(key))
    }

    /// All keys in sorted order
    pub fn all_keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    /// Value rendered for display; strings are shown without quotes
    pub fn display(&self, key: &str) -> Option<String> {
        self.get(key).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Copy every key of `other` into this store, overwriting existing ones
    pub fn merge(&mut self, other: Configuration) {
        self.values.extend(other.values);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn normalize(key: &str) -> String {
    key.to_lowercase()
}

fn infer(raw: &str) -> Value {
    if let Ok(b) = raw.parse::<bool>() {
        return Value::Boolean(b);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Integer(i);
    }
    // Keeps words like "inf" and "nan" as strings
    if raw.chars().any(|c| c.is_ascii_digit())
        && let Ok(f) = raw.parse::<f64>()
    {
        return Value::Float(f);
    }
    Value::String(raw.to_string())
}

fn flatten(configuration: &mut Configuration, prefix: &str, table: toml::Table) {
    for (key, value) in table {
        let key = if prefix.is_empty() { key } else { format!("{}.{}", prefix, key) };
        match value {
            Value::Table(inner) => flatten(configuration, &key, inner),
            other => configuration.set(&key, other),
        }
    }
}
