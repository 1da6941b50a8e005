//! Per-shell settings records.

use crate::constants::KEY_SEPARATOR;
use crate::error::DomainError;
use crate::ids::{FeatureId, ShellId};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Settings of a single tenant shell.
///
/// Owned by the settings cache and shared read-only with the host. Feature order is the
/// declaration order; repeated feature ids are kept but have no further effect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShellSettings {
    id: ShellId,
    enabled_features: Vec<FeatureId>,
    properties: BTreeMap<String, Value>,
    configuration: BTreeMap<String, String>,
}

impl ShellSettings {
    #[must_use]
    pub const fn new(id: ShellId) -> Self {
        Self {
            id,
            enabled_features: Vec::new(),
            properties: BTreeMap::new(),
            configuration: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_feature(mut self, feature: FeatureId) -> Self {
        self.enabled_features.push(feature);
        self
    }

    /// Appends several features by name.
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidIdentifier`] if any name is empty.
    pub fn with_features<I>(mut self, features: I) -> Result<Self, DomainError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for feature in features {
            self.enabled_features.push(FeatureId::new(feature)?);
        }
        Ok(self)
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_configuration(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.configuration.insert(key.into(), value.into());
        self
    }

    /// Merges a nested JSON object into the configuration as `Parent:Child` keys.
    #[must_use]
    pub fn with_configuration_tree(mut self, tree: &Value) -> Self {
        flatten_into(&mut self.configuration, None, tree);
        self
    }

    #[must_use]
    pub const fn id(&self) -> &ShellId {
        &self.id
    }

    #[must_use]
    pub fn enabled_features(&self) -> &[FeatureId] {
        &self.enabled_features
    }

    #[must_use]
    pub fn is_enabled(&self, feature: &FeatureId) -> bool {
        self.enabled_features.contains(feature)
    }

    #[must_use]
    pub const fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }

    /// Looks up a property, ignoring key case.
    ///
    /// `Parent:Child` keys also match nested objects, so `WebRouting:Host` finds both a
    /// flat `"WebRouting:Host"` entry and `{ "WebRouting": { "Host": .. } }`.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&Value> {
        find_ignore_case(&self.properties, key).or_else(|| {
            let mut segments = key.split(KEY_SEPARATOR);
            let root = find_ignore_case(&self.properties, segments.next()?)?;
            segments.try_fold(root, |value, segment| match value {
                Value::Object(map) => {
                    map.iter().find(|(k, _)| k.eq_ignore_ascii_case(segment)).map(|(_, v)| v)
                },
                _ => None,
            })
        })
    }

    /// Reads a property that is either a single string or an array of strings.
    #[must_use]
    pub fn property_strings(&self, key: &str) -> Vec<&str> {
        match self.property(key) {
            Some(Value::String(s)) => vec![s.as_str()],
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    #[must_use]
    pub const fn configuration(&self) -> &BTreeMap<String, String> {
        &self.configuration
    }
}

fn find_ignore_case<'a>(map: &'a BTreeMap<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).or_else(|| map.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v))
}

fn flatten_into(target: &mut BTreeMap<String, String>, prefix: Option<&str>, value: &Value) {
    let join = |key: &str| match prefix {
        Some(p) => format!("{p}{KEY_SEPARATOR}{key}"),
        None => key.to_owned(),
    };

    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                flatten_into(target, Some(&join(key)), nested);
            }
        },
        Value::Array(items) => {
            for (index, nested) in items.iter().enumerate() {
                flatten_into(target, Some(&join(&index.to_string())), nested);
            }
        },
        Value::Null => {},
        Value::String(s) => {
            if let Some(p) = prefix {
                target.insert(p.to_owned(), s.clone());
            }
        },
        other => {
            if let Some(p) = prefix {
                target.insert(p.to_owned(), other.to_string());
            }
        },
    }
}
