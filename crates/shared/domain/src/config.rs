use crate::constants::{DEFAULT_SHELL, DEFAULT_TENANT_CLAIM, DEFAULT_TENANT_HEADER};
use crate::error::DomainError;
use crate::ids::ShellId;
use crate::resolution::RoutingSources;
use crate::shell::ShellSettings;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// Top-level host configuration: the shells to serve and how requests are routed to them.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostConfigInner {
    pub shells: Vec<ShellConfig>,
    pub routing: RoutingConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct HostConfig {
    #[serde(flatten, default)]
    inner: Arc<HostConfigInner>,
}

impl Deref for HostConfig {
    type Target = HostConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for HostConfig {
    fn deref_mut(&mut self) -> &mut HostConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// A shell as declared in configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ShellConfig {
    pub name: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
    /// Free-form tree flattened into `Parent:Child` keys of the shell configuration.
    #[serde(default)]
    pub configuration: Value,
}

impl ShellConfig {
    /// Converts the raw declaration into validated [`ShellSettings`].
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidIdentifier`] for an empty shell or feature name.
    pub fn to_settings(&self) -> Result<ShellSettings, DomainError> {
        let id = ShellId::new(&self.name)?;
        let mut settings = ShellSettings::new(id)
            .with_features(&self.features)?
            .with_configuration_tree(&self.configuration);
        for (key, value) in &self.properties {
            settings = settings.with_property(key.clone(), value.clone());
        }
        Ok(settings)
    }
}

/// Resolution pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub sources: RoutingSources,
    pub header_name: String,
    pub claim_key: String,
    /// Shell returned when nothing else matches; `None` disables the fallback strategy.
    pub fallback: Option<String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            sources: RoutingSources::default(),
            header_name: DEFAULT_TENANT_HEADER.to_owned(),
            claim_key: DEFAULT_TENANT_CLAIM.to_owned(),
            fallback: Some(DEFAULT_SHELL.to_owned()),
        }
    }
}
