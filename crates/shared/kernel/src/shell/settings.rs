use crate::error::{HostError, HostErrorExt};
use indexmap::IndexMap;
use mhost_domain::ShellId;
use mhost_domain::config::HostConfig;
use mhost_domain::shell::ShellSettings;
use std::sync::Arc;

/// Shell id → settings, in declaration order. Ids are unique, ignoring case.
#[derive(Debug, Clone, Default)]
pub struct ShellSettingsCache {
    shells: IndexMap<ShellId, Arc<ShellSettings>>,
}

impl ShellSettingsCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// Returns [`HostError::Configuration`] on a duplicate shell id.
    pub fn from_settings<I>(settings: I) -> Result<Self, HostError>
    where
        I: IntoIterator<Item = ShellSettings>,
    {
        let mut cache = Self::new();
        for shell in settings {
            cache.insert(shell)?;
        }
        Ok(cache)
    }

    /// Validates and collects the shells declared in a loaded configuration.
    ///
    /// # Errors
    /// Returns [`HostError::Domain`] for an empty shell or feature name and
    /// [`HostError::Configuration`] for a duplicate shell id.
    pub fn from_config(config: &HostConfig) -> Result<Self, HostError> {
        let mut cache = Self::new();
        for (index, shell) in config.shells.iter().enumerate() {
            let settings = shell
                .to_settings()
                .map_err(HostError::from)
                .context(format!("shells[{index}]"))?;
            cache.insert(settings)?;
        }
        Ok(cache)
    }

    /// # Errors
    /// Returns [`HostError::Configuration`] if a shell with the same id exists.
    pub fn insert(&mut self, settings: ShellSettings) -> Result<&mut Self, HostError> {
        if let Some(existing) = self.shells.get(settings.id()) {
            return Err(HostError::configuration(format!(
                "Duplicate shell id '{}' (already declared as '{}')",
                settings.id(),
                existing.id()
            )));
        }
        self.shells.insert(settings.id().clone(), Arc::new(settings));
        Ok(self)
    }

    #[must_use]
    pub fn get(&self, id: &ShellId) -> Option<&Arc<ShellSettings>> {
        self.shells.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &ShellId) -> bool {
        self.shells.contains_key(id)
    }

    /// The first declared shell.
    #[must_use]
    pub fn first(&self) -> Option<&Arc<ShellSettings>> {
        self.shells.first().map(|(_, settings)| settings)
    }

    pub fn ids(&self) -> impl Iterator<Item = &ShellId> {
        self.shells.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ShellSettings>> {
        self.shells.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.shells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(name: &str) -> ShellSettings {
        ShellSettings::new(ShellId::new(name).unwrap())
    }

    #[test]
    fn duplicate_shell_ids_are_rejected_ignoring_case() {
        let err = ShellSettingsCache::from_settings([shell("Tenant1"), shell("TENANT1")]).unwrap_err();
        assert!(err.to_string().contains("Duplicate shell id 'TENANT1'"));
    }

    #[test]
    fn keeps_declaration_order() {
        let cache =
            ShellSettingsCache::from_settings([shell("B"), shell("A"), shell("C")]).unwrap();
        let ids: Vec<_> = cache.ids().map(ShellId::as_str).collect();
        assert_eq!(ids, ["B", "A", "C"]);
        assert_eq!(cache.first().map(|s| s.id().as_str()), Some("B"));
    }
}
