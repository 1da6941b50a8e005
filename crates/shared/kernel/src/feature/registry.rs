use super::{FeatureDiscovery, ShellFeatureDescriptor};
use crate::error::HostError;
use indexmap::IndexMap;
use mhost_domain::FeatureId;
use std::sync::Arc;

/// Feature id → descriptor, in registration order. Ids are unique, ignoring case.
#[derive(Debug, Clone, Default)]
pub struct FeatureRegistry {
    features: IndexMap<FeatureId, Arc<ShellFeatureDescriptor>>,
}

impl FeatureRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from descriptors.
    ///
    /// # Errors
    /// Returns [`HostError::Configuration`] on a duplicate feature id.
    pub fn from_descriptors<I>(descriptors: I) -> Result<Self, HostError>
    where
        I: IntoIterator<Item = ShellFeatureDescriptor>,
    {
        let mut registry = Self::new();
        for descriptor in descriptors {
            registry.register(descriptor)?;
        }
        Ok(registry)
    }

    /// Builds a registry from whatever a discovery source reports and checks that every
    /// declared dependency was reported too.
    ///
    /// # Errors
    /// Propagates discovery failures and duplicate ids; [`HostError::FeatureNotFound`] for
    /// a dependency no discovered feature provides.
    pub fn discover(discovery: &dyn FeatureDiscovery) -> Result<Self, HostError> {
        let registry = Self::from_descriptors(discovery.discover()?)?;
        registry.validate()?;
        tracing::debug!(features = registry.len(), "Feature registry populated");
        Ok(registry)
    }

    /// Adds a descriptor.
    ///
    /// # Errors
    /// Returns [`HostError::Configuration`] if a feature with the same id is registered.
    pub fn register(&mut self, descriptor: ShellFeatureDescriptor) -> Result<&mut Self, HostError> {
        if let Some(existing) = self.features.get(descriptor.id()) {
            return Err(HostError::configuration(format!(
                "Duplicate feature id '{}' (already registered as '{}')",
                descriptor.id(),
                existing.id()
            )));
        }
        self.features.insert(descriptor.id().clone(), Arc::new(descriptor));
        Ok(self)
    }

    /// Checks that every dependency named by any descriptor is registered.
    ///
    /// # Errors
    /// Returns [`HostError::FeatureNotFound`] for the first missing dependency, with the
    /// referencing feature as context.
    pub fn validate(&self) -> Result<(), HostError> {
        for descriptor in self.features.values() {
            if let Some(missing) =
                descriptor.dependencies().iter().find(|dep| !self.features.contains_key(*dep))
            {
                return Err(HostError::FeatureNotFound {
                    feature: missing.clone(),
                    context: Some(format!("dependency of '{}'", descriptor.id()).into()),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: &FeatureId) -> Option<&Arc<ShellFeatureDescriptor>> {
        self.features.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &FeatureId) -> bool {
        self.features.contains_key(id)
    }

    /// Feature ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &FeatureId> {
        self.features.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ShellFeatureDescriptor>> {
        self.features.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
