use super::{FeatureRegistration, ShellFeatureDescriptor};
use crate::error::HostError;

/// Source of feature descriptors for a [`super::FeatureRegistry`].
pub trait FeatureDiscovery {
    /// # Errors
    /// Returns [`HostError`] if a descriptor cannot be produced.
    fn discover(&self) -> Result<Vec<ShellFeatureDescriptor>, HostError>;
}

/// Explicit, hand-assembled list of descriptors.
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    descriptors: Vec<ShellFeatureDescriptor>,
}

impl StaticDiscovery {
    #[must_use]
    pub fn new(descriptors: impl IntoIterator<Item = ShellFeatureDescriptor>) -> Self {
        Self { descriptors: descriptors.into_iter().collect() }
    }

    #[must_use]
    pub fn with(mut self, descriptor: ShellFeatureDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }
}

impl FeatureDiscovery for StaticDiscovery {
    fn discover(&self) -> Result<Vec<ShellFeatureDescriptor>, HostError> {
        Ok(self.descriptors.clone())
    }
}

/// Features submitted at link time with `#[shell_feature]`.
///
/// Link order is unspecified, so descriptors are sorted by normalized id to keep the
/// registry (and therefore `ordered_all`) deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryDiscovery;

impl FeatureDiscovery for InventoryDiscovery {
    fn discover(&self) -> Result<Vec<ShellFeatureDescriptor>, HostError> {
        let mut descriptors = inventory::iter::<FeatureRegistration>
            .into_iter()
            .map(FeatureRegistration::to_descriptor)
            .collect::<Result<Vec<_>, _>>()?;
        descriptors.sort_by(|a, b| a.id().canonical().cmp(b.id().canonical()));
        tracing::debug!(features = descriptors.len(), "Discovered statically registered features");
        Ok(descriptors)
    }
}
