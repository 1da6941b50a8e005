//! Pluggable shell features: descriptors, initializers, registry, discovery and ordering.

mod discovery;
mod registry;
mod resolver;

pub use discovery::{FeatureDiscovery, InventoryDiscovery, StaticDiscovery};
pub use registry::FeatureRegistry;
pub use resolver::DependencyResolver;

use crate::container::ServiceCollection;
use crate::error::{BoxError, HostError};
use crate::shell::{RootServices, ShellConfiguration};
use mhost_domain::shell::ShellSettings;
use mhost_domain::{FeatureId, ShellId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A feature instance activated for one shell; contributes that shell's registrations.
pub trait ShellFeature: Send + Sync {
    /// Adds (or overrides) registrations in the shell's in-progress collection.
    ///
    /// # Errors
    /// Any error aborts the shell build.
    fn configure_services(&self, services: &mut ServiceCollection) -> Result<(), BoxError>;
}

impl<F> ShellFeature for F
where
    F: Fn(&mut ServiceCollection) -> Result<(), BoxError> + Send + Sync,
{
    fn configure_services(&self, services: &mut ServiceCollection) -> Result<(), BoxError> {
        self(services)
    }
}

/// Constructs a feature from root capabilities and the shell's identity.
pub trait ActivateFeature: ShellFeature + Sized + 'static {
    /// # Errors
    /// Any error aborts the shell build.
    fn activate(activation: &FeatureActivation<'_>) -> Result<Self, BoxError>;
}

/// Static description of a feature type, generated by `#[shell_feature]`.
pub trait FeatureMetadata {
    const ID: &'static str;
    const DEPENDENCIES: &'static [&'static str];
    const METADATA: &'static [(&'static str, &'static str)] = &[];
}

/// Type-erased feature initializer stored in a descriptor.
pub trait FeatureFactory: Send + Sync {
    /// # Errors
    /// Returns the initializer's own failure.
    fn create(&self, activation: &FeatureActivation<'_>) -> Result<Box<dyn ShellFeature>, BoxError>;
}

impl<F> FeatureFactory for F
where
    F: Fn(&FeatureActivation<'_>) -> Result<Box<dyn ShellFeature>, BoxError> + Send + Sync,
{
    fn create(&self, activation: &FeatureActivation<'_>) -> Result<Box<dyn ShellFeature>, BoxError> {
        self(activation)
    }
}

/// Everything a feature may use while it is being constructed.
///
/// Only root-level capabilities are reachable here; shell-scoped services do not exist yet.
#[derive(Debug)]
pub struct FeatureActivation<'a> {
    settings: &'a Arc<ShellSettings>,
    root: &'a RootServices,
}

impl<'a> FeatureActivation<'a> {
    pub(crate) const fn new(settings: &'a Arc<ShellSettings>, root: &'a RootServices) -> Self {
        Self { settings, root }
    }

    #[must_use]
    pub fn shell_id(&self) -> &ShellId {
        self.settings.id()
    }

    #[must_use]
    pub fn settings(&self) -> &ShellSettings {
        self.settings
    }

    #[must_use]
    pub fn shared_settings(&self) -> Arc<ShellSettings> {
        Arc::clone(self.settings)
    }

    #[must_use]
    pub const fn root(&self) -> &RootServices {
        self.root
    }

    /// The shell's configuration view (`Parent:Child` keys, case-insensitive).
    #[must_use]
    pub fn configuration(&self) -> ShellConfiguration {
        ShellConfiguration::from_settings(self.settings)
    }
}

type ConfigureFn = dyn Fn(&mut ServiceCollection, &ShellSettings) -> Result<(), BoxError> + Send + Sync;

struct ConfigureFeature {
    configure: Arc<ConfigureFn>,
    settings: Arc<ShellSettings>,
}

impl ShellFeature for ConfigureFeature {
    fn configure_services(&self, services: &mut ServiceCollection) -> Result<(), BoxError> {
        (self.configure)(services, &self.settings)
    }
}

fn activate_erased<T: ActivateFeature>(
    activation: &FeatureActivation<'_>,
) -> Result<Box<dyn ShellFeature>, BoxError> {
    Ok(Box::new(T::activate(activation)?))
}

/// Immutable description of a feature: id, dependencies, metadata and initializer.
#[derive(Clone)]
pub struct ShellFeatureDescriptor {
    id: FeatureId,
    dependencies: Vec<FeatureId>,
    metadata: BTreeMap<String, String>,
    initializer: Option<Arc<dyn FeatureFactory>>,
}

impl ShellFeatureDescriptor {
    /// Creates a descriptor without dependencies or initializer.
    ///
    /// # Errors
    /// Returns [`HostError::Domain`] if the id is empty.
    pub fn new(id: impl AsRef<str>) -> Result<Self, HostError> {
        Ok(Self {
            id: FeatureId::new(id)?,
            dependencies: Vec::new(),
            metadata: BTreeMap::new(),
            initializer: None,
        })
    }

    /// Appends dependencies, keeping declaration order.
    ///
    /// # Errors
    /// Returns [`HostError::Domain`] if any id is empty.
    pub fn depends_on<I>(mut self, dependencies: I) -> Result<Self, HostError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for dependency in dependencies {
            self.dependencies.push(FeatureId::new(dependency)?);
        }
        Ok(self)
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Sets an initializer that builds a feature instance per shell.
    #[must_use]
    pub fn with_initializer<F>(mut self, initializer: F) -> Self
    where
        F: Fn(&FeatureActivation<'_>) -> Result<Box<dyn ShellFeature>, BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.initializer = Some(Arc::new(initializer));
        self
    }

    /// Uses `T::activate` as the initializer.
    #[must_use]
    pub fn with_feature<T: ActivateFeature>(mut self) -> Self {
        self.initializer = Some(Arc::new(activate_erased::<T>));
        self
    }

    /// Shorthand for features that only add registrations.
    #[must_use]
    pub fn configure<F>(self, configure: F) -> Self
    where
        F: Fn(&mut ServiceCollection, &ShellSettings) -> Result<(), BoxError>
            + Send
            + Sync
            + 'static,
    {
        let configure: Arc<ConfigureFn> = Arc::new(configure);
        self.with_initializer(move |activation: &FeatureActivation<'_>| {
            Ok(Box::new(ConfigureFeature {
                configure: Arc::clone(&configure),
                settings: activation.shared_settings(),
            }) as Box<dyn ShellFeature>)
        })
    }

    #[must_use]
    pub const fn id(&self) -> &FeatureId {
        &self.id
    }

    #[must_use]
    pub fn dependencies(&self) -> &[FeatureId] {
        &self.dependencies
    }

    #[must_use]
    pub const fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    #[must_use]
    pub fn initializer(&self) -> Option<&dyn FeatureFactory> {
        self.initializer.as_deref()
    }
}

impl fmt::Debug for ShellFeatureDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellFeatureDescriptor")
            .field("id", &self.id)
            .field("dependencies", &self.dependencies)
            .field("metadata", &self.metadata)
            .field("has_initializer", &self.initializer.is_some())
            .finish()
    }
}

/// Link-time registration record collected by [`InventoryDiscovery`].
pub struct FeatureRegistration {
    pub id: &'static str,
    pub dependencies: &'static [&'static str],
    pub metadata: &'static [(&'static str, &'static str)],
    pub factory: fn(&FeatureActivation<'_>) -> Result<Box<dyn ShellFeature>, BoxError>,
}

impl FeatureRegistration {
    #[must_use]
    pub const fn of<T: ActivateFeature + FeatureMetadata>() -> Self {
        Self {
            id: T::ID,
            dependencies: T::DEPENDENCIES,
            metadata: T::METADATA,
            factory: activate_erased::<T>,
        }
    }

    /// # Errors
    /// Returns [`HostError::Domain`] if an id is empty.
    pub fn to_descriptor(&self) -> Result<ShellFeatureDescriptor, HostError> {
        let mut descriptor = ShellFeatureDescriptor::new(self.id)?.depends_on(self.dependencies)?;
        for (key, value) in self.metadata {
            descriptor = descriptor.with_metadata(*key, *value);
        }
        descriptor.initializer = Some(Arc::new(self.factory));
        Ok(descriptor)
    }
}

impl fmt::Debug for FeatureRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureRegistration")
            .field("id", &self.id)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

inventory::collect!(FeatureRegistration);
