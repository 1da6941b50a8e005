use super::root::infrastructure_types;
use super::{
    DeferredShellContext, RootServices, RootServicesAccessor, ShellConfiguration, ShellContext,
    ShellHostHandle, ShellScopeFactory, ShellSettingsCache,
};
use crate::container::{ServiceCollection, ServiceDescriptor, ServiceProvider};
use crate::error::HostError;
use crate::feature::{
    DependencyResolver, FeatureActivation, FeatureDiscovery, FeatureRegistry,
};
use dashmap::DashMap;
use fxhash::FxHashSet;
use mhost_domain::config::HostConfig;
use mhost_domain::constants::DEFAULT_SHELL;
use mhost_domain::shell::ShellSettings;
use mhost_domain::{FeatureId, ShellId};
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

pub(crate) struct HostInner {
    registry: Arc<FeatureRegistry>,
    settings: ShellSettingsCache,
    pub(crate) root: Arc<ServiceProvider>,
    root_services: RootServices,
    /// Root registrations minus infrastructure, re-targeted at `root`.
    inherited: Vec<ServiceDescriptor>,
    shells: DashMap<ShellId, Arc<ShellContext>>,
    /// Reentrant so a feature may open another shell mid-build; holds the ids this thread
    /// is currently building.
    build_lock: ReentrantMutex<RefCell<FxHashSet<ShellId>>>,
    disposed: AtomicBool,
}

impl HostInner {
    fn ensure_alive(&self) -> Result<(), HostError> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(HostError::disposed());
        }
        Ok(())
    }

    fn get_shell(&self, id: &ShellId) -> Result<Arc<ShellContext>, HostError> {
        self.ensure_alive()?;
        if let Some(context) = self.shells.get(id) {
            return Ok(Arc::clone(context.value()));
        }

        let settings = self
            .settings
            .get(id)
            .ok_or_else(|| HostError::NotFound { shell: id.clone(), context: None })?;

        let building = self.build_lock.lock();
        self.ensure_alive()?;
        if let Some(context) = self.shells.get(id) {
            return Ok(Arc::clone(context.value()));
        }

        if !building.borrow_mut().insert(id.clone()) {
            return Err(HostError::Lifecycle {
                message: format!("Shell '{id}' was requested again while it is being built")
                    .into(),
                context: None,
            });
        }
        let context = {
            let _mark = BuildMark { building: &building, id };
            self.build_shell(settings)?
        };
        self.shells.insert(context.id().clone(), Arc::clone(&context));
        Ok(context)
    }

    fn build_shell(&self, settings: &Arc<ShellSettings>) -> Result<Arc<ShellContext>, HostError> {
        let shell = settings.id();

        let unknown: Vec<&str> = settings
            .enabled_features()
            .iter()
            .filter(|feature| !self.registry.contains(feature))
            .map(FeatureId::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(HostError::configuration(format!(
                "Shell '{shell}' enables unknown features: {}",
                unknown.join(", ")
            )));
        }

        let feature_order =
            DependencyResolver::ordered_features(settings.enabled_features(), &self.registry)?;

        let mut services = ServiceCollection::new();
        services.extend(self.inherited.iter().cloned());

        let deferred = DeferredShellContext::new(shell.clone());
        services
            .add_instance(shell.clone())
            .add_shared(Arc::clone(settings))
            .add_instance(ShellConfiguration::from_settings(settings))
            .add_instance(deferred.clone());

        let activation = FeatureActivation::new(settings, &self.root_services);
        for feature_id in &feature_order {
            let Some(descriptor) = self.registry.get(feature_id) else {
                return Err(HostError::feature_not_found(feature_id.clone()));
            };
            let Some(initializer) = descriptor.initializer() else { continue };

            let wrap = |source| HostError::FeatureInitialization {
                feature: descriptor.id().clone(),
                shell: shell.clone(),
                source,
                context: None,
            };
            let feature = initializer.create(&activation).map_err(wrap)?;
            feature.configure_services(&mut services).map_err(wrap)?;
            debug!(shell = %shell, feature = %descriptor.id(), "Feature services registered");
        }

        let context =
            Arc::new(ShellContext::new(Arc::clone(settings), services.build(), feature_order));
        deferred.populate(&context);

        info!(
            shell = %shell,
            features = ?context.feature_order().iter().map(FeatureId::as_str).collect::<Vec<_>>(),
            services = context.services().len(),
            "Shell built"
        );
        Ok(context)
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        // Waits out an in-flight build; it re-checks the flag and bails.
        let _guard = self.build_lock.lock();

        for id in self.settings.ids().collect::<Vec<_>>().into_iter().rev() {
            if let Some((_, context)) = self.shells.remove(id) {
                context.services().dispose();
            }
        }
        self.root.dispose();
        info!("Shell host disposed");
    }
}

/// Clears a shell's in-progress mark when its build ends, including by unwinding.
struct BuildMark<'a> {
    building: &'a RefCell<FxHashSet<ShellId>>,
    id: &'a ShellId,
}

impl Drop for BuildMark<'_> {
    fn drop(&mut self) {
        self.building.borrow_mut().remove(self.id);
    }
}

impl Drop for HostInner {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Builds and caches one [`ShellContext`] per configured shell.
///
/// Cheap to clone; all clones share the same cache. Each shell is built at most once, on
/// first request, and never rebuilt. The host (and every built container) is disposed when
/// [`ShellHost::dispose`] is called or the last clone is dropped.
#[derive(Clone)]
pub struct ShellHost {
    inner: Arc<HostInner>,
}

impl ShellHost {
    #[must_use]
    pub fn builder() -> ShellHostBuilder {
        ShellHostBuilder::default()
    }

    /// Host over the shells in `config` and the features reported by `discovery`.
    ///
    /// # Errors
    /// Propagates discovery failures, duplicate ids and invalid shell declarations.
    pub fn from_config(
        config: &HostConfig,
        discovery: &dyn FeatureDiscovery,
        root: ServiceCollection,
    ) -> Result<Self, HostError> {
        Ok(Self::builder()
            .registry(FeatureRegistry::discover(discovery)?)
            .settings(ShellSettingsCache::from_config(config)?)
            .root_services(root)
            .build())
    }

    pub(crate) const fn from_inner(inner: Arc<HostInner>) -> Self {
        Self { inner }
    }

    /// Returns the cached context, building it on first request.
    ///
    /// # Errors
    /// * [`HostError::Disposed`] after [`ShellHost::dispose`].
    /// * [`HostError::NotFound`] if no settings exist for `id`.
    /// * [`HostError::Configuration`] if the shell enables unregistered features.
    /// * [`HostError::FeatureNotFound`] / [`HostError::CircularDependency`] from ordering.
    /// * [`HostError::FeatureInitialization`] if a feature fails.
    /// * [`HostError::Lifecycle`] if a shell's own build asks for that shell again.
    pub fn get_shell(&self, id: &ShellId) -> Result<Arc<ShellContext>, HostError> {
        self.inner.get_shell(id)
    }

    /// The shell named `Default`, else the first declared shell.
    ///
    /// # Errors
    /// [`HostError::NoShellsConfigured`] if there are no shells, otherwise as
    /// [`ShellHost::get_shell`].
    pub fn default_shell(&self) -> Result<Arc<ShellContext>, HostError> {
        self.inner.ensure_alive()?;
        let settings = &self.inner.settings;
        let id = ShellId::new(DEFAULT_SHELL)
            .ok()
            .filter(|id| settings.contains(id))
            .or_else(|| settings.first().map(|s| s.id().clone()))
            .ok_or(HostError::NoShellsConfigured { context: None })?;
        self.get_shell(&id)
    }

    /// Builds whatever is missing and returns every shell in declaration order.
    ///
    /// # Errors
    /// Stops at the first shell that fails to build.
    pub fn all_shells(&self) -> Result<Vec<Arc<ShellContext>>, HostError> {
        self.inner.settings.ids().map(|id| self.get_shell(id)).collect()
    }

    /// The cached context, without building it.
    #[must_use]
    pub fn try_get_built(&self, id: &ShellId) -> Option<Arc<ShellContext>> {
        if self.is_disposed() {
            return None;
        }
        self.inner.shells.get(id).map(|context| Arc::clone(context.value()))
    }

    /// Disposes every built container, then the root. Later calls fail with
    /// [`HostError::Disposed`]. Idempotent.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn registry(&self) -> &FeatureRegistry {
        &self.inner.registry
    }

    #[must_use]
    pub fn settings(&self) -> &ShellSettingsCache {
        &self.inner.settings
    }

    /// The root container, including host infrastructure services.
    #[must_use]
    pub fn root(&self) -> &Arc<ServiceProvider> {
        &self.inner.root
    }

    #[must_use]
    pub fn handle(&self) -> ShellHostHandle {
        ShellHostHandle::new(Arc::downgrade(&self.inner))
    }
}

impl fmt::Debug for ShellHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellHost")
            .field("features", &self.inner.registry.len())
            .field("shells", &self.inner.settings.len())
            .field("built", &self.inner.shells.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Collects the registry, the shells and the root registrations for a [`ShellHost`].
#[derive(Debug, Default)]
pub struct ShellHostBuilder {
    registry: Arc<FeatureRegistry>,
    settings: ShellSettingsCache,
    root: ServiceCollection,
}

impl ShellHostBuilder {
    #[must_use]
    pub fn registry(mut self, registry: impl Into<Arc<FeatureRegistry>>) -> Self {
        self.registry = registry.into();
        self
    }

    #[must_use]
    pub fn settings(mut self, settings: ShellSettingsCache) -> Self {
        self.settings = settings;
        self
    }

    /// Replaces the root registrations.
    #[must_use]
    pub fn root_services(mut self, root: ServiceCollection) -> Self {
        self.root = root;
        self
    }

    /// Adds to the root registrations in place.
    #[must_use]
    pub fn configure_root(mut self, configure: impl FnOnce(&mut ServiceCollection)) -> Self {
        configure(&mut self.root);
        self
    }

    #[must_use]
    pub fn build(self) -> ShellHost {
        let Self { registry, settings, mut root } = self;
        let excluded = Arc::new(infrastructure_types());

        let inner = Arc::new_cyclic(|weak| {
            let template: Vec<ServiceDescriptor> = root
                .descriptors()
                .filter(|descriptor| !excluded.contains(&descriptor.type_id()))
                .cloned()
                .collect();

            root.add_instance(ShellHostHandle::new(weak.clone()))
                .add_instance(ShellScopeFactory::new(ShellHostHandle::new(weak.clone())))
                .add_instance(RootServicesAccessor::new(weak.clone()));

            let provider = Arc::new(root.build());
            let inherited =
                template.iter().map(|descriptor| descriptor.inherited_from(&provider)).collect();

            HostInner {
                registry,
                settings,
                root_services: RootServices::new(Arc::clone(&provider), Arc::clone(&excluded)),
                root: provider,
                inherited,
                shells: DashMap::new(),
                build_lock: ReentrantMutex::new(RefCell::new(FxHashSet::default())),
                disposed: AtomicBool::new(false),
            }
        });

        debug!(
            features = inner.registry.len(),
            shells = inner.settings.len(),
            inherited = inner.inherited.len(),
            "Shell host ready"
        );
        ShellHost::from_inner(inner)
    }
}
