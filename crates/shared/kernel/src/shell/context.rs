use crate::container::ServiceProvider;
use crate::error::HostError;
use mhost_domain::shell::ShellSettings;
use mhost_domain::{FeatureId, ShellId};
use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

/// A built shell: its settings, its frozen container and the order its features ran in.
pub struct ShellContext {
    settings: Arc<ShellSettings>,
    services: ServiceProvider,
    feature_order: Vec<FeatureId>,
}

impl ShellContext {
    pub(crate) const fn new(
        settings: Arc<ShellSettings>,
        services: ServiceProvider,
        feature_order: Vec<FeatureId>,
    ) -> Self {
        Self { settings, services, feature_order }
    }

    #[must_use]
    pub fn id(&self) -> &ShellId {
        self.settings.id()
    }

    #[must_use]
    pub fn settings(&self) -> &Arc<ShellSettings> {
        &self.settings
    }

    #[must_use]
    pub const fn services(&self) -> &ServiceProvider {
        &self.services
    }

    /// Enabled features plus their dependencies, dependency-first.
    #[must_use]
    pub fn feature_order(&self) -> &[FeatureId] {
        &self.feature_order
    }

    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.services.get::<T>()
    }

    /// # Errors
    /// See [`ServiceProvider::require`].
    pub fn require<T: Any + Send + Sync>(&self) -> Result<Arc<T>, HostError> {
        self.services.require::<T>()
    }
}

impl fmt::Debug for ShellContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellContext")
            .field("id", self.id())
            .field("feature_order", &self.feature_order)
            .field("services", &self.services.len())
            .finish()
    }
}

/// Single-assignment reference from a shell's services back to their own [`ShellContext`].
///
/// Registered before the container exists and populated right after it is built, so services
/// may hold it but must only read it once construction is over. The reference is weak; the
/// host's cache owns the context.
#[derive(Clone)]
pub struct DeferredShellContext {
    shell: ShellId,
    cell: Arc<OnceLock<Weak<ShellContext>>>,
}

impl DeferredShellContext {
    pub(crate) fn new(shell: ShellId) -> Self {
        Self { shell, cell: Arc::new(OnceLock::new()) }
    }

    pub(crate) fn populate(&self, context: &Arc<ShellContext>) {
        if self.cell.set(Arc::downgrade(context)).is_err() {
            tracing::warn!(shell = %self.shell, "Deferred shell context populated twice; keeping the first");
        }
    }

    #[must_use]
    pub const fn shell_id(&self) -> &ShellId {
        &self.shell
    }

    #[must_use]
    pub fn is_populated(&self) -> bool {
        self.cell.get().is_some()
    }

    /// The owning context.
    ///
    /// # Panics
    /// If read while the shell is still being built, or after the host released it.
    #[must_use]
    pub fn get(&self) -> Arc<ShellContext> {
        match self.try_get() {
            Ok(context) => context,
            Err(err) => panic!("{err}"),
        }
    }

    /// # Errors
    /// Returns [`HostError::Lifecycle`] if the context is not (or no longer) available.
    pub fn try_get(&self) -> Result<Arc<ShellContext>, HostError> {
        let Some(weak) = self.cell.get() else {
            return Err(HostError::Lifecycle {
                message: format!(
                    "shell context for '{}' was read before the shell finished building",
                    self.shell
                )
                .into(),
                context: None,
            });
        };
        weak.upgrade().ok_or_else(|| HostError::Lifecycle {
            message: format!("shell context for '{}' has already been released", self.shell).into(),
            context: None,
        })
    }
}

impl fmt::Debug for DeferredShellContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredShellContext")
            .field("shell", &self.shell)
            .field("populated", &self.is_populated())
            .finish()
    }
}
