use super::{HostInner, ShellContext, ShellHost};
use crate::container::ServiceProvider;
use crate::error::HostError;
use fxhash::FxHashSet;
use mhost_domain::ShellId;
use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::{Arc, Weak};

/// Root-level resolver handed to features while they are constructed.
///
/// Resolves from the root container only and hides the host's infrastructure services, so
/// an initializer cannot reach back into the host that is building it.
#[derive(Clone)]
pub struct RootServices {
    provider: Arc<ServiceProvider>,
    excluded: Arc<FxHashSet<TypeId>>,
}

impl RootServices {
    pub(crate) const fn new(provider: Arc<ServiceProvider>, excluded: Arc<FxHashSet<TypeId>>) -> Self {
        Self { provider, excluded }
    }

    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        if self.excluded.contains(&TypeId::of::<T>()) {
            return None;
        }
        self.provider.get::<T>()
    }

    /// # Errors
    /// Returns [`HostError::MissingService`] if `T` is not registered at the root or is a
    /// host infrastructure type.
    pub fn require<T: Any + Send + Sync>(&self) -> Result<Arc<T>, HostError> {
        if self.excluded.contains(&TypeId::of::<T>()) {
            return Err(HostError::MissingService {
                service: type_name::<T>().into(),
                context: Some("host infrastructure is not available to features".into()),
            });
        }
        self.provider.require::<T>()
    }

    #[must_use]
    pub fn contains<T: Any>(&self) -> bool {
        let type_id = TypeId::of::<T>();
        !self.excluded.contains(&type_id) && self.provider.contains_type(type_id)
    }
}

impl fmt::Debug for RootServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootServices")
            .field("services", &self.provider.len())
            .field("excluded", &self.excluded.len())
            .finish()
    }
}

/// Non-owning handle to the host, registered at the root for transport code.
#[derive(Clone)]
pub struct ShellHostHandle {
    inner: Weak<HostInner>,
}

impl ShellHostHandle {
    pub(crate) const fn new(inner: Weak<HostInner>) -> Self {
        Self { inner }
    }

    /// The host, unless it has been dropped.
    #[must_use]
    pub fn upgrade(&self) -> Option<ShellHost> {
        self.inner.upgrade().map(ShellHost::from_inner)
    }

    /// # Errors
    /// Returns [`HostError::Disposed`] if the host is gone, otherwise whatever
    /// [`ShellHost::get_shell`] returns.
    pub fn get_shell(&self, id: &ShellId) -> Result<Arc<ShellContext>, HostError> {
        self.upgrade().ok_or_else(HostError::disposed)?.get_shell(id)
    }
}

impl fmt::Debug for ShellHostHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellHostHandle").field("alive", &(self.inner.strong_count() > 0)).finish()
    }
}

/// A shell's context borrowed for the duration of one unit of work.
#[derive(Debug, Clone)]
pub struct ShellScope {
    context: Arc<ShellContext>,
}

impl ShellScope {
    #[must_use]
    pub fn shell_id(&self) -> &ShellId {
        self.context.id()
    }

    #[must_use]
    pub fn services(&self) -> &ServiceProvider {
        self.context.services()
    }

    #[must_use]
    pub const fn context(&self) -> &Arc<ShellContext> {
        &self.context
    }
}

/// Opens [`ShellScope`]s by shell id.
#[derive(Debug, Clone)]
pub struct ShellScopeFactory {
    host: ShellHostHandle,
}

impl ShellScopeFactory {
    pub(crate) const fn new(host: ShellHostHandle) -> Self {
        Self { host }
    }

    /// # Errors
    /// Same as [`ShellHost::get_shell`].
    pub fn create_scope(&self, id: &ShellId) -> Result<ShellScope, HostError> {
        Ok(ShellScope { context: self.host.get_shell(id)? })
    }
}

/// Access to the unfiltered root container.
#[derive(Clone)]
pub struct RootServicesAccessor {
    inner: Weak<HostInner>,
}

impl RootServicesAccessor {
    pub(crate) const fn new(inner: Weak<HostInner>) -> Self {
        Self { inner }
    }

    #[must_use]
    pub fn root(&self) -> Option<Arc<ServiceProvider>> {
        self.inner.upgrade().map(|inner| Arc::clone(&inner.root))
    }
}

impl fmt::Debug for RootServicesAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootServicesAccessor").finish_non_exhaustive()
    }
}

/// Types registered at the root by the host itself and never copied into shells.
pub(crate) fn infrastructure_types() -> FxHashSet<TypeId> {
    [
        TypeId::of::<ShellHostHandle>(),
        TypeId::of::<ShellScopeFactory>(),
        TypeId::of::<RootServicesAccessor>(),
    ]
    .into_iter()
    .collect()
}
