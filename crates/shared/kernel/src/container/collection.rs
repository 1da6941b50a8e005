use super::{Disposable, ServiceInstance, ServiceProvider};
use indexmap::IndexMap;
use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

pub(crate) type ServiceFactory = Arc<dyn Fn(&ServiceProvider) -> ServiceInstance + Send + Sync>;
pub(crate) type DisposeHook = fn(&(dyn Any + Send + Sync + 'static));

/// Where a registration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceOrigin {
    /// Registered directly into this collection; the container owns the instance.
    Local,
    /// Copied from the root container; resolved through and owned by the root.
    Inherited,
}

#[derive(Clone)]
pub(crate) enum ServiceSource {
    Instance(ServiceInstance),
    Factory(ServiceFactory),
    Root(Arc<ServiceProvider>),
}

/// A single registration: the service type, how to produce it, and how to dispose it.
#[derive(Clone)]
pub struct ServiceDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    pub(crate) source: ServiceSource,
    pub(crate) dispose: Option<DisposeHook>,
    origin: ServiceOrigin,
}

impl ServiceDescriptor {
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[must_use]
    pub const fn origin(&self) -> ServiceOrigin {
        self.origin
    }

    /// Re-targets the registration at a built root container.
    pub(crate) fn inherited_from(&self, root: &Arc<ServiceProvider>) -> Self {
        Self {
            type_id: self.type_id,
            type_name: self.type_name,
            source: ServiceSource::Root(Arc::clone(root)),
            dispose: None,
            origin: ServiceOrigin::Inherited,
        }
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self.source {
            ServiceSource::Instance(_) => "instance",
            ServiceSource::Factory(_) => "factory",
            ServiceSource::Root(_) => "root",
        };
        f.debug_struct("ServiceDescriptor")
            .field("type_name", &self.type_name)
            .field("source", &source)
            .field("origin", &self.origin)
            .field("disposable", &self.dispose.is_some())
            .finish()
    }
}

/// Mutable registration set. One entry per service type; the last registration wins.
#[derive(Debug, Clone, Default)]
pub struct ServiceCollection {
    entries: IndexMap<TypeId, ServiceDescriptor>,
}

impl ServiceCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a ready-made singleton.
    pub fn add_instance<T: Any + Send + Sync>(&mut self, value: T) -> &mut Self {
        self.add_shared(Arc::new(value))
    }

    /// Registers an already shared singleton without re-wrapping it.
    pub fn add_shared<T: Any + Send + Sync>(&mut self, value: Arc<T>) -> &mut Self {
        self.insert(descriptor::<T>(ServiceSource::Instance(value), None))
    }

    /// Registers a lazily created singleton. The factory runs at most once per container,
    /// on first resolution, and may resolve other services from the same container.
    pub fn add_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(&ServiceProvider) -> T + Send + Sync + 'static,
    {
        let factory: ServiceFactory = Arc::new(move |sp| Arc::new(factory(sp)) as ServiceInstance);
        self.insert(descriptor::<T>(ServiceSource::Factory(factory), None))
    }

    /// Registers a singleton that is disposed together with its container.
    pub fn add_disposable<T: Disposable>(&mut self, value: T) -> &mut Self {
        self.insert(descriptor::<T>(
            ServiceSource::Instance(Arc::new(value)),
            Some(dispose_erased::<T>),
        ))
    }

    /// Lazily created variant of [`ServiceCollection::add_disposable`].
    pub fn add_disposable_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Disposable,
        F: Fn(&ServiceProvider) -> T + Send + Sync + 'static,
    {
        let factory: ServiceFactory = Arc::new(move |sp| Arc::new(factory(sp)) as ServiceInstance);
        self.insert(descriptor::<T>(ServiceSource::Factory(factory), Some(dispose_erased::<T>)))
    }

    /// Inserts a descriptor, replacing any earlier registration of the same type.
    pub fn insert(&mut self, descriptor: ServiceDescriptor) -> &mut Self {
        if let Some(previous) = self.entries.insert(descriptor.type_id, descriptor) {
            tracing::trace!(service = previous.type_name, "Service registration replaced");
        }
        self
    }

    /// Removes the registration of `T`, if any.
    pub fn remove<T: Any>(&mut self) -> Option<ServiceDescriptor> {
        self.entries.shift_remove(&TypeId::of::<T>())
    }

    #[must_use]
    pub fn contains<T: Any>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    #[must_use]
    pub fn contains_type(&self, type_id: TypeId) -> bool {
        self.entries.contains_key(&type_id)
    }

    #[must_use]
    pub fn get_descriptor<T: Any>(&self) -> Option<&ServiceDescriptor> {
        self.entries.get(&TypeId::of::<T>())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registrations in first-registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.entries.values()
    }

    /// Freezes the collection into an immutable container.
    #[must_use]
    pub fn build(self) -> ServiceProvider {
        ServiceProvider::from_descriptors(self.entries.into_values())
    }
}

impl Extend<ServiceDescriptor> for ServiceCollection {
    fn extend<I: IntoIterator<Item = ServiceDescriptor>>(&mut self, iter: I) {
        for descriptor in iter {
            self.insert(descriptor);
        }
    }
}

fn descriptor<T: Any>(source: ServiceSource, dispose: Option<DisposeHook>) -> ServiceDescriptor {
    ServiceDescriptor {
        type_id: TypeId::of::<T>(),
        type_name: type_name::<T>(),
        source,
        dispose,
        origin: ServiceOrigin::Local,
    }
}

fn dispose_erased<T: Disposable>(instance: &(dyn Any + Send + Sync + 'static)) {
    if let Some(service) = instance.downcast_ref::<T>() {
        service.dispose();
    }
}
