use super::ServiceInstance;
use super::collection::{ServiceDescriptor, ServiceOrigin, ServiceSource};
use crate::error::HostError;
use fxhash::FxHashMap;
use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

struct ProviderEntry {
    descriptor: ServiceDescriptor,
    resolved: OnceLock<ServiceInstance>,
}

/// Immutable, built container. Safe for unsynchronized concurrent reads.
///
/// Factory registrations are resolved lazily and cached per container; a factory must not
/// resolve its own service type.
pub struct ServiceProvider {
    entries: FxHashMap<TypeId, ProviderEntry>,
    order: Vec<TypeId>,
    disposed: AtomicBool,
}

impl ServiceProvider {
    pub(crate) fn from_descriptors(descriptors: impl IntoIterator<Item = ServiceDescriptor>) -> Self {
        let mut entries = FxHashMap::default();
        let mut order = Vec::new();
        for descriptor in descriptors {
            let type_id = descriptor.type_id();
            order.push(type_id);
            entries.insert(type_id, ProviderEntry { descriptor, resolved: OnceLock::new() });
        }
        Self { entries, order, disposed: AtomicBool::new(false) }
    }

    /// Resolves `T`, or `None` if it is not registered or the container is disposed.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.get_erased(TypeId::of::<T>())?.downcast::<T>().ok()
    }

    /// Resolves `T` or fails with a descriptive error.
    ///
    /// # Errors
    /// Returns [`HostError::Disposed`] after disposal and [`HostError::MissingService`]
    /// if `T` is not registered.
    pub fn require<T: Any + Send + Sync>(&self) -> Result<Arc<T>, HostError> {
        if self.is_disposed() {
            return Err(HostError::disposed());
        }
        self.get::<T>().ok_or_else(|| HostError::MissingService {
            service: type_name::<T>().into(),
            context: None,
        })
    }

    #[must_use]
    pub fn contains<T: Any>(&self) -> bool {
        self.contains_type(TypeId::of::<T>())
    }

    #[must_use]
    pub fn contains_type(&self, type_id: TypeId) -> bool {
        self.entries.contains_key(&type_id)
    }

    pub(crate) fn get_erased(&self, type_id: TypeId) -> Option<ServiceInstance> {
        if self.is_disposed() {
            return None;
        }
        let entry = self.entries.get(&type_id)?;
        match &entry.descriptor.source {
            ServiceSource::Instance(instance) => Some(Arc::clone(instance)),
            ServiceSource::Factory(factory) => {
                Some(Arc::clone(entry.resolved.get_or_init(|| factory(self))))
            },
            ServiceSource::Root(root) => root.get_erased(type_id),
        }
    }

    /// Registered service type names, in registration order.
    pub fn service_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.order.iter().filter_map(|id| self.entries.get(id)).map(|e| e.descriptor.type_name())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Disposes every locally owned disposable instance, newest registration first.
    ///
    /// Lazily created services that were never resolved have nothing to release. Inherited
    /// registrations are left to the root container. Calling this more than once is a no-op.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        for type_id in self.order.iter().rev() {
            let Some(entry) = self.entries.get(type_id) else { continue };
            let descriptor = &entry.descriptor;
            let Some(hook) = descriptor.dispose else { continue };
            if descriptor.origin() != ServiceOrigin::Local {
                continue;
            }

            let instance = match &descriptor.source {
                ServiceSource::Instance(instance) => Some(instance),
                ServiceSource::Factory(_) => entry.resolved.get(),
                ServiceSource::Root(_) => None,
            };
            if let Some(instance) = instance {
                tracing::debug!(service = descriptor.type_name(), "Disposing service");
                hook(&**instance);
            }
        }
    }
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("services", &self.service_names().collect::<Vec<_>>())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::container::{Disposable, ServiceCollection};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Counter(Arc<AtomicUsize>);

    impl Disposable for Counter {
        fn dispose(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Debug)]
    struct Greeter {
        name: Arc<String>,
    }

    #[test]
    fn factories_run_once_and_see_other_services() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_factory = Arc::clone(&calls);

        let mut services = ServiceCollection::new();
        services.add_instance(String::from("acme"));
        services.add_factory(move |sp| {
            calls_in_factory.fetch_add(1, Ordering::SeqCst);
            Greeter { name: sp.get::<String>().expect("name registered") }
        });
        let provider = services.build();

        let first = provider.get::<Greeter>().unwrap();
        let second = provider.get::<Greeter>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.name.as_str(), "acme");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dispose_runs_once_and_hides_services() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let mut services = ServiceCollection::new();
        services.add_disposable(Counter(Arc::clone(&disposed)));
        let provider = services.build();

        provider.dispose();
        provider.dispose();
        assert_eq!(disposed.load(Ordering::SeqCst), 1);
        assert!(provider.get::<Counter>().is_none());
        assert!(provider.require::<Counter>().is_err());
    }

    #[test]
    fn unresolved_disposable_factories_are_skipped() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&disposed);
        let mut services = ServiceCollection::new();
        services.add_disposable_factory(move |_| Counter(Arc::clone(&flag)));
        let provider = services.build();

        provider.dispose();
        assert_eq!(disposed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn missing_service_is_reported_by_type() {
        let provider = ServiceCollection::new().build();
        let err = provider.require::<Greeter>().unwrap_err();
        assert!(err.to_string().contains("Greeter"));
    }
}
