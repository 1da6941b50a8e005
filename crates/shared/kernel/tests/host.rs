use mhost_kernel::prelude::*;
use mhost_kernel::shell::{RootServicesAccessor, ShellHostHandle, ShellScopeFactory};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

#[derive(Debug, PartialEq, Eq)]
struct CoreMarker;

#[derive(Debug, PartialEq, Eq)]
struct BillingMarker;

#[derive(Debug, PartialEq, Eq)]
struct Greeting(&'static str);

#[derive(Debug, Default)]
struct Pool {
    disposed: AtomicUsize,
}

impl Disposable for Pool {
    fn dispose(&self) {
        self.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

fn id(name: &str) -> ShellId {
    ShellId::new(name).unwrap()
}

fn core() -> ShellFeatureDescriptor {
    ShellFeatureDescriptor::new("Core").unwrap().configure(|services, _| {
        services.add_instance(CoreMarker);
        Ok(())
    })
}

fn billing() -> ShellFeatureDescriptor {
    ShellFeatureDescriptor::new("Billing").unwrap().depends_on(["Core"]).unwrap().configure(
        |services, _| {
            services.add_instance(BillingMarker);
            Ok(())
        },
    )
}

fn shells(declared: &[(&str, &[&str])]) -> ShellSettingsCache {
    ShellSettingsCache::from_settings(
        declared
            .iter()
            .map(|(name, features)| ShellSettings::new(id(name)).with_features(*features).unwrap()),
    )
    .unwrap()
}

fn host(declared: &[(&str, &[&str])]) -> ShellHost {
    ShellHost::builder()
        .registry(FeatureRegistry::from_descriptors([core(), billing()]).unwrap())
        .settings(shells(declared))
        .build()
}

#[test]
fn builds_features_in_dependency_order() {
    let host = host(&[("Tenant1", &["Billing"])]);
    let shell = host.get_shell(&id("tenant1")).unwrap();

    let order: Vec<_> = shell.feature_order().iter().map(FeatureId::as_str).collect();
    assert_eq!(order, ["Core", "Billing"]);
    assert!(shell.get::<CoreMarker>().is_some());
    assert!(shell.get::<BillingMarker>().is_some());
}

#[test]
fn repeated_requests_return_the_same_context() {
    let host = host(&[("Tenant1", &["Core"])]);
    let first = host.get_shell(&id("Tenant1")).unwrap();
    let second = host.get_shell(&id("TENANT1")).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&host.try_get_built(&id("tenant1")).unwrap(), &first));
}

#[test]
fn feature_services_do_not_leak_between_shells() {
    let host = host(&[("A", &["Billing"]), ("B", &[])]);
    assert!(host.get_shell(&id("A")).unwrap().get::<BillingMarker>().is_some());

    let b = host.get_shell(&id("B")).unwrap();
    assert!(b.get::<BillingMarker>().is_none());
    assert!(b.get::<CoreMarker>().is_none());
}

#[test]
fn root_services_are_inherited_unless_overridden() {
    let overriding = ShellFeatureDescriptor::new("Override").unwrap().configure(|services, _| {
        services.add_instance(Greeting("shell"));
        Ok(())
    });
    let host = ShellHost::builder()
        .registry(FeatureRegistry::from_descriptors([overriding]).unwrap())
        .settings(shells(&[("A", &["Override"]), ("B", &[])]))
        .configure_root(|root| {
            root.add_instance(Greeting("root"));
        })
        .build();

    let a = host.get_shell(&id("A")).unwrap();
    let b = host.get_shell(&id("B")).unwrap();
    assert_eq!(a.require::<Greeting>().unwrap().0, "shell");
    assert_eq!(b.require::<Greeting>().unwrap().0, "root");
    assert_eq!(host.root().require::<Greeting>().unwrap().0, "root");
}

#[test]
fn inherited_root_instances_are_shared_not_copied() {
    let host = ShellHost::builder()
        .settings(shells(&[("A", &[]), ("B", &[])]))
        .configure_root(|root| {
            root.add_factory(|_| Greeting("lazy"));
        })
        .build();

    let a = host.get_shell(&id("A")).unwrap().require::<Greeting>().unwrap();
    let b = host.get_shell(&id("B")).unwrap().require::<Greeting>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn infrastructure_is_not_visible_inside_shells() {
    let host = host(&[("Tenant1", &[])]);
    assert!(host.root().contains::<ShellHostHandle>());
    assert!(host.root().contains::<ShellScopeFactory>());
    assert!(host.root().contains::<RootServicesAccessor>());

    let shell = host.get_shell(&id("Tenant1")).unwrap();
    assert!(shell.get::<ShellHostHandle>().is_none());
    assert!(shell.get::<ShellScopeFactory>().is_none());
    assert!(shell.get::<RootServicesAccessor>().is_none());
}

#[test]
fn shell_identity_services_are_registered() {
    let host = ShellHost::builder()
        .settings(
            ShellSettingsCache::from_settings([ShellSettings::new(id("Tenant1"))
                .with_configuration("Billing:Currency", "EUR")])
            .unwrap(),
        )
        .build();
    let shell = host.get_shell(&id("Tenant1")).unwrap();

    assert_eq!(*shell.require::<ShellId>().unwrap(), id("tenant1"));
    assert_eq!(shell.require::<ShellSettings>().unwrap().id().as_str(), "Tenant1");
    let configuration = shell.require::<ShellConfiguration>().unwrap();
    assert_eq!(configuration.section("billing").get("currency"), Some("EUR"));

    let deferred = shell.require::<DeferredShellContext>().unwrap();
    assert!(Arc::ptr_eq(&deferred.get(), &shell));
}

#[test]
fn features_see_root_services_but_not_the_host() {
    let probe = ShellFeatureDescriptor::new("Probe").unwrap().with_initializer(
        |activation: &FeatureActivation<'_>| {
            assert!(activation.root().get::<ShellHostHandle>().is_none());
            assert!(activation.root().require::<ShellScopeFactory>().is_err());
            let greeting = activation.root().require::<Greeting>()?;
            let shell = activation.shell_id().to_string();
            Ok(Box::new(move |services: &mut ServiceCollection| -> Result<(), BoxError> {
                services.add_instance(format!("{}@{shell}", greeting.0));
                Ok(())
            }) as Box<dyn ShellFeature>)
        },
    );

    let host = ShellHost::builder()
        .registry(FeatureRegistry::from_descriptors([probe]).unwrap())
        .settings(shells(&[("Tenant1", &["Probe"])]))
        .configure_root(|root| {
            root.add_instance(Greeting("root"));
        })
        .build();

    let shell = host.get_shell(&id("Tenant1")).unwrap();
    assert_eq!(shell.require::<String>().unwrap().as_str(), "root@Tenant1");
}

#[test]
fn unknown_shell_is_not_found() {
    let host = host(&[("Tenant1", &[])]);
    let err = host.get_shell(&id("Ghost")).unwrap_err();
    assert!(matches!(err, HostError::NotFound { ref shell, .. } if shell.as_str() == "Ghost"));
}

#[test]
fn unknown_features_are_all_reported() {
    let host = host(&[("Tenant1", &["Core", "Payroll", "Fax"])]);
    let err = host.get_shell(&id("Tenant1")).unwrap_err();
    let message = err.to_string();
    assert!(matches!(err, HostError::Configuration { .. }));
    assert!(message.contains("Tenant1"));
    assert!(message.contains("Payroll, Fax"));
    assert!(host.try_get_built(&id("Tenant1")).is_none());
}

#[test]
fn failing_feature_names_feature_and_shell() {
    let broken = ShellFeatureDescriptor::new("Broken").unwrap().configure(|_, _| Err("boom".into()));
    let host = ShellHost::builder()
        .registry(FeatureRegistry::from_descriptors([broken]).unwrap())
        .settings(shells(&[("Tenant1", &["Broken"])]))
        .build();

    let err = host.get_shell(&id("Tenant1")).unwrap_err();
    let HostError::FeatureInitialization { feature, shell, source, .. } = err else {
        panic!("expected an initialization failure, got {err:?}");
    };
    assert_eq!(feature.as_str(), "Broken");
    assert_eq!(shell.as_str(), "Tenant1");
    assert_eq!(source.to_string(), "boom");
    assert!(host.try_get_built(&id("Tenant1")).is_none());
}

#[test]
fn default_shell_prefers_the_default_name_then_declaration_order() {
    let named = host(&[("Tenant1", &[]), ("default", &[])]);
    assert_eq!(named.default_shell().unwrap().id().as_str(), "default");

    let first = host(&[("Tenant2", &[]), ("Tenant1", &[])]);
    assert_eq!(first.default_shell().unwrap().id().as_str(), "Tenant2");

    let empty = host(&[]);
    assert!(matches!(empty.default_shell().unwrap_err(), HostError::NoShellsConfigured { .. }));
}

#[test]
fn all_shells_builds_everything_in_declaration_order() {
    let host = host(&[("B", &["Core"]), ("A", &["Billing"])]);
    let built = host.all_shells().unwrap();
    let ids: Vec<_> = built.iter().map(|s| s.id().as_str()).collect();
    assert_eq!(ids, ["B", "A"]);
    assert!(Arc::ptr_eq(&built[1], &host.get_shell(&id("A")).unwrap()));
}

#[test]
fn dispose_releases_shell_services_once_and_blocks_access() {
    let pool = Arc::new(Pool::default());
    let shared = Arc::clone(&pool);
    let feature = ShellFeatureDescriptor::new("Pool").unwrap().configure(move |services, _| {
        let pool = Arc::clone(&shared);
        services.add_disposable_factory(move |_| PoolHandle(Arc::clone(&pool)));
        Ok(())
    });
    let host = ShellHost::builder()
        .registry(FeatureRegistry::from_descriptors([feature]).unwrap())
        .settings(shells(&[("Tenant1", &["Pool"]), ("Tenant2", &["Pool"])]))
        .build();

    host.get_shell(&id("Tenant1")).unwrap().require::<PoolHandle>().unwrap();
    host.get_shell(&id("Tenant2")).unwrap();

    host.dispose();
    host.dispose();

    // Tenant2 never resolved its handle, so only Tenant1 had anything to release.
    assert_eq!(pool.disposed.load(Ordering::SeqCst), 1);
    assert!(host.is_disposed());
    assert!(matches!(host.get_shell(&id("Tenant1")).unwrap_err(), HostError::Disposed { .. }));
    assert!(host.try_get_built(&id("Tenant1")).is_none());
}

#[test]
fn root_disposables_are_released_by_the_root_only() {
    let host = ShellHost::builder()
        .settings(shells(&[("Tenant1", &[])]))
        .configure_root(|root| {
            root.add_disposable(Pool::default());
        })
        .build();

    let from_shell = host.get_shell(&id("Tenant1")).unwrap().require::<Pool>().unwrap();
    drop(host);
    assert_eq!(from_shell.disposed.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_first_access_builds_once() {
    const THREADS: usize = 16;
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&builds);
    let counted = ShellFeatureDescriptor::new("Counted").unwrap().configure(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let host = ShellHost::builder()
        .registry(FeatureRegistry::from_descriptors([counted]).unwrap())
        .settings(shells(&[("Tenant1", &["Counted"])]))
        .build();

    let barrier = Arc::new(Barrier::new(THREADS));
    let contexts: Vec<_> = (0..THREADS)
        .map(|_| {
            let host = host.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                host.get_shell(&id("Tenant1")).unwrap()
            })
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(contexts.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
}

#[test]
fn scope_factory_reaches_built_shells() {
    let host = host(&[("Tenant1", &["Core"])]);
    let factory = host.root().require::<ShellScopeFactory>().unwrap();
    let scope = factory.create_scope(&id("Tenant1")).unwrap();
    assert!(scope.services().contains::<CoreMarker>());
    assert!(Arc::ptr_eq(scope.context(), &host.get_shell(&id("Tenant1")).unwrap()));
}

/// Root service built by opening another shell's scope from inside a root factory.
#[derive(Debug)]
struct Directory(Result<Vec<String>, String>);

fn directory_host(target: &'static str) -> ShellHost {
    let lookup = ShellFeatureDescriptor::new("Lookup").unwrap().with_initializer(
        |activation: &FeatureActivation<'_>| {
            let directory = activation.root().require::<Directory>()?;
            let features = directory.0.clone().map_err(BoxError::from)?;
            Ok(Box::new(move |services: &mut ServiceCollection| -> Result<(), BoxError> {
                services.add_instance(features.clone());
                Ok(())
            }) as Box<dyn ShellFeature>)
        },
    );

    ShellHost::builder()
        .registry(FeatureRegistry::from_descriptors([core(), lookup]).unwrap())
        .settings(shells(&[("A", &["Lookup"]), ("B", &["Core"])]))
        .configure_root(move |root| {
            root.add_factory(move |sp| {
                let Some(factory) = sp.get::<ShellScopeFactory>() else {
                    return Directory(Err("no scope factory".to_owned()));
                };
                Directory(
                    factory
                        .create_scope(&id(target))
                        .map(|scope| {
                            scope.context().feature_order().iter().map(ToString::to_string).collect()
                        })
                        .map_err(|err| err.to_string()),
                )
            });
        })
        .build()
}

/// Runs `get_shell` on a worker so a lock regression fails instead of hanging the suite.
fn get_shell_within(host: &ShellHost, name: &'static str) -> Result<Arc<ShellContext>, HostError> {
    let (tx, rx) = mpsc::channel();
    let worker = host.clone();
    thread::spawn(move || {
        let _ = tx.send(worker.get_shell(&id(name)));
    });
    rx.recv_timeout(Duration::from_secs(5)).expect("get_shell did not return within 5s")
}

#[test]
fn feature_may_open_another_shell_while_being_built() {
    let host = directory_host("B");

    let a = get_shell_within(&host, "A").unwrap();
    assert_eq!(a.require::<Vec<String>>().unwrap().as_slice(), ["Core"]);
    assert!(host.try_get_built(&id("B")).is_some());
}

#[test]
fn feature_reopening_its_own_shell_fails_fast() {
    let host = directory_host("A");

    let err = get_shell_within(&host, "A").unwrap_err();
    let HostError::FeatureInitialization { feature, source, .. } = err else {
        panic!("expected an initialization failure, got {err:?}");
    };
    assert_eq!(feature.as_str(), "Lookup");
    assert!(source.to_string().contains("Lifecycle violation"), "{source}");
    assert!(host.try_get_built(&id("A")).is_none());
}

#[derive(Debug)]
struct PoolHandle(Arc<Pool>);

impl Disposable for PoolHandle {
    fn dispose(&self) {
        self.0.dispose();
    }
}
