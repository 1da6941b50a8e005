//! Common imports for code that declares features or hosts shells.

pub use crate::container::{Disposable, ServiceCollection, ServiceProvider};
pub use crate::error::{BoxError, HostError, HostErrorExt};
pub use crate::feature::{
    ActivateFeature, DependencyResolver, FeatureActivation, FeatureDiscovery, FeatureRegistry,
    InventoryDiscovery, ShellFeature, ShellFeatureDescriptor, StaticDiscovery,
};
pub use crate::resolution::{ResolutionPipeline, ShellResolverStrategy};
pub use crate::shell::{
    DeferredShellContext, RootServices, ShellConfiguration, ShellContext, ShellHost,
    ShellSettingsCache,
};
pub use mhost_domain::resolution::{ResolutionContext, RoutingSources};
pub use mhost_domain::shell::ShellSettings;
pub use mhost_domain::{FeatureId, ShellId};
