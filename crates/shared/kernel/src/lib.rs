//! # Shell host kernel
//!
//! Builds one isolated service container per tenant shell and picks the shell a request
//! belongs to.
//!
//! * [`feature`]: feature descriptors, the registry, discovery and dependency ordering.
//! * [`container`]: the type-keyed [`ServiceCollection`] / [`ServiceProvider`] pair.
//! * [`shell`]: the [`ShellHost`] that lazily builds and caches [`ShellContext`]s.
//! * [`resolution`]: the ranked [`ResolutionPipeline`] of shell resolver strategies.
//! * [`config`]: file + environment settings loader.
//!
//! ```rust
//! use mhost_kernel::prelude::*;
//!
//! # fn main() -> Result<(), HostError> {
//! let registry = FeatureRegistry::from_descriptors([
//!     ShellFeatureDescriptor::new("Core")?.configure(|services, _| {
//!         services.add_instance(String::from("core"));
//!         Ok(())
//!     }),
//! ])?;
//! let shells = ShellSettingsCache::from_settings([
//!     ShellSettings::new(ShellId::new("Tenant1")?).with_features(["core"])?,
//! ])?;
//!
//! let host = ShellHost::builder().registry(registry).settings(shells).build();
//! let shell = host.get_shell(&ShellId::new("tenant1")?)?;
//! assert_eq!(shell.require::<String>()?.as_str(), "core");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod container;
pub mod error;
pub mod feature;
pub mod prelude;
pub mod resolution;
pub mod shell;

pub use container::{ServiceCollection, ServiceProvider};
pub use error::{BoxError, HostError, HostErrorExt};
pub use resolution::ResolutionPipeline;
pub use shell::{ShellContext, ShellHost};

pub use inventory;
pub use mhost_domain as domain;
