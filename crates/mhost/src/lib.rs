//! Facade crate for the shell host.
//! Re-exports the domain, kernel and macro crates and composes a host with its resolution
//! pipeline. Keep this crate thin: it wires other crates together and owns no business logic.
//!
//! ## Usage
//! ```rust
//! use mhost::prelude::*;
//!
//! # fn main() -> Result<(), HostError> {
//! let shells = ShellSettingsCache::from_settings([ShellSettings::new(ShellId::new("Default")?)])?;
//! let runtime = ShellRuntime::new(
//!     ShellHost::builder().settings(shells.clone()).build(),
//!     ResolutionPipeline::standard(&shells, &RoutingConfig::default())?,
//! );
//! let shell = runtime.resolve_shell(&ResolutionContext::new().with_host("unknown.example.com"))?;
//! assert_eq!(shell.id().as_str(), "Default");
//! # Ok(())
//! # }
//! ```

pub use mhost_derive::{mhost_error, shell_feature};
pub use mhost_domain as domain;
pub use mhost_kernel as kernel;

use mhost_domain::config::HostConfig;
use mhost_kernel::container::ServiceCollection;
use mhost_kernel::feature::FeatureDiscovery;
use mhost_kernel::prelude::{
    HostError, ResolutionContext, ResolutionPipeline, ShellContext, ShellHost,
};
use std::sync::Arc;

pub mod prelude {
    pub use crate::ShellRuntime;
    pub use mhost_derive::shell_feature;
    pub use mhost_domain::config::{HostConfig, RoutingConfig};
    pub use mhost_kernel::prelude::*;
}

/// A host plus the pipeline that picks a shell per request.
#[derive(Debug, Clone)]
pub struct ShellRuntime {
    host: ShellHost,
    pipeline: ResolutionPipeline,
}

impl ShellRuntime {
    #[must_use]
    pub const fn new(host: ShellHost, pipeline: ResolutionPipeline) -> Self {
        Self { host, pipeline }
    }

    /// Host over the configured shells, with the standard pipeline for the configured routing.
    ///
    /// # Errors
    /// Propagates discovery, settings and fallback-name validation failures.
    pub fn from_config(
        config: &HostConfig,
        discovery: &dyn FeatureDiscovery,
        root: ServiceCollection,
    ) -> Result<Self, HostError> {
        let host = ShellHost::from_config(config, discovery, root)?;
        let pipeline = ResolutionPipeline::standard(host.settings(), &config.routing)?;
        tracing::info!(
            shells = host.settings().len(),
            features = host.registry().len(),
            strategies = pipeline.len(),
            "Shell runtime ready"
        );
        Ok(Self { host, pipeline })
    }

    #[must_use]
    pub const fn host(&self) -> &ShellHost {
        &self.host
    }

    #[must_use]
    pub const fn pipeline(&self) -> &ResolutionPipeline {
        &self.pipeline
    }

    /// The shell for a request: the pipeline's answer, else the host's default shell.
    ///
    /// # Errors
    /// Whatever [`ShellHost::get_shell`] / [`ShellHost::default_shell`] return.
    pub fn resolve_shell(&self, request: &ResolutionContext) -> Result<Arc<ShellContext>, HostError> {
        match self.pipeline.resolve(request) {
            Some(shell) => self.host.get_shell(&shell),
            None => self.host.default_shell(),
        }
    }
}
