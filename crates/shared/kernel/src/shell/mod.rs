//! Per-shell containers: settings, the lazily built [`ShellContext`] cache and the
//! services a shell can use to reach the host.

mod configuration;
mod context;
mod host;
mod root;
mod settings;

pub use configuration::ShellConfiguration;
pub use context::{DeferredShellContext, ShellContext};
pub use host::{ShellHost, ShellHostBuilder};
pub use root::{RootServices, RootServicesAccessor, ShellHostHandle, ShellScope, ShellScopeFactory};
pub use settings::ShellSettingsCache;

pub(crate) use host::HostInner;
