use mhost_domain::{DomainError, FeatureId, ShellId};
use std::borrow::Cow;

/// Boxed error returned by feature initializers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by the feature registry, the dependency resolver and the shell host.
///
/// All of them describe static misconfiguration and are never retried.
#[mhost_derive::mhost_error]
pub enum HostError {
    /// Duplicate shell or feature ids, unknown feature references and similar.
    #[error("Configuration error{}: {message}", format_context(.context))]
    Configuration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The settings cache is empty, so there is no default shell.
    #[error("No shells configured{}", format_context(.context))]
    NoShellsConfigured { context: Option<Cow<'static, str>> },

    /// A feature id (requested or named as a dependency) is missing from the registry.
    #[error("Feature '{feature}' not found{}", format_context(.context))]
    FeatureNotFound { feature: FeatureId, context: Option<Cow<'static, str>> },

    /// The dependency graph contains a cycle; `cycle` starts and ends with the same id.
    #[error("Circular feature dependency{}: {}", format_context(.context), format_cycle(.cycle))]
    CircularDependency { cycle: Vec<FeatureId>, context: Option<Cow<'static, str>> },

    /// A feature initializer failed while a shell was being built.
    #[error(
        "Feature '{feature}' failed to initialize for shell '{shell}'{}: {source}",
        format_context(.context)
    )]
    FeatureInitialization {
        feature: FeatureId,
        shell: ShellId,
        #[source]
        source: BoxError,
        context: Option<Cow<'static, str>>,
    },

    /// A required service is not registered in the container.
    #[error("Service '{service}' is not registered{}", format_context(.context))]
    MissingService { service: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// No settings exist for the requested shell.
    #[error("Shell '{shell}' not found{}", format_context(.context))]
    NotFound { shell: ShellId, context: Option<Cow<'static, str>> },

    /// The host (or container) has been disposed.
    #[error("Host has been disposed{}", format_context(.context))]
    Disposed { context: Option<Cow<'static, str>> },

    /// An object was used outside of its valid lifecycle window.
    #[error("Lifecycle violation{}: {message}", format_context(.context))]
    Lifecycle { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Invalid identifier in a descriptor or settings record.
    #[error("Domain error{}: {source}", format_context(.context))]
    Domain { source: DomainError, context: Option<Cow<'static, str>> },
}

impl HostError {
    pub(crate) fn configuration(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Configuration { message: message.into(), context: None }
    }

    pub(crate) const fn feature_not_found(feature: FeatureId) -> Self {
        Self::FeatureNotFound { feature, context: None }
    }

    pub(crate) const fn disposed() -> Self {
        Self::Disposed { context: None }
    }
}

fn format_cycle(cycle: &[FeatureId]) -> String {
    cycle.iter().map(FeatureId::as_str).collect::<Vec<_>>().join(" -> ")
}
