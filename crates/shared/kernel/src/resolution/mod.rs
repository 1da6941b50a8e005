//! Request → shell resolution.
//!
//! A [`ResolutionPipeline`] asks its strategies in rank order and returns the first shell id
//! any of them produces. Strategies hold immutable lookup tables only, so a pipeline is
//! shared across request threads without locking.

mod strategies;

pub use strategies::{FixedStrategy, HostStrategy, PathStrategy, WebRoutingStrategy};

use crate::error::HostError;
use crate::shell::ShellSettingsCache;
use mhost_domain::ShellId;
use mhost_domain::config::RoutingConfig;
use mhost_domain::resolution::ResolutionContext;
use std::fmt;
use std::sync::Arc;

/// Maps request signals to a shell id. `None` means "no opinion"; the next strategy runs.
pub trait ShellResolverStrategy: Send + Sync {
    fn resolve(&self, context: &ResolutionContext) -> Option<ShellId>;

    /// Name used in logs.
    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> ShellResolverStrategy for F
where
    F: Fn(&ResolutionContext) -> Option<ShellId> + Send + Sync,
{
    fn resolve(&self, context: &ResolutionContext) -> Option<ShellId> {
        self(context)
    }
}

struct RankedStrategy {
    rank: i32,
    strategy: Arc<dyn ShellResolverStrategy>,
}

/// Strategies ordered by rank, lowest first; equal ranks keep registration order.
#[derive(Clone)]
pub struct ResolutionPipeline {
    strategies: Arc<[RankedStrategy]>,
}

impl ResolutionPipeline {
    /// Rank of the web routing strategy in [`ResolutionPipeline::standard`].
    pub const WEB_ROUTING_RANK: i32 = 0;
    /// Rank of the fallback strategy in [`ResolutionPipeline::standard`].
    pub const FALLBACK_RANK: i32 = i32::MAX;

    #[must_use]
    pub fn builder() -> ResolutionPipelineBuilder {
        ResolutionPipelineBuilder::default()
    }

    /// Web routing over the shells' `WebRouting:*` properties, then the configured fallback.
    ///
    /// # Errors
    /// Returns [`HostError::Domain`] if the fallback shell name is empty.
    pub fn standard(shells: &ShellSettingsCache, routing: &RoutingConfig) -> Result<Self, HostError> {
        let mut builder = Self::builder()
            .add(Self::WEB_ROUTING_RANK, WebRoutingStrategy::from_settings(shells.iter(), routing));
        if let Some(fallback) = &routing.fallback {
            builder = builder.add(Self::FALLBACK_RANK, FixedStrategy::new(ShellId::new(fallback)?));
        }
        Ok(builder.build())
    }

    /// First non-empty answer, in rank order.
    #[must_use]
    pub fn resolve(&self, context: &ResolutionContext) -> Option<ShellId> {
        self.strategies.iter().find_map(|ranked| {
            let shell = ranked.strategy.resolve(context)?;
            tracing::trace!(strategy = ranked.strategy.name(), shell = %shell, "Shell resolved");
            Some(shell)
        })
    }

    /// Strategy names in evaluation order.
    pub fn strategy_names(&self) -> impl Iterator<Item = &str> {
        self.strategies.iter().map(|ranked| ranked.strategy.name())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl fmt::Debug for ResolutionPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.strategies.iter().map(|r| (r.rank, r.strategy.name())))
            .finish()
    }
}

#[derive(Default)]
pub struct ResolutionPipelineBuilder {
    strategies: Vec<RankedStrategy>,
}

impl ResolutionPipelineBuilder {
    #[must_use]
    pub fn add(mut self, rank: i32, strategy: impl ShellResolverStrategy + 'static) -> Self {
        self.strategies.push(RankedStrategy { rank, strategy: Arc::new(strategy) });
        self
    }

    #[must_use]
    pub fn add_shared(mut self, rank: i32, strategy: Arc<dyn ShellResolverStrategy>) -> Self {
        self.strategies.push(RankedStrategy { rank, strategy });
        self
    }

    #[must_use]
    pub fn build(mut self) -> ResolutionPipeline {
        // Stable: ties keep registration order.
        self.strategies.sort_by_key(|ranked| ranked.rank);
        ResolutionPipeline { strategies: self.strategies.into() }
    }
}

impl fmt::Debug for ResolutionPipelineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionPipelineBuilder").field("strategies", &self.strategies.len()).finish()
    }
}
