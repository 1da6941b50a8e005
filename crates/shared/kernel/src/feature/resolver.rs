//! Dependency-first ordering of features.
//!
//! Depth-first traversal with three node states. A dependency reached while its node is
//! still in progress closes a cycle; finished nodes are emitted in post-order, so every
//! feature follows all of its transitive dependencies and shared dependencies appear once.

use super::FeatureRegistry;
use crate::error::HostError;
use fxhash::FxHashMap;
use mhost_domain::FeatureId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    InProgress,
    Done,
}

struct Traversal<'r> {
    registry: &'r FeatureRegistry,
    states: FxHashMap<FeatureId, VisitState>,
    path: Vec<FeatureId>,
    order: Vec<FeatureId>,
}

impl<'r> Traversal<'r> {
    fn new(registry: &'r FeatureRegistry) -> Self {
        Self { registry, states: FxHashMap::default(), path: Vec::new(), order: Vec::new() }
    }

    fn visit(&mut self, id: &FeatureId) -> Result<(), HostError> {
        match self.states.get(id) {
            Some(VisitState::Done) => return Ok(()),
            Some(VisitState::InProgress) => return Err(self.cycle_through(id)),
            None => {},
        }

        let descriptor =
            self.registry.get(id).ok_or_else(|| HostError::feature_not_found(id.clone()))?;
        // Registry spelling wins over the spelling used by the caller or a dependent.
        let canonical = descriptor.id().clone();

        self.states.insert(canonical.clone(), VisitState::InProgress);
        self.path.push(canonical.clone());

        for dependency in descriptor.dependencies() {
            self.visit(dependency)?;
        }

        self.path.pop();
        self.states.insert(canonical.clone(), VisitState::Done);
        self.order.push(canonical);
        Ok(())
    }

    fn cycle_through(&self, id: &FeatureId) -> HostError {
        let start = self.path.iter().position(|entry| entry == id).unwrap_or(0);
        let mut cycle: Vec<FeatureId> = self.path[start..].to_vec();
        cycle.push(self.path.get(start).cloned().unwrap_or_else(|| id.clone()));
        HostError::CircularDependency { cycle, context: None }
    }
}

/// Stateless resolver over a [`FeatureRegistry`].
#[derive(Debug)]
pub struct DependencyResolver;

impl DependencyResolver {
    /// All transitive dependencies of `feature`, dependency-first, excluding `feature`.
    ///
    /// # Errors
    /// * [`HostError::FeatureNotFound`] if `feature` or any dependency is not registered.
    /// * [`HostError::CircularDependency`] if the traversal closes a cycle.
    pub fn resolve_dependencies(
        feature: &FeatureId,
        registry: &FeatureRegistry,
    ) -> Result<Vec<FeatureId>, HostError> {
        if !registry.contains(feature) {
            return Err(HostError::feature_not_found(feature.clone()));
        }

        let mut traversal = Traversal::new(registry);
        traversal.visit(feature)?;
        let mut order = traversal.order;
        // Post-order always finishes with the starting node.
        order.pop();
        Ok(order)
    }

    /// `selected` plus all transitive dependencies, each after its dependencies.
    ///
    /// Independent features keep the first-encounter order of `selected`; repeated ids are
    /// ignored.
    ///
    /// # Errors
    /// Same as [`DependencyResolver::resolve_dependencies`]; no partial order is returned.
    pub fn ordered_features<'a, I>(
        selected: I,
        registry: &FeatureRegistry,
    ) -> Result<Vec<FeatureId>, HostError>
    where
        I: IntoIterator<Item = &'a FeatureId>,
    {
        let mut traversal = Traversal::new(registry);
        for feature in selected {
            traversal.visit(feature)?;
        }
        Ok(traversal.order)
    }

    /// Every registered feature, dependency-first, seeded in registration order.
    ///
    /// # Errors
    /// Same as [`DependencyResolver::ordered_features`].
    pub fn ordered_all(registry: &FeatureRegistry) -> Result<Vec<FeatureId>, HostError> {
        Self::ordered_features(registry.ids(), registry)
    }
}
