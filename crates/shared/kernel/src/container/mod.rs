//! Type-keyed service container.
//!
//! A [`ServiceCollection`] is the mutable registration set a shell is assembled from; one
//! registration per type, later registrations replace earlier ones. Building it freezes the
//! set into an immutable [`ServiceProvider`] that resolves services by type.

mod collection;
mod provider;

pub use collection::{ServiceCollection, ServiceDescriptor, ServiceOrigin};
pub use provider::ServiceProvider;

use std::any::Any;
use std::sync::Arc;

/// Type-erased service instance shared by a container.
pub type ServiceInstance = Arc<dyn Any + Send + Sync>;

/// Services that own resources released when their container is disposed.
pub trait Disposable: Send + Sync + 'static {
    fn dispose(&self);
}
