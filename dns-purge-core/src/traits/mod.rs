//! Collaborator abstractions

mod api_registry;
mod observer;

pub use api_registry::{ApiRegistry, InMemoryApiRegistry};
pub use observer::{NoopRunObserver, RunObserver};
