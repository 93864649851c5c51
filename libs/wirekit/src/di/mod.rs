//! Singleton service container and field injection.

pub mod inject;
pub mod service;

pub use inject::{resolve_injections, Inject, InjectMany, InjectionRequest};
pub use service::{Service, ServiceInstance, ServiceRegistry};
