use thiserror::Error;

use crate::class::{display_id, ClassId, ServiceId};
use crate::schema::TypeKind;

/// Structured configuration errors raised while registering or compiling directives.
///
/// Every variant describes a contradiction in the declared metadata; none of them
/// can occur while serving a request and none are retried.
#[derive(Debug, Error)]
pub enum RegistryError {
    // Dependency injection
    #[error("service '{class}'{} is already registered", display_id(.id))]
    DuplicateService {
        class: ClassId,
        id: Option<ServiceId>,
    },
    #[error("class '{class}' must be registered as a service before it can receive injections")]
    UnregisteredService { class: ClassId },
    #[error("'{destination}.{key}' requires service '{source_class}'{} which is not registered", display_id(.id))]
    MissingDependency {
        destination: ClassId,
        key: String,
        source_class: ClassId,
        id: Option<ServiceId>,
    },
    #[error("service '{class}' does not hold an instance of the expected type")]
    ServiceTypeMismatch { class: ClassId },

    // Routing
    #[error("router path '{path}' of '{class}' collides with '{existing_path}' of '{existing_class}'")]
    DuplicateRouterPath {
        path: String,
        class: ClassId,
        existing_path: String,
        existing_class: ClassId,
    },
    #[error("endpoint '{class}.{key}' belongs to a class that is not registered as a router")]
    UnknownRouter { class: ClassId, key: String },
    #[error("handler '{key}' is bound to '{found}' but declared on '{expected}'")]
    HandlerOwnerMismatch {
        key: String,
        expected: ClassId,
        found: ClassId,
    },
    #[error("middleware '{reference}' is not registered")]
    UnknownMiddleware { reference: String },
    #[error("middleware '{name}' is already registered")]
    DuplicateMiddleware { name: String },

    // Messaging
    #[error("the \"{event}\" event with the namespace \"{namespace}\" already exists")]
    DuplicateEvent { event: String, namespace: String },
    #[error("event handler '{class}.{key}' belongs to a class that is not registered as a websocket")]
    UnknownWebsocket { class: ClassId, key: String },

    // Types
    #[error("type reference {reference} used by '{referrer}' does not resolve to a known type")]
    UnresolvableTypeReference { reference: String, referrer: String },
    #[error("type name '{name}' is declared more than once")]
    DuplicateTypeName { name: String },
    #[error("type '{name}' derives from itself")]
    TypeCycle { name: String },
    #[error("'{name}' cannot derive fields from '{source_type}', which is of kind {kind}")]
    InvalidTransformTarget {
        name: String,
        source_type: String,
        kind: TypeKind,
    },
    #[error("field resolver '{field}' targets '{target}', which is of kind {kind}; only object and interface types take field resolvers")]
    InvalidFieldResolverTarget {
        field: String,
        target: String,
        kind: TypeKind,
    },

    // Lifecycle
    #[error("the registry is closed; call reset() before registering new directives")]
    Closed,
}
