//! # WireKit - Declarative API Assembly
//!
//! Application types describe themselves through directives: routers and
//! endpoints, middleware, websocket events, schema types and root fields,
//! injected dependencies. A [`Registry`] accumulates them and
//! [`Registry::build_all`] compiles everything into immutable [`Artifacts`]:
//!
//! - a dispatchable routing table with precomputed middleware chains,
//! - a schema graph including synthesised enum, union, partial and required types,
//! - websocket namespaces with their bound event handlers,
//! - the service container used to resolve injected fields.
//!
//! ## Registration
//!
//! ```rust,ignore
//! use wirekit::prelude::*;
//!
//! #[derive(Default)]
//! struct Users;
//!
//! async fn list(_: Arc<Users>, ctx: RequestContext, next: Next) -> HandlerResult {
//!     ctx.set_body(serde_json::json!([]));
//!     next.run(ctx).await
//! }
//!
//! fn register(r: &mut Registry) -> Result<(), RegistryError> {
//!     r.add_router::<Users>("/users")?;
//!     r.add_endpoint::<Users>(
//!         "list",
//!         EndpointParams::new(HttpMethod::Get, "/", HandlerFn::of(list)),
//!     )
//! }
//!
//! wirekit::directives!(register);
//! ```
//!
//! Registrators submitted with [`directives!`] are collected at link time via
//! `inventory` and run by [`Registry::discover`].

pub mod class;
pub mod di;
pub mod directive;
pub mod error;
pub mod http;
pub mod registry;
pub mod routing;
pub mod runtime;
pub mod schema;
pub mod websocket;

pub use class::{ClassId, ServiceId};
pub use directive::{Category, Directive};
pub use error::RegistryError;
pub use registry::{Artifacts, BuildOptions, Phase, Registrator, Registry};
pub use runtime::Host;

#[doc(hidden)]
pub use inventory;

/// Submits a registration function for discovery.
///
/// The function has the signature `fn(&mut Registry) -> Result<(), RegistryError>`.
#[macro_export]
macro_rules! directives {
    ($register:path) => {
        $crate::inventory::submit! {
            $crate::registry::Registrator($register)
        }
    };
}

pub mod prelude {
    pub use std::sync::Arc;

    pub use crate::di::{Inject, InjectMany, InjectionRequest};
    pub use crate::http::{
        FnMiddleware, HandlerResult, Middleware, MiddlewareRef, Next, Request, RequestContext,
        Response, Timing,
    };
    pub use crate::routing::{AppliesTo, EndpointParams, HandlerFn, HttpMethod};
    pub use crate::schema::{
        CreateParams, EnumValueParams, FieldParams, FieldResolverParams, ResolverFn,
        RootFieldParams, RootOperation, TypeParams, TypeRef,
    };
    pub use crate::websocket::{EventFn, EventResult, SocketMessage};
    pub use crate::{BuildOptions, Host, Registry, RegistryError, ServiceId};
}
