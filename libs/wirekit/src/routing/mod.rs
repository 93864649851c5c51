//! Routers and endpoints compiled into a dispatchable routing table.

pub mod compiler;
pub mod endpoint;
pub mod router;

pub use compiler::compile_routers;
pub use endpoint::{
    AppliesTo, EndpointParams, HandlerFn, HttpMethod, RouterParams, UseMiddlewareParams,
};
pub use router::{CompiledRouter, MountedRouter, Route};
