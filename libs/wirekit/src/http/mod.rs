//! Request model, middleware contract and path handling shared by the routing compiler.

pub mod context;
pub mod middleware;
pub mod path;

pub use context::{Request, RequestContext, Response};
pub use middleware::{
    FnMiddleware, HandlerResult, Middleware, MiddlewareEntry, MiddlewareIndex, MiddlewareKey,
    MiddlewareRef, Next, Timing, Wrapping,
};
pub use path::{join_paths, normalize_path, PathPattern};
