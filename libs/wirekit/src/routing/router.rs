use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use serde_json::json;

use super::endpoint::HttpMethod;
use crate::class::ClassId;
use crate::http::{HandlerResult, Middleware, Next, PathPattern, Request, RequestContext, Response};

pub(crate) type Chain = Arc<[Arc<dyn Middleware>]>;

/// One compiled endpoint: its full request path and precomputed stage chain.
#[derive(Clone)]
pub struct Route {
    pub router: ClassId,
    pub key: String,
    pub method: HttpMethod,
    pub pattern: PathPattern,
    pub(crate) chain: Chain,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("router", &self.router)
            .field("key", &self.key)
            .field("method", &self.method)
            .field("pattern", &self.pattern.to_string())
            .field("stages", &self.stage_names())
            .finish()
    }
}

impl Route {
    pub fn path(&self) -> String {
        self.pattern.to_string()
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.chain.iter().map(|m| m.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MountedRouter {
    pub class: ClassId,
    /// Normalised router path.
    pub path: String,
    /// Router path under the REST endpoint.
    pub mount: String,
}

/// Terminal stage of the unmatched-request chain.
pub(crate) struct NotFound;

#[async_trait]
impl Middleware for NotFound {
    async fn invoke(&self, ctx: RequestContext, next: Next) -> HandlerResult {
        ctx.set_status(StatusCode::NOT_FOUND);
        next.run(ctx).await
    }

    fn name(&self) -> &str {
        "not-found"
    }
}

/// Routing table produced by the routing compiler.
///
/// Immutable and shareable; `dispatch` may run concurrently.
#[derive(Clone)]
pub struct CompiledRouter {
    pub(crate) rest_endpoint: String,
    pub(crate) routers: Vec<MountedRouter>,
    pub(crate) routes: Vec<Route>,
    pub(crate) fallback: Chain,
}

impl fmt::Debug for CompiledRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRouter")
            .field("rest_endpoint", &self.rest_endpoint)
            .field("routers", &self.routers.len())
            .field("routes", &self.routes.len())
            .finish()
    }
}

impl Default for CompiledRouter {
    fn default() -> Self {
        Self {
            rest_endpoint: "/".to_owned(),
            routers: Vec::new(),
            routes: Vec::new(),
            fallback: Arc::from(vec![Arc::new(NotFound) as Arc<dyn Middleware>]),
        }
    }
}

impl CompiledRouter {
    pub fn rest_endpoint(&self) -> &str {
        &self.rest_endpoint
    }

    pub fn routers(&self) -> &[MountedRouter] {
        &self.routers
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// First route, in mount order, whose method and path pattern match.
    pub fn find(
        &self,
        method: &http::Method,
        path: &str,
    ) -> Option<(&Route, HashMap<String, String>)> {
        self.routes.iter().find_map(|r| {
            if !r.method.matches(method) {
                return None;
            }
            r.pattern.matches(path).map(|params| (r, params))
        })
    }

    pub async fn dispatch(&self, request: Request) -> Response {
        let method = request.method.clone();
        let path = request.path.clone();
        let ctx = RequestContext::new(request);

        let chain = match self.find(&method, &path) {
            Some((route, params)) => {
                tracing::debug!(%method, %path, route = %route.key, "Dispatching request");
                ctx.set_params(params);
                Arc::clone(&route.chain)
            }
            None => {
                tracing::debug!(%method, %path, "No route matched");
                Arc::clone(&self.fallback)
            }
        };

        if let Err(e) = Next::new(chain).run(ctx.clone()).await {
            tracing::error!(%method, %path, error = %e, "Request handler failed");
            ctx.set_status(StatusCode::INTERNAL_SERVER_ERROR);
            ctx.set_body(json!({ "error": e.to_string() }));
        }
        ctx.into_response()
    }
}
