//! End-to-end routing: registration, chain assembly and dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use http::{HeaderName, HeaderValue, Method, StatusCode};
use serde_json::{json, Value};

use wirekit::http::{HandlerResult, Middleware, MiddlewareRef, Next, Request, RequestContext, Timing};
use wirekit::routing::{AppliesTo, EndpointParams, HandlerFn, HttpMethod};
use wirekit::{BuildOptions, Registry, RegistryError};

const TRACE: &str = "x-trace";

/// Records `label` in the request trace and mirrors the trace into a response header.
fn mark(ctx: &RequestContext, label: &str) {
    ctx.push_state("trace", json!(label));
    let joined = match ctx.state("trace") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(","),
        _ => String::new(),
    };
    ctx.set_header(
        HeaderName::from_static(TRACE),
        HeaderValue::from_str(&joined).unwrap(),
    );
}

struct Mark(&'static str);

#[async_trait]
impl Middleware for Mark {
    async fn invoke(&self, ctx: RequestContext, next: Next) -> HandlerResult {
        mark(&ctx, self.0);
        next.run(ctx).await
    }

    fn name(&self) -> &str {
        self.0
    }
}

#[derive(Default)]
struct Audit;

#[async_trait]
impl Middleware for Audit {
    async fn invoke(&self, ctx: RequestContext, next: Next) -> HandlerResult {
        mark(&ctx, "audit");
        next.run(ctx).await
    }
}

#[derive(Default)]
struct Shop;

async fn handle_x(_: Arc<Shop>, ctx: RequestContext, next: Next) -> HandlerResult {
    mark(&ctx, "H");
    ctx.set_body(json!({ "ok": true }));
    next.run(ctx).await
}

async fn handle_x_again(_: Arc<Shop>, ctx: RequestContext, next: Next) -> HandlerResult {
    mark(&ctx, "H2");
    next.run(ctx).await
}

async fn handle_item(_: Arc<Shop>, ctx: RequestContext, next: Next) -> HandlerResult {
    ctx.set_body(json!({ "id": ctx.param("id") }));
    next.run(ctx).await
}

async fn handle_fail(_: Arc<Shop>, _: RequestContext, _: Next) -> HandlerResult {
    anyhow::bail!("boom")
}

fn trace(resp: &wirekit::http::Response) -> String {
    resp.headers
        .get(TRACE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}

fn marks(r: &mut Registry) -> Result<(), RegistryError> {
    r.add_named_middleware("g1", Timing::Before, Mark("G1"))?;
    r.add_named_middleware("g2", Timing::After, Mark("G2"))?;
    r.add_named_middleware("r1", Timing::Before, Mark("R1"))?;
    r.add_named_middleware("r2", Timing::After, Mark("R2"))?;
    r.add_named_middleware("e1", Timing::Before, Mark("E1"))?;
    r.add_named_middleware("e2", Timing::After, Mark("E2"))
}

fn shop_registry() -> Registry {
    let mut r = Registry::new();
    marks(&mut r).unwrap();
    r.add_router::<Shop>("/r").unwrap();
    r.add_endpoint::<Shop>(
        "x",
        EndpointParams::new(HttpMethod::Get, "/x", HandlerFn::of(handle_x)),
    )
    .unwrap();
    r.use_middleware::<Shop>(
        AppliesTo::Class,
        vec![MiddlewareRef::named("r1"), MiddlewareRef::named("r2")],
    )
    .unwrap();
    r.use_middleware::<Shop>(
        AppliesTo::member("x"),
        vec![MiddlewareRef::named("e1"), MiddlewareRef::named("e2")],
    )
    .unwrap();
    r
}

fn global_options() -> BuildOptions {
    BuildOptions::new("/rest")
        .with_global(MiddlewareRef::named("g1"))
        .with_global(MiddlewareRef::named("g2"))
}

#[tokio::test]
async fn chain_runs_in_declared_order() {
    let mut r = shop_registry();
    let artifacts = r.build_all(&global_options()).unwrap();

    let resp = artifacts
        .router
        .dispatch(Request::new(Method::GET, "/rest/r/x"))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, Some(json!({ "ok": true })));
    assert_eq!(trace(&resp), "G1,R1,E1,H,E2,R2,G2");

    let route = &artifacts.router.routes()[0];
    assert_eq!(route.path(), "/rest/r/x");
    assert_eq!(route.len(), 7);
    assert_eq!(route.stage_names()[3], "Shop.x");
}

#[tokio::test]
async fn paths_match_case_insensitively() {
    let mut r = shop_registry();
    let artifacts = r.build_all(&global_options()).unwrap();
    let resp = artifacts
        .router
        .dispatch(Request::new(Method::GET, "/REST/R/X/"))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn unmatched_request_is_404_inside_global_chain() {
    let mut r = shop_registry();
    let artifacts = r.build_all(&global_options()).unwrap();

    let resp = artifacts
        .router
        .dispatch(Request::new(Method::GET, "/rest/r/missing"))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(trace(&resp), "G1,G2");

    let wrong_method = artifacts
        .router
        .dispatch(Request::new(Method::POST, "/rest/r/x"))
        .await;
    assert_eq!(wrong_method.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn endpoints_sharing_path_and_method_are_merged() {
    let mut r = shop_registry();
    r.add_endpoint::<Shop>(
        "x_again",
        EndpointParams::new(HttpMethod::Get, "/x/", HandlerFn::of(handle_x_again)),
    )
    .unwrap();
    r.use_middleware::<Shop>(
        AppliesTo::member("x_again"),
        vec![MiddlewareRef::named("e1")],
    )
    .unwrap();

    let artifacts = r.build_all(&global_options()).unwrap();
    assert_eq!(artifacts.router.routes().len(), 1);
    assert_eq!(artifacts.router.routes()[0].len(), 9);

    let resp = artifacts
        .router
        .dispatch(Request::new(Method::GET, "/rest/r/x"))
        .await;
    assert_eq!(trace(&resp), "G1,R1,E1,H,E2,E1,H2,R2,G2");
}

#[tokio::test]
async fn merged_handlers_keep_their_own_endpoint_middleware() {
    let mut r = Registry::new();
    r.add_named_middleware("auth", Timing::Before, Mark("auth"))
        .unwrap();
    r.add_router::<Shop>("/r").unwrap();
    r.add_endpoint::<Shop>(
        "validate",
        EndpointParams::new(HttpMethod::Post, "/x", HandlerFn::of(handle_x)),
    )
    .unwrap();
    r.add_endpoint::<Shop>(
        "business",
        EndpointParams::new(HttpMethod::Post, "/x", HandlerFn::of(handle_x_again)),
    )
    .unwrap();
    r.use_middleware::<Shop>(
        AppliesTo::member("business"),
        vec![MiddlewareRef::named("auth")],
    )
    .unwrap();

    let artifacts = r.build_all(&BuildOptions::new("/")).unwrap();
    let route = &artifacts.router.routes()[0];
    assert_eq!(
        route.stage_names(),
        ["Shop.validate", "auth", "Shop.business"]
    );

    let resp = artifacts
        .router
        .dispatch(Request::new(Method::POST, "/r/x"))
        .await;
    assert_eq!(trace(&resp), "H,auth,H2");
}

#[tokio::test]
async fn class_and_inline_middleware() {
    let mut r = Registry::new();
    r.add_middleware::<Audit>(Timing::After).unwrap();
    r.add_router::<Shop>("/r").unwrap();
    r.add_endpoint::<Shop>(
        "x",
        EndpointParams::new(HttpMethod::Get, "/x", HandlerFn::of(handle_x)),
    )
    .unwrap();
    r.use_middleware::<Shop>(
        AppliesTo::Class,
        vec![
            MiddlewareRef::class::<Audit>(),
            MiddlewareRef::inline(Mark("inline")),
        ],
    )
    .unwrap();

    let artifacts = r.build_all(&BuildOptions::new("/")).unwrap();
    assert!(artifacts.services.get::<Audit>(None).is_some());

    let resp = artifacts
        .router
        .dispatch(Request::new(Method::GET, "/r/x"))
        .await;
    assert_eq!(trace(&resp), "inline,H,audit");
}

#[tokio::test]
async fn path_parameters_reach_the_handler() {
    let mut r = Registry::new();
    r.add_router::<Shop>("/shop").unwrap();
    r.add_endpoint::<Shop>(
        "item",
        EndpointParams::new(HttpMethod::Get, "/items/:id", HandlerFn::of(handle_item)),
    )
    .unwrap();
    let artifacts = r.build_all(&BuildOptions::new("/api")).unwrap();

    let resp = artifacts
        .router
        .dispatch(Request::new(Method::GET, "/api/shop/items/42?full=1"))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, Some(json!({ "id": "42" })));
}

#[tokio::test]
async fn handler_error_becomes_500() {
    let mut r = Registry::new();
    r.add_router::<Shop>("/shop").unwrap();
    r.add_endpoint::<Shop>(
        "fail",
        EndpointParams::new(HttpMethod::All, "/fail", HandlerFn::of(handle_fail)),
    )
    .unwrap();
    let artifacts = r.build_all(&BuildOptions::new("/")).unwrap();

    let resp = artifacts
        .router
        .dispatch(Request::new(Method::DELETE, "/shop/fail"))
        .await;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.body, Some(json!({ "error": "boom" })));
}

#[test]
fn unknown_middleware_reference_fails_the_build() {
    let mut r = Registry::new();
    r.add_router::<Shop>("/shop").unwrap();
    r.use_middleware::<Shop>(AppliesTo::Class, vec![MiddlewareRef::named("nope")])
        .unwrap();
    let err = r.build_all(&BuildOptions::new("/")).unwrap_err();
    assert!(matches!(err, RegistryError::UnknownMiddleware { .. }));
}

#[test]
fn endpoint_without_router_fails_the_build() {
    let mut r = Registry::new();
    r.add_service::<Shop>().unwrap();
    r.add_endpoint::<Shop>(
        "x",
        EndpointParams::new(HttpMethod::Get, "/x", HandlerFn::of(handle_x)),
    )
    .unwrap();
    let err = r.build_all(&BuildOptions::new("/")).unwrap_err();
    assert!(matches!(err, RegistryError::UnknownRouter { .. }));
}

#[test]
fn duplicate_named_middleware_is_rejected() {
    let mut r = Registry::new();
    r.add_named_middleware("g1", Timing::Before, Mark("a")).unwrap();
    let err = r
        .add_named_middleware("g1", Timing::After, Mark("b"))
        .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateMiddleware { .. }));
}
