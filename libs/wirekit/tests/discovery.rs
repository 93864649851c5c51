//! Link-time discovery of registrators and the host lifecycle.

use std::sync::Arc;

use http::{Method, StatusCode};
use serde_json::json;

use wirekit::http::{HandlerResult, Next, Request, RequestContext};
use wirekit::routing::{EndpointParams, HandlerFn, HttpMethod};
use wirekit::{BuildOptions, Host, Registry, RegistryError};

#[derive(Default)]
struct Health;

async fn ping(_: Arc<Health>, ctx: RequestContext, next: Next) -> HandlerResult {
    ctx.set_body(json!("pong"));
    next.run(ctx).await
}

fn health_directives(r: &mut Registry) -> Result<(), RegistryError> {
    r.add_router::<Health>("/health")?;
    r.add_endpoint::<Health>(
        "ping",
        EndpointParams::new(HttpMethod::Get, "/ping", HandlerFn::of(ping)),
    )
}

wirekit::directives!(health_directives);

#[tokio::test]
async fn host_discovers_builds_and_serves() {
    let mut host = Host::new(BuildOptions::new("/rest"));
    host.discover().unwrap();
    let artifacts = host.start().unwrap();

    assert_eq!(artifacts.router.routers().len(), 1);
    assert_eq!(artifacts.router.routers()[0].mount, "/rest/health");
    assert!(host.get_service::<Health>(None).is_some());

    let resp = artifacts
        .router
        .dispatch(Request::new(Method::GET, "/rest/health/ping"))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, Some(json!("pong")));

    host.stop();
    assert!(host.artifacts().is_none());

    // A second discovery round after stop rebuilds the same tree.
    host.discover().unwrap();
    let again = host.start().unwrap();
    assert_eq!(again.router.routes().len(), 1);
}

#[test]
fn discovering_twice_without_reset_collides() {
    let mut r = Registry::new();
    r.discover().unwrap();
    assert!(matches!(
        r.discover(),
        Err(RegistryError::DuplicateRouterPath { .. })
    ));
}
