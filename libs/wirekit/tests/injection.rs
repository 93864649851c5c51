//! Field injection resolved by `build_all`.

use std::sync::Arc;

use http::{Method, StatusCode};
use serde_json::json;

use wirekit::di::{Inject, InjectMany, InjectionRequest};
use wirekit::http::{HandlerResult, Next, Request, RequestContext};
use wirekit::routing::{EndpointParams, HandlerFn, HttpMethod};
use wirekit::{BuildOptions, Registry, RegistryError, ServiceId};

struct Store {
    label: &'static str,
}

#[derive(Default)]
struct Catalog {
    primary: Inject<Store>,
    replicas: InjectMany<Store>,
}

async fn list(catalog: Arc<Catalog>, ctx: RequestContext, next: Next) -> HandlerResult {
    let primary = catalog.primary.require()?;
    let replicas = catalog.replicas.get();
    let labels: Vec<&str> = replicas.iter().map(|s| s.label).collect();
    ctx.set_body(json!({ "primary": primary.label, "replicas": labels }));
    next.run(ctx).await
}

fn register_stores(r: &mut Registry) -> Result<(), RegistryError> {
    r.add_service_instance(Store { label: "main" }, Some(ServiceId::from("main")))?;
    r.add_service_instance(Store { label: "east" }, Some(ServiceId::from("east")))?;
    r.add_service_instance(Store { label: "west" }, Some(ServiceId::from(2_i64)))
}

#[tokio::test]
async fn injected_fields_are_visible_to_handlers() {
    let mut r = Registry::new();
    register_stores(&mut r).unwrap();
    r.add_router::<Catalog>("/catalog").unwrap();
    r.add_endpoint::<Catalog>(
        "list",
        EndpointParams::new(HttpMethod::Get, "/", HandlerFn::of(list)),
    )
    .unwrap();
    r.inject(InjectionRequest::single::<Catalog, Store>("primary", |c| &c.primary).id("main"))
        .unwrap();
    r.inject(
        InjectionRequest::many::<Catalog, Store>("replicas", |c| &c.replicas)
            .ids([Some(ServiceId::from(2_i64)), Some(ServiceId::from("east"))]),
    )
    .unwrap();

    let artifacts = r.build_all(&BuildOptions::new("/rest")).unwrap();
    let catalog = artifacts.services.get::<Catalog>(None).unwrap();
    assert!(catalog.primary.is_resolved());
    assert_eq!(catalog.replicas.len(), 2);

    let resp = artifacts
        .router
        .dispatch(Request::new(Method::GET, "/rest/catalog"))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        resp.body,
        Some(json!({ "primary": "main", "replicas": ["west", "east"] }))
    );
}

#[test]
fn missing_dependency_aborts_the_build() {
    let mut r = Registry::new();
    r.add_service::<Catalog>().unwrap();
    r.inject(InjectionRequest::single::<Catalog, Store>("primary", |c| &c.primary).id("nope"))
        .unwrap();

    match r.build_all(&BuildOptions::new("/")).unwrap_err() {
        RegistryError::MissingDependency { key, id, .. } => {
            assert_eq!(key, "primary");
            assert_eq!(id, Some(ServiceId::from("nope")));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unregistered_destination_aborts_the_build() {
    let mut r = Registry::new();
    register_stores(&mut r).unwrap();
    r.inject(InjectionRequest::single::<Catalog, Store>("primary", |c| &c.primary).id("main"))
        .unwrap();
    assert!(matches!(
        r.build_all(&BuildOptions::new("/")).unwrap_err(),
        RegistryError::UnregisteredService { .. }
    ));
}
