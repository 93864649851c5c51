//! Routing compiler: merges endpoint directives per router, resolves middleware
//! associations and precomputes every route's stage chain.
//!
//! Chain order for a route is
//! `global before, router before, endpoint segments, router after, global after`,
//! where each endpoint merged into the route contributes its own segment
//! `endpoint before, handler, endpoint after` in declaration order.

use std::sync::Arc;

use super::endpoint::{AppliesTo, HandlerFn, HttpMethod, RouterParams, UseMiddlewareParams};
use super::router::{Chain, CompiledRouter, MountedRouter, NotFound, Route};
use crate::class::ClassId;
use crate::di::ServiceRegistry;
use crate::directive::{Directive, RoutingDirective};
use crate::error::RegistryError;
use crate::http::{join_paths, Middleware, MiddlewareIndex, PathPattern, Wrapping};
use crate::registry::BuildOptions;

/// Endpoints of one router sharing `(path, method)`.
struct Group<'a> {
    /// Member key of the first directive; names the route.
    canonical: &'a str,
    method: HttpMethod,
    path: String,
    handlers: Vec<(&'a str, &'a HandlerFn)>,
}

pub fn middleware_index(directives: &[Directive]) -> Result<MiddlewareIndex, RegistryError> {
    let mut index = MiddlewareIndex::default();
    for d in directives {
        if let Some(RoutingDirective::Middleware { key, entry }) = d.routing() {
            index.insert(key.clone(), entry.clone())?;
        }
    }
    Ok(index)
}

fn chain_of(parts: &[&[Arc<dyn Middleware>]]) -> Chain {
    parts.iter().flat_map(|p| p.iter().cloned()).collect::<Vec<_>>().into()
}

fn applies_to_member(u: &UseMiddlewareParams, key: &str) -> bool {
    matches!(&u.applies_to, AppliesTo::Member(k) if **k == *key)
}

pub fn compile_routers(
    directives: &[Directive],
    services: &ServiceRegistry,
    options: &BuildOptions,
) -> Result<CompiledRouter, RegistryError> {
    let index = middleware_index(directives)?;
    let global = index.split(options.global.iter())?;

    let routers: Vec<(ClassId, &RouterParams)> = directives
        .iter()
        .filter_map(|d| match d.routing() {
            Some(RoutingDirective::Router(p)) => Some((d.owner, p)),
            _ => None,
        })
        .collect();

    let associations: Vec<(ClassId, &UseMiddlewareParams)> = directives
        .iter()
        .filter_map(|d| match d.routing() {
            Some(RoutingDirective::UseMiddleware(u)) => Some((d.owner, u)),
            _ => None,
        })
        .collect();

    let mut groups: Vec<Vec<Group<'_>>> = routers.iter().map(|_| Vec::new()).collect();
    for d in directives {
        let Some(RoutingDirective::Endpoint(ep)) = d.routing() else {
            continue;
        };
        let pos = routers
            .iter()
            .position(|(class, _)| *class == d.owner)
            .ok_or_else(|| RegistryError::UnknownRouter {
                class: d.owner,
                key: d.key.to_string(),
            })?;
        if ep.handler.owner() != d.owner {
            return Err(RegistryError::HandlerOwnerMismatch {
                key: d.key.to_string(),
                expected: d.owner,
                found: ep.handler.owner(),
            });
        }

        let path = PathPattern::parse(&ep.path).to_string();
        let bucket = &mut groups[pos];
        match bucket
            .iter_mut()
            .find(|g| g.method == ep.method && g.path == path)
        {
            Some(group) => {
                tracing::debug!(
                    router = %d.owner,
                    key = %d.key,
                    into = group.canonical,
                    "Endpoint merged"
                );
                group.handlers.push((&*d.key, &ep.handler));
            }
            None => bucket.push(Group {
                canonical: &*d.key,
                method: ep.method,
                path,
                handlers: vec![(&*d.key, &ep.handler)],
            }),
        }
    }

    warn_unattached_associations(&routers, &groups, &associations);

    let mut mounted = Vec::with_capacity(routers.len());
    let mut routes = Vec::new();
    for ((class, params), router_groups) in routers.iter().zip(&groups) {
        let router_wrap = index.split(
            associations
                .iter()
                .filter(|(owner, u)| owner == class && u.applies_to == AppliesTo::Class)
                .flat_map(|(_, u)| u.middlewares.iter()),
        )?;
        let instance = services.instance_of(*class)?;
        let mount = join_paths(&[&options.rest_endpoint, &params.path]);

        for g in router_groups {
            let mut segments: Vec<Arc<dyn Middleware>> = Vec::new();
            for (key, h) in &g.handlers {
                let endpoint_wrap: Wrapping = index.split(
                    associations
                        .iter()
                        .filter(|(owner, u)| owner == class && applies_to_member(u, key))
                        .flat_map(|(_, u)| u.middlewares.iter()),
                )?;
                let bound = h
                    .bind(Arc::clone(instance))
                    .ok_or(RegistryError::ServiceTypeMismatch { class: *class })?;
                segments.extend(endpoint_wrap.before);
                segments.push(bound);
                segments.extend(endpoint_wrap.after);
            }

            let chain = chain_of(&[
                global.before.as_slice(),
                router_wrap.before.as_slice(),
                segments.as_slice(),
                router_wrap.after.as_slice(),
                global.after.as_slice(),
            ]);
            let pattern = PathPattern::parse(&join_paths(&[&mount, &g.path]));
            tracing::debug!(
                method = %g.method,
                path = %pattern,
                router = %class,
                handlers = g.handlers.len(),
                stages = chain.len(),
                "Route compiled"
            );
            routes.push(Route {
                router: *class,
                key: g.canonical.to_owned(),
                method: g.method,
                pattern,
                chain,
            });
        }

        mounted.push(MountedRouter {
            class: *class,
            path: params.path.clone(),
            mount,
        });
    }

    let not_found: Vec<Arc<dyn Middleware>> = vec![Arc::new(NotFound)];
    let fallback = chain_of(&[
        global.before.as_slice(),
        not_found.as_slice(),
        global.after.as_slice(),
    ]);

    tracing::info!(
        rest_endpoint = %options.rest_endpoint,
        routers = mounted.len(),
        routes = routes.len(),
        "Routers compiled"
    );
    Ok(CompiledRouter {
        rest_endpoint: options.rest_endpoint.clone(),
        routers: mounted,
        routes,
        fallback,
    })
}

fn warn_unattached_associations(
    routers: &[(ClassId, &RouterParams)],
    groups: &[Vec<Group<'_>>],
    associations: &[(ClassId, &UseMiddlewareParams)],
) {
    for (owner, u) in associations {
        let Some(pos) = routers.iter().position(|(class, _)| class == owner) else {
            tracing::warn!(
                class = %owner,
                "Middleware association on a class that is not a router is ignored"
            );
            continue;
        };
        let AppliesTo::Member(key) = &u.applies_to else {
            continue;
        };
        let key: &str = key;
        if !groups[pos]
            .iter()
            .any(|g| g.handlers.iter().any(|(k, _)| *k == key))
        {
            tracing::warn!(
                router = %owner,
                key,
                "Middleware association targets no endpoint"
            );
        }
    }
}
