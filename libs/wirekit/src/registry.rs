//! Metadata registry: accumulates directives and services, then compiles them.
//!
//! Registration is a sequence of single-step appends on `&mut Registry`.
//! `build_all` closes the registry and runs the passes in order
//! injections, types, routers, websockets; `reset` returns it to an empty,
//! open state.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use crate::class::{ClassId, ServiceId};
use crate::di::{resolve_injections, InjectionRequest, Service, ServiceInstance, ServiceRegistry};
use crate::directive::{Directive, MessagingDirective, Payload, RoutingDirective, TypeDirective};
use crate::error::RegistryError;
use crate::http::{normalize_path, Middleware, MiddlewareEntry, MiddlewareKey, MiddlewareRef, Timing};
use crate::routing::{
    compile_routers, AppliesTo, CompiledRouter, EndpointParams, RouterParams, UseMiddlewareParams,
};
use crate::schema::{
    compile_schema, CompiledSchema, CreatedDef, CreatedType, CreatedTypeId, EnumValueParams,
    FieldParams, FieldResolverParams, RootFieldParams, TypeCreator, TypeKind, TypeParams, TypeRef,
};
use crate::websocket::{compile_websockets, CompiledWebsockets, EventFn, EventParams, WebsocketParams};

/// The function type submitted by `directives!` via `inventory::submit!`.
pub struct Registrator(pub fn(&mut Registry) -> Result<(), RegistryError>);

inventory::collect!(Registrator);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Populating,
    Closed,
}

/// Options for one build.
#[derive(Clone, Debug)]
pub struct BuildOptions {
    /// Prefix every router is mounted under.
    pub rest_endpoint: String,
    /// Middleware wrapped around every route and the unmatched-request chain.
    pub global: Vec<MiddlewareRef>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::from_config(&wirekit_bootstrap::RestConfig::default())
    }
}

impl BuildOptions {
    pub fn new(rest_endpoint: &str) -> Self {
        Self {
            rest_endpoint: normalize_path(rest_endpoint),
            global: Vec::new(),
        }
    }

    pub fn from_config(cfg: &wirekit_bootstrap::RestConfig) -> Self {
        Self::new(&cfg.rest_endpoint)
    }

    pub fn with_global(mut self, middleware: MiddlewareRef) -> Self {
        self.global.push(middleware);
        self
    }
}

/// Output of one successful build.
#[derive(Clone, Debug)]
pub struct Artifacts {
    pub router: CompiledRouter,
    pub schema: CompiledSchema,
    pub websockets: CompiledWebsockets,
    pub services: ServiceRegistry,
}

/// Marker owner for directives produced by `TypeCreator`.
struct CreatedTypes;

#[derive(Default)]
pub struct Registry {
    directives: Vec<Directive>,
    services: ServiceRegistry,
    injections: Vec<InjectionRequest>,
    /// Normalised router path -> (path as registered, router class).
    router_paths: HashMap<String, (String, ClassId)>,
    next_created: u32,
    phase: Phase,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("phase", &self.phase)
            .field("directives", &self.directives.len())
            .field("services", &self.services)
            .field("injections", &self.injections.len())
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    pub fn injections(&self) -> &[InjectionRequest] {
        &self.injections
    }

    pub fn get_service<T: Send + Sync + 'static>(&self, id: Option<&ServiceId>) -> Option<Arc<T>> {
        self.services.get::<T>(id)
    }

    fn ensure_open(&self) -> Result<(), RegistryError> {
        match self.phase {
            Phase::Populating => Ok(()),
            Phase::Closed => Err(RegistryError::Closed),
        }
    }

    fn push(&mut self, owner: ClassId, key: impl Into<Cow<'static, str>>, payload: Payload) {
        self.directives.push(Directive::new(owner, key, payload));
    }

    // ================= services =================

    pub fn add_service<T: Default + Send + Sync + 'static>(&mut self) -> Result<(), RegistryError> {
        self.add_service_instance(T::default(), None)
    }

    pub fn add_service_with_id<T: Default + Send + Sync + 'static>(
        &mut self,
        id: impl Into<ServiceId>,
    ) -> Result<(), RegistryError> {
        self.add_service_instance(T::default(), Some(id.into()))
    }

    pub fn add_service_instance<T: Send + Sync + 'static>(
        &mut self,
        instance: T,
        id: Option<ServiceId>,
    ) -> Result<(), RegistryError> {
        self.register_arc(Arc::new(instance), id).map(|_| ())
    }

    fn register_arc<T: Send + Sync + 'static>(
        &mut self,
        instance: Arc<T>,
        id: Option<ServiceId>,
    ) -> Result<Arc<T>, RegistryError> {
        self.ensure_open()?;
        self.services.register(Service {
            class: ClassId::of::<T>(),
            id,
            instance: Arc::clone(&instance) as ServiceInstance,
        })?;
        Ok(instance)
    }

    pub fn inject(&mut self, request: InjectionRequest) -> Result<(), RegistryError> {
        self.ensure_open()?;
        self.injections.push(request);
        Ok(())
    }

    // ================= routing =================

    /// Registers `R` as a router mounted at `path`; fails immediately when
    /// another router already claims the same normalised path.
    pub fn add_router<R: Default + Send + Sync + 'static>(
        &mut self,
        path: &str,
    ) -> Result<(), RegistryError> {
        self.ensure_open()?;
        let class = ClassId::of::<R>();
        let normalized = normalize_path(path);
        if let Some((existing_path, existing_class)) = self.router_paths.get(&normalized) {
            return Err(RegistryError::DuplicateRouterPath {
                path: path.to_owned(),
                class,
                existing_path: existing_path.clone(),
                existing_class: *existing_class,
            });
        }
        self.add_service::<R>()?;
        self.router_paths
            .insert(normalized.clone(), (path.to_owned(), class));
        tracing::debug!(router = %class, path = %normalized, "Router registered");
        self.push(
            class,
            "",
            Payload::Routing(RoutingDirective::Router(RouterParams {
                path: normalized,
                raw_path: path.to_owned(),
            })),
        );
        Ok(())
    }

    pub fn add_endpoint<R: 'static>(
        &mut self,
        key: &'static str,
        params: EndpointParams,
    ) -> Result<(), RegistryError> {
        self.ensure_open()?;
        let owner = ClassId::of::<R>();
        if params.handler.owner() != owner {
            return Err(RegistryError::HandlerOwnerMismatch {
                key: key.to_owned(),
                expected: owner,
                found: params.handler.owner(),
            });
        }
        let params = EndpointParams {
            handler: params.handler.with_default_name(format!("{owner}.{key}")),
            ..params
        };
        self.push(owner, key, Payload::Routing(RoutingDirective::Endpoint(params)));
        Ok(())
    }

    /// Class-based middleware: `M` becomes a service and is invoked through that instance.
    pub fn add_middleware<M: Middleware + Default>(
        &mut self,
        timing: Timing,
    ) -> Result<(), RegistryError> {
        let instance = self.register_arc(Arc::new(M::default()), None)?;
        let class = ClassId::of::<M>();
        self.push(
            class,
            "",
            Payload::Routing(RoutingDirective::Middleware {
                key: MiddlewareKey::Class(class),
                entry: MiddlewareEntry {
                    timing,
                    class_based: true,
                    invocable: instance,
                },
            }),
        );
        Ok(())
    }

    /// Middleware referenced by name; not registered as a service.
    pub fn add_named_middleware(
        &mut self,
        name: &'static str,
        timing: Timing,
        middleware: impl Middleware,
    ) -> Result<(), RegistryError> {
        self.ensure_open()?;
        let key = MiddlewareKey::Named(Cow::Borrowed(name));
        let taken = self.directives.iter().any(|d| {
            matches!(d.routing(), Some(RoutingDirective::Middleware { key: k, .. }) if *k == key)
        });
        if taken {
            return Err(RegistryError::DuplicateMiddleware {
                name: name.to_owned(),
            });
        }
        self.push(
            ClassId::of::<MiddlewareKey>(),
            name,
            Payload::Routing(RoutingDirective::Middleware {
                key,
                entry: MiddlewareEntry {
                    timing,
                    class_based: false,
                    invocable: Arc::new(middleware),
                },
            }),
        );
        Ok(())
    }

    pub fn use_middleware<R: 'static>(
        &mut self,
        applies_to: AppliesTo,
        middlewares: Vec<MiddlewareRef>,
    ) -> Result<(), RegistryError> {
        self.ensure_open()?;
        let key = match &applies_to {
            AppliesTo::Class => Cow::Borrowed(""),
            AppliesTo::Member(k) => k.clone(),
        };
        self.push(
            ClassId::of::<R>(),
            key,
            Payload::Routing(RoutingDirective::UseMiddleware(UseMiddlewareParams {
                applies_to,
                middlewares,
            })),
        );
        Ok(())
    }

    // ================= messaging =================

    pub fn add_websocket<W: Default + Send + Sync + 'static>(
        &mut self,
        namespace: &str,
    ) -> Result<(), RegistryError> {
        self.add_service::<W>()?;
        self.push(
            ClassId::of::<W>(),
            "",
            Payload::Messaging(MessagingDirective::Websocket(WebsocketParams {
                namespace: normalize_path(namespace),
                raw_namespace: namespace.to_owned(),
            })),
        );
        Ok(())
    }

    pub fn add_event<W: 'static>(
        &mut self,
        key: &'static str,
        event: impl Into<Cow<'static, str>>,
        handler: EventFn,
    ) -> Result<(), RegistryError> {
        self.ensure_open()?;
        let owner = ClassId::of::<W>();
        if handler.owner() != owner {
            return Err(RegistryError::HandlerOwnerMismatch {
                key: key.to_owned(),
                expected: owner,
                found: handler.owner(),
            });
        }
        self.push(
            owner,
            key,
            Payload::Messaging(MessagingDirective::On(EventParams {
                event: event.into(),
                handler,
            })),
        );
        Ok(())
    }

    // ================= types =================

    pub fn add_type<T: 'static>(&mut self, params: TypeParams) -> Result<(), RegistryError> {
        self.ensure_open()?;
        self.push(ClassId::of::<T>(), "", Payload::Type(TypeDirective::Type(params)));
        Ok(())
    }

    pub fn add_field<T: 'static>(
        &mut self,
        key: &'static str,
        params: FieldParams,
    ) -> Result<(), RegistryError> {
        self.ensure_open()?;
        self.push(ClassId::of::<T>(), key, Payload::Type(TypeDirective::Field(params)));
        Ok(())
    }

    pub fn add_enum_value<T: 'static>(
        &mut self,
        key: &'static str,
        params: EnumValueParams,
    ) -> Result<(), RegistryError> {
        self.ensure_open()?;
        self.push(
            ClassId::of::<T>(),
            key,
            Payload::Type(TypeDirective::EnumValue(params)),
        );
        Ok(())
    }

    /// Registers `S` as a resolver service contributing root and field resolvers.
    pub fn add_resolver<S: Default + Send + Sync + 'static>(&mut self) -> Result<(), RegistryError> {
        self.add_service::<S>()?;
        self.push(ClassId::of::<S>(), "", Payload::Type(TypeDirective::Resolver));
        Ok(())
    }

    pub fn add_root_field<S: 'static>(
        &mut self,
        key: &'static str,
        params: RootFieldParams,
    ) -> Result<(), RegistryError> {
        self.ensure_open()?;
        let owner = ClassId::of::<S>();
        if params.resolver.owner() != owner {
            return Err(RegistryError::HandlerOwnerMismatch {
                key: key.to_owned(),
                expected: owner,
                found: params.resolver.owner(),
            });
        }
        self.push(owner, key, Payload::Type(TypeDirective::RootField(params)));
        Ok(())
    }

    /// Adds a computed field to the object type `params.target`, resolved by `S`.
    pub fn add_field_resolver<S: 'static>(
        &mut self,
        key: &'static str,
        params: FieldResolverParams,
    ) -> Result<(), RegistryError> {
        self.ensure_open()?;
        let owner = ClassId::of::<S>();
        if params.resolver.owner() != owner {
            return Err(RegistryError::HandlerOwnerMismatch {
                key: key.to_owned(),
                expected: owner,
                found: params.resolver.owner(),
            });
        }
        self.push(owner, key, Payload::Type(TypeDirective::FieldResolver(params)));
        Ok(())
    }

    pub fn type_creator(&mut self) -> TypeCreator<'_> {
        TypeCreator::new(self)
    }

    pub(crate) fn add_created(
        &mut self,
        name: Option<String>,
        kind: Option<TypeKind>,
        description: Option<String>,
        def: CreatedDef,
    ) -> Result<TypeRef, RegistryError> {
        self.ensure_open()?;
        let id = CreatedTypeId(self.next_created);
        self.next_created += 1;
        self.push(
            ClassId::of::<CreatedTypes>(),
            id.to_string(),
            Payload::Type(TypeDirective::Created(CreatedType {
                id,
                name,
                kind,
                description,
                def,
            })),
        );
        Ok(TypeRef::created(id))
    }

    // ================= lifecycle =================

    /// Runs every registrator linked into the binary against this registry.
    pub fn discover(&mut self) -> Result<(), RegistryError> {
        let mut count = 0usize;
        for r in ::inventory::iter::<Registrator> {
            (r.0)(self)?;
            count += 1;
        }
        tracing::info!(
            registrators = count,
            directives = self.directives.len(),
            services = self.services.len(),
            "Directives discovered"
        );
        Ok(())
    }

    /// Closes the registry and compiles every directive.
    ///
    /// Any error aborts the build; nothing partial is returned. A closed
    /// registry must be `reset` before it accepts new directives.
    pub fn build_all(&mut self, options: &BuildOptions) -> Result<Artifacts, RegistryError> {
        self.phase = Phase::Closed;
        tracing::info!(
            directives = self.directives.len(),
            services = self.services.len(),
            rest_endpoint = %options.rest_endpoint,
            "Build started"
        );

        resolve_injections(&self.services, &self.injections)?;
        let schema = compile_schema(&self.directives, &self.services)?;
        let router = compile_routers(&self.directives, &self.services, options)?;
        let websockets = compile_websockets(&self.directives, &self.services)?;

        tracing::info!(
            routes = router.routes().len(),
            types = schema.types().len(),
            namespaces = websockets.namespaces().len(),
            "Build finished"
        );
        Ok(Artifacts {
            router,
            schema,
            websockets,
            services: self.services.clone(),
        })
    }

    /// Drops every directive and service and reopens the registry.
    pub fn reset(&mut self) {
        self.directives.clear();
        self.services.clear();
        self.injections.clear();
        self.router_paths.clear();
        self.next_created = 0;
        self.phase = Phase::Populating;
        tracing::debug!("Registry reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HandlerResult, Next, RequestContext};
    use crate::routing::{HandlerFn, HttpMethod};
    use crate::schema::CreateParams;

    #[derive(Default)]
    struct Cms;
    #[derive(Default)]
    struct Blog;

    async fn noop(_: Arc<Blog>, ctx: RequestContext, next: Next) -> HandlerResult {
        next.run(ctx).await
    }

    #[test]
    fn router_paths_collide_after_normalisation() {
        let mut r = Registry::new();
        r.add_router::<Cms>("/cms").unwrap();
        let err = r.add_router::<Blog>("/CMS/").unwrap_err();
        match err {
            RegistryError::DuplicateRouterPath {
                path,
                existing_path,
                ..
            } => {
                assert_eq!(path, "/CMS/");
                assert_eq!(existing_path, "/cms");
            }
            other => panic!("unexpected error: {other}"),
        }
        // The rejected router was not registered as a service.
        assert!(r.get_service::<Blog>(None).is_none());
    }

    #[test]
    fn endpoint_handler_must_belong_to_router() {
        let mut r = Registry::new();
        r.add_router::<Cms>("/cms").unwrap();
        let err = r
            .add_endpoint::<Cms>(
                "list",
                EndpointParams::new(HttpMethod::Get, "/", HandlerFn::of(noop)),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::HandlerOwnerMismatch { .. }));
    }

    #[test]
    fn closed_registry_rejects_registration_until_reset() {
        let mut r = Registry::new();
        r.add_router::<Cms>("/cms").unwrap();
        r.build_all(&BuildOptions::new("/")).unwrap();
        assert_eq!(r.phase(), Phase::Closed);

        assert!(matches!(
            r.add_router::<Blog>("/blog"),
            Err(RegistryError::Closed)
        ));
        assert!(matches!(
            r.add_type::<Blog>(TypeParams::object()),
            Err(RegistryError::Closed)
        ));

        r.reset();
        assert_eq!(r.phase(), Phase::Populating);
        assert!(r.directives().is_empty());
        assert!(r.services().is_empty());
        r.add_router::<Cms>("/cms").unwrap();
    }

    #[test]
    fn created_types_get_sequential_ids() {
        let mut r = Registry::new();
        let mut creator = r.type_creator();
        creator
            .create_enum(
                [("a", serde_json::json!(1)), ("b", serde_json::json!(2))],
                CreateParams::default(),
            )
            .unwrap();
        creator
            .create_enum([("c", serde_json::json!(3))], CreateParams::default())
            .unwrap();
        let keys: Vec<&str> = r.directives().iter().map(|d| &*d.key).collect();
        assert_eq!(keys, ["created#0", "created#1"]);
    }

    #[test]
    fn build_options_normalise_endpoint() {
        assert_eq!(BuildOptions::new("/API/").rest_endpoint, "/api");
        assert_eq!(BuildOptions::default().rest_endpoint, "/rest");

        let declared = wirekit_bootstrap::RestConfig {
            rest_endpoint: " API//v1/ ".to_owned(),
        };
        assert_eq!(BuildOptions::from_config(&declared).rest_endpoint, "/api/v1");
    }
}
