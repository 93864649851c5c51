use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use http::Method;
use serde::Serialize;
use serde_json::{Map, Value};

use super::type_ref::TypeRef;
use super::types::{FieldDefinition, FieldParams, FieldType};
use crate::class::ClassId;
use crate::di::ServiceInstance;
use crate::http::{
    HandlerResult, Middleware, MiddlewareRef, Next, Request, RequestContext, Wrapping,
};
use crate::routing::router::Chain;

pub type ResolverResult = anyhow::Result<Value>;

/// Root operation type a resolver field is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum RootOperation {
    Query,
    Mutation,
    Subscription,
}

impl RootOperation {
    pub fn type_name(&self) -> &'static str {
        match self {
            RootOperation::Query => "Query",
            RootOperation::Mutation => "Mutation",
            RootOperation::Subscription => "Subscription",
        }
    }
}

impl fmt::Display for RootOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

type Invoke =
    Arc<dyn Fn(Value, Map<String, Value>) -> BoxFuture<'static, ResolverResult> + Send + Sync>;
type Binder = Arc<dyn Fn(ServiceInstance) -> Option<Invoke> + Send + Sync>;

/// Resolver function written against its resolver type.
#[derive(Clone)]
pub struct ResolverFn {
    owner: ClassId,
    binder: Binder,
}

impl fmt::Debug for ResolverFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverFn")
            .field("owner", &self.owner)
            .finish()
    }
}

impl ResolverFn {
    /// Root field resolver: receives the arguments only.
    pub fn of<S, F, Fut>(f: F) -> Self
    where
        S: Send + Sync + 'static,
        F: Fn(Arc<S>, Map<String, Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolverResult> + Send + 'static,
    {
        Self::field(move |s: Arc<S>, _parent: Value, args| f(s, args))
    }

    /// Field resolver: receives the parent object value and the arguments.
    pub fn field<S, F, Fut>(f: F) -> Self
    where
        S: Send + Sync + 'static,
        F: Fn(Arc<S>, Value, Map<String, Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolverResult> + Send + 'static,
    {
        let f = Arc::new(f);
        Self {
            owner: ClassId::of::<S>(),
            binder: Arc::new(move |instance: ServiceInstance| -> Option<Invoke> {
                let service = instance.downcast::<S>().ok()?;
                let f = Arc::clone(&f);
                Some(Arc::new(
                    move |parent: Value, args: Map<String, Value>| -> BoxFuture<'static, ResolverResult> {
                        Box::pin(f(Arc::clone(&service), parent, args))
                    },
                ))
            }),
        }
    }

    pub fn owner(&self) -> ClassId {
        self.owner
    }

    pub(crate) fn bind(&self, instance: ServiceInstance) -> Option<BoundResolver> {
        (self.binder)(instance).map(BoundResolver)
    }
}

/// Resolver function bound to its service instance.
#[derive(Clone)]
pub struct BoundResolver(Invoke);

impl BoundResolver {
    pub async fn call(&self, args: Map<String, Value>) -> ResolverResult {
        (self.0)(Value::Null, args).await
    }

    pub async fn resolve(&self, parent: Value, args: Map<String, Value>) -> ResolverResult {
        (self.0)(parent, args).await
    }
}

impl fmt::Debug for BoundResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BoundResolver")
    }
}

/// State key holding the parent object while a field resolver chain runs.
pub const PARENT_STATE: &str = "parent";

/// Chain stage that runs the bound resolver.
///
/// Arguments are read from the request body; the resolved value becomes the
/// response body, so after-middleware sees and may replace it.
struct ResolverStage {
    name: String,
    resolver: BoundResolver,
}

#[async_trait]
impl Middleware for ResolverStage {
    async fn invoke(&self, ctx: RequestContext, next: Next) -> HandlerResult {
        let args = match ctx.request_body() {
            Some(Value::Object(args)) => args,
            _ => Map::new(),
        };
        let parent = ctx.state(PARENT_STATE).unwrap_or(Value::Null);
        let value = self.resolver.resolve(parent, args).await?;
        ctx.set_body(value);
        next.run(ctx).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Bound resolver wrapped by its before/after middleware.
#[derive(Clone)]
pub struct ResolverChain {
    path: String,
    chain: Chain,
}

impl fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverChain")
            .field("path", &self.path)
            .field("stages", &self.stage_names())
            .finish()
    }
}

impl ResolverChain {
    /// `path` is the `Type.field` label of the resolved field.
    pub(crate) fn new(path: String, resolver: BoundResolver, wrapping: Wrapping) -> Self {
        let stage: Arc<dyn Middleware> = Arc::new(ResolverStage {
            name: path.clone(),
            resolver,
        });
        let chain: Vec<Arc<dyn Middleware>> = wrapping
            .before
            .into_iter()
            .chain(std::iter::once(stage))
            .chain(wrapping.after)
            .collect();
        Self {
            path,
            chain: chain.into(),
        }
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.chain.iter().map(|m| m.name()).collect()
    }

    pub async fn call(&self, args: Map<String, Value>) -> ResolverResult {
        self.resolve(Value::Null, args).await
    }

    /// Runs the chain; a stage that does not continue leaves whatever body it set.
    pub async fn resolve(&self, parent: Value, args: Map<String, Value>) -> ResolverResult {
        let request = Request::new(Method::POST, self.path.clone()).with_body(Value::Object(args));
        let ctx = RequestContext::new(request);
        ctx.set_state(PARENT_STATE, parent);
        Next::new(Arc::clone(&self.chain)).run(ctx.clone()).await?;
        Ok(ctx.body().unwrap_or(Value::Null))
    }
}

/// Query, mutation or subscription field contributed by a resolver class.
#[derive(Clone, Debug)]
pub struct RootFieldParams {
    pub operation: RootOperation,
    pub name: Option<String>,
    pub output: FieldParams,
    pub args: Vec<(String, FieldParams)>,
    pub description: Option<String>,
    pub resolver: ResolverFn,
    pub middlewares: Vec<MiddlewareRef>,
}

impl RootFieldParams {
    pub fn new(operation: RootOperation, output: FieldParams, resolver: ResolverFn) -> Self {
        Self {
            operation,
            name: None,
            output,
            args: Vec::new(),
            description: None,
            resolver,
            middlewares: Vec::new(),
        }
    }

    pub fn query(output: FieldParams, resolver: ResolverFn) -> Self {
        Self::new(RootOperation::Query, output, resolver)
    }

    pub fn mutation(output: FieldParams, resolver: ResolverFn) -> Self {
        Self::new(RootOperation::Mutation, output, resolver)
    }

    pub fn subscription(output: FieldParams, resolver: ResolverFn) -> Self {
        Self::new(RootOperation::Subscription, output, resolver)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn arg(mut self, name: impl Into<String>, params: FieldParams) -> Self {
        self.args.push((name.into(), params));
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_middleware(mut self, middleware: MiddlewareRef) -> Self {
        self.middlewares.push(middleware);
        self
    }
}

/// Computed field of an object type, resolved by a resolver class.
///
/// The field is added to the target type (replacing a declared field of the
/// same name) and is inherited by types extending it.
#[derive(Clone, Debug)]
pub struct FieldResolverParams {
    pub target: TypeRef,
    pub name: Option<String>,
    pub output: FieldParams,
    pub args: Vec<(String, FieldParams)>,
    pub resolver: ResolverFn,
    pub middlewares: Vec<MiddlewareRef>,
}

impl FieldResolverParams {
    pub fn new(target: TypeRef, output: FieldParams, resolver: ResolverFn) -> Self {
        Self {
            target,
            name: None,
            output,
            args: Vec::new(),
            resolver,
            middlewares: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn arg(mut self, name: impl Into<String>, params: FieldParams) -> Self {
        self.args.push((name.into(), params));
        self
    }

    pub fn with_middleware(mut self, middleware: MiddlewareRef) -> Self {
        self.middlewares.push(middleware);
        self
    }
}

/// Compiled root field with its resolver chain.
#[derive(Clone, Debug)]
pub struct RootField {
    pub name: String,
    pub owner: ClassId,
    pub ty: FieldType,
    pub args: Vec<FieldDefinition>,
    pub description: Option<String>,
    pub resolver: ResolverChain,
}

/// Compiled field resolver attached to an object type.
#[derive(Clone, Debug)]
pub struct FieldResolver {
    /// Type the resolver was declared on; differs from the lookup type when inherited.
    pub declared_on: String,
    pub field: String,
    pub owner: ClassId,
    pub resolver: ResolverChain,
}
