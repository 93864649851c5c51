use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::class::ClassId;
use crate::di::ServiceInstance;
use crate::http::{HandlerResult, Middleware, MiddlewareRef, Next, RequestContext};

/// HTTP verb of an endpoint; `All` matches every method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    All,
}

impl HttpMethod {
    pub fn matches(&self, method: &http::Method) -> bool {
        match self {
            HttpMethod::All => true,
            HttpMethod::Get => *method == http::Method::GET,
            HttpMethod::Post => *method == http::Method::POST,
            HttpMethod::Put => *method == http::Method::PUT,
            HttpMethod::Patch => *method == http::Method::PATCH,
            HttpMethod::Delete => *method == http::Method::DELETE,
            HttpMethod::Head => *method == http::Method::HEAD,
            HttpMethod::Options => *method == http::Method::OPTIONS,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::All => "ALL",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Binder = Arc<dyn Fn(ServiceInstance, String) -> Option<Arc<dyn Middleware>> + Send + Sync>;
type BoxedHandler<S> =
    Arc<dyn Fn(Arc<S>, RequestContext, Next) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Endpoint handler written against its router type.
///
/// The function receives the router's singleton instance; binding happens
/// when the routing compiler runs, so injected fields are already resolved.
#[derive(Clone)]
pub struct HandlerFn {
    owner: ClassId,
    name: Option<Cow<'static, str>>,
    binder: Binder,
}

impl fmt::Debug for HandlerFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFn")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .finish()
    }
}

struct BoundHandler<S> {
    name: String,
    service: Arc<S>,
    f: BoxedHandler<S>,
}

#[async_trait]
impl<S: Send + Sync + 'static> Middleware for BoundHandler<S> {
    async fn invoke(&self, ctx: RequestContext, next: Next) -> HandlerResult {
        (self.f)(Arc::clone(&self.service), ctx, next).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl HandlerFn {
    pub fn of<S, F, Fut>(f: F) -> Self
    where
        S: Send + Sync + 'static,
        F: Fn(Arc<S>, RequestContext, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let owner = ClassId::of::<S>();
        let f: BoxedHandler<S> = Arc::new(
            move |svc: Arc<S>, ctx: RequestContext, next: Next| -> BoxFuture<'static, HandlerResult> {
                Box::pin(f(svc, ctx, next))
            },
        );
        Self {
            owner,
            name: None,
            binder: Arc::new(move |instance: ServiceInstance, name: String| {
                let service = instance.downcast::<S>().ok()?;
                Some(Arc::new(BoundHandler {
                    name,
                    service,
                    f: Arc::clone(&f),
                }) as Arc<dyn Middleware>)
            }),
        }
    }

    pub fn owner(&self) -> ClassId {
        self.owner
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn with_default_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        if self.name.is_none() {
            self.name = Some(name.into());
        }
        self
    }

    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Binds the handler to its owner's instance; `None` if the instance has another type.
    pub(crate) fn bind(&self, instance: ServiceInstance) -> Option<Arc<dyn Middleware>> {
        let name = match &self.name {
            Some(name) => name.to_string(),
            None => self.owner.to_string(),
        };
        (self.binder)(instance, name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouterParams {
    /// Normalised mount path.
    pub path: String,
    /// Path as written at registration.
    pub raw_path: String,
}

#[derive(Clone, Debug)]
pub struct EndpointParams {
    pub method: HttpMethod,
    pub path: Cow<'static, str>,
    pub handler: HandlerFn,
}

impl EndpointParams {
    pub fn new(method: HttpMethod, path: impl Into<Cow<'static, str>>, handler: HandlerFn) -> Self {
        Self {
            method,
            path: path.into(),
            handler,
        }
    }
}

/// Target of a use-middleware association.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AppliesTo {
    /// The whole router.
    Class,
    /// One endpoint, identified by its member key.
    Member(Cow<'static, str>),
}

impl AppliesTo {
    pub fn member(key: impl Into<Cow<'static, str>>) -> Self {
        AppliesTo::Member(key.into())
    }
}

#[derive(Clone, Debug)]
pub struct UseMiddlewareParams {
    pub applies_to: AppliesTo,
    pub middlewares: Vec<MiddlewareRef>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Request;
    use serde_json::json;

    #[derive(Default)]
    struct Greeter {
        greeting: &'static str,
    }

    #[test]
    fn all_matches_every_method() {
        assert!(HttpMethod::All.matches(&http::Method::DELETE));
        assert!(HttpMethod::Get.matches(&http::Method::GET));
        assert!(!HttpMethod::Get.matches(&http::Method::POST));
    }

    #[tokio::test]
    async fn handler_is_bound_to_instance() {
        let h = HandlerFn::of::<Greeter, _, _>(|g, ctx, next| async move {
            ctx.set_body(json!(g.greeting));
            next.run(ctx).await
        })
        .named("Greeter.hello");
        assert_eq!(h.owner(), ClassId::of::<Greeter>());

        let instance: ServiceInstance = Arc::new(Greeter { greeting: "hi" });
        let bound = h.bind(instance).unwrap();
        assert_eq!(bound.name(), "Greeter.hello");

        let ctx = RequestContext::new(Request::new(http::Method::GET, "/"));
        bound
            .invoke(ctx.clone(), Next::new(Arc::from(Vec::new())))
            .await
            .unwrap();
        assert_eq!(ctx.body(), Some(json!("hi")));
    }

    #[test]
    fn binding_to_wrong_instance_fails() {
        let h = HandlerFn::of::<Greeter, _, _>(|_g, ctx, next| next.run(ctx));
        let instance: ServiceInstance = Arc::new(5_u8);
        assert!(h.bind(instance).is_none());
    }
}
