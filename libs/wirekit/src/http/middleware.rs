//! Middleware contract and the index that resolves middleware references.
//!
//! Handlers and middleware share one shape: a stage receives the request
//! context and the remainder of the chain, and continues it by awaiting
//! [`Next::run`]. Not calling `next` short-circuits every later stage.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use super::context::RequestContext;
use crate::class::ClassId;
use crate::error::RegistryError;

pub type HandlerResult = anyhow::Result<()>;

#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    async fn invoke(&self, ctx: RequestContext, next: Next) -> HandlerResult;

    /// Label used in logs and route introspection.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Remainder of a compiled chain, starting at `position`.
#[derive(Clone)]
pub struct Next {
    chain: Arc<[Arc<dyn Middleware>]>,
    position: usize,
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("len", &self.chain.len())
            .field("position", &self.position)
            .finish()
    }
}

impl Next {
    pub fn new(chain: Arc<[Arc<dyn Middleware>]>) -> Self {
        Self { chain, position: 0 }
    }

    /// Runs the next stage; past the end of the chain this is a no-op.
    pub async fn run(self, ctx: RequestContext) -> HandlerResult {
        let Some(stage) = self.chain.get(self.position).cloned() else {
            return Ok(());
        };
        let next = Next {
            chain: self.chain,
            position: self.position + 1,
        };
        stage.invoke(ctx, next).await
    }

    pub fn remaining(&self) -> usize {
        self.chain.len().saturating_sub(self.position)
    }
}

type BoxedStage =
    Arc<dyn Fn(RequestContext, Next) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Middleware built from a closure.
#[derive(Clone)]
pub struct FnMiddleware {
    name: Cow<'static, str>,
    f: BoxedStage,
}

impl fmt::Debug for FnMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMiddleware")
            .field("name", &self.name)
            .finish()
    }
}

impl FnMiddleware {
    pub fn new<F, Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(RequestContext, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self {
            name: name.into(),
            f: Arc::new(
                move |ctx: RequestContext, next: Next| -> BoxFuture<'static, HandlerResult> {
                    Box::pin(f(ctx, next))
                },
            ),
        }
    }
}

#[async_trait]
impl Middleware for FnMiddleware {
    async fn invoke(&self, ctx: RequestContext, next: Next) -> HandlerResult {
        (self.f)(ctx, next).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Timing {
    #[default]
    Before,
    After,
}

/// Identity of a registered middleware.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MiddlewareKey {
    Class(ClassId),
    Named(Cow<'static, str>),
}

impl fmt::Display for MiddlewareKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiddlewareKey::Class(c) => write!(f, "{c}"),
            MiddlewareKey::Named(n) => f.write_str(n),
        }
    }
}

/// Reference to a middleware inside a use-middleware association or the global list.
#[derive(Clone)]
pub enum MiddlewareRef {
    Class(ClassId),
    Named(Cow<'static, str>),
    /// Callable that was never registered; placed by its own timing.
    Inline {
        timing: Timing,
        middleware: Arc<dyn Middleware>,
    },
}

impl fmt::Debug for MiddlewareRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiddlewareRef::Class(c) => f.debug_tuple("Class").field(c).finish(),
            MiddlewareRef::Named(n) => f.debug_tuple("Named").field(n).finish(),
            MiddlewareRef::Inline { timing, middleware } => f
                .debug_struct("Inline")
                .field("timing", timing)
                .field("name", &middleware.name())
                .finish(),
        }
    }
}

impl MiddlewareRef {
    pub fn class<M: Middleware>() -> Self {
        MiddlewareRef::Class(ClassId::of::<M>())
    }

    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        MiddlewareRef::Named(name.into())
    }

    /// Unregistered callables run before the wrapped stages.
    pub fn inline(middleware: impl Middleware) -> Self {
        MiddlewareRef::Inline {
            timing: Timing::Before,
            middleware: Arc::new(middleware),
        }
    }

    pub fn inline_after(middleware: impl Middleware) -> Self {
        MiddlewareRef::Inline {
            timing: Timing::After,
            middleware: Arc::new(middleware),
        }
    }
}

#[derive(Clone)]
pub struct MiddlewareEntry {
    pub timing: Timing,
    pub class_based: bool,
    pub invocable: Arc<dyn Middleware>,
}

impl fmt::Debug for MiddlewareEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareEntry")
            .field("timing", &self.timing)
            .field("class_based", &self.class_based)
            .field("name", &self.invocable.name())
            .finish()
    }
}

/// Before/after stage lists resolved from a list of references.
#[derive(Default, Clone)]
pub struct Wrapping {
    pub before: Vec<Arc<dyn Middleware>>,
    pub after: Vec<Arc<dyn Middleware>>,
}

impl Wrapping {
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }
}

/// Lookup table from middleware identity to its timing and invocable.
#[derive(Default, Clone, Debug)]
pub struct MiddlewareIndex {
    entries: HashMap<MiddlewareKey, MiddlewareEntry>,
}

impl MiddlewareIndex {
    pub fn insert(
        &mut self,
        key: MiddlewareKey,
        entry: MiddlewareEntry,
    ) -> Result<(), RegistryError> {
        if self.entries.contains_key(&key) {
            return Err(RegistryError::DuplicateMiddleware {
                name: key.to_string(),
            });
        }
        self.entries.insert(key, entry);
        Ok(())
    }

    pub fn get(&self, key: &MiddlewareKey) -> Option<&MiddlewareEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolve(
        &self,
        r: &MiddlewareRef,
    ) -> Result<(Timing, Arc<dyn Middleware>), RegistryError> {
        let key = match r {
            MiddlewareRef::Inline { timing, middleware } => {
                return Ok((*timing, Arc::clone(middleware)));
            }
            MiddlewareRef::Class(c) => MiddlewareKey::Class(*c),
            MiddlewareRef::Named(n) => MiddlewareKey::Named(n.clone()),
        };
        self.entries
            .get(&key)
            .map(|e| (e.timing, Arc::clone(&e.invocable)))
            .ok_or_else(|| RegistryError::UnknownMiddleware {
                reference: key.to_string(),
            })
    }

    /// Splits references into before/after lists, keeping reference order in each.
    pub fn split<'a, I>(&self, refs: I) -> Result<Wrapping, RegistryError>
    where
        I: IntoIterator<Item = &'a MiddlewareRef>,
    {
        let mut out = Wrapping::default();
        for r in refs {
            let (timing, mw) = self.resolve(r)?;
            match timing {
                Timing::Before => out.before.push(mw),
                Timing::After => out.after.push(mw),
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::context::Request;
    use serde_json::json;

    fn tracer(label: &'static str) -> FnMiddleware {
        FnMiddleware::new(label, move |ctx: RequestContext, next: Next| async move {
            ctx.push_state("trace", json!(label));
            next.run(ctx).await
        })
    }

    fn stop(label: &'static str) -> FnMiddleware {
        FnMiddleware::new(label, move |ctx: RequestContext, _next: Next| async move {
            ctx.push_state("trace", json!(label));
            Ok(())
        })
    }

    #[tokio::test]
    async fn chain_runs_in_order_and_can_short_circuit() {
        let chain: Arc<[Arc<dyn Middleware>]> = Arc::from(vec![
            Arc::new(tracer("a")) as Arc<dyn Middleware>,
            Arc::new(stop("b")),
            Arc::new(tracer("c")),
        ]);
        let ctx = RequestContext::new(Request::new(http::Method::GET, "/"));
        Next::new(chain).run(ctx.clone()).await.unwrap();
        assert_eq!(ctx.state("trace"), Some(json!(["a", "b"])));
    }

    #[test]
    fn split_orders_by_timing() {
        let mut index = MiddlewareIndex::default();
        index
            .insert(
                MiddlewareKey::Named("auth".into()),
                MiddlewareEntry {
                    timing: Timing::Before,
                    class_based: false,
                    invocable: Arc::new(tracer("auth")),
                },
            )
            .unwrap();
        index
            .insert(
                MiddlewareKey::Named("audit".into()),
                MiddlewareEntry {
                    timing: Timing::After,
                    class_based: false,
                    invocable: Arc::new(tracer("audit")),
                },
            )
            .unwrap();

        let refs = [
            MiddlewareRef::named("audit"),
            MiddlewareRef::inline(tracer("inline")),
            MiddlewareRef::named("auth"),
        ];
        let w = index.split(refs.iter()).unwrap();
        let before: Vec<&str> = w.before.iter().map(|m| m.name()).collect();
        let after: Vec<&str> = w.after.iter().map(|m| m.name()).collect();
        assert_eq!(before, vec!["inline", "auth"]);
        assert_eq!(after, vec!["audit"]);
    }

    #[test]
    fn unknown_and_duplicate_middleware() {
        let mut index = MiddlewareIndex::default();
        let entry = MiddlewareEntry {
            timing: Timing::Before,
            class_based: false,
            invocable: Arc::new(tracer("x")),
        };
        index
            .insert(MiddlewareKey::Named("x".into()), entry.clone())
            .unwrap();
        assert!(matches!(
            index.insert(MiddlewareKey::Named("x".into()), entry),
            Err(RegistryError::DuplicateMiddleware { .. })
        ));
        assert!(matches!(
            index.resolve(&MiddlewareRef::named("missing")),
            Err(RegistryError::UnknownMiddleware { .. })
        ));
    }
}
