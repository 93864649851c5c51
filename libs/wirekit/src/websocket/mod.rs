//! Websocket namespaces: event handlers bound to their socket service.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::class::ClassId;
use crate::di::{ServiceInstance, ServiceRegistry};
use crate::directive::{Directive, MessagingDirective, Payload};
use crate::error::RegistryError;

/// Message delivered to an event handler.
#[derive(Clone, Debug, PartialEq)]
pub struct SocketMessage {
    pub namespace: String,
    pub event: String,
    pub payload: Value,
}

/// Optional acknowledgement returned to the sender.
pub type EventResult = anyhow::Result<Option<Value>>;

type Invoke = Arc<dyn Fn(SocketMessage) -> BoxFuture<'static, EventResult> + Send + Sync>;
type Binder = Arc<dyn Fn(ServiceInstance) -> Option<Invoke> + Send + Sync>;

/// Event handler written against its websocket type.
#[derive(Clone)]
pub struct EventFn {
    owner: ClassId,
    binder: Binder,
}

impl fmt::Debug for EventFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventFn")
            .field("owner", &self.owner)
            .finish()
    }
}

impl EventFn {
    pub fn of<S, F, Fut>(f: F) -> Self
    where
        S: Send + Sync + 'static,
        F: Fn(Arc<S>, SocketMessage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = EventResult> + Send + 'static,
    {
        let f = Arc::new(f);
        Self {
            owner: ClassId::of::<S>(),
            binder: Arc::new(move |instance: ServiceInstance| -> Option<Invoke> {
                let service = instance.downcast::<S>().ok()?;
                let f = Arc::clone(&f);
                Some(Arc::new(
                    move |msg: SocketMessage| -> BoxFuture<'static, EventResult> {
                        Box::pin(f(Arc::clone(&service), msg))
                    },
                ))
            }),
        }
    }

    pub fn owner(&self) -> ClassId {
        self.owner
    }

    fn bind(&self, instance: ServiceInstance) -> Option<Invoke> {
        (self.binder)(instance)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebsocketParams {
    pub namespace: String,
    pub raw_namespace: String,
}

#[derive(Clone, Debug)]
pub struct EventParams {
    pub event: Cow<'static, str>,
    pub handler: EventFn,
}

/// Handler bound to the socket service instance that declared it.
#[derive(Clone)]
pub struct BoundEvent {
    pub event: String,
    pub owner: ClassId,
    pub key: String,
    invoke: Invoke,
}

impl fmt::Debug for BoundEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundEvent")
            .field("event", &self.event)
            .field("owner", &self.owner)
            .field("key", &self.key)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct Namespace {
    pub namespace: String,
    pub events: Vec<BoundEvent>,
}

impl Namespace {
    pub fn event(&self, event: &str) -> Option<&BoundEvent> {
        self.events.iter().find(|e| e.event == event)
    }
}

#[derive(Clone, Debug, Default)]
pub struct CompiledWebsockets {
    namespaces: Vec<Namespace>,
}

impl CompiledWebsockets {
    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    pub fn namespace(&self, namespace: &str) -> Option<&Namespace> {
        let wanted = crate::http::normalize_path(namespace);
        self.namespaces.iter().find(|n| n.namespace == wanted)
    }

    /// Invokes the handler bound to `(namespace, event)`.
    pub async fn dispatch(&self, namespace: &str, event: &str, payload: Value) -> EventResult {
        let ns = self
            .namespace(namespace)
            .ok_or_else(|| anyhow::anyhow!("unknown websocket namespace '{namespace}'"))?;
        let bound = ns
            .event(event)
            .ok_or_else(|| anyhow::anyhow!("no handler for event '{event}' in '{}'", ns.namespace))?;
        let msg = SocketMessage {
            namespace: ns.namespace.clone(),
            event: event.to_owned(),
            payload,
        };
        (bound.invoke)(msg).await
    }
}

/// Binds every event directive to its socket instance, grouped by namespace.
pub fn compile_websockets(
    directives: &[Directive],
    services: &ServiceRegistry,
) -> Result<CompiledWebsockets, RegistryError> {
    let mut sockets: Vec<(ClassId, String)> = Vec::new();
    let mut namespaces: Vec<Namespace> = Vec::new();

    for d in directives {
        if let Payload::Messaging(MessagingDirective::Websocket(params)) = &d.payload {
            sockets.push((d.owner, params.namespace.clone()));
            if !namespaces.iter().any(|n| n.namespace == params.namespace) {
                namespaces.push(Namespace {
                    namespace: params.namespace.clone(),
                    events: Vec::new(),
                });
            }
        }
    }

    let mut seen: HashSet<(String, String)> = HashSet::new();
    for d in directives {
        let Payload::Messaging(MessagingDirective::On(params)) = &d.payload else {
            continue;
        };
        let namespace = sockets
            .iter()
            .find(|(class, _)| *class == d.owner)
            .map(|(_, ns)| ns.clone())
            .ok_or_else(|| RegistryError::UnknownWebsocket {
                class: d.owner,
                key: d.key.to_string(),
            })?;

        if !seen.insert((namespace.clone(), params.event.to_string())) {
            return Err(RegistryError::DuplicateEvent {
                event: params.event.to_string(),
                namespace,
            });
        }

        let instance = services.instance_of(d.owner)?;
        let invoke = params
            .handler
            .bind(Arc::clone(instance))
            .ok_or(RegistryError::ServiceTypeMismatch { class: d.owner })?;

        tracing::debug!(
            namespace = %namespace,
            event = %params.event,
            socket = %d.owner,
            "Event handler bound"
        );
        if let Some(ns) = namespaces.iter_mut().find(|n| n.namespace == namespace) {
            ns.events.push(BoundEvent {
                event: params.event.to_string(),
                owner: d.owner,
                key: d.key.to_string(),
                invoke,
            });
        }
    }

    tracing::info!(
        namespaces = ?namespaces.iter().map(|n| n.namespace.as_str()).collect::<Vec<_>>(),
        events = seen.len(),
        "Websockets compiled"
    );
    Ok(CompiledWebsockets { namespaces })
}
