//! Websocket namespaces and event binding.

use std::sync::Arc;

use serde_json::{json, Value};

use wirekit::websocket::{EventFn, EventResult, SocketMessage};
use wirekit::{BuildOptions, Registry, RegistryError};

#[derive(Default)]
struct Chat;

#[derive(Default)]
struct ChatAudit;

#[derive(Default)]
struct Admin;

async fn on_message(_: Arc<Chat>, msg: SocketMessage) -> EventResult {
    Ok(Some(json!({ "echo": msg.payload, "ns": msg.namespace })))
}

async fn on_join(_: Arc<ChatAudit>, _: SocketMessage) -> EventResult {
    Ok(None)
}

async fn on_admin_message(_: Arc<Admin>, msg: SocketMessage) -> EventResult {
    Ok(Some(Value::String(msg.event)))
}

fn build(r: &mut Registry) -> Result<wirekit::Artifacts, RegistryError> {
    r.build_all(&BuildOptions::new("/"))
}

#[tokio::test]
async fn events_are_grouped_by_namespace() {
    let mut r = Registry::new();
    r.add_websocket::<Chat>("/Chat/").unwrap();
    r.add_websocket::<ChatAudit>("chat").unwrap();
    r.add_websocket::<Admin>("/admin").unwrap();
    r.add_event::<Chat>("on_message", "message", EventFn::of(on_message))
        .unwrap();
    r.add_event::<ChatAudit>("on_join", "join", EventFn::of(on_join))
        .unwrap();
    r.add_event::<Admin>("on_message", "message", EventFn::of(on_admin_message))
        .unwrap();

    let ws = build(&mut r).unwrap().websockets;
    let names: Vec<&str> = ws.namespaces().iter().map(|n| n.namespace.as_str()).collect();
    assert_eq!(names, ["/chat", "/admin"]);

    let chat = ws.namespace("/CHAT").unwrap();
    let events: Vec<&str> = chat.events.iter().map(|e| e.event.as_str()).collect();
    assert_eq!(events, ["message", "join"]);

    let ack = ws.dispatch("/chat", "message", json!("hi")).await.unwrap();
    assert_eq!(ack, Some(json!({ "echo": "hi", "ns": "/chat" })));
    assert_eq!(ws.dispatch("/chat", "join", Value::Null).await.unwrap(), None);
    assert_eq!(
        ws.dispatch("/admin", "message", Value::Null).await.unwrap(),
        Some(json!("message"))
    );
    assert!(ws.dispatch("/chat", "leave", Value::Null).await.is_err());
    assert!(ws.dispatch("/nowhere", "message", Value::Null).await.is_err());
}

#[test]
fn duplicate_event_in_namespace_is_rejected() {
    let mut r = Registry::new();
    r.add_websocket::<Chat>("/chat").unwrap();
    r.add_websocket::<ChatAudit>("/chat").unwrap();
    r.add_event::<Chat>("a", "message", EventFn::of(on_message))
        .unwrap();
    r.add_event::<ChatAudit>("b", "message", EventFn::of(on_join))
        .unwrap();

    match build(&mut r).unwrap_err() {
        RegistryError::DuplicateEvent { event, namespace } => {
            assert_eq!(event, "message");
            assert_eq!(namespace, "/chat");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn event_on_undeclared_socket_fails_the_build() {
    let mut r = Registry::new();
    r.add_service::<Chat>().unwrap();
    r.add_event::<Chat>("a", "message", EventFn::of(on_message))
        .unwrap();
    assert!(matches!(
        build(&mut r).unwrap_err(),
        RegistryError::UnknownWebsocket { .. }
    ));
}

#[test]
fn event_handler_must_belong_to_socket() {
    let mut r = Registry::new();
    r.add_websocket::<Admin>("/admin").unwrap();
    assert!(matches!(
        r.add_event::<Admin>("a", "message", EventFn::of(on_message)),
        Err(RegistryError::HandlerOwnerMismatch { .. })
    ));
}
