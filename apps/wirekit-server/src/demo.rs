//! Sample notes API registered through `wirekit::directives!`.

use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use parking_lot::RwLock;
use serde_json::{json, Map, Value};

use wirekit::prelude::*;
use wirekit::schema::TypeKind;

/// Name of the global middleware the server wraps around every request.
pub const REQUEST_LOG: &str = "request-log";

pub struct NoteStore {
    notes: RwLock<Vec<Value>>,
}

impl Default for NoteStore {
    fn default() -> Self {
        Self {
            notes: RwLock::new(vec![json!({ "id": 1, "title": "welcome", "body": null })]),
        }
    }
}

impl NoteStore {
    fn list(&self) -> Vec<Value> {
        self.notes.read().clone()
    }

    fn get(&self, id: u64) -> Option<Value> {
        self.notes
            .read()
            .iter()
            .find(|n| n.get("id").and_then(Value::as_u64) == Some(id))
            .cloned()
    }

    fn insert(&self, mut note: Value) -> Value {
        let mut notes = self.notes.write();
        let id = notes.len() as u64 + 1;
        if let Some(obj) = note.as_object_mut() {
            obj.insert("id".into(), json!(id));
        }
        notes.push(note.clone());
        note
    }
}

#[derive(Default)]
pub struct Notes {
    store: Inject<NoteStore>,
}

#[derive(Default)]
pub struct RequireJson;

#[async_trait]
impl Middleware for RequireJson {
    async fn invoke(&self, ctx: RequestContext, next: Next) -> HandlerResult {
        if ctx.request_body().is_none() {
            ctx.set_status(StatusCode::BAD_REQUEST);
            ctx.set_body(json!({ "error": "a JSON body is required" }));
            return Ok(());
        }
        next.run(ctx).await
    }

    fn name(&self) -> &str {
        "require-json"
    }
}

async fn list_notes(notes: Arc<Notes>, ctx: RequestContext, next: Next) -> HandlerResult {
    let store = notes.store.require()?;
    ctx.set_body(Value::Array(store.list()));
    next.run(ctx).await
}

async fn get_note(notes: Arc<Notes>, ctx: RequestContext, next: Next) -> HandlerResult {
    let store = notes.store.require()?;
    let id = ctx
        .param("id")
        .and_then(|id| id.parse::<u64>().ok())
        .ok_or_else(|| anyhow::anyhow!("note id must be a number"))?;
    match store.get(id) {
        Some(note) => ctx.set_body(note),
        None => ctx.set_status(StatusCode::NOT_FOUND),
    }
    next.run(ctx).await
}

async fn create_note(notes: Arc<Notes>, ctx: RequestContext, next: Next) -> HandlerResult {
    let store = notes.store.require()?;
    let body = ctx.request_body().unwrap_or(Value::Null);
    ctx.set_status(StatusCode::CREATED);
    ctx.set_body(store.insert(body));
    next.run(ctx).await
}

#[derive(Default)]
pub struct NotesQuery {
    store: Inject<NoteStore>,
}

async fn query_notes(q: Arc<NotesQuery>, _: Map<String, Value>) -> anyhow::Result<Value> {
    Ok(Value::Array(q.store.require()?.list()))
}

#[derive(Default)]
pub struct NoteFields;

/// First words of the note body, at most `words` of them.
async fn preview(_: Arc<NoteFields>, note: Value, args: Map<String, Value>) -> anyhow::Result<Value> {
    let words = args.get("words").and_then(Value::as_u64).unwrap_or(5) as usize;
    let body = note.get("body").and_then(Value::as_str).unwrap_or_default();
    Ok(json!(body.split_whitespace().take(words).collect::<Vec<_>>().join(" ")))
}

#[derive(Default)]
pub struct NotesSocket;

async fn on_ping(_: Arc<NotesSocket>, msg: SocketMessage) -> EventResult {
    Ok(Some(json!({ "pong": msg.payload })))
}

pub struct Note;

fn register(r: &mut Registry) -> Result<(), RegistryError> {
    r.add_service::<NoteStore>()?;
    r.add_named_middleware(
        REQUEST_LOG,
        Timing::Before,
        FnMiddleware::new(REQUEST_LOG, |ctx: RequestContext, next: Next| async move {
            tracing::info!(method = %ctx.method(), path = %ctx.path(), "Request received");
            let result = next.run(ctx.clone()).await;
            tracing::info!(status = %ctx.status(), "Request finished");
            result
        }),
    )?;
    r.add_middleware::<RequireJson>(Timing::Before)?;

    // REST
    r.add_router::<Notes>("/notes")?;
    r.inject(InjectionRequest::single::<Notes, NoteStore>("store", |n| &n.store))?;
    r.add_endpoint::<Notes>(
        "list",
        EndpointParams::new(HttpMethod::Get, "/", HandlerFn::of(list_notes)),
    )?;
    r.add_endpoint::<Notes>(
        "get",
        EndpointParams::new(HttpMethod::Get, "/:id", HandlerFn::of(get_note)),
    )?;
    r.add_endpoint::<Notes>(
        "create",
        EndpointParams::new(HttpMethod::Post, "/", HandlerFn::of(create_note)),
    )?;
    r.use_middleware::<Notes>(
        AppliesTo::member("create"),
        vec![MiddlewareRef::class::<RequireJson>()],
    )?;

    // Schema
    r.add_type::<Note>(TypeParams::object().describe("A short note"))?;
    r.add_type::<Note>(TypeParams::input())?;
    r.add_field::<Note>("id", FieldParams::new(TypeRef::id()))?;
    r.add_field::<Note>("title", FieldParams::new(TypeRef::string()))?;
    r.add_field::<Note>("body", FieldParams::new(TypeRef::string()).nullable())?;
    r.type_creator().create_partial(
        TypeRef::class_as::<Note>(TypeKind::Input),
        CreateParams::named("NoteUpdate").kind(TypeKind::Input),
    )?;

    r.add_resolver::<NotesQuery>()?;
    r.inject(InjectionRequest::single::<NotesQuery, NoteStore>("store", |q| &q.store))?;
    r.add_root_field::<NotesQuery>(
        "notes",
        RootFieldParams::query(
            FieldParams::new(TypeRef::class::<Note>()).list(),
            ResolverFn::of(query_notes),
        )
        .describe("Every stored note"),
    )?;
    r.add_resolver::<NoteFields>()?;
    r.add_field_resolver::<NoteFields>(
        "preview",
        FieldResolverParams::new(
            TypeRef::class::<Note>(),
            FieldParams::new(TypeRef::string()),
            ResolverFn::field(preview),
        )
        .arg("words", FieldParams::new(TypeRef::int()).nullable()),
    )?;

    // Messaging
    r.add_websocket::<NotesSocket>("/notes")?;
    r.add_event::<NotesSocket>("on_ping", "ping", EventFn::of(on_ping))?;
    Ok(())
}

wirekit::directives!(register);
