use std::collections::HashMap;
use std::sync::Arc;

use http::{HeaderMap, Method, StatusCode};
use parking_lot::Mutex;
use serde_json::Value;

/// Transport-facing request handed to `CompiledRouter::dispatch`.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

#[derive(Debug)]
struct ContextState {
    method: Method,
    path: String,
    params: HashMap<String, String>,
    request_headers: HeaderMap,
    request_body: Option<Value>,
    status: StatusCode,
    response_headers: HeaderMap,
    response_body: Option<Value>,
    state: serde_json::Map<String, Value>,
}

/// Per-request context shared by every stage of a compiled chain.
///
/// Cloning is cheap; all clones observe the same state.
#[derive(Debug, Clone)]
pub struct RequestContext {
    inner: Arc<Mutex<ContextState>>,
}

impl RequestContext {
    pub fn new(request: Request) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ContextState {
                method: request.method,
                path: request.path,
                params: HashMap::new(),
                request_headers: request.headers,
                request_body: request.body,
                status: StatusCode::NOT_FOUND,
                response_headers: HeaderMap::new(),
                response_body: None,
                state: serde_json::Map::new(),
            })),
        }
    }

    pub fn method(&self) -> Method {
        self.inner.lock().method.clone()
    }

    pub fn path(&self) -> String {
        self.inner.lock().path.clone()
    }

    pub fn param(&self, name: &str) -> Option<String> {
        self.inner.lock().params.get(name).cloned()
    }

    pub fn params(&self) -> HashMap<String, String> {
        self.inner.lock().params.clone()
    }

    pub(crate) fn set_params(&self, params: HashMap<String, String>) {
        self.inner.lock().params = params;
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.inner
            .lock()
            .request_headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    }

    pub fn request_body(&self) -> Option<Value> {
        self.inner.lock().request_body.clone()
    }

    pub fn status(&self) -> StatusCode {
        self.inner.lock().status
    }

    pub fn set_status(&self, status: StatusCode) {
        self.inner.lock().status = status;
    }

    /// Sets the response body; a still-untouched `404` status becomes `200`.
    pub fn set_body(&self, body: Value) {
        let mut st = self.inner.lock();
        st.response_body = Some(body);
        if st.status == StatusCode::NOT_FOUND {
            st.status = StatusCode::OK;
        }
    }

    pub fn body(&self) -> Option<Value> {
        self.inner.lock().response_body.clone()
    }

    pub fn set_header(&self, name: http::HeaderName, value: http::HeaderValue) {
        self.inner.lock().response_headers.insert(name, value);
    }

    /// Request-scoped scratch values shared between stages.
    pub fn set_state(&self, key: impl Into<String>, value: Value) {
        self.inner.lock().state.insert(key.into(), value);
    }

    pub fn state(&self, key: &str) -> Option<Value> {
        self.inner.lock().state.get(key).cloned()
    }

    /// Appends `value` to the array stored under `key`, creating it on first use.
    pub fn push_state(&self, key: &str, value: Value) {
        let mut st = self.inner.lock();
        match st.state.get_mut(key) {
            Some(Value::Array(items)) => items.push(value),
            _ => {
                st.state.insert(key.to_owned(), Value::Array(vec![value]));
            }
        }
    }

    pub fn into_response(self) -> Response {
        let st = self.inner.lock();
        Response {
            status: st.status,
            headers: st.response_headers.clone(),
            body: st.response_body.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn body_promotes_default_status() {
        let ctx = RequestContext::new(Request::new(Method::GET, "/x"));
        assert_eq!(ctx.status(), StatusCode::NOT_FOUND);
        ctx.set_body(json!({"ok": true}));
        assert_eq!(ctx.status(), StatusCode::OK);

        let ctx = RequestContext::new(Request::new(Method::POST, "/x"));
        ctx.set_status(StatusCode::CREATED);
        ctx.set_body(json!(1));
        assert_eq!(ctx.status(), StatusCode::CREATED);
    }

    #[test]
    fn clones_share_state() {
        let ctx = RequestContext::new(Request::new(Method::GET, "/x"));
        let other = ctx.clone();
        other.push_state("trace", json!("a"));
        ctx.push_state("trace", json!("b"));
        assert_eq!(ctx.state("trace"), Some(json!(["a", "b"])));
    }
}
