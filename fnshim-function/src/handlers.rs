//! Local function host HTTP handlers
//!
//! Serves the function the way `netlify dev` does: every request under
//! `/.netlify/functions/{name}` becomes one invocation event.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use base64::{engine::general_purpose, Engine};
use bytes::Bytes;
use fnshim_core::{HostError, RequestId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::event::{HandlerResponse, InvocationContext, InvocationEvent};
use crate::handler::FunctionHandler;

/// Route prefix functions are served under
pub const FUNCTIONS_PREFIX: &str = "/.netlify/functions";

/// Deadline handed to locally hosted invocations (Netlify's synchronous limit)
const LOCAL_TIMEOUT_MS: i64 = 10_000;

/// Shared state for the function host
pub struct FunctionState {
    pub handler: Arc<FunctionHandler>,
}

impl FunctionState {
    pub fn new(handler: Arc<FunctionHandler>) -> Self {
        Self { handler }
    }

    /// Names of the hosted functions
    pub fn function_names(&self) -> Vec<String> {
        vec![self.handler.name().to_string()]
    }
}

/// Router serving the hosted function
pub fn function_router(state: Arc<FunctionState>) -> Router {
    Router::new()
        .route(&format!("{FUNCTIONS_PREFIX}/:name"), any(invoke_function))
        .route(&format!("{FUNCTIONS_PREFIX}/:name/*rest"), any(invoke_function))
        .with_state(state)
}

/// ANY /.netlify/functions/{name}[/{rest}]
pub async fn invoke_function(
    State(state): State<Arc<FunctionState>>,
    Path(params): Path<HashMap<String, String>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let name = params.get("name").map(String::as_str).unwrap_or_default();
    let request_id = RequestId::new();

    if name != state.handler.name() {
        warn!(function = %name, "Function not found");
        return host_error(&HostError::function_not_found(name).with_request_id(request_id));
    }

    info!(
        function = %name,
        method = %method,
        path = %uri.path(),
        request_id = %request_id,
        payload_size = body.len(),
        "Invoke"
    );

    let event = event_from_request(&method, &uri, &headers, &body);
    let context = InvocationContext::local(name, &request_id, LOCAL_TIMEOUT_MS);
    let response = state.handler.handle(event, context).await;

    into_http(response)
}

/// Build the invocation event for an HTTP request
pub fn event_from_request(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: &Bytes,
) -> InvocationEvent {
    let mut header_map: HashMap<String, String> = HashMap::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            continue;
        };
        header_map
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }

    let query_string_parameters = uri
        .query()
        .map(|q| {
            form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect::<HashMap<String, String>>()
        })
        .unwrap_or_default();

    let (body, is_base64_encoded) = if body.is_empty() {
        (None, false)
    } else {
        match std::str::from_utf8(body) {
            Ok(text) => (Some(text.to_string()), false),
            Err(_) => (Some(general_purpose::STANDARD.encode(body)), true),
        }
    };

    InvocationEvent {
        path: Some(uri.path().to_string()),
        http_method: Some(method.as_str().to_string()),
        headers: header_map,
        query_string_parameters,
        raw_query: uri.query().map(str::to_string),
        body,
        is_base64_encoded,
        extra: serde_json::Map::new(),
    }
}

fn into_http(response: HandlerResponse) -> Response {
    let status = StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::OK);
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from(response.body),
    )
        .into_response()
}

fn host_error(error: &HostError) -> Response {
    let status =
        StatusCode::from_u16(error.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        error.to_json(),
    )
        .into_response()
}
