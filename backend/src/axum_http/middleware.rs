use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tracing::info;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Request-scoped trace id, available to handlers via `Extension`.
#[derive(Debug, Clone)]
pub struct TraceId(pub String);

/// Reads X-Request-ID when the client supplies one, generates a UUID
/// otherwise, and echoes the id back in the response header.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let trace_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    info!(trace_id = %trace_id, method = %req.method(), path = %req.uri().path(), "request received");

    req.extensions_mut().insert(TraceId(trace_id.clone()));

    let mut response = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
