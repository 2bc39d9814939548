use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tags each request with an id (the caller's, if it sent one), runs it inside
/// a span carrying that id and echoes the id on the response.
pub async fn logging_middleware(mut request: Request, next: Next) -> Response {
    let start = Instant::now();

    let request_id = match request.headers().get(REQUEST_ID_HEADER) {
        Some(value) => value.clone(),
        None => {
            let generated = HeaderValue::from_str(&Uuid::new_v4().to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("unknown"));
            request.headers_mut().insert(REQUEST_ID_HEADER, generated.clone());
            generated
        }
    };
    let id = request_id.to_str().unwrap_or("invalid").to_string();

    let span = tracing::info_span!(
        "request",
        request_id = %id,
        method = %request.method(),
        uri = %request.uri(),
    );

    async move {
        tracing::info!(version = ?request.version(), "Request started");

        let mut response = next.run(request).await;
        response.headers_mut().insert(REQUEST_ID_HEADER, request_id);

        let status = response.status();
        let duration_ms = start.elapsed().as_millis() as u64;
        if status.is_server_error() {
            tracing::warn!(status = %status, duration_ms, "Request failed");
        } else {
            tracing::info!(status = %status, duration_ms, "Request completed");
        }

        response
    }
    .instrument(span)
    .await
}
