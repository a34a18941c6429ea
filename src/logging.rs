//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{request, response},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::Error;

/// The number of bytes of a request or response body to log at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The largest request body the middleware will buffer, the same as axum's default body limit.
pub const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
///
/// Request bodies over [MAX_REQUEST_BODY_BYTES] are rejected with
/// `413 Payload Too Large` before they reach a handler.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, MAX_REQUEST_BODY_BYTES).await {
        Ok(body) => body,
        Err(error) => {
            tracing::warn!("Could not read request body for {}: {error}", parts.uri);
            return Error::RequestBodyTooLarge.into_response();
        }
    };
    log_request(&parts, &String::from_utf8_lossy(&body));

    let response = next.run(Request::from_parts(parts, Body::from(body))).await;

    let (parts, body) = response.into_parts();
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            Bytes::new()
        }
    };
    log_response(&parts, &String::from_utf8_lossy(&body));

    Response::from_parts(parts, Body::from(body))
}

/// The longest prefix of `text` that is at most `limit` bytes and ends on a char boundary.
fn truncate(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }

    let end = text
        .char_indices()
        .map(|(index, _)| index)
        .take_while(|&index| index <= limit)
        .last()
        .unwrap_or(0);

    &text[..end]
}

fn log_request(parts: &request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {} {}\nbody: {}...",
            parts.method,
            parts.uri,
            truncate(body, LOG_BODY_LENGTH_LIMIT)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!(
            "Received request: {} {}\nbody: {body:?}",
            parts.method,
            parts.uri
        );
    }
}

fn log_response(parts: &response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {}\nbody: {}...",
            parts.status,
            truncate(body, LOG_BODY_LENGTH_LIMIT)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {}\nbody: {body:?}", parts.status);
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, middleware, routing::post};
    use axum_test::TestServer;
    use serde_json::Value;

    use super::{MAX_REQUEST_BODY_BYTES, logging_middleware, truncate};

    fn get_echo_server() -> TestServer {
        let app = Router::new()
            .route("/echo", post(|body: String| async move { body }))
            .layer(middleware::from_fn(logging_middleware));
        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[test]
    fn short_text_is_not_truncated() {
        assert_eq!(truncate("Sword", 64), "Sword");
    }

    #[test]
    fn truncates_on_char_boundary() {
        // Each hourglass is three bytes, so the limit falls inside the second one.
        assert_eq!(truncate("⏳⏳⏳", 5), "⏳");
        assert_eq!(truncate("abcdef", 3), "abc");
    }

    #[tokio::test]
    async fn passes_body_through() {
        let server = get_echo_server();
        let body = "x".repeat(200);

        let response = server.post("/echo").text(body.clone()).await;

        response.assert_status_ok();
        assert_eq!(response.text(), body);
    }

    #[tokio::test]
    async fn rejects_body_over_limit() {
        let server = get_echo_server();

        let response = server
            .post("/echo")
            .text("x".repeat(MAX_REQUEST_BODY_BYTES + 1))
            .await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        assert!(response.json::<Value>()["error"].is_string());
    }

    #[tokio::test]
    async fn accepts_body_at_limit() {
        let server = get_echo_server();

        let response = server
            .post("/echo")
            .text("x".repeat(MAX_REQUEST_BODY_BYTES))
            .await;

        response.assert_status_ok();
        assert_eq!(response.text().len(), MAX_REQUEST_BODY_BYTES);
    }
}
