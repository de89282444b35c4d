//! Request tracing middleware.

use axum::{
    body::Body,
    http::{header::HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for request ID.
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Request ID stored in request extensions.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Propagates the caller's `X-Request-ID` or generates a UUID v4, runs the request
/// inside a span carrying it and echoes it on the response.
pub async fn trace_id(mut req: Request<Body>, next: Next) -> Response {
    let request_id = request_id_from(&req);
    req.extensions_mut().insert(RequestId(request_id.clone()));

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    async move {
        let start = std::time::Instant::now();
        let mut response = next.run(req).await;

        tracing::info!(
            status = response.status().as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Request completed"
        );

        if let Ok(header_value) = HeaderValue::from_str(&request_id) {
            response
                .headers_mut()
                .insert(HeaderName::from_static("x-request-id"), header_value);
        }
        response
    }
    .instrument(span)
    .await
}

fn request_id_from(req: &Request<Body>) -> String {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_propagates_incoming_id() {
        let req = Request::builder()
            .header(REQUEST_ID_HEADER, "req-123_abc.xyz")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_id_from(&req), "req-123_abc.xyz");
    }

    #[test]
    fn test_generates_uuid_when_missing() {
        let req = Request::builder().body(Body::empty()).unwrap();
        let id = request_id_from(&req);
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_generates_uuid_for_empty_header() {
        let req = Request::builder()
            .header(REQUEST_ID_HEADER, "")
            .body(Body::empty())
            .unwrap();
        assert!(Uuid::parse_str(&request_id_from(&req)).is_ok());
    }
}
