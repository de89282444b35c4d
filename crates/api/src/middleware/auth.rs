//! HTTP Basic authentication middleware.
//!
//! Credentials are checked against the configured credential endpoint. The
//! authenticated username becomes the request's [`Participant`].

use axum::{
    body::Body,
    extract::State,
    http::{header::WWW_AUTHENTICATE, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::headers::{authorization::Basic, Authorization, HeaderMapExt};
use serde_json::json;
use tracing::{debug, warn};

use crate::app::AppState;
use crate::extractors::Participant;

/// Middleware that requires valid HTTP Basic credentials.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(Authorization(basic)) = req.headers().typed_get::<Authorization<Basic>>() else {
        return unauthorized_response("Missing or malformed Basic credentials");
    };

    if basic.username().is_empty() {
        return unauthorized_response("Missing or malformed Basic credentials");
    }

    match state
        .credentials
        .check(basic.username(), basic.password())
        .await
    {
        Ok(true) => {
            debug!(participant = basic.username(), "Authenticated");
            req.extensions_mut()
                .insert(Participant(basic.username().to_string()));
            next.run(req).await
        }
        Ok(false) => unauthorized_response("Invalid credentials"),
        Err(e) => {
            warn!(error = %e, "Credential check failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "error": "auth_unavailable",
                    "message": "Credential check failed"
                })),
            )
                .into_response()
        }
    }
}

/// Helper to create unauthorized response.
fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(WWW_AUTHENTICATE, "Basic realm=\"tablet-fleet\"")],
        Json(json!({
            "error": "unauthorized",
            "message": message
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_response() {
        let response = unauthorized_response("Test message");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(WWW_AUTHENTICATE).unwrap(),
            "Basic realm=\"tablet-fleet\""
        );
    }
}
