//! Authenticated participant extractor.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

/// Username of the authenticated caller, inserted by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant(pub String);

impl Participant {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Participant
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Participant>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn test_extracts_from_extensions() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        parts.extensions.insert(Participant("alice".into()));
        let participant = Participant::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(participant.as_str(), "alice");
    }

    #[tokio::test]
    async fn test_missing_participant_is_unauthorized() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        let err = Participant::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }
}
