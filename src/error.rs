//! Error taxonomy and Axum response conversions.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Authentication errors returned to callers as values.
///
/// The first four variants are domain outcomes meant for direct user-facing
/// display; `Operational` covers store/transport failures and is never shown
/// to clients in detail.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown email and wrong password collapse into this one message so a
    /// caller cannot tell which emails are registered.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email already registered")]
    AlreadyRegistered,

    #[error("Invalid or expired reset token")]
    InvalidOrExpiredToken,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Operational(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::Operational(anyhow::Error::new(err))
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            AuthError::AlreadyRegistered => (StatusCode::CONFLICT, self.to_string()),
            AuthError::InvalidOrExpiredToken => (StatusCode::BAD_REQUEST, self.to_string()),
            AuthError::Unauthenticated => (StatusCode::UNAUTHORIZED, self.to_string()),
            AuthError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AuthError::Operational(err) => {
                // Log detailed error server-side, return generic message to client
                tracing::error!(error = %err, "operational failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong. Please try again.".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Extract status code and JSON body from an AuthError response.
    async fn error_response(err: AuthError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        (status, json)
    }

    #[tokio::test]
    async fn test_invalid_credentials_is_unauthorized() {
        let (status, body) = error_response(AuthError::InvalidCredentials).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid email or password");
    }

    #[tokio::test]
    async fn test_already_registered_is_conflict() {
        let (status, body) = error_response(AuthError::AlreadyRegistered).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Email already registered");
    }

    #[tokio::test]
    async fn test_invalid_or_expired_token() {
        let (status, body) = error_response(AuthError::InvalidOrExpiredToken).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid or expired reset token");
    }

    #[tokio::test]
    async fn test_unauthenticated() {
        let (status, body) = error_response(AuthError::Unauthenticated).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authentication required");
    }

    #[tokio::test]
    async fn test_bad_request_keeps_message() {
        let (status, body) =
            error_response(AuthError::BadRequest("Password too short".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Password too short");
    }

    #[tokio::test]
    async fn test_operational_hides_details() {
        // The store failure detail must NOT leak to the client
        let (status, body) = error_response(AuthError::Operational(anyhow::anyhow!(
            "connection refused at 10.0.0.5:5432"
        )))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Something went wrong. Please try again.");
        assert!(!body["error"].as_str().unwrap().contains("10.0.0.5"));
    }

    #[test]
    fn test_from_sqlx_error() {
        let app_err = AuthError::from(sqlx::Error::RowNotFound);
        assert!(matches!(app_err, AuthError::Operational(_)));
    }
}
