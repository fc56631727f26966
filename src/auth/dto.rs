use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for user signup.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for requesting a password-reset link.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Request body for completing a password reset.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

/// Query string for the reset-token validity check.
#[derive(Debug, Deserialize)]
pub struct ResetTokenQuery {
    pub token: String,
}

/// Response returned after signup or login. The session token itself
/// travels in the cookie, never in the body.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: PublicUser,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
}

/// Generic acknowledgement for the reset endpoints.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub success: bool,
}

/// Result of the reset-token validity check.
#[derive(Debug, Serialize)]
pub struct TokenValidity {
    pub valid: bool,
}
