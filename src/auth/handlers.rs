use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, ForgotPasswordRequest, LoginRequest, PublicUser, ResetPasswordRequest,
            ResetTokenQuery, SignupRequest, StatusResponse, TokenValidity,
        },
        extractors::CurrentUser,
        reset, services,
        services::is_valid_email,
        session::{clear_session_cookie, session_cookie, SESSION_COOKIE},
    },
    error::AuthError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password/validate", get(validate_reset_token))
        .route("/auth/reset-password", post(reset_password))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

/// Shared input checks for signup and reset. Login deliberately skips the
/// password-length check: old accounts may predate the rule.
fn check_password(password: &str) -> Result<(), AuthError> {
    if password.len() < 8 {
        warn!("password too short");
        return Err(AuthError::BadRequest("Password too short".into()));
    }
    Ok(())
}

fn check_email(email: &str) -> Result<(), AuthError> {
    if !is_valid_email(email) {
        warn!(email = %email, "invalid email");
        return Err(AuthError::BadRequest("Invalid email".into()));
    }
    Ok(())
}

#[instrument(skip(state, jar, payload))]
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(mut payload): Json<SignupRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AuthError> {
    payload.email = payload.email.trim().to_lowercase();
    check_email(&payload.email)?;
    check_password(&payload.password)?;

    let ttl = state.config.session.ttl();
    let (user, session) =
        services::signup(&state.db, &payload.email, &payload.password, ttl).await?;

    let cookie = session_cookie(
        &session.token,
        session.expires_at,
        state.config.session.cookie_secure,
    );
    Ok((
        jar.add(cookie),
        Json(AuthResponse {
            user: PublicUser {
                id: user.id,
                email: user.email,
            },
        }),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(mut payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AuthError> {
    payload.email = payload.email.trim().to_lowercase();
    check_email(&payload.email)?;

    let ttl = state.config.session.ttl();
    let (user, session) =
        services::login(&state.db, &payload.email, &payload.password, ttl).await?;

    let cookie = session_cookie(
        &session.token,
        session.expires_at,
        state.config.session.cookie_secure,
    );
    Ok((
        jar.add(cookie),
        Json(AuthResponse {
            user: PublicUser {
                id: user.id,
                email: user.email,
            },
        }),
    ))
}

/// Revokes the session (when the cookie names one) and tells the browser to
/// forget it. A missing or stale cookie still logs out with 204.
#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), AuthError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        services::logout(&state.db, cookie.value()).await?;
    }
    Ok((jar.add(clear_session_cookie()), StatusCode::NO_CONTENT))
}

/// Always answers success for a well-formed email, whether or not it is
/// registered. The outcome difference lives only in the store and the log.
#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(mut payload): Json<ForgotPasswordRequest>,
) -> Result<Json<StatusResponse>, AuthError> {
    payload.email = payload.email.trim().to_lowercase();
    check_email(&payload.email)?;

    reset::request_reset(&state, &payload.email).await?;
    Ok(Json(StatusResponse { success: true }))
}

#[instrument(skip(state, query))]
pub async fn validate_reset_token(
    State(state): State<AppState>,
    Query(query): Query<ResetTokenQuery>,
) -> Result<Json<TokenValidity>, AuthError> {
    let valid = reset::validate_token(&state.db, &query.token).await?;
    Ok(Json(TokenValidity { valid }))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<StatusResponse>, AuthError> {
    check_password(&payload.password)?;

    reset::consume_reset(&state.db, &payload.token, &payload.password).await?;
    Ok(Json(StatusResponse { success: true }))
}

#[instrument(skip(session))]
pub async fn get_me(CurrentUser(session): CurrentUser) -> Json<PublicUser> {
    Json(PublicUser {
        id: session.user_id,
        email: session.email,
    })
}

#[cfg(test)]
mod me_tests {
    use super::*;

    #[test]
    fn test_me_response_serialization() {
        let response = PublicUser {
            id: uuid::Uuid::new_v4(),
            email: "test@example.com".to_string(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("id"));
    }

    #[test]
    fn test_auth_response_never_contains_token() {
        let response = AuthResponse {
            user: PublicUser {
                id: uuid::Uuid::new_v4(),
                email: "test@example.com".to_string(),
            },
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("token"));
    }
}
