use axum_extra::extract::cookie::{Cookie, SameSite};
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use tracing::warn;
use uuid::Uuid;

use crate::auth::repo::is_unique_violation;
use crate::auth::repo_types::{Session, SessionUser};
use crate::auth::token::{generate_token, MAX_TOKEN_RETRIES};
use crate::error::AuthError;

/// Name of the bearer cookie.
pub const SESSION_COOKIE: &str = "session_token";

/// Issue a fresh session for `user_id`, valid for `ttl` from now.
/// Regenerates the token and retries if the UNIQUE constraint on
/// `sessions.token` ever fires.
pub async fn issue(db: &PgPool, user_id: Uuid, ttl: Duration) -> Result<Session, AuthError> {
    let expires_at = OffsetDateTime::now_utc() + ttl;

    for _ in 0..MAX_TOKEN_RETRIES {
        let token = generate_token();
        match Session::insert(db, user_id, &token, expires_at).await {
            Ok(session) => return Ok(session),
            Err(e) if is_unique_violation(&e, "sessions_token_key") => {
                warn!(user_id = %user_id, "session token collision, regenerating");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AuthError::Operational(anyhow::anyhow!(
        "session token collided {MAX_TOKEN_RETRIES} times in a row"
    )))
}

/// Resolve a bearer token to its user. `None` when the token is unknown or
/// the session has expired. Expired rows are only filtered, never deleted
/// here; the reaper removes them out-of-band.
pub async fn validate(db: &PgPool, token: &str) -> Result<Option<SessionUser>, AuthError> {
    let Some(session) = Session::find_with_user(db, token).await? else {
        return Ok(None);
    };
    if session.is_expired() {
        return Ok(None);
    }
    Ok(Some(session))
}

/// Delete the session behind `token`. Idempotent: revoking an unknown or
/// already-revoked token succeeds.
pub async fn revoke(db: &PgPool, token: &str) -> Result<(), AuthError> {
    Session::delete_by_token(db, token).await?;
    Ok(())
}

/// Build the bearer cookie for a freshly issued session. The cookie expiry
/// matches the session row, so the browser drops it when the store would
/// reject it anyway.
pub fn session_cookie(token: &str, expires_at: OffsetDateTime, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.to_owned()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .expires(expires_at)
        .build()
}

/// Build the cookie that tells the browser to forget the session: same
/// name and path, empty value, expiry in the past.
pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Expiration;

    #[test]
    fn session_cookie_sets_browser_attributes() {
        let expires = OffsetDateTime::now_utc() + Duration::days(7);
        let cookie = session_cookie("abc123", expires, true);

        assert_eq!(cookie.name(), "session_token");
        assert_eq!(cookie.value(), "abc123");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.expires(), Some(Expiration::DateTime(expires)));
    }

    #[test]
    fn secure_flag_can_be_disabled_for_local_dev() {
        let cookie = session_cookie("abc123", OffsetDateTime::now_utc(), false);
        assert_eq!(cookie.secure(), Some(false));
    }

    #[test]
    fn clear_cookie_expires_in_the_past() {
        let cookie = clear_session_cookie();

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.path(), Some("/"));
        match cookie.expires() {
            Some(Expiration::DateTime(dt)) => assert!(dt <= OffsetDateTime::UNIX_EPOCH),
            other => panic!("expected a past expiry, got {:?}", other),
        }
    }
}
