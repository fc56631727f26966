use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};

use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo::is_unique_violation;
use crate::auth::repo_types::{Session, User};
use crate::auth::session;
use crate::auth::token::{generate_token, MAX_TOKEN_RETRIES};
use crate::error::AuthError;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Register a new account and log it straight in.
///
/// The user row and its first session commit in one transaction. A duplicate
/// email surfaces as `AlreadyRegistered` whether it is caught by the
/// pre-check or by the UNIQUE constraint when two signups race.
pub async fn signup(
    db: &PgPool,
    email: &str,
    password: &str,
    session_ttl: Duration,
) -> Result<(User, Session), AuthError> {
    if User::find_by_email(db, email).await?.is_some() {
        warn!(email = %email, "signup for already registered email");
        return Err(AuthError::AlreadyRegistered);
    }

    let password_hash = hash_password(password)?;

    for _ in 0..MAX_TOKEN_RETRIES {
        let token = generate_token();
        let expires_at = OffsetDateTime::now_utc() + session_ttl;

        let mut tx = db.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(&password_hash)
        .fetch_one(&mut *tx)
        .await;

        let user = match user {
            Ok(u) => u,
            Err(e) if is_unique_violation(&e, "users_email_key") => {
                warn!(email = %email, "signup lost race to concurrent registration");
                return Err(AuthError::AlreadyRegistered);
            }
            Err(e) => return Err(e.into()),
        };

        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (user_id, token, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, token, created_at, expires_at
            "#,
        )
        .bind(user.id)
        .bind(&token)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await;

        match session {
            Ok(session) => {
                tx.commit().await?;
                info!(user_id = %user.id, email = %user.email, "user registered");
                return Ok((user, session));
            }
            Err(e) if is_unique_violation(&e, "sessions_token_key") => {
                // The aborted transaction rolls back on drop; the whole
                // insert pair is retried with a fresh token.
                drop(tx);
                warn!(email = %email, "session token collision during signup, regenerating");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AuthError::Operational(anyhow::anyhow!(
        "session token collided {MAX_TOKEN_RETRIES} times in a row"
    )))
}

/// Verify credentials and open a session. Unknown email and wrong password
/// are the same `InvalidCredentials` outcome, so the response does not
/// reveal which emails exist.
pub async fn login(
    db: &PgPool,
    email: &str,
    password: &str,
    session_ttl: Duration,
) -> Result<(User, Session), AuthError> {
    let Some(user) = User::find_by_email(db, email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AuthError::InvalidCredentials);
    };

    if !verify_password(password, &user.password_hash) {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials);
    }

    let session = session::issue(db, user.id, session_ttl).await?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((user, session))
}

/// Close the session behind `token`. Succeeds even when the token is
/// unknown, so a stale cookie still logs out cleanly.
pub async fn logout(db: &PgPool, token: &str) -> Result<(), AuthError> {
    session::revoke(db, token).await?;
    info!("user logged out");
    Ok(())
}

#[cfg(test)]
mod email_tests {
    use super::*;

    #[test]
    fn accepts_ordinary_addresses() {
        assert!(is_valid_email("test@example.com"));
        assert!(is_valid_email("first.last+tag@sub.domain.co"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-sign.example.com"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("spaces in@example.com"));
        assert!(!is_valid_email("missing-tld@example"));
    }
}
