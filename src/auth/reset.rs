use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::auth::password::hash_password;
use crate::auth::repo::is_unique_violation;
use crate::auth::repo_types::{PasswordResetToken, User};
use crate::auth::token::{generate_token, MAX_TOKEN_RETRIES};
use crate::error::AuthError;
use crate::state::AppState;

/// Start a password reset for `email` (already lowercased by the caller).
///
/// An unknown email returns `Ok(())` with no side effect, so the endpoint
/// answers identically whether or not the address is registered. For a known
/// user, any previous token is superseded and the fresh link goes out via
/// the notifier. The swap is one `ON CONFLICT (user_id)` upsert: a separate
/// delete+insert, even inside a transaction, lets two concurrent requests
/// both delete before either insert is visible and commit two live tokens.
/// With the unique constraint as arbiter the writes serialize in the store
/// and the last one wins.
pub async fn request_reset(state: &AppState, email: &str) -> Result<(), AuthError> {
    let Some(user) = User::find_by_email(&state.db, email).await? else {
        debug!("password reset requested for unknown email");
        return Ok(());
    };

    let ttl = state.config.reset.ttl();

    for _ in 0..MAX_TOKEN_RETRIES {
        let token = generate_token();
        let expires_at = OffsetDateTime::now_utc() + ttl;

        match PasswordResetToken::upsert_for_user(&state.db, user.id, &token, expires_at).await {
            Ok(_) => {
                let reset_url = state.config.reset.reset_url(&token);
                state.notifier.send_reset_link(email, &reset_url).await?;
                info!(user_id = %user.id, "password reset token issued");
                return Ok(());
            }
            Err(e) if is_unique_violation(&e, "password_reset_tokens_token_key") => {
                warn!(user_id = %user.id, "reset token collision, regenerating");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AuthError::Operational(anyhow::anyhow!(
        "reset token collided {MAX_TOKEN_RETRIES} times in a row"
    )))
}

/// Check whether a reset token is live without consuming it. The reset page
/// calls this on load so the user sees "link expired" before typing anything.
pub async fn validate_token(db: &PgPool, token: &str) -> Result<bool, AuthError> {
    let Some(row) = PasswordResetToken::find_by_token(db, token).await? else {
        return Ok(false);
    };
    Ok(!row.is_expired())
}

/// Complete a password reset: spend the token and install the new password.
///
/// The token is claimed with a single `DELETE .. RETURNING` that checks
/// expiry in the same statement, so two concurrent submissions of the same
/// token cannot both succeed. The claim, the password update, and the purge
/// of the user's sessions commit together; an invalid or expired token
/// leaves the store untouched.
pub async fn consume_reset(db: &PgPool, token: &str, new_password: &str) -> Result<(), AuthError> {
    let mut tx = db.begin().await?;

    let claimed = sqlx::query_scalar::<_, uuid::Uuid>(
        r#"
        DELETE FROM password_reset_tokens
        WHERE token = $1 AND expires_at > now()
        RETURNING user_id
        "#,
    )
    .bind(token)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(user_id) = claimed else {
        return Err(AuthError::InvalidOrExpiredToken);
    };

    let password_hash = hash_password(new_password)?;

    sqlx::query(
        r#"
        UPDATE users
        SET password_hash = $1, updated_at = now()
        WHERE id = $2
        "#,
    )
    .bind(&password_hash)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    // A reset means the old credential may be compromised; every session
    // issued under it goes with it.
    let purged = sqlx::query(
        r#"
        DELETE FROM sessions
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(
        user_id = %user_id,
        sessions_revoked = purged.rows_affected(),
        "password reset completed"
    );
    Ok(())
}
