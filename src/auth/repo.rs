use crate::auth::repo_types::{PasswordResetToken, Session, SessionUser, User};
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

/// True when `err` is a Postgres unique-constraint violation on the named
/// constraint. Insert sites use this to tell a token collision (retryable)
/// or a duplicate email (domain outcome) apart from real store failures.
pub(crate) fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(dbe) => dbe.constraint() == Some(constraint),
        _ => false,
    }
}

impl User {
    /// Find a user by email. Callers lowercase the email first.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }
}

impl Session {
    /// Insert a session row. Surfaces the raw sqlx error so the caller can
    /// spot a token collision and retry with a fresh token.
    pub async fn insert(
        db: &PgPool,
        user_id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> Result<Session, sqlx::Error> {
        sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (user_id, token, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, token, created_at, expires_at
            "#,
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .fetch_one(db)
        .await
    }

    /// Look up a session by token, joined with its owner. Returns the row
    /// whether or not it has expired; the caller applies the expiry check.
    pub async fn find_with_user(db: &PgPool, token: &str) -> anyhow::Result<Option<SessionUser>> {
        let row = sqlx::query_as::<_, SessionUser>(
            r#"
            SELECT s.user_id, u.email, s.expires_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    /// Delete a session by token. Returns the number of rows removed;
    /// deleting a token that does not exist is not an error.
    pub async fn delete_by_token(db: &PgPool, token: &str) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE token = $1
            "#,
        )
        .bind(token)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }
}

impl PasswordResetToken {
    /// Install a fresh reset token for `user_id`, replacing any previous one
    /// in the same statement. The `user_id` unique constraint is the arbiter,
    /// so concurrent swaps for one user serialize in the store and exactly
    /// one row survives. Surfaces the raw sqlx error so the caller can spot
    /// a token collision and retry with a fresh token.
    pub async fn upsert_for_user(
        db: &PgPool,
        user_id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> Result<PasswordResetToken, sqlx::Error> {
        sqlx::query_as::<_, PasswordResetToken>(
            r#"
            INSERT INTO password_reset_tokens (user_id, token, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET token = EXCLUDED.token, expires_at = EXCLUDED.expires_at
            RETURNING id, user_id, token, expires_at
            "#,
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .fetch_one(db)
        .await
    }

    /// Look up a reset token without consuming it.
    pub async fn find_by_token(
        db: &PgPool,
        token: &str,
    ) -> anyhow::Result<Option<PasswordResetToken>> {
        let row = sqlx::query_as::<_, PasswordResetToken>(
            r#"
            SELECT id, user_id, token, expires_at
            FROM password_reset_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }
}
