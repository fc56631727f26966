use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                   // unique user ID
    pub email: String,              // lowercased email
    #[serde(skip_serializing)]
    pub password_hash: String,      // Argon2 hash, not exposed in JSON
    pub created_at: OffsetDateTime, // creation timestamp
    pub updated_at: OffsetDateTime, // last credential change
}

/// Session record backing one logged-in client.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String, // opaque bearer token, unique
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

impl Session {
    /// A session past its deadline no longer authenticates. Expired rows
    /// stay in the table until the reaper collects them.
    pub fn is_expired(&self) -> bool {
        self.expires_at <= OffsetDateTime::now_utc()
    }
}

/// Session joined with its owner, the result of validating a bearer token.
#[derive(Debug, Clone, FromRow)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub email: String,
    pub expires_at: OffsetDateTime,
}

impl SessionUser {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= OffsetDateTime::now_utc()
    }
}

/// Password-reset token. At most one live row per user; the row is deleted
/// when consumed or superseded, which is what makes it single-use.
#[derive(Debug, Clone, FromRow)]
pub struct PasswordResetToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: OffsetDateTime,
}

impl PasswordResetToken {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= OffsetDateTime::now_utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn session_expiring_in(seconds: i64) -> Session {
        let now = OffsetDateTime::now_utc();
        Session {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token: "a".repeat(64),
            created_at: now,
            expires_at: now + Duration::seconds(seconds),
        }
    }

    fn reset_token_expiring_in(seconds: i64) -> PasswordResetToken {
        PasswordResetToken {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token: "b".repeat(64),
            expires_at: OffsetDateTime::now_utc() + Duration::seconds(seconds),
        }
    }

    #[test]
    fn live_session_is_not_expired() {
        assert!(!session_expiring_in(3600).is_expired());
    }

    #[test]
    fn session_past_deadline_is_expired() {
        assert!(session_expiring_in(-1).is_expired());
    }

    #[test]
    fn live_reset_token_is_not_expired() {
        assert!(!reset_token_expiring_in(3600).is_expired());
    }

    #[test]
    fn reset_token_past_deadline_is_expired() {
        assert!(reset_token_expiring_in(-1).is_expired());
    }
}
