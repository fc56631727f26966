//! Background reaper for expired rows.
//!
//! Sessions and reset tokens are only filtered at read time; nothing on the
//! request path deletes them. This job sweeps both tables on an interval so
//! expired rows do not pile up forever.

use sqlx::PgPool;
use std::time::Duration;
use tracing::{error, info};

/// Totals from one reaper sweep.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReapCounts {
    pub sessions: u64,
    pub reset_tokens: u64,
}

/// Delete every expired session and reset token. Safe to run at any time:
/// read-time filtering means live traffic never sees the rows this removes.
pub async fn reap_expired(db: &PgPool) -> anyhow::Result<ReapCounts> {
    let sessions = sqlx::query(
        r#"
        DELETE FROM sessions
        WHERE expires_at <= now()
        "#,
    )
    .execute(db)
    .await?
    .rows_affected();

    let reset_tokens = sqlx::query(
        r#"
        DELETE FROM password_reset_tokens
        WHERE expires_at <= now()
        "#,
    )
    .execute(db)
    .await?
    .rows_affected();

    Ok(ReapCounts {
        sessions,
        reset_tokens,
    })
}

/// Run the reaper every `interval`, forever. Spawned from `main`; a failed
/// sweep is logged and retried on the next tick.
pub async fn run_cleanup_loop(db: PgPool, interval: Duration) {
    loop {
        tokio::time::sleep(interval).await;

        match reap_expired(&db).await {
            Ok(counts) if counts.sessions > 0 || counts.reset_tokens > 0 => {
                info!(
                    sessions = counts.sessions,
                    reset_tokens = counts.reset_tokens,
                    "reaped expired rows"
                );
            }
            Ok(_) => {}
            Err(e) => error!(error = %e, "cleanup sweep failed"),
        }
    }
}
