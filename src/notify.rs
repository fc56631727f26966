use axum::async_trait;
use tracing::info;

/// Out-of-band delivery of password-reset links.
///
/// The auth core only manufactures and records reset tokens; getting the
/// link in front of the user (email, SMS, ...) belongs to whatever
/// implements this trait.
#[async_trait]
pub trait ResetNotifier: Send + Sync {
    async fn send_reset_link(&self, email: &str, reset_url: &str) -> anyhow::Result<()>;
}

/// Development notifier that writes the link to the log instead of sending
/// anything. Swap in a real sender without touching the reset flow.
#[derive(Clone)]
pub struct LogNotifier;

#[async_trait]
impl ResetNotifier for LogNotifier {
    async fn send_reset_link(&self, email: &str, reset_url: &str) -> anyhow::Result<()> {
        info!(email = %email, reset_url = %reset_url, "password reset link (log delivery)");
        Ok(())
    }
}
