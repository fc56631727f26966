use anyhow::Context;
use serde::Deserialize;

/// Session issuance settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub ttl_days: i64,
    pub cookie_secure: bool,
}

impl SessionConfig {
    pub fn ttl(&self) -> time::Duration {
        time::Duration::days(self.ttl_days)
    }
}

/// Password-reset token settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ResetConfig {
    pub ttl_minutes: i64,
    /// Base URL the reset link is built against, e.g. `https://app.example.com`.
    pub link_base: String,
}

impl ResetConfig {
    pub fn ttl(&self) -> time::Duration {
        time::Duration::minutes(self.ttl_minutes)
    }

    pub fn reset_url(&self, token: &str) -> String {
        format!(
            "{}/reset-password?token={}",
            self.link_base.trim_end_matches('/'),
            token
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub session: SessionConfig,
    pub reset: ResetConfig,
    /// Seconds between expired-row sweeps; 0 disables the background job.
    pub cleanup_interval_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        // Secure cookies default on in production, off for local development.
        let cookie_secure = std::env::var("COOKIE_SECURE")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or_else(|| {
                std::env::var("APP_ENV").map(|v| v == "production").unwrap_or(false)
            });

        let session = SessionConfig {
            ttl_days: std::env::var("SESSION_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(7),
            cookie_secure,
        };

        let reset = ResetConfig {
            ttl_minutes: std::env::var("RESET_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            link_base: std::env::var("RESET_LINK_BASE")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
        };

        let cleanup_interval_secs = std::env::var("CLEANUP_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(3600);

        Ok(Self {
            database_url,
            session,
            reset,
            cleanup_interval_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Env vars are process-global; serialize tests that touch them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for var in [
            "DATABASE_URL",
            "SESSION_TTL_DAYS",
            "COOKIE_SECURE",
            "APP_ENV",
            "RESET_TTL_MINUTES",
            "RESET_LINK_BASE",
            "CLEANUP_INTERVAL_SECS",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("DATABASE_URL", "postgres://localhost/doorkeep");

        let config = AppConfig::from_env().expect("config should load");
        assert_eq!(config.session.ttl_days, 7);
        assert!(!config.session.cookie_secure);
        assert_eq!(config.reset.ttl_minutes, 60);
        assert_eq!(config.reset.link_base, "http://localhost:8080");
        assert_eq!(config.cleanup_interval_secs, 3600);

        clear_env();
    }

    #[test]
    fn test_missing_database_url_fails() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        assert!(AppConfig::from_env().is_err());
    }

    #[test]
    fn test_production_enables_secure_cookie() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("DATABASE_URL", "postgres://localhost/doorkeep");
        std::env::set_var("APP_ENV", "production");

        let config = AppConfig::from_env().expect("config should load");
        assert!(config.session.cookie_secure);

        clear_env();
    }

    #[test]
    fn test_reset_url_joins_cleanly() {
        let reset = ResetConfig {
            ttl_minutes: 60,
            link_base: "https://app.example.com/".into(),
        };
        assert_eq!(
            reset.reset_url("abc123"),
            "https://app.example.com/reset-password?token=abc123"
        );
    }
}
