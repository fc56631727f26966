use crate::config::AppConfig;
use crate::notify::{LogNotifier, ResetNotifier};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub notifier: Arc<dyn ResetNotifier>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(std::time::Duration::from_secs(5))
            .connect(&config.database_url)
            .await?;

        let notifier = Arc::new(LogNotifier) as Arc<dyn ResetNotifier>;

        Ok(Self {
            db,
            config,
            notifier,
        })
    }

    pub fn from_parts(db: PgPool, config: Arc<AppConfig>, notifier: Arc<dyn ResetNotifier>) -> Self {
        Self {
            db,
            config,
            notifier,
        }
    }
}
