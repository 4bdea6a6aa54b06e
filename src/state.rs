use crate::auth::repo::{MemoryUserRepo, PgUserRepo, UserRepo};
use crate::config::AppConfig;
use crate::db;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepo>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let users = match config.database_url.as_deref() {
            Some(url) => {
                let pool = db::connect(url, config.db_max_connections).await?;
                db::migrate(&pool).await;
                Arc::new(PgUserRepo::new(pool)) as Arc<dyn UserRepo>
            }
            None => {
                warn!("DATABASE_URL not set; using in-memory user store");
                Arc::new(MemoryUserRepo::new()) as Arc<dyn UserRepo>
            }
        };

        Ok(Self::with_repo(config, users))
    }

    pub fn with_repo(config: Arc<AppConfig>, users: Arc<dyn UserRepo>) -> Self {
        Self { config, users }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::with_repo(
            Arc::new(AppConfig::for_tests()),
            Arc::new(MemoryUserRepo::new()),
        )
    }
}
