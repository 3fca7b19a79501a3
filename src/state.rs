use std::sync::Arc;

use time::OffsetDateTime;

use crate::config::AppConfig;
use crate::schedule::Moment;
use crate::store::{MemoryStore, PgStore, Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = match &config.database_url {
            Some(url) => {
                let pg = PgStore::connect(url, config.max_connections).await?;
                pg.migrate().await?;
                tracing::info!("using postgres store");
                Arc::new(pg) as Arc<dyn Store>
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory store, data is lost on exit");
                Arc::new(MemoryStore::new()) as Arc<dyn Store>
            }
        };

        Ok(Self::from_parts(store, config))
    }

    pub fn from_parts(store: Arc<dyn Store>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    /// Current campus time.
    pub fn now(&self) -> Moment {
        Moment::new(OffsetDateTime::now_utc().to_offset(self.config.utc_offset))
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::fake_with_store(Arc::new(MemoryStore::new()))
    }

    #[cfg(test)]
    pub fn fake_with_store(store: Arc<dyn Store>) -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            max_connections: 1,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
            },
            utc_offset: time::UtcOffset::UTC,
            attendance: crate::config::AttendancePolicy::default(),
        });
        Self::from_parts(store, config)
    }
}
