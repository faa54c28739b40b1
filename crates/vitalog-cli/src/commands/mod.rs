pub mod checkin;
pub mod run;
pub mod streak;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use vitalog_core::{
    CheckInSource, EngineConfig, FetchError, PersistError, RestStore, SqliteStore, StoreBackend,
    StreakState, StreakStore,
};

/// The configured store backend, opened and ready.
pub enum Backend {
    Rest(RestStore),
    Sqlite(SqliteStore),
}

impl Backend {
    /// Open the backend named in the configuration. REST credentials come
    /// from the environment and their absence is fatal here, before any
    /// user is touched.
    pub fn open(config: &EngineConfig) -> Result<Self, Box<dyn std::error::Error>> {
        match config.store.backend {
            StoreBackend::Rest => {
                let (url, key) = config.rest_credentials()?;
                Ok(Backend::Rest(RestStore::new(url, key)))
            }
            StoreBackend::Sqlite => {
                let store = SqliteStore::open(config.sqlite_path()?)?;
                Ok(Backend::Sqlite(store))
            }
        }
    }
}

#[async_trait]
impl CheckInSource for Backend {
    async fn fetch_check_ins(&self, user_id: &str) -> Result<Vec<DateTime<Utc>>, FetchError> {
        match self {
            Backend::Rest(store) => store.fetch_check_ins(user_id).await,
            Backend::Sqlite(store) => store.fetch_check_ins(user_id).await,
        }
    }
}

#[async_trait]
impl StreakStore for Backend {
    async fn list_users(&self) -> Result<Vec<String>, FetchError> {
        match self {
            Backend::Rest(store) => store.list_users().await,
            Backend::Sqlite(store) => store.list_users().await,
        }
    }

    async fn load_streak(&self, user_id: &str) -> Result<Option<StreakState>, FetchError> {
        match self {
            Backend::Rest(store) => store.load_streak(user_id).await,
            Backend::Sqlite(store) => store.load_streak(user_id).await,
        }
    }

    async fn upsert_streak(&self, user_id: &str, state: &StreakState) -> Result<(), PersistError> {
        match self {
            Backend::Rest(store) => store.upsert_streak(user_id, state).await,
            Backend::Sqlite(store) => store.upsert_streak(user_id, state).await,
        }
    }
}
