use std::sync::Arc;

use schoolhub_cache::{CacheConfig, RedisCache};
use schoolhub_config::{CorsConfig, JwtConfig, StorageConfig};
use schoolhub_core::{FileStorage, LocalFileStorage};
use schoolhub_db::{DatabaseConfig, PgPool, init_db_pool};
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub cache: Option<RedisCache>,
    pub file_storage: Arc<dyn FileStorage>,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub storage_config: StorageConfig,
}

impl AppState {
    pub fn new(
        db: PgPool,
        jwt_config: JwtConfig,
        cors_config: CorsConfig,
        storage_config: StorageConfig,
    ) -> Self {
        let file_storage = Arc::new(LocalFileStorage::new(
            storage_config.upload_dir.clone(),
            storage_config.base_url.clone(),
            storage_config.max_upload_bytes,
        ));

        Self {
            db,
            cache: None,
            file_storage,
            jwt_config,
            cors_config,
            storage_config,
        }
    }

    pub fn with_cache(mut self, cache: Option<RedisCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> Option<&RedisCache> {
        self.cache.as_ref()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("cache_enabled", &self.cache.is_some())
            .field("storage_config", &self.storage_config)
            .finish_non_exhaustive()
    }
}

/// Connects to Postgres and, when enabled, Redis.
///
/// A Redis outage only disables caching; the database is required.
pub async fn init_app_state() -> anyhow::Result<AppState> {
    let db_config = DatabaseConfig::from_env()
        .map_err(|e| anyhow::anyhow!("DATABASE_URL must be set: {}", e))?;
    let db = init_db_pool(&db_config).await?;

    let cache_config = CacheConfig::from_env();
    let cache = if cache_config.enabled {
        match RedisCache::connect(&cache_config).await {
            Ok(cache) => {
                info!("Redis cache connected");
                Some(cache)
            }
            Err(e) => {
                warn!(error = %e, "Redis unavailable, continuing without cache");
                None
            }
        }
    } else {
        None
    };

    Ok(AppState::new(
        db,
        JwtConfig::from_env(),
        CorsConfig::from_env(),
        StorageConfig::from_env(),
    )
    .with_cache(cache))
}
