// Shared test setup: builds a full AppState against the databases named
// in the environment, or returns None so callers can skip.

use std::sync::Arc;

use placemap_core::db::{create_diesel_pool, DieselDatabaseConfig, RedisConfig, RedisPool};
use placemap_core::{AppState, GeocoderClient, HttpObjectStore, ObjectStore};

pub async fn setup_state() -> Option<AppState> {
    dotenv::from_filename(".env.test").ok();
    dotenv::dotenv().ok();

    if std::env::var("DATABASE_URL").is_err() || std::env::var("REDIS_URL").is_err() {
        eprintln!("Skipping test: DATABASE_URL or REDIS_URL not configured");
        return None;
    }
    if std::env::var("IDENTITY_JWT_SECRET").is_err() {
        std::env::set_var(
            "IDENTITY_JWT_SECRET",
            "integration-test-secret-0123456789abcdef",
        );
    }

    let config = placemap_core::app_config::config();

    let db_config = DieselDatabaseConfig::default();
    let max_connections = db_config.max_connections;
    let diesel_pool = match create_diesel_pool(db_config).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: failed to create database pool: {}", e);
            return None;
        },
    };

    let migration_config = placemap_core::migrations::MigrationConfig::default();
    if let Err(e) =
        placemap_core::migrations::run_all_migrations(&diesel_pool, migration_config).await
    {
        eprintln!("Skipping test: migrations failed: {}", e);
        return None;
    }

    let redis_pool = match RedisPool::new(RedisConfig::from_env()).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: failed to connect to Redis: {}", e);
            return None;
        },
    };

    let geocoder = Arc::new(GeocoderClient::new(config.geocoder.clone()));
    let object_store: Arc<dyn ObjectStore> =
        Arc::new(HttpObjectStore::new(config.storage.clone()));

    Some(AppState {
        diesel_pool,
        redis_pool,
        geocoder,
        object_store,
        max_connections,
    })
}
