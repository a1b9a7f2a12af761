// Application state and configuration
use std::sync::Arc;

use crate::{
    db::DieselPool,
    services::{GeocoderClient, ObjectStore},
    RedisPool,
};

// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub diesel_pool: DieselPool,
    pub redis_pool: RedisPool,
    pub geocoder: Arc<GeocoderClient>,
    pub object_store: Arc<dyn ObjectStore>,
    pub max_connections: u32,
}
