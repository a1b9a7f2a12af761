// Photo pipeline: resize on the way in, store through an object store
// abstraction so tests do not need a live storage backend.

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;
use tracing::{info, instrument};

use crate::app_config::StorageConfig;
use crate::utils::image::{resize_image, MAX_PHOTO_DIMENSION};
use crate::utils::service_error::ServiceError;
use crate::utils::share_key::generate_key;

/// Random prefix length in generated object keys
const PHOTO_KEY_RANDOM_LENGTH: usize = 12;

static STORAGE_HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .pool_max_idle_per_host(10)
        .timeout(Duration::from_secs(30))
        .build()
        .expect("Failed to create HTTP client for photo storage")
});

/// Storage backend seam. The production impl talks to a REST object
/// store; tests substitute an in-memory one.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes under `key` and return the public URL
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ServiceError>;

    /// Fetch the raw bytes behind a public URL
    async fn download(&self, url: &str) -> Result<Vec<u8>, ServiceError>;
}

/// Supabase-storage-style REST object store
pub struct HttpObjectStore {
    config: StorageConfig,
}

impl HttpObjectStore {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/object/{}/{}",
            self.config.base_url, self.config.bucket, key
        )
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/object/public/{}/{}",
            self.config.base_url, self.config.bucket, key
        )
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    #[instrument(skip(self, bytes))]
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ServiceError> {
        STORAGE_HTTP_CLIENT
            .post(self.object_url(key))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await?
            .error_for_status()?;

        Ok(self.public_url(key))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ServiceError> {
        let response = STORAGE_HTTP_CLIENT
            .get(url)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.bytes().await?.to_vec())
    }
}

/// Generate an object key, optionally namespaced under an owner prefix
pub fn generate_photo_key(owner_prefix: Option<&str>) -> String {
    let name = format!(
        "{}-{}.jpg",
        generate_key(PHOTO_KEY_RANDOM_LENGTH),
        Utc::now().timestamp_millis()
    );
    match owner_prefix {
        Some(prefix) => format!("{}/{}", prefix, name),
        None => name,
    }
}

/// Resize an uploaded photo and store it, returning the public URL
#[instrument(skip(store, bytes))]
pub async fn store_photo(
    store: &dyn ObjectStore,
    owner_prefix: Option<&str>,
    bytes: &[u8],
) -> Result<String, ServiceError> {
    let resized = resize_image(bytes, MAX_PHOTO_DIMENSION)
        .map_err(|e| ServiceError::ValidationError(format!("Invalid image: {}", e)))?;

    let key = generate_photo_key(owner_prefix);
    let url = store.upload(&key, resized, "image/jpeg").await?;
    info!("Stored photo at {}", url);
    Ok(url)
}

pub mod test_support {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Mutex, PoisonError};

    /// In-memory store substituted for the REST backend in tests
    #[derive(Default)]
    pub struct MemoryObjectStore {
        pub objects: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl MemoryObjectStore {
        pub fn is_empty(&self) -> bool {
            self.objects
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_empty()
        }
    }

    #[async_trait]
    impl ObjectStore for MemoryObjectStore {
        async fn upload(
            &self,
            key: &str,
            bytes: Vec<u8>,
            _content_type: &str,
        ) -> Result<String, ServiceError> {
            let url = format!("memory://photos/{}", key);
            self.objects
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(url.clone(), bytes);
            Ok(url)
        }

        async fn download(&self, url: &str) -> Result<Vec<u8>, ServiceError> {
            self.objects
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(url)
                .cloned()
                .ok_or(ServiceError::NotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::MemoryObjectStore;
    use super::*;
    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, ImageEncoder};

    fn tiny_png() -> Vec<u8> {
        let mut out = Vec::new();
        let pixels = vec![200u8; 8 * 8 * 3];
        PngEncoder::new(&mut out)
            .write_image(&pixels, 8, 8, ExtendedColorType::Rgb8)
            .unwrap();
        out
    }

    #[test]
    fn test_photo_keys_are_unique_and_jpg() {
        let a = generate_photo_key(None);
        let b = generate_photo_key(None);
        assert_ne!(a, b);
        assert!(a.ends_with(".jpg"));
    }

    #[test]
    fn test_photo_key_owner_prefix() {
        let key = generate_photo_key(Some("1f1e9a00"));
        assert!(key.starts_with("1f1e9a00/"));
    }

    #[tokio::test]
    async fn test_store_photo_round_trip() {
        let store = MemoryObjectStore::default();
        let url = store_photo(&store, None, &tiny_png()).await.unwrap();

        assert!(url.starts_with("memory://photos/"));
        let stored = store.download(&url).await.unwrap();
        assert!(!stored.is_empty());
    }

    #[tokio::test]
    async fn test_store_photo_rejects_garbage() {
        let store = MemoryObjectStore::default();
        let result = store_photo(&store, None, b"not an image").await;
        assert!(matches!(result, Err(ServiceError::ValidationError(_))));
    }
}
