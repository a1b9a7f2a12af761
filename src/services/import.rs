// Copy a place from a shared view into the viewer's own set. Imports
// always land private with their own photo copies, so the viewer's map
// never references the source owner's objects.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    app::AppState,
    db::{DieselPool, RedisPool},
    models::place::{
        NewPlace, Place, PlaceResponse, ACCOUNT_PHOTO_LIMIT, PER_PIN_PHOTO_LIMIT,
    },
    models::share::ImportPlaceRequest,
    services::photo::{store_photo, ObjectStore},
    utils::service_error::ServiceError,
};

/// Coordinate tolerance for duplicate detection, roughly 11 meters
const DUPLICATE_COORDINATE_TOLERANCE: f64 = 0.0001;

pub struct ImportService {
    diesel_pool: DieselPool,
    redis_pool: RedisPool,
    object_store: Arc<dyn ObjectStore>,
}

impl ImportService {
    pub fn new(state: &AppState) -> Self {
        Self {
            diesel_pool: state.diesel_pool.clone(),
            redis_pool: state.redis_pool.clone(),
            object_store: state.object_store.clone(),
        }
    }

    /// Import a public place into the viewer's set. The row insert is
    /// all-or-nothing; photo copying afterwards is best effort per photo.
    #[instrument(skip(self, request))]
    pub async fn import_place(
        &self,
        viewer_id: Option<Uuid>,
        request: ImportPlaceRequest,
    ) -> Result<PlaceResponse, ServiceError> {
        let viewer = viewer_id.ok_or(ServiceError::LoginRequired)?;

        let source = self.load_public_source(request.source_place_id).await?;
        let source_owner = source.user_id.ok_or(ServiceError::NotFound)?;

        if source_owner == viewer {
            return Err(ServiceError::ValidationError(
                "Cannot import your own place".to_string(),
            ));
        }

        self.check_not_already_imported(viewer, source_owner, source.id)
            .await?;
        self.check_no_nearby_duplicate(viewer, &source).await?;

        let photos_to_copy = if request.copy_photos {
            source
                .photo_urls
                .iter()
                .take(PER_PIN_PHOTO_LIMIT)
                .cloned()
                .collect()
        } else {
            Vec::new()
        };

        // Pre-flight the account cap before inserting anything so the
        // import fails whole rather than landing half-populated
        if !photos_to_copy.is_empty() {
            let existing = self.account_photo_count(viewer).await?;
            if existing + photos_to_copy.len() > ACCOUNT_PHOTO_LIMIT {
                return Err(ServiceError::StorageLimitExceeded);
            }
        }

        let imported = self.insert_copy(viewer, &source).await?;

        let imported = if photos_to_copy.is_empty() {
            imported
        } else {
            let urls = self.copy_photos(viewer, &photos_to_copy).await;
            self.attach_photos(imported.id, urls).await?
        };

        self.record_import(viewer, source_owner, source.id).await;

        info!(
            "Imported place {} from user {} for user {}",
            source.id, source_owner, viewer
        );
        Ok(imported.to_response())
    }

    /// Source place ids already imported from this owner, for marking
    /// rows in the shared view
    #[instrument(skip(self))]
    pub async fn imported_ids(
        &self,
        viewer_id: Option<Uuid>,
        source_owner: Uuid,
    ) -> Result<Vec<Uuid>, ServiceError> {
        let viewer = viewer_id.ok_or(ServiceError::LoginRequired)?;

        let members = self
            .redis_pool
            .smembers(&import_record_key(viewer, source_owner))
            .await?;

        Ok(members
            .iter()
            .filter_map(|m| Uuid::parse_str(m).ok())
            .collect())
    }

    async fn load_public_source(&self, place_id: Uuid) -> Result<Place, ServiceError> {
        use crate::schema::places::dsl;

        let mut conn = self.diesel_pool.get().await.map_err(|e| {
            ServiceError::DatabaseError(format!("Failed to get connection: {}", e))
        })?;

        let source: Place = dsl::places
            .filter(dsl::id.eq(place_id))
            .first(&mut conn)
            .await
            .optional()?
            .ok_or(ServiceError::NotFound)?;

        if !source.is_public {
            return Err(ServiceError::Forbidden);
        }

        Ok(source)
    }

    async fn check_not_already_imported(
        &self,
        viewer: Uuid,
        source_owner: Uuid,
        source_id: Uuid,
    ) -> Result<(), ServiceError> {
        let key = import_record_key(viewer, source_owner);
        match self.redis_pool.sismember(&key, &source_id.to_string()).await {
            Ok(true) => Err(ServiceError::DuplicatePlace),
            Ok(false) => Ok(()),
            Err(e) => {
                // The coordinate check below still catches duplicates
                warn!("Import record lookup failed for {}: {}", key, e);
                Ok(())
            },
        }
    }

    async fn check_no_nearby_duplicate(
        &self,
        viewer: Uuid,
        source: &Place,
    ) -> Result<(), ServiceError> {
        use crate::schema::places::dsl;

        let mut conn = self.diesel_pool.get().await.map_err(|e| {
            ServiceError::DatabaseError(format!("Failed to get connection: {}", e))
        })?;

        // Coordinate proximity alone decides: the same spot under a
        // different name is still a duplicate
        let duplicates: i64 = dsl::places
            .filter(dsl::user_id.eq(viewer))
            .filter(dsl::latitude.between(
                source.latitude - DUPLICATE_COORDINATE_TOLERANCE,
                source.latitude + DUPLICATE_COORDINATE_TOLERANCE,
            ))
            .filter(dsl::longitude.between(
                source.longitude - DUPLICATE_COORDINATE_TOLERANCE,
                source.longitude + DUPLICATE_COORDINATE_TOLERANCE,
            ))
            .count()
            .get_result(&mut conn)
            .await?;

        if duplicates > 0 {
            return Err(ServiceError::DuplicatePlace);
        }
        Ok(())
    }

    async fn account_photo_count(&self, viewer: Uuid) -> Result<usize, ServiceError> {
        use crate::schema::places::dsl;

        let mut conn = self.diesel_pool.get().await.map_err(|e| {
            ServiceError::DatabaseError(format!("Failed to get connection: {}", e))
        })?;

        let photo_lists: Vec<Vec<String>> = dsl::places
            .filter(dsl::user_id.eq(viewer))
            .select(dsl::photo_urls)
            .load(&mut conn)
            .await?;

        Ok(photo_lists.iter().map(Vec::len).sum())
    }

    /// Insert the copied row: private, no photos yet
    async fn insert_copy(&self, viewer: Uuid, source: &Place) -> Result<Place, ServiceError> {
        let now = Utc::now();
        let copy = NewPlace {
            id: Uuid::new_v4(),
            user_id: Some(viewer),
            name: source.name.clone(),
            address: source.address.clone(),
            comment: source.comment.clone(),
            latitude: source.latitude,
            longitude: source.longitude,
            visit_date: source.visit_date,
            rating: source.rating,
            color: source.color.clone(),
            photo_urls: Vec::new(),
            is_public: false,
            created_at: now,
            updated_at: now,
        };

        let mut conn = self.diesel_pool.get().await.map_err(|e| {
            ServiceError::DatabaseError(format!("Failed to get connection: {}", e))
        })?;

        let place: Place = diesel::insert_into(crate::schema::places::table)
            .values(&copy)
            .get_result(&mut conn)
            .await?;

        Ok(place)
    }

    /// Copy each photo into the viewer's namespace. A photo that fails to
    /// download or re-encode is skipped, not fatal.
    async fn copy_photos(&self, viewer: Uuid, source_urls: &[String]) -> Vec<String> {
        let prefix = viewer.to_string();
        let mut copied = Vec::new();

        for url in source_urls {
            let bytes = match self.object_store.download(url).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Skipping photo {}: download failed: {}", url, e);
                    continue;
                },
            };

            match store_photo(self.object_store.as_ref(), Some(&prefix), &bytes).await {
                Ok(new_url) => copied.push(new_url),
                Err(e) => warn!("Skipping photo {}: copy failed: {}", url, e),
            }
        }

        copied
    }

    async fn attach_photos(
        &self,
        place_id: Uuid,
        photo_urls: Vec<String>,
    ) -> Result<Place, ServiceError> {
        use crate::schema::places::dsl;

        let mut conn = self.diesel_pool.get().await.map_err(|e| {
            ServiceError::DatabaseError(format!("Failed to get connection: {}", e))
        })?;

        let place: Place = diesel::update(dsl::places.filter(dsl::id.eq(place_id)))
            .set((
                dsl::photo_urls.eq(photo_urls),
                dsl::updated_at.eq(Utc::now()),
            ))
            .get_result(&mut conn)
            .await?;

        Ok(place)
    }

    /// Best-effort import record; losing it only re-enables the import
    /// button, the coordinate duplicate check still holds
    async fn record_import(&self, viewer: Uuid, source_owner: Uuid, source_id: Uuid) {
        let key = import_record_key(viewer, source_owner);
        if let Err(e) = self.redis_pool.sadd(&key, &source_id.to_string()).await {
            warn!("Failed to record import in {}: {}", key, e);
        }
    }
}

fn import_record_key(viewer: Uuid, source_owner: Uuid) -> String {
    format!("imported:{}:{}", viewer, source_owner)
}
