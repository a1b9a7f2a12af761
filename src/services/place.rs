// Place CRUD business logic. Handlers stay thin; all validation,
// ownership checks, and address normalization happen here.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    db::DieselPool,
    models::place::{
        validate_photo_urls, validate_pin_color, CreatePlaceRequest, NewPlace, Place,
        PlaceResponse, UpdatePlace, UpdatePlaceRequest,
    },
    services::geocode::GeocoderClient,
    utils::service_error::ServiceError,
    utils::validation::{trim_and_validate_field, trim_optional_field},
};

pub struct PlaceService {
    diesel_pool: DieselPool,
    geocoder: Arc<GeocoderClient>,
}

impl PlaceService {
    pub fn new(state: &AppState) -> Self {
        Self {
            diesel_pool: state.diesel_pool.clone(),
            geocoder: state.geocoder.clone(),
        }
    }

    /// Load the caller's own places, newest first. Guests own nothing,
    /// so they get an empty set rather than an error.
    #[instrument(skip(self))]
    pub async fn load_own(&self, user_id: Option<Uuid>) -> Result<Vec<Place>, ServiceError> {
        use crate::schema::places::dsl;

        let owner = match user_id {
            Some(id) => id,
            None => return Ok(Vec::new()),
        };

        let mut conn = self.diesel_pool.get().await.map_err(|e| {
            ServiceError::DatabaseError(format!("Failed to get connection: {}", e))
        })?;

        let rows: Vec<Place> = dsl::places
            .filter(dsl::user_id.eq(owner))
            .order(dsl::created_at.desc())
            .load(&mut conn)
            .await?;

        Ok(rows)
    }

    /// Create a place. When the request omits an address the coordinates
    /// are reverse-geocoded before storing, so every row carries a
    /// displayable address (or the explicit placeholder).
    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        user_id: Option<Uuid>,
        request: CreatePlaceRequest,
    ) -> Result<PlaceResponse, ServiceError> {
        let owner = user_id.ok_or(ServiceError::LoginRequired)?;

        request.validate()?;
        validate_pin_color(&request.color).map_err(ServiceError::ValidationError)?;
        validate_photo_urls(&request.photo_urls).map_err(ServiceError::ValidationError)?;
        self.check_account_photo_limit(owner, None, request.photo_urls.len())
            .await?;

        let address = match request.address.filter(|a| !a.trim().is_empty()) {
            Some(address) => address.trim().to_string(),
            None => {
                self.geocoder
                    .reverse_geocode(request.latitude, request.longitude)
                    .await
            },
        };

        let now = Utc::now();
        let new_place = NewPlace {
            id: Uuid::new_v4(),
            user_id: Some(owner),
            name: trim_and_validate_field(&request.name, true)
                .map_err(ServiceError::ValidationError)?,
            address,
            comment: trim_optional_field(request.comment.as_ref()),
            latitude: request.latitude,
            longitude: request.longitude,
            visit_date: request.visit_date,
            rating: request.rating,
            color: request.color,
            photo_urls: request.photo_urls,
            is_public: true,
            created_at: now,
            updated_at: now,
        };

        let mut conn = self.diesel_pool.get().await.map_err(|e| {
            ServiceError::DatabaseError(format!("Failed to get connection: {}", e))
        })?;

        let place: Place = diesel::insert_into(crate::schema::places::table)
            .values(&new_place)
            .get_result(&mut conn)
            .await?;

        info!("Created place {} for user {}", place.id, owner);
        Ok(place.to_response())
    }

    /// Full-row update from the edit modal. Ownership is enforced in the
    /// WHERE clause so a non-owner sees NotFound, never another user's row.
    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        user_id: Option<Uuid>,
        place_id: Uuid,
        request: UpdatePlaceRequest,
    ) -> Result<PlaceResponse, ServiceError> {
        use crate::schema::places::dsl;

        let owner = user_id.ok_or(ServiceError::LoginRequired)?;

        request.validate()?;
        validate_pin_color(&request.color).map_err(ServiceError::ValidationError)?;
        validate_photo_urls(&request.photo_urls).map_err(ServiceError::ValidationError)?;
        self.check_account_photo_limit(owner, Some(place_id), request.photo_urls.len())
            .await?;

        let changes = UpdatePlace {
            name: trim_and_validate_field(&request.name, true)
                .map_err(ServiceError::ValidationError)?,
            address: request.address,
            comment: trim_optional_field(request.comment.as_ref()),
            visit_date: request.visit_date,
            rating: request.rating,
            color: request.color,
            photo_urls: request.photo_urls,
            updated_at: Utc::now(),
        };

        let mut conn = self.diesel_pool.get().await.map_err(|e| {
            ServiceError::DatabaseError(format!("Failed to get connection: {}", e))
        })?;

        let place: Place = diesel::update(
            dsl::places
                .filter(dsl::id.eq(place_id))
                .filter(dsl::user_id.eq(owner)),
        )
        .set(&changes)
        .get_result(&mut conn)
        .await
        .optional()?
        .ok_or(ServiceError::NotFound)?;

        Ok(place.to_response())
    }

    /// Delete a place. Photos in object storage are not garbage-collected
    /// here; orphan cleanup runs out of band.
    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: Option<Uuid>, place_id: Uuid) -> Result<(), ServiceError> {
        use crate::schema::places::dsl;

        let owner = user_id.ok_or(ServiceError::LoginRequired)?;

        let mut conn = self.diesel_pool.get().await.map_err(|e| {
            ServiceError::DatabaseError(format!("Failed to get connection: {}", e))
        })?;

        let deleted = diesel::delete(
            dsl::places
                .filter(dsl::id.eq(place_id))
                .filter(dsl::user_id.eq(owner)),
        )
        .execute(&mut conn)
        .await?;

        if deleted == 0 {
            return Err(ServiceError::NotFound);
        }

        info!("Deleted place {} for user {}", place_id, owner);
        Ok(())
    }

    /// Sidebar visibility toggle; narrow update so it cannot clobber
    /// concurrent edits to other fields.
    #[instrument(skip(self))]
    pub async fn set_visibility(
        &self,
        user_id: Option<Uuid>,
        place_id: Uuid,
        is_public: bool,
    ) -> Result<PlaceResponse, ServiceError> {
        use crate::schema::places::dsl;

        let owner = user_id.ok_or(ServiceError::LoginRequired)?;

        let mut conn = self.diesel_pool.get().await.map_err(|e| {
            ServiceError::DatabaseError(format!("Failed to get connection: {}", e))
        })?;

        let place: Place = diesel::update(
            dsl::places
                .filter(dsl::id.eq(place_id))
                .filter(dsl::user_id.eq(owner)),
        )
        .set((dsl::is_public.eq(is_public), dsl::updated_at.eq(Utc::now())))
        .get_result(&mut conn)
        .await
        .optional()?
        .ok_or(ServiceError::NotFound)?;

        Ok(place.to_response())
    }

    /// Total photos across all of a user's places, for the account cap
    pub async fn photo_count(&self, user_id: Uuid) -> Result<usize, ServiceError> {
        self.photo_count_excluding(user_id, None).await
    }

    async fn photo_count_excluding(
        &self,
        user_id: Uuid,
        exclude: Option<Uuid>,
    ) -> Result<usize, ServiceError> {
        use crate::schema::places::dsl;

        let mut conn = self.diesel_pool.get().await.map_err(|e| {
            ServiceError::DatabaseError(format!("Failed to get connection: {}", e))
        })?;

        let mut query = dsl::places
            .filter(dsl::user_id.eq(user_id))
            .select(dsl::photo_urls)
            .into_boxed();
        if let Some(excluded_id) = exclude {
            query = query.filter(dsl::id.ne(excluded_id));
        }

        let photo_lists: Vec<Vec<String>> = query.load(&mut conn).await?;
        Ok(photo_lists.iter().map(Vec::len).sum())
    }

    /// Account-wide photo ceiling, checked before any write lands
    async fn check_account_photo_limit(
        &self,
        owner: Uuid,
        exclude: Option<Uuid>,
        incoming: usize,
    ) -> Result<(), ServiceError> {
        let existing = self.photo_count_excluding(owner, exclude).await?;
        if existing + incoming > crate::models::place::ACCOUNT_PHOTO_LIMIT {
            return Err(ServiceError::StorageLimitExceeded);
        }
        Ok(())
    }
}
