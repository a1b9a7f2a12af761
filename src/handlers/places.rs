// Place CRUD endpoints plus the photo upload that feeds them

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    middleware::auth_middleware::MaybeUser,
    models::place::{CreatePlaceRequest, SetVisibilityRequest, UpdatePlaceRequest},
    services::{
        filter::{apply_filters, PlaceFilter},
        photo::store_photo,
        place::PlaceService,
    },
    utils::service_error::ServiceError,
};

/// List the caller's places, filtered and grouped
/// GET /api/v1/places
pub async fn list_places(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(filter): Query<PlaceFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let service = PlaceService::new(&state);
    let rows = service.load_own(user.map(|u| u.user_id)).await?;

    let visible: Vec<_> = apply_filters(&rows, &filter)
        .iter()
        .map(|p| p.to_response())
        .collect();

    Ok(Json(json!({ "places": visible })))
}

/// Create a place
/// POST /api/v1/places
pub async fn create_place(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreatePlaceRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let service = PlaceService::new(&state);
    let place = service.create(Some(user.user_id), request).await?;
    Ok((StatusCode::CREATED, Json(place)))
}

/// Update a place (full row)
/// PUT /api/v1/places/{id}
pub async fn update_place(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(place_id): Path<Uuid>,
    Json(request): Json<UpdatePlaceRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let service = PlaceService::new(&state);
    let place = service.update(Some(user.user_id), place_id, request).await?;
    Ok(Json(place))
}

/// Delete a place
/// DELETE /api/v1/places/{id}
pub async fn delete_place(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(place_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let service = PlaceService::new(&state);
    service.delete(Some(user.user_id), place_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Toggle sharing visibility for one place
/// PUT /api/v1/places/{id}/visibility
pub async fn set_place_visibility(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(place_id): Path<Uuid>,
    Json(request): Json<SetVisibilityRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let service = PlaceService::new(&state);
    let place = service
        .set_visibility(Some(user.user_id), place_id, request.is_public)
        .await?;
    Ok(Json(place))
}

/// Upload a photo; the response URL goes into a place's photo list
/// POST /api/v1/photos
pub async fn upload_photo(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: Bytes,
) -> Result<impl IntoResponse, ServiceError> {
    if body.is_empty() {
        return Err(ServiceError::ValidationError(
            "Photo body must not be empty".to_string(),
        ));
    }

    let prefix = user.user_id.to_string();
    let url = store_photo(state.object_store.as_ref(), Some(&prefix), &body).await?;
    Ok((StatusCode::CREATED, Json(json!({ "url": url }))))
}
