// Settings endpoints: pin label overrides and UI preferences

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    middleware::auth_middleware::MaybeUser,
    models::pin_setting::SavePinSettingsRequest,
    services::settings::{SettingsService, UiPreferences},
    utils::service_error::ServiceError,
};

/// The caller's pin label overrides; empty for guests
/// GET /api/v1/settings/pins
pub async fn get_pin_labels(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> Result<impl IntoResponse, ServiceError> {
    let service = SettingsService::new(&state);
    let labels = service.get_pin_labels(user.map(|u| u.user_id)).await?;
    Ok(Json(json!({ "labels": labels })))
}

/// Batch-save pin label overrides
/// PUT /api/v1/settings/pins
pub async fn save_pin_labels(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<SavePinSettingsRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let service = SettingsService::new(&state);
    let labels = service.save_pin_labels(Some(user.user_id), request).await?;
    Ok(Json(json!({ "labels": labels })))
}

/// UI preferences; defaults for guests
/// GET /api/v1/settings/preferences
pub async fn get_preferences(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> Result<impl IntoResponse, ServiceError> {
    let service = SettingsService::new(&state);
    let preferences = service.get_preferences(user.map(|u| u.user_id)).await?;
    Ok(Json(preferences))
}

/// Save UI preferences
/// PUT /api/v1/settings/preferences
pub async fn save_preferences(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(preferences): Json<UiPreferences>,
) -> Result<impl IntoResponse, ServiceError> {
    let service = SettingsService::new(&state);
    let saved = service
        .save_preferences(Some(user.user_id), preferences)
        .await?;
    Ok(Json(saved))
}
