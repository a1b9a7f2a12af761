// Profile endpoints

use axum::{extract::State, response::IntoResponse, Json};

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    models::profile::UpdateNicknameRequest,
    services::profile::ProfileService,
    utils::service_error::ServiceError,
};

/// Fetch (lazily creating) the caller's profile
/// GET /api/v1/profile
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let service = ProfileService::new(&state);
    let profile = service.get_or_create(Some(user.user_id)).await?;
    Ok(Json(profile))
}

/// Change the caller's nickname
/// PUT /api/v1/profile
pub async fn update_nickname(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<UpdateNicknameRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let service = ProfileService::new(&state);
    let profile = service.update_nickname(Some(user.user_id), request).await?;
    Ok(Json(profile))
}
