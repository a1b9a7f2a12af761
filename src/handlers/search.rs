// Geocoding endpoints: the search proxy and reverse geocoding

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    app::AppState, middleware::auth_middleware::MaybeUser, utils::service_error::ServiceError,
};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
    /// Monotonic request sequence issued by the caller; used to drop
    /// responses the caller has already superseded, and echoed back
    pub seq: Option<u64>,
}

/// Proxy a text search to the place provider. A request superseded by a
/// newer one from the same caller answers 204 so clients drop it quietly.
/// GET /api/v1/search
pub async fn search_places(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = user.map(|u| u.user_id);
    match state.geocoder.search(&params.query, caller, params.seq).await? {
        Some(results) => {
            Ok(Json(json!({ "seq": params.seq, "results": results })).into_response())
        },
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

#[derive(Debug, Deserialize)]
pub struct ReverseParams {
    pub lat: f64,
    pub lon: f64,
}

/// Reverse-geocode coordinates into a displayable address
/// GET /api/v1/geocode/reverse
pub async fn reverse_geocode(
    State(state): State<AppState>,
    Query(params): Query<ReverseParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let address = state.geocoder.reverse_geocode(params.lat, params.lon).await;
    Ok(Json(json!({ "address": address })))
}
