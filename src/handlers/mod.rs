// HTTP handlers for the place store API

pub mod places;
pub mod profile;
pub mod search;
pub mod settings;
pub mod share;

use crate::app::AppState;
use crate::middleware::auth_middleware::{auth_middleware, optional_auth_middleware};
use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};

/// Routes that serve guests as well as signed-in users. Auth is
/// optional: a valid bearer token personalizes the response.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/places", get(places::list_places))
        .route("/settings/pins", get(settings::get_pin_labels))
        .route("/settings/preferences", get(settings::get_preferences))
        .route("/search", get(search::search_places))
        .layer(axum_middleware::from_fn(optional_auth_middleware))
        // Fully anonymous endpoints
        .route("/share/resolve", get(share::resolve_share))
        .route("/geocode/reverse", get(search::reverse_geocode))
}

/// Routes that require a signed-in caller
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/places", post(places::create_place))
        .route("/places/{id}", put(places::update_place))
        .route("/places/{id}", delete(places::delete_place))
        .route("/places/{id}/visibility", put(places::set_place_visibility))
        .route("/photos", post(places::upload_photo))
        .route("/share/tokens", post(share::create_share_token))
        .route("/share/tokens", get(share::list_share_tokens))
        .route("/share/tokens/{id}", delete(share::deactivate_share_token))
        .route("/share/import", post(share::import_place))
        .route("/share/imported", get(share::list_imported))
        .route("/profile", get(profile::get_profile))
        .route("/profile", put(profile::update_nickname))
        .route("/settings/pins", put(settings::save_pin_labels))
        .route("/settings/preferences", put(settings::save_preferences))
        .layer(axum_middleware::from_fn(auth_middleware))
}
