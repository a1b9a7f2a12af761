// Share token management and the public resolution endpoint

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    models::share::{CreateShareTokenRequest, ImportPlaceRequest, ShareIdentifier},
    services::{import::ImportService, share::ShareService},
    utils::service_error::ServiceError,
};

/// Mint a share token
/// POST /api/v1/share/tokens
pub async fn create_share_token(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateShareTokenRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let service = ShareService::new(&state);
    let token = service.create_token(Some(user.user_id), request).await?;
    Ok((StatusCode::CREATED, Json(token)))
}

/// List the caller's active share tokens
/// GET /api/v1/share/tokens
pub async fn list_share_tokens(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let service = ShareService::new(&state);
    let tokens = service.list_tokens(Some(user.user_id)).await?;
    Ok(Json(json!({ "tokens": tokens })))
}

/// Deactivate a share token
/// DELETE /api/v1/share/tokens/{id}
pub async fn deactivate_share_token(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(token_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let service = ShareService::new(&state);
    service.deactivate(Some(user.user_id), token_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Query parameters for share resolution. `token` is the current
/// generation; `s` and `shared` are the legacy link parameters, both
/// kept so old URLs in the wild keep working.
#[derive(Debug, Deserialize)]
pub struct ResolveShareParams {
    pub token: Option<String>,
    pub s: Option<String>,
    pub shared: Option<String>,
}

impl ResolveShareParams {
    pub fn into_identifier(self) -> Result<ShareIdentifier, ServiceError> {
        if let Some(token) = self.token.filter(|t| !t.is_empty()) {
            return Ok(ShareIdentifier::Token(token));
        }
        if let Some(key) = self.s.or(self.shared).filter(|k| !k.is_empty()) {
            return Ok(ShareIdentifier::LegacyKey(key));
        }
        Err(ServiceError::ValidationError(
            "Missing share identifier".to_string(),
        ))
    }
}

/// Resolve a share link into the read-only viewer payload; no auth
/// GET /api/v1/share/resolve
pub async fn resolve_share(
    State(state): State<AppState>,
    Query(params): Query<ResolveShareParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let identifier = params.into_identifier()?;
    let service = ShareService::new(&state);
    let resolution = service.resolve(identifier).await?;
    Ok(Json(resolution))
}

/// Import a place from a shared view into the caller's set
/// POST /api/v1/share/import
pub async fn import_place(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<ImportPlaceRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let service = ImportService::new(&state);
    let place = service.import_place(Some(user.user_id), request).await?;
    Ok((StatusCode::CREATED, Json(place)))
}

#[derive(Debug, Deserialize)]
pub struct ImportedParams {
    pub owner: Uuid,
}

/// Source place ids the caller already imported from this owner
/// GET /api/v1/share/imported
pub async fn list_imported(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<ImportedParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let service = ImportService::new(&state);
    let ids = service
        .imported_ids(Some(user.user_id), params.owner)
        .await?;
    Ok(Json(json!({ "imported": ids })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(
        token: Option<&str>,
        s: Option<&str>,
        shared: Option<&str>,
    ) -> ResolveShareParams {
        ResolveShareParams {
            token: token.map(String::from),
            s: s.map(String::from),
            shared: shared.map(String::from),
        }
    }

    #[test]
    fn test_token_param_wins() {
        let identifier = params(Some("abc"), Some("legacy"), None)
            .into_identifier()
            .unwrap();
        assert_eq!(identifier, ShareIdentifier::Token("abc".to_string()));
    }

    #[test]
    fn test_both_legacy_params_accepted() {
        assert_eq!(
            params(None, Some("k1"), None).into_identifier().unwrap(),
            ShareIdentifier::LegacyKey("k1".to_string())
        );
        assert_eq!(
            params(None, None, Some("k2")).into_identifier().unwrap(),
            ShareIdentifier::LegacyKey("k2".to_string())
        );
    }

    #[test]
    fn test_missing_identifier_rejected() {
        assert!(params(None, None, None).into_identifier().is_err());
        assert!(params(Some(""), None, None).into_identifier().is_err());
    }
}
