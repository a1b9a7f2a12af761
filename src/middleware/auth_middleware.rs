// Authentication middleware for protected routes
// Validates JWT tokens and injects AuthenticatedUser into request extensions

use axum::{
    body::Body,
    http::{header, request::Parts, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::middleware::auth::{validate_access_token, AuthenticatedUser};

fn bearer_token(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "success": false,
            "message": message
        })),
    )
        .into_response()
}

/// Middleware for routes that require a signed-in caller
pub async fn auth_middleware(mut request: Request<Body>, next: Next) -> Response {
    let token = match bearer_token(&request) {
        Some(token) => token,
        None => return unauthorized("Missing or invalid authorization header"),
    };

    match validate_access_token(token, &crate::app_config::config().identity) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        },
        Err(e) => {
            tracing::warn!("JWT validation failed: {}", e);
            unauthorized("Invalid or expired token")
        },
    }
}

/// Middleware for routes that serve both guests and signed-in users.
/// A missing header means guest; a present but invalid token is still
/// rejected so a broken client notices instead of silently degrading.
pub async fn optional_auth_middleware(mut request: Request<Body>, next: Next) -> Response {
    if let Some(token) = bearer_token(&request) {
        match validate_access_token(token, &crate::app_config::config().identity) {
            Ok(user) => {
                request.extensions_mut().insert(user);
            },
            Err(e) => {
                tracing::warn!("JWT validation failed: {}", e);
                return unauthorized("Invalid or expired token");
            },
        }
    }
    next.run(request).await
}

/// Extractor for AuthenticatedUser from request extensions
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for AuthenticatedUser {
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "success": false,
                        "message": "Authentication required"
                    })),
                )
            })
    }
}

/// Extractor for routes behind optional auth: guests extract as None
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthenticatedUser>);

impl<S: Send + Sync> axum::extract::FromRequestParts<S> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<AuthenticatedUser>().cloned()))
    }
}
