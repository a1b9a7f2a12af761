// Identity claims for bearer tokens minted by the external identity
// provider. This service only validates; it never issues tokens.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_config::IdentityConfig;

/// Authenticated user information extracted from a validated JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub exp: u64,
}

/// Claims layout of the identity provider's access tokens
#[derive(Debug, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: String,
    pub exp: u64,
    #[serde(default)]
    pub aud: Option<String>,
    #[serde(default)]
    pub iss: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Token subject is not a valid user id")]
    InvalidSubject,
}

/// Validate a bearer token and extract the caller identity
pub fn validate_access_token(
    token: &str,
    identity: &IdentityConfig,
) -> Result<AuthenticatedUser, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[identity.audience.as_str()]);
    validation.set_issuer(&[identity.issuer.as_str()]);

    let data = decode::<AccessTokenClaims>(
        token,
        &DecodingKey::from_secret(identity.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|_| AuthError::InvalidToken)?;

    let user_id = Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::InvalidSubject)?;

    Ok(AuthenticatedUser {
        user_id,
        exp: data.claims.exp,
    })
}
