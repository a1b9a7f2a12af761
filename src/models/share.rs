// Sharing entities: expiring/revocable share tokens plus the legacy
// permanently-valid shared links kept for read compatibility

use chrono::{DateTime, TimeZone, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::place::PlaceResponse;
use crate::schema::{share_tokens, shared_links};

// =============================================================================
// DATABASE MODELS
// =============================================================================

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = share_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ShareToken {
    pub id: Uuid,
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub place_ids: Option<Vec<Uuid>>,
    pub is_active: bool,
    pub access_count: i32,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = share_tokens)]
pub struct NewShareToken {
    pub id: Uuid,
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub place_ids: Option<Vec<Uuid>>,
    pub is_active: bool,
    pub access_count: i32,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Legacy share row: no expiry, no active flag, snapshot always present
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = shared_links)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SharedLink {
    pub id: Uuid,
    pub share_key: String,
    pub user_id: Uuid,
    pub place_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// EXPIRATION
// =============================================================================

/// Expiration class chosen at token creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpirationClass {
    #[serde(rename = "24h")]
    Hours24,
    #[serde(rename = "7d")]
    Days7,
    #[serde(rename = "30d")]
    Days30,
    #[serde(rename = "never")]
    Never,
}

impl ExpirationClass {
    /// Concrete expiry for a token created at `now`. "Never" is encoded
    /// as a fixed far-future sentinel rather than a NULL column.
    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            ExpirationClass::Hours24 => now + chrono::Duration::hours(24),
            ExpirationClass::Days7 => now + chrono::Duration::days(7),
            ExpirationClass::Days30 => now + chrono::Duration::days(30),
            ExpirationClass::Never => never_expires_sentinel(),
        }
    }
}

/// The "never expires" sentinel (end of year 2099)
pub fn never_expires_sentinel() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2099, 12, 31, 23, 59, 59).unwrap()
}

// =============================================================================
// REQUEST/RESPONSE DTOs
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateShareTokenRequest {
    pub expiration: ExpirationClass,

    /// The caller's currently filtered visible set ("share what I see").
    /// Empty or absent means "all of my public places at access time".
    #[serde(default)]
    pub place_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShareTokenResponse {
    pub id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub access_count: i32,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Whether the token carries a static snapshot or resolves dynamically
    pub is_snapshot: bool,
}

impl ShareToken {
    pub fn to_response(&self) -> ShareTokenResponse {
        ShareTokenResponse {
            id: self.id,
            token: self.token.clone(),
            expires_at: self.expires_at,
            is_active: self.is_active,
            access_count: self.access_count,
            last_accessed_at: self.last_accessed_at,
            created_at: self.created_at,
            is_snapshot: self.place_ids.is_some(),
        }
    }
}

/// Identifier variants accepted by the share resolution endpoint. Which
/// URL parameter is present selects the variant; new code never
/// special-cases the legacy path beyond this one dispatch point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareIdentifier {
    Token(String),
    LegacyKey(String),
}

/// Resolved read-only snapshot handed to the viewer ("shared mode")
#[derive(Debug, Clone, Serialize)]
pub struct ShareResolutionResponse {
    pub owner_nickname: String,
    pub read_only: bool,
    pub places: Vec<PlaceResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportPlaceRequest {
    pub source_place_id: Uuid,

    #[serde(default)]
    pub copy_photos: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiration_classes_map_to_durations() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();

        assert_eq!(
            ExpirationClass::Hours24.expires_at(now),
            now + chrono::Duration::hours(24)
        );
        assert_eq!(
            ExpirationClass::Days7.expires_at(now),
            now + chrono::Duration::days(7)
        );
        assert_eq!(
            ExpirationClass::Days30.expires_at(now),
            now + chrono::Duration::days(30)
        );
        assert_eq!(
            ExpirationClass::Never.expires_at(now),
            never_expires_sentinel()
        );
    }

    #[test]
    fn test_expiration_class_wire_names() {
        assert_eq!(
            serde_json::from_str::<ExpirationClass>("\"24h\"").unwrap(),
            ExpirationClass::Hours24
        );
        assert_eq!(
            serde_json::from_str::<ExpirationClass>("\"never\"").unwrap(),
            ExpirationClass::Never
        );
        assert!(serde_json::from_str::<ExpirationClass>("\"1y\"").is_err());
    }

    #[test]
    fn test_sentinel_is_far_future() {
        assert!(never_expires_sentinel() > Utc::now());
    }
}
