// Place model - a single saved map pin with its metadata

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::schema::places;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Fixed pin color palette (hex strings, as stored)
pub const PIN_COLORS: [&str; 5] = ["#ef4444", "#f59e0b", "#10b981", "#3b82f6", "#8b5cf6"];

/// Maximum photos attached to a single place
pub const PER_PIN_PHOTO_LIMIT: usize = 10;

/// Global photo ceiling per account
pub const ACCOUNT_PHOTO_LIMIT: usize = 300;

/// Placeholder stored when reverse geocoding fails
pub const ADDRESS_UNAVAILABLE: &str = "Address unavailable";

// =============================================================================
// DATABASE MODELS
// =============================================================================

/// Place record as stored in PostgreSQL
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = places)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Place {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub address: String,
    pub comment: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub visit_date: Option<NaiveDate>,
    pub rating: i32,
    pub color: String,
    pub photo_urls: Vec<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New place for insertion
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = places)]
pub struct NewPlace {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub address: String,
    pub comment: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub visit_date: Option<NaiveDate>,
    pub rating: i32,
    pub color: String,
    pub photo_urls: Vec<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full-row update applied from the edit modal. The client always submits
/// the complete field set, so a cleared comment really clears the column.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = places)]
#[diesel(treat_none_as_null = true)]
pub struct UpdatePlace {
    pub name: String,
    pub address: String,
    pub comment: Option<String>,
    pub visit_date: Option<NaiveDate>,
    pub rating: i32,
    pub color: String,
    pub photo_urls: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// REQUEST/RESPONSE DTOs
// =============================================================================

/// Request to create a place (map click or search-result action)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePlaceRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    /// Canonical address. When absent the server reverse-geocodes the
    /// coordinates before storing.
    pub address: Option<String>,

    #[validate(length(max = 2000, message = "Comment must be less than 2000 characters"))]
    pub comment: Option<String>,

    pub latitude: f64,
    pub longitude: f64,

    pub visit_date: Option<NaiveDate>,

    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    pub color: String,

    #[serde(default)]
    pub photo_urls: Vec<String>,
}

/// Request to update a place. The edit modal resubmits every field.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdatePlaceRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    pub address: String,

    #[validate(length(max = 2000, message = "Comment must be less than 2000 characters"))]
    pub comment: Option<String>,

    pub visit_date: Option<NaiveDate>,

    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    pub color: String,

    #[serde(default)]
    pub photo_urls: Vec<String>,
}

/// Narrow request for the sidebar visibility toggle
#[derive(Debug, Clone, Deserialize)]
pub struct SetVisibilityRequest {
    pub is_public: bool,
}

/// Place DTO for API responses
#[derive(Debug, Clone, Serialize)]
pub struct PlaceResponse {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub comment: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub visit_date: Option<NaiveDate>,
    pub rating: i32,
    pub color: String,
    pub photo_urls: Vec<String>,
    pub is_public: bool,
    /// Derived "{country}, {city}" group header for the sidebar list
    pub category: String,
    pub created_at: DateTime<Utc>,
}

impl Place {
    pub fn to_response(&self) -> PlaceResponse {
        PlaceResponse {
            id: self.id,
            name: self.name.clone(),
            address: self.address.clone(),
            comment: self.comment.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            visit_date: self.visit_date,
            rating: self.rating,
            color: self.color.clone(),
            photo_urls: self.photo_urls.clone(),
            is_public: self.is_public,
            category: crate::services::filter::category_key(&self.address),
            created_at: self.created_at,
        }
    }
}

/// Validate a hex color against the fixed palette
pub fn validate_pin_color(color: &str) -> Result<(), String> {
    if PIN_COLORS.contains(&color) {
        Ok(())
    } else {
        Err(format!("Unknown pin color: {}", color))
    }
}

/// Validate the per-pin photo cap
pub fn validate_photo_urls(photo_urls: &[String]) -> Result<(), String> {
    if photo_urls.len() > PER_PIN_PHOTO_LIMIT {
        return Err(format!(
            "A place can hold at most {} photos",
            PER_PIN_PHOTO_LIMIT
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_accepts_known_colors() {
        for color in PIN_COLORS {
            assert!(validate_pin_color(color).is_ok());
        }
    }

    #[test]
    fn test_palette_rejects_unknown_color() {
        assert!(validate_pin_color("#123456").is_err());
        assert!(validate_pin_color("red").is_err());
    }

    #[test]
    fn test_rating_bounds_are_enforced() {
        let mut request = CreatePlaceRequest {
            name: "Blue Cafe".to_string(),
            address: None,
            comment: None,
            latitude: 37.5665,
            longitude: 126.978,
            visit_date: None,
            rating: 0,
            color: "#ef4444".to_string(),
            photo_urls: vec![],
        };
        assert!(request.validate().is_err());

        request.rating = 6;
        assert!(request.validate().is_err());

        request.rating = 3;
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_photo_cap() {
        let urls: Vec<String> = (0..11).map(|i| format!("https://p/{}.jpg", i)).collect();
        assert!(validate_photo_urls(&urls).is_err());
        assert!(validate_photo_urls(&urls[..10]).is_ok());
    }
}
