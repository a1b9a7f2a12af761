// Geocoding collaborators: reverse geocoding for pin addresses and the
// text search proxy used by the search box.

use once_cell::sync::Lazy;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::app_config::GeocoderConfig;
use crate::models::place::ADDRESS_UNAVAILABLE;
use crate::utils::service_error::ServiceError;

// Shared HTTP client with connection pooling
static GEOCODER_HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(30))
        .timeout(Duration::from_secs(5))
        .build()
        .expect("Failed to create HTTP client for geocoding")
});

/// One search-proxy result row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceSearchResult {
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Coarse place kind from the upstream provider, e.g. "restaurant"
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReverseGeocodeBody {
    address: Option<ReverseGeocodeAddress>,
}

#[derive(Debug, Deserialize)]
struct ReverseGeocodeAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    county: Option<String>,
    suburb: Option<String>,
    borough: Option<String>,
    city_district: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Serialize)]
struct SearchTextBody<'a> {
    #[serde(rename = "textQuery")]
    text_query: &'a str,
    #[serde(rename = "languageCode")]
    language_code: &'a str,
    #[serde(rename = "maxResultCount")]
    max_result_count: u8,
}

#[derive(Debug, Deserialize)]
struct SearchTextResponse {
    #[serde(default)]
    places: Vec<SearchTextPlace>,
}

#[derive(Debug, Deserialize)]
struct SearchTextPlace {
    #[serde(rename = "displayName")]
    display_name: Option<SearchTextDisplayName>,
    #[serde(rename = "formattedAddress")]
    formatted_address: Option<String>,
    location: Option<SearchTextLocation>,
    #[serde(rename = "primaryType")]
    primary_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchTextDisplayName {
    text: String,
}

#[derive(Debug, Deserialize)]
struct SearchTextLocation {
    latitude: f64,
    longitude: f64,
}

/// Newest search sequence issued by each caller. A response that
/// finishes after its caller issued a higher sequence is stale; one
/// caller's searches never invalidate another's.
#[derive(Default)]
pub struct SearchSequences {
    latest: Mutex<HashMap<Uuid, u64>>,
}

impl SearchSequences {
    /// Record `seq` as issued by `caller`; older values never overwrite
    /// newer ones, so out-of-order arrivals are harmless.
    pub fn register(&self, caller: Uuid, seq: u64) {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = latest.entry(caller).or_insert(seq);
        if *entry < seq {
            *entry = seq;
        }
    }

    /// Whether `seq` is still the newest sequence this caller issued
    pub fn is_current(&self, caller: Uuid, seq: u64) -> bool {
        let latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        latest.get(&caller).map_or(true, |&newest| seq >= newest)
    }
}

/// Client for both geocoding collaborators. Tracks search sequences per
/// caller so overlapping searches from one caller resolve in order
/// without interfering with anyone else's.
pub struct GeocoderClient {
    config: GeocoderConfig,
    sequences: SearchSequences,
}

impl GeocoderClient {
    pub fn new(config: GeocoderConfig) -> Self {
        Self {
            config,
            sequences: SearchSequences::default(),
        }
    }

    /// Reverse-geocode coordinates into the canonical "City District,
    /// Country" address form. Failures degrade to a placeholder rather
    /// than blocking pin creation.
    #[instrument(skip(self))]
    pub async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> String {
        match self.try_reverse_geocode(latitude, longitude).await {
            Ok(address) => address,
            Err(e) => {
                warn!("Reverse geocoding failed, using placeholder: {}", e);
                ADDRESS_UNAVAILABLE.to_string()
            },
        }
    }

    async fn try_reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<String, ServiceError> {
        let response = GEOCODER_HTTP_CLIENT
            .get(&self.config.reverse_url)
            .query(&[
                ("format", "json"),
                ("lat", &latitude.to_string()),
                ("lon", &longitude.to_string()),
            ])
            .header("Accept-Language", "en")
            .header("User-Agent", &self.config.user_agent)
            .send()
            .await?
            .error_for_status()?;

        let body: ReverseGeocodeBody = response.json().await.map_err(|e| {
            ServiceError::UpstreamError(format!("Malformed reverse geocode response: {}", e))
        })?;

        Ok(canonical_address(body.address))
    }

    /// Proxy a free-text place search to the upstream provider. When the
    /// caller supplies a sequence number, a response superseded by one of
    /// that caller's newer searches comes back as None. Anonymous callers
    /// get no server-side staleness guard.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        query: &str,
        caller: Option<Uuid>,
        seq: Option<u64>,
    ) -> Result<Option<Vec<PlaceSearchResult>>, ServiceError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ServiceError::ValidationError(
                "Search query must not be empty".to_string(),
            ));
        }
        if self.config.search_api_key.is_empty() {
            return Err(ServiceError::UpstreamError(
                "Place search is not configured".to_string(),
            ));
        }

        let ticket = match (caller, seq) {
            (Some(caller), Some(seq)) => {
                self.sequences.register(caller, seq);
                Some((caller, seq))
            },
            _ => None,
        };

        let response = GEOCODER_HTTP_CLIENT
            .post(&self.config.search_url)
            .header("Content-Type", "application/json")
            .header("X-Goog-Api-Key", &self.config.search_api_key)
            .header(
                "X-Goog-FieldMask",
                "places.displayName,places.formattedAddress,places.location,places.primaryType",
            )
            .json(&SearchTextBody {
                text_query: query,
                language_code: "en",
                max_result_count: 10,
            })
            .send()
            .await?
            .error_for_status()?;

        let body: SearchTextResponse = response.json().await.map_err(|e| {
            ServiceError::UpstreamError(format!("Malformed search response: {}", e))
        })?;

        // Drop the response if this caller issued a newer search meanwhile
        if let Some((caller, seq)) = ticket {
            if !self.sequences.is_current(caller, seq) {
                return Ok(None);
            }
        }

        let results = body
            .places
            .into_iter()
            .filter_map(|p| {
                let location = p.location?;
                Some(PlaceSearchResult {
                    name: p.display_name.map(|d| d.text).unwrap_or_default(),
                    address: p.formatted_address.unwrap_or_default(),
                    latitude: location.latitude,
                    longitude: location.longitude,
                    kind: p.primary_type,
                })
            })
            .collect();

        Ok(Some(results))
    }
}

/// Assemble "City District, Country" from reverse geocode components,
/// dropping whichever parts are missing.
fn canonical_address(address: Option<ReverseGeocodeAddress>) -> String {
    let address = match address {
        Some(a) => a,
        None => return ADDRESS_UNAVAILABLE.to_string(),
    };

    let city = address
        .city
        .or(address.town)
        .or(address.village)
        .or(address.county);
    let district = address
        .suburb
        .or(address.borough)
        .or(address.city_district);

    let locality = match (city, district) {
        (Some(city), Some(district)) => format!("{} {}", city, district),
        (Some(city), None) => city,
        (None, Some(district)) => district,
        (None, None) => String::new(),
    };

    match (locality.is_empty(), address.country) {
        (false, Some(country)) => format!("{}, {}", locality, country),
        (false, None) => locality,
        (true, Some(country)) => country,
        (true, None) => ADDRESS_UNAVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(
        city: Option<&str>,
        district: Option<&str>,
        country: Option<&str>,
    ) -> ReverseGeocodeAddress {
        ReverseGeocodeAddress {
            city: city.map(String::from),
            town: None,
            village: None,
            county: None,
            suburb: district.map(String::from),
            borough: None,
            city_district: None,
            country: country.map(String::from),
        }
    }

    #[test]
    fn test_canonical_address_full() {
        let result = canonical_address(Some(address(
            Some("Seoul"),
            Some("Jongno"),
            Some("South Korea"),
        )));
        assert_eq!(result, "Seoul Jongno, South Korea");
    }

    #[test]
    fn test_canonical_address_without_district() {
        let result = canonical_address(Some(address(Some("Paris"), None, Some("France"))));
        assert_eq!(result, "Paris, France");
    }

    #[test]
    fn test_canonical_address_without_country() {
        let result = canonical_address(Some(address(Some("Seoul"), Some("Jongno"), None)));
        assert_eq!(result, "Seoul Jongno");
    }

    #[test]
    fn test_canonical_address_empty_falls_back() {
        assert_eq!(canonical_address(None), ADDRESS_UNAVAILABLE);
        assert_eq!(
            canonical_address(Some(address(None, None, None))),
            ADDRESS_UNAVAILABLE
        );
    }

    #[test]
    fn test_town_used_when_city_missing() {
        let addr = ReverseGeocodeAddress {
            city: None,
            town: Some("Gapyeong".to_string()),
            village: None,
            county: None,
            suburb: None,
            borough: None,
            city_district: None,
            country: Some("South Korea".to_string()),
        };
        assert_eq!(canonical_address(Some(addr)), "Gapyeong, South Korea");
    }

    #[test]
    fn test_search_sequences_are_scoped_per_caller() {
        let sequences = SearchSequences::default();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        sequences.register(first, 1);
        sequences.register(second, 2);

        // Another caller's newer search never invalidates this one
        assert!(sequences.is_current(first, 1));
        assert!(sequences.is_current(second, 2));
    }

    #[test]
    fn test_newer_sequence_supersedes_older() {
        let sequences = SearchSequences::default();
        let caller = Uuid::new_v4();

        sequences.register(caller, 1);
        sequences.register(caller, 2);

        assert!(!sequences.is_current(caller, 1));
        assert!(sequences.is_current(caller, 2));
    }

    #[test]
    fn test_out_of_order_register_keeps_newest() {
        let sequences = SearchSequences::default();
        let caller = Uuid::new_v4();

        sequences.register(caller, 5);
        sequences.register(caller, 3);

        assert!(!sequences.is_current(caller, 3));
        assert!(sequences.is_current(caller, 5));
    }

    #[test]
    fn test_unknown_caller_is_always_current() {
        let sequences = SearchSequences::default();
        assert!(sequences.is_current(Uuid::new_v4(), 1));
    }

    #[test]
    fn test_search_result_serializes_expected_shape() {
        let result = PlaceSearchResult {
            name: "Blue Cafe".to_string(),
            address: "Seoul Jongno, South Korea".to_string(),
            latitude: 37.5665,
            longitude: 126.978,
            kind: Some("cafe".to_string()),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["name"], "Blue Cafe");
        assert_eq!(json["kind"], "cafe");
    }
}
