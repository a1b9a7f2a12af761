// Filter engine: pure predicates over the in-memory place set.
// Deterministic and side-effect free; everything here is unit-testable
// without a database.

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::models::place::Place;

/// Group header used when the address carries no comma-separated country
pub const NO_COUNTRY_PLACEHOLDER: &str = "No country info";

/// Group header used when the address is empty
pub const OTHER_PLACEHOLDER: &str = "Other";

/// Filter predicates combined with logical AND. Field renames match
/// the query-string names the client sends.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceFilter {
    /// Case-insensitive substring match against name OR address
    #[serde(rename = "q")]
    pub text: Option<String>,
    /// Exact pin color, or "all"/absent for no color restriction
    pub color: Option<String>,
    #[serde(rename = "from")]
    pub date_from: Option<NaiveDate>,
    #[serde(rename = "to")]
    pub date_to: Option<NaiveDate>,
}

impl PlaceFilter {
    fn matches(&self, place: &Place) -> bool {
        self.matches_text(place) && self.matches_color(place) && self.matches_dates(place)
    }

    fn matches_text(&self, place: &Place) -> bool {
        match self.text.as_deref() {
            None | Some("") => true,
            Some(text) => {
                let needle = text.to_lowercase();
                place.name.to_lowercase().contains(&needle)
                    || place.address.to_lowercase().contains(&needle)
            },
        }
    }

    fn matches_color(&self, place: &Place) -> bool {
        match self.color.as_deref() {
            None | Some("") | Some("all") => true,
            Some(color) => place.color == color,
        }
    }

    fn matches_dates(&self, place: &Place) -> bool {
        if self.date_from.is_none() && self.date_to.is_none() {
            return true;
        }

        // Any date bound set: undated places are excluded
        let visit_date = match place.visit_date {
            Some(d) => d,
            None => return false,
        };

        if let Some(from) = self.date_from {
            if visit_date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if visit_date > to {
                return false;
            }
        }
        true
    }
}

/// Apply the filter predicates and return the visible subset, grouped by
/// category key: groups in lexicographic key order, places within a
/// group in their input order.
pub fn apply_filters(places: &[Place], filter: &PlaceFilter) -> Vec<Place> {
    let mut grouped: BTreeMap<String, Vec<Place>> = BTreeMap::new();

    for place in places {
        if filter.matches(place) {
            grouped
                .entry(category_key(&place.address))
                .or_default()
                .push(place.clone());
        }
    }

    grouped.into_values().flatten().collect()
}

/// Derive the "{country}, {city}" category key from a free-text address.
/// Addresses come from a geocoder, so this is a display heuristic, not
/// administrative geography.
pub fn category_key(address: &str) -> String {
    let address = address.trim();
    let parts: Vec<&str> = address.split(',').collect();

    if parts.len() >= 2 {
        let country = parts.last().map(|p| p.trim()).unwrap_or_default();
        let city = parts[0]
            .trim()
            .split_whitespace()
            .next()
            .unwrap_or(OTHER_PLACEHOLDER);
        format!("{}, {}", country, city)
    } else {
        let city = address.split_whitespace().next().unwrap_or(OTHER_PLACEHOLDER);
        format!("{}, {}", NO_COUNTRY_PLACEHOLDER, city)
    }
}
