// Filter engine behavior through the public API: no database needed.

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use placemap_core::models::place::Place;
use placemap_core::{apply_filters, category_key, PlaceFilter};

fn place(name: &str, address: &str, color: &str, visit_date: Option<&str>) -> Place {
    let now = Utc::now();
    Place {
        id: Uuid::new_v4(),
        user_id: Some(Uuid::new_v4()),
        name: name.to_string(),
        address: address.to_string(),
        comment: None,
        latitude: 37.5665,
        longitude: 126.978,
        visit_date: visit_date.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
        rating: 4,
        color: color.to_string(),
        photo_urls: vec![],
        is_public: false,
        created_at: now,
        updated_at: now,
    }
}

fn sample_places() -> Vec<Place> {
    vec![
        place(
            "Morning Brew",
            "Seoul Jongno, South Korea",
            "#ef4444",
            Some("2025-04-12"),
        ),
        place(
            "Cafe Lumiere",
            "Paris Marais, France",
            "#3b82f6",
            Some("2025-07-03"),
        ),
        place("Han River Walk", "Seoul Mapo, South Korea", "#10b981", None),
        place(
            "Harbor View",
            "Busan Haeundae, South Korea",
            "#ef4444",
            Some("2025-07-20"),
        ),
    ]
}

#[test]
fn test_combined_filters_are_anded() {
    let filter = PlaceFilter {
        text: Some("cafe".to_string()),
        color: Some("#3b82f6".to_string()),
        date_from: Some(NaiveDate::parse_from_str("2025-07-01", "%Y-%m-%d").unwrap()),
        date_to: None,
    };

    let result = apply_filters(&sample_places(), &filter);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].name, "Cafe Lumiere");
}

#[test]
fn test_text_filter_is_case_insensitive() {
    let filter = PlaceFilter {
        text: Some("HAEUNDAE".to_string()),
        ..Default::default()
    };
    let result = apply_filters(&sample_places(), &filter);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].name, "Harbor View");
}

#[test]
fn test_date_bound_excludes_undated() {
    let filter = PlaceFilter {
        date_to: Some(NaiveDate::parse_from_str("2025-12-31", "%Y-%m-%d").unwrap()),
        ..Default::default()
    };
    let result = apply_filters(&sample_places(), &filter);
    assert!(result.iter().all(|p| p.visit_date.is_some()));
    assert_eq!(result.len(), 3);
}

#[test]
fn test_grouping_is_stable_and_sorted() {
    let result = apply_filters(&sample_places(), &PlaceFilter::default());

    let categories: Vec<String> = result.iter().map(|p| category_key(&p.address)).collect();
    let mut sorted = categories.clone();
    sorted.sort();

    // Group headers appear in lexicographic order
    let mut deduped = categories.clone();
    deduped.dedup();
    let mut sorted_deduped = deduped.clone();
    sorted_deduped.sort();
    assert_eq!(deduped, sorted_deduped);

    // France group before the Korean groups
    assert_eq!(result[0].name, "Cafe Lumiere");
}

#[test]
fn test_filtering_never_mutates_input() {
    let places = sample_places();
    let before = places.clone();

    let filter = PlaceFilter {
        text: Some("river".to_string()),
        ..Default::default()
    };
    let _ = apply_filters(&places, &filter);

    assert_eq!(places, before);
}

#[test]
fn test_category_key_variants() {
    assert_eq!(
        category_key("Seoul Jongno, South Korea"),
        "South Korea, Seoul"
    );
    assert_eq!(category_key("Reykjavik"), "No country info, Reykjavik");
    assert_eq!(category_key(""), "No country info, Other");
    // Multi-comma addresses use the last segment as the country
    assert_eq!(
        category_key("12 Rue Oberkampf, Paris, France"),
        "France, 12"
    );
}
