// Share token semantics that do not need a database: key generation,
// expiration classes, and identifier dispatch.

use chrono::{Duration, TimeZone, Utc};

use placemap_core::models::share::{never_expires_sentinel, CreateShareTokenRequest};
use placemap_core::utils::share_key::{
    generate_share_token, is_valid_key, SHARE_TOKEN_LENGTH,
};
use placemap_core::{ExpirationClass, ShareIdentifier};

#[test]
fn test_generated_tokens_are_url_safe() {
    for _ in 0..100 {
        let token = generate_share_token();
        assert_eq!(token.len(), SHARE_TOKEN_LENGTH);
        assert!(is_valid_key(&token), "{}", token);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}

#[test]
fn test_tokens_do_not_repeat() {
    let mut seen = std::collections::HashSet::new();
    for _ in 0..1000 {
        assert!(seen.insert(generate_share_token()));
    }
}

#[test]
fn test_expiration_classes() {
    let created = Utc.with_ymd_and_hms(2025, 1, 15, 9, 30, 0).unwrap();

    assert_eq!(
        ExpirationClass::Hours24.expires_at(created) - created,
        Duration::hours(24)
    );
    assert_eq!(
        ExpirationClass::Days7.expires_at(created) - created,
        Duration::days(7)
    );
    assert_eq!(
        ExpirationClass::Days30.expires_at(created) - created,
        Duration::days(30)
    );
    assert_eq!(
        ExpirationClass::Never.expires_at(created),
        never_expires_sentinel()
    );
}

#[test]
fn test_create_request_wire_format() {
    let request: CreateShareTokenRequest =
        serde_json::from_str(r#"{"expiration":"7d"}"#).unwrap();
    assert_eq!(request.expiration, ExpirationClass::Days7);
    assert!(request.place_ids.is_empty());

    let request: CreateShareTokenRequest = serde_json::from_str(
        r#"{"expiration":"never","place_ids":["c56a4180-65aa-42ec-a945-5fd21dec0538"]}"#,
    )
    .unwrap();
    assert_eq!(request.expiration, ExpirationClass::Never);
    assert_eq!(request.place_ids.len(), 1);
}

#[test]
fn test_identifier_variants_compare() {
    assert_ne!(
        ShareIdentifier::Token("abc".to_string()),
        ShareIdentifier::LegacyKey("abc".to_string())
    );
}
