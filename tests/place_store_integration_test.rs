// End-to-end service tests against real Postgres and Redis. Each test
// skips itself when the databases are not configured.

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use placemap_core::models::place::{CreatePlaceRequest, UpdatePlaceRequest};
use placemap_core::models::profile::UpdateNicknameRequest;
use placemap_core::models::share::{CreateShareTokenRequest, ImportPlaceRequest, NewShareToken};
use placemap_core::services::photo::test_support::MemoryObjectStore;
use placemap_core::utils::service_error::ServiceError;
use placemap_core::utils::share_key::generate_share_token;
use placemap_core::{
    ExpirationClass, ImportService, PlaceService, ProfileService, ShareIdentifier, ShareService,
};

fn create_request(name: &str) -> CreatePlaceRequest {
    serde_json::from_value(serde_json::json!({
        "name": name,
        "address": "Seoul Jongno, South Korea",
        "latitude": 37.5665,
        "longitude": 126.978,
        "rating": 4,
        "color": "#ef4444"
    }))
    .unwrap()
}

#[tokio::test]
async fn test_place_crud_lifecycle() {
    let state = match common::setup_state().await {
        Some(state) => state,
        None => return,
    };
    let service = PlaceService::new(&state);
    let owner = Uuid::new_v4();

    // Guests own nothing
    assert!(service.load_own(None).await.unwrap().is_empty());

    // Guests cannot create
    assert!(matches!(
        service.create(None, create_request("Guest Pin")).await,
        Err(ServiceError::LoginRequired)
    ));

    let created = service
        .create(Some(owner), create_request("Morning Brew"))
        .await
        .unwrap();
    assert_eq!(created.name, "Morning Brew");
    assert!(created.is_public);
    assert_eq!(created.category, "South Korea, Seoul");

    let rows = service.load_own(Some(owner)).await.unwrap();
    assert_eq!(rows.len(), 1);

    let update: UpdatePlaceRequest = serde_json::from_value(serde_json::json!({
        "name": "Morning Brew II",
        "address": "Seoul Jongno, South Korea",
        "comment": "great espresso",
        "rating": 5,
        "color": "#3b82f6",
        "photo_urls": []
    }))
    .unwrap();
    let updated = service.update(Some(owner), created.id, update).await.unwrap();
    assert_eq!(updated.name, "Morning Brew II");
    assert_eq!(updated.rating, 5);
    assert_eq!(updated.comment.as_deref(), Some("great espresso"));

    // A stranger cannot touch the row
    let stranger = Uuid::new_v4();
    assert!(matches!(
        service.delete(Some(stranger), created.id).await,
        Err(ServiceError::NotFound)
    ));

    let toggled = service
        .set_visibility(Some(owner), created.id, false)
        .await
        .unwrap();
    assert!(!toggled.is_public);

    service.delete(Some(owner), created.id).await.unwrap();
    assert!(service.load_own(Some(owner)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_share_token_lifecycle() {
    let state = match common::setup_state().await {
        Some(state) => state,
        None => return,
    };
    let places = PlaceService::new(&state);
    let shares = ShareService::new(&state);
    let owner = Uuid::new_v4();

    let place = places
        .create(Some(owner), create_request("Shared Spot"))
        .await
        .unwrap();

    let token = shares
        .create_token(
            Some(owner),
            CreateShareTokenRequest {
                expiration: ExpirationClass::Days7,
                place_ids: vec![],
            },
        )
        .await
        .unwrap();
    assert!(token.is_active);
    assert!(!token.is_snapshot);
    assert_eq!(token.access_count, 0);

    let resolved = shares
        .resolve(ShareIdentifier::Token(token.token.clone()))
        .await
        .unwrap();
    assert!(resolved.read_only);
    assert_eq!(resolved.places.len(), 1);
    assert_eq!(resolved.places[0].name, "Shared Spot");
    assert!(!resolved.owner_nickname.is_empty());

    // Access was counted
    let listed = shares.list_tokens(Some(owner)).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].access_count, 1);

    // Deactivation makes the token look missing
    shares.deactivate(Some(owner), token.id).await.unwrap();
    assert!(matches!(
        shares
            .resolve(ShareIdentifier::Token(token.token.clone()))
            .await,
        Err(ServiceError::InvalidShareToken)
    ));
    assert!(shares.list_tokens(Some(owner)).await.unwrap().is_empty());

    // Unknown tokens and legacy keys resolve the same way
    assert!(matches!(
        shares
            .resolve(ShareIdentifier::LegacyKey("no-such-key".to_string()))
            .await,
        Err(ServiceError::InvalidShareToken)
    ));

    places.delete(Some(owner), place.id).await.unwrap();
}

#[tokio::test]
async fn test_private_places_never_leak_through_shares() {
    let state = match common::setup_state().await {
        Some(state) => state,
        None => return,
    };
    let places = PlaceService::new(&state);
    let shares = ShareService::new(&state);
    let owner = Uuid::new_v4();

    let public = places
        .create(Some(owner), create_request("Public Spot"))
        .await
        .unwrap();
    let private = places
        .create(Some(owner), create_request("Private Spot"))
        .await
        .unwrap();
    places
        .set_visibility(Some(owner), private.id, false)
        .await
        .unwrap();

    // Snapshot tokens naming the private place still exclude it
    let token = shares
        .create_token(
            Some(owner),
            CreateShareTokenRequest {
                expiration: ExpirationClass::Hours24,
                place_ids: vec![public.id, private.id],
            },
        )
        .await
        .unwrap();
    assert!(token.is_snapshot);

    let resolved = shares
        .resolve(ShareIdentifier::Token(token.token))
        .await
        .unwrap();
    assert_eq!(resolved.places.len(), 1);
    assert_eq!(resolved.places[0].name, "Public Spot");

    places.delete(Some(owner), public.id).await.unwrap();
    places.delete(Some(owner), private.id).await.unwrap();
}

#[tokio::test]
async fn test_import_copies_and_blocks_duplicates() {
    let state = match common::setup_state().await {
        Some(state) => state,
        None => return,
    };
    let places = PlaceService::new(&state);
    let imports = ImportService::new(&state);
    let owner = Uuid::new_v4();
    let viewer = Uuid::new_v4();

    let source = places
        .create(Some(owner), create_request("Hidden Gem"))
        .await
        .unwrap();
    places
        .set_visibility(Some(owner), source.id, false)
        .await
        .unwrap();

    // Private sources are not importable
    assert!(matches!(
        imports
            .import_place(
                Some(viewer),
                ImportPlaceRequest {
                    source_place_id: source.id,
                    copy_photos: false,
                },
            )
            .await,
        Err(ServiceError::Forbidden)
    ));

    places
        .set_visibility(Some(owner), source.id, true)
        .await
        .unwrap();

    // Owners cannot import their own places
    assert!(matches!(
        imports
            .import_place(
                Some(owner),
                ImportPlaceRequest {
                    source_place_id: source.id,
                    copy_photos: false,
                },
            )
            .await,
        Err(ServiceError::ValidationError(_))
    ));

    let copy = imports
        .import_place(
            Some(viewer),
            ImportPlaceRequest {
                source_place_id: source.id,
                copy_photos: false,
            },
        )
        .await
        .unwrap();
    assert_eq!(copy.name, "Hidden Gem");
    assert!(!copy.is_public);
    assert!(copy.photo_urls.is_empty());

    // Second attempt is a duplicate
    assert!(matches!(
        imports
            .import_place(
                Some(viewer),
                ImportPlaceRequest {
                    source_place_id: source.id,
                    copy_photos: false,
                },
            )
            .await,
        Err(ServiceError::DuplicatePlace)
    ));

    let imported = imports.imported_ids(Some(viewer), owner).await.unwrap();
    assert!(imported.contains(&source.id));

    // The same spot shared under a different name is still a duplicate:
    // coordinate proximity decides, not the title
    let other_owner = Uuid::new_v4();
    let nearby = places
        .create(Some(other_owner), create_request("Hidden Gem Annex"))
        .await
        .unwrap();
    assert!(matches!(
        imports
            .import_place(
                Some(viewer),
                ImportPlaceRequest {
                    source_place_id: nearby.id,
                    copy_photos: false,
                },
            )
            .await,
        Err(ServiceError::DuplicatePlace)
    ));

    places.delete(Some(owner), source.id).await.unwrap();
    places.delete(Some(viewer), copy.id).await.unwrap();
    places.delete(Some(other_owner), nearby.id).await.unwrap();
}

#[tokio::test]
async fn test_expired_token_resolves_as_expired() {
    let state = match common::setup_state().await {
        Some(state) => state,
        None => return,
    };
    let places = PlaceService::new(&state);
    let shares = ShareService::new(&state);
    let owner = Uuid::new_v4();

    let place = places
        .create(Some(owner), create_request("Sunset Point"))
        .await
        .unwrap();

    // A token whose expiry passed while it stayed active
    let now = Utc::now();
    let stale = NewShareToken {
        id: Uuid::new_v4(),
        token: generate_share_token(),
        user_id: owner,
        expires_at: now - Duration::hours(1),
        place_ids: None,
        is_active: true,
        access_count: 0,
        last_accessed_at: None,
        created_at: now - Duration::days(8),
    };
    let mut conn = state.diesel_pool.get().await.unwrap();
    diesel::insert_into(placemap_core::schema::share_tokens::table)
        .values(&stale)
        .execute(&mut conn)
        .await
        .unwrap();
    drop(conn);

    assert!(matches!(
        shares
            .resolve(ShareIdentifier::Token(stale.token.clone()))
            .await,
        Err(ServiceError::ExpiredShareToken)
    ));

    places.delete(Some(owner), place.id).await.unwrap();
}

#[tokio::test]
async fn test_import_photo_copy_respects_account_ceiling() {
    let mut state = match common::setup_state().await {
        Some(state) => state,
        None => return,
    };
    let store = Arc::new(MemoryObjectStore::default());
    state.object_store = store.clone();

    let places = PlaceService::new(&state);
    let imports = ImportService::new(&state);
    let owner = Uuid::new_v4();
    let viewer = Uuid::new_v4();

    // Fill the viewer's account to the photo ceiling
    for i in 0..30 {
        let filler: CreatePlaceRequest = serde_json::from_value(serde_json::json!({
            "name": format!("Filler {}", i),
            "address": "Seoul Jongno, South Korea",
            "latitude": 37.0 + f64::from(i) * 0.01,
            "longitude": 127.0,
            "rating": 3,
            "color": "#10b981",
            "photo_urls": (0..10)
                .map(|p| format!("https://photos.test/{}-{}.jpg", i, p))
                .collect::<Vec<_>>(),
        }))
        .unwrap();
        places.create(Some(viewer), filler).await.unwrap();
    }

    let source: CreatePlaceRequest = serde_json::from_value(serde_json::json!({
        "name": "Lighthouse",
        "address": "Busan, South Korea",
        "latitude": 35.1,
        "longitude": 129.0,
        "rating": 5,
        "color": "#ef4444",
        "photo_urls": ["https://photos.test/lighthouse.jpg"],
    }))
    .unwrap();
    let source = places.create(Some(owner), source).await.unwrap();

    // One more photo would cross the ceiling, so the whole import fails
    assert!(matches!(
        imports
            .import_place(
                Some(viewer),
                ImportPlaceRequest {
                    source_place_id: source.id,
                    copy_photos: true,
                },
            )
            .await,
        Err(ServiceError::StorageLimitExceeded)
    ));

    // Nothing was uploaded and no row landed
    assert!(store.is_empty());
    let rows = places.load_own(Some(viewer)).await.unwrap();
    assert_eq!(rows.len(), 30);

    for row in rows {
        places.delete(Some(viewer), row.id).await.unwrap();
    }
    places.delete(Some(owner), source.id).await.unwrap();
}

#[tokio::test]
async fn test_profile_lazy_creation_and_rename() {
    let state = match common::setup_state().await {
        Some(state) => state,
        None => return,
    };
    let profiles = ProfileService::new(&state);
    let user = Uuid::new_v4();

    let profile = profiles.get_or_create(Some(user)).await.unwrap();
    assert!(!profile.nickname.is_empty());

    // Second call returns the same row
    let again = profiles.get_or_create(Some(user)).await.unwrap();
    assert_eq!(again.nickname, profile.nickname);

    let renamed = profiles
        .update_nickname(
            Some(user),
            UpdateNicknameRequest {
                nickname: format!("Renamed {}", &user.to_string()[..8]),
            },
        )
        .await
        .unwrap();
    assert!(renamed.nickname.starts_with("Renamed "));
}
