// Settings service against real Postgres and Redis; skips when absent.

mod common;

use uuid::Uuid;

use placemap_core::models::pin_setting::{PinLabelEntry, SavePinSettingsRequest};
use placemap_core::utils::service_error::ServiceError;
use placemap_core::{SettingsService, UiPreferences};

#[tokio::test]
async fn test_pin_label_upsert() {
    let state = match common::setup_state().await {
        Some(state) => state,
        None => return,
    };
    let service = SettingsService::new(&state);
    let user = Uuid::new_v4();

    assert!(service.get_pin_labels(Some(user)).await.unwrap().is_empty());

    let saved = service
        .save_pin_labels(
            Some(user),
            SavePinSettingsRequest {
                labels: vec![
                    PinLabelEntry {
                        color: "#ef4444".to_string(),
                        label: "Restaurants".to_string(),
                    },
                    PinLabelEntry {
                        color: "#3b82f6".to_string(),
                        label: "Cafes".to_string(),
                    },
                ],
            },
        )
        .await
        .unwrap();
    assert_eq!(saved.len(), 2);

    // Re-saving one color replaces its label, not adds a row
    let saved = service
        .save_pin_labels(
            Some(user),
            SavePinSettingsRequest {
                labels: vec![PinLabelEntry {
                    color: "#ef4444".to_string(),
                    label: "Dinner spots".to_string(),
                }],
            },
        )
        .await
        .unwrap();
    assert_eq!(saved.len(), 2);
    let restaurant = saved.iter().find(|s| s.color == "#ef4444").unwrap();
    assert_eq!(restaurant.label, "Dinner spots");
}

#[tokio::test]
async fn test_pin_labels_reject_unknown_color() {
    let state = match common::setup_state().await {
        Some(state) => state,
        None => return,
    };
    let service = SettingsService::new(&state);

    let result = service
        .save_pin_labels(
            Some(Uuid::new_v4()),
            SavePinSettingsRequest {
                labels: vec![PinLabelEntry {
                    color: "#000000".to_string(),
                    label: "Unknown".to_string(),
                }],
            },
        )
        .await;
    assert!(matches!(result, Err(ServiceError::ValidationError(_))));
}

#[tokio::test]
async fn test_ui_preferences_round_trip() {
    let state = match common::setup_state().await {
        Some(state) => state,
        None => return,
    };
    let service = SettingsService::new(&state);
    let user = Uuid::new_v4();

    // Defaults before anything saved; guests also get defaults
    assert_eq!(
        service.get_preferences(Some(user)).await.unwrap(),
        UiPreferences::default()
    );
    assert_eq!(
        service.get_preferences(None).await.unwrap(),
        UiPreferences::default()
    );

    let prefs = UiPreferences {
        language: "ko".to_string(),
        left_handed: true,
        map_style: "satellite".to_string(),
    };
    service
        .save_preferences(Some(user), prefs.clone())
        .await
        .unwrap();

    assert_eq!(service.get_preferences(Some(user)).await.unwrap(), prefs);

    // Guests cannot save
    assert!(matches!(
        service.save_preferences(None, prefs).await,
        Err(ServiceError::LoginRequired)
    ));
}
