// Per-user settings: pin label overrides in Postgres, lightweight UI
// preferences as a JSON blob in Redis.

use chrono::Utc;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    db::{DieselPool, RedisPool},
    models::pin_setting::{NewPinSetting, PinSetting, PinSettingResponse, SavePinSettingsRequest},
    models::place::validate_pin_color,
    utils::service_error::ServiceError,
};

/// UI preferences kept out of Postgres; losing them resets the UI to
/// defaults, nothing more
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiPreferences {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub left_handed: bool,
    #[serde(default = "default_map_style")]
    pub map_style: String,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_map_style() -> String {
    "streets".to_string()
}

impl Default for UiPreferences {
    fn default() -> Self {
        Self {
            language: default_language(),
            left_handed: false,
            map_style: default_map_style(),
        }
    }
}

pub struct SettingsService {
    diesel_pool: DieselPool,
    redis_pool: RedisPool,
}

impl SettingsService {
    pub fn new(state: &AppState) -> Self {
        Self {
            diesel_pool: state.diesel_pool.clone(),
            redis_pool: state.redis_pool.clone(),
        }
    }

    /// The caller's pin label overrides. Colors without a row fall back
    /// to default labels client-side.
    #[instrument(skip(self))]
    pub async fn get_pin_labels(
        &self,
        user_id: Option<Uuid>,
    ) -> Result<Vec<PinSettingResponse>, ServiceError> {
        use crate::schema::user_pin_settings::dsl;

        let owner = match user_id {
            Some(id) => id,
            None => return Ok(Vec::new()),
        };

        let mut conn = self.diesel_pool.get().await.map_err(|e| {
            ServiceError::DatabaseError(format!("Failed to get connection: {}", e))
        })?;

        let settings: Vec<PinSetting> = dsl::user_pin_settings
            .filter(dsl::user_id.eq(owner))
            .order(dsl::color.asc())
            .load(&mut conn)
            .await?;

        Ok(settings.iter().map(PinSetting::to_response).collect())
    }

    /// Batch upsert of label overrides, one statement per save
    #[instrument(skip(self, request))]
    pub async fn save_pin_labels(
        &self,
        user_id: Option<Uuid>,
        request: SavePinSettingsRequest,
    ) -> Result<Vec<PinSettingResponse>, ServiceError> {
        use crate::schema::user_pin_settings::dsl;

        let owner = user_id.ok_or(ServiceError::LoginRequired)?;

        request.validate()?;
        for entry in &request.labels {
            validate_pin_color(&entry.color).map_err(ServiceError::ValidationError)?;
        }

        let now = Utc::now();
        let rows: Vec<NewPinSetting> = request
            .labels
            .iter()
            .map(|entry| NewPinSetting {
                id: Uuid::new_v4(),
                user_id: owner,
                color: entry.color.clone(),
                label: entry.label.trim().to_string(),
                created_at: now,
                updated_at: now,
            })
            .collect();

        if rows.is_empty() {
            return self.get_pin_labels(Some(owner)).await;
        }

        let mut conn = self.diesel_pool.get().await.map_err(|e| {
            ServiceError::DatabaseError(format!("Failed to get connection: {}", e))
        })?;

        diesel::insert_into(dsl::user_pin_settings)
            .values(&rows)
            .on_conflict((dsl::user_id, dsl::color))
            .do_update()
            .set((
                dsl::label.eq(excluded(dsl::label)),
                dsl::updated_at.eq(excluded(dsl::updated_at)),
            ))
            .execute(&mut conn)
            .await?;

        info!("Saved {} pin labels for user {}", rows.len(), owner);
        self.get_pin_labels(Some(owner)).await
    }

    /// UI preferences, defaulted when absent or unreadable
    #[instrument(skip(self))]
    pub async fn get_preferences(
        &self,
        user_id: Option<Uuid>,
    ) -> Result<UiPreferences, ServiceError> {
        let owner = match user_id {
            Some(id) => id,
            None => return Ok(UiPreferences::default()),
        };

        let raw: Option<String> = self.redis_pool.get(&preferences_key(owner)).await?;

        Ok(match raw {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!("Discarding unreadable preferences for {}: {}", owner, e);
                UiPreferences::default()
            }),
            None => UiPreferences::default(),
        })
    }

    #[instrument(skip(self, preferences))]
    pub async fn save_preferences(
        &self,
        user_id: Option<Uuid>,
        preferences: UiPreferences,
    ) -> Result<UiPreferences, ServiceError> {
        let owner = user_id.ok_or(ServiceError::LoginRequired)?;

        let json = serde_json::to_string(&preferences)
            .map_err(|_| ServiceError::InternalError)?;
        self.redis_pool.set(&preferences_key(owner), json).await?;

        Ok(preferences)
    }
}

fn preferences_key(user_id: Uuid) -> String {
    format!("prefs:{}", user_id)
}
