// Per-user pin label overrides, composite-unique on (user_id, color)

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::schema::user_pin_settings;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = user_pin_settings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PinSetting {
    pub id: Uuid,
    pub user_id: Uuid,
    pub color: String,
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_pin_settings)]
pub struct NewPinSetting {
    pub id: Uuid,
    pub user_id: Uuid,
    pub color: String,
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One label override in a batch upsert
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PinLabelEntry {
    pub color: String,

    #[validate(length(min = 1, max = 50, message = "Label must be 1-50 characters"))]
    pub label: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SavePinSettingsRequest {
    #[validate]
    pub labels: Vec<PinLabelEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PinSettingResponse {
    pub color: String,
    pub label: String,
}

impl PinSetting {
    pub fn to_response(&self) -> PinSettingResponse {
        PinSettingResponse {
            color: self.color.clone(),
            label: self.label.clone(),
        }
    }
}
