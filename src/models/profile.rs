// Profile model - one row per identity, lazily created with a random nickname

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use lazy_static::lazy_static;
use rand::{thread_rng, Rng};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::schema::profiles;

/// Nickname shown when the owner's profile cannot be resolved
pub const ANONYMOUS_NICKNAME: &str = "Anonymous";

const NICKNAME_ADJECTIVES: [&str; 15] = [
    "Happy", "Swift", "Brave", "Clever", "Gentle", "Bright", "Cool", "Wild", "Smart", "Lucky",
    "Mighty", "Noble", "Quiet", "Rapid", "Sunny",
];

const NICKNAME_NOUNS: [&str; 15] = [
    "Panda", "Tiger", "Eagle", "Fox", "Wolf", "Bear", "Lion", "Hawk", "Dragon", "Phoenix",
    "Falcon", "Raven", "Otter", "Lynx", "Deer",
];

lazy_static! {
    static ref NICKNAME_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9\s\-_]+$").unwrap();
}

// =============================================================================
// DATABASE MODELS
// =============================================================================

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Profile {
    pub id: Uuid,
    pub nickname: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = profiles)]
pub struct NewProfile {
    pub id: Uuid,
    pub nickname: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// REQUEST/RESPONSE DTOs
// =============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateNicknameRequest {
    #[validate(length(min = 1, max = 30, message = "Nickname must be 1-30 characters"))]
    #[validate(regex(
        path = "NICKNAME_REGEX",
        message = "Nickname can only contain letters, numbers, spaces, hyphens, and underscores"
    ))]
    pub nickname: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub nickname: String,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn to_response(&self) -> ProfileResponse {
        ProfileResponse {
            id: self.id,
            nickname: self.nickname.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// "Adjective Noun NN" nickname assigned on lazy profile creation
pub fn generate_random_nickname() -> String {
    let mut rng = thread_rng();
    let adjective = NICKNAME_ADJECTIVES[rng.gen_range(0..NICKNAME_ADJECTIVES.len())];
    let noun = NICKNAME_NOUNS[rng.gen_range(0..NICKNAME_NOUNS.len())];
    let number: u8 = rng.gen_range(0..100);
    format!("{} {} {}", adjective, noun, number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_nickname_passes_validation() {
        for _ in 0..50 {
            let request = UpdateNicknameRequest {
                nickname: generate_random_nickname(),
            };
            assert!(request.validate().is_ok(), "{:?}", request.nickname);
        }
    }

    #[test]
    fn test_nickname_pattern_rejects_punctuation() {
        let request = UpdateNicknameRequest {
            nickname: "bad!name".to_string(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_nickname_length_limit() {
        let request = UpdateNicknameRequest {
            nickname: "a".repeat(31),
        };
        assert!(request.validate().is_err());
    }
}
