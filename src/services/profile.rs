// Profile lookup and nickname management. Profiles are created lazily
// on first read so sign-up flows elsewhere never have to call us.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    db::DieselPool,
    models::profile::{
        generate_random_nickname, NewProfile, Profile, ProfileResponse, UpdateNicknameRequest,
    },
    utils::service_error::ServiceError,
};

pub struct ProfileService {
    diesel_pool: DieselPool,
}

impl ProfileService {
    pub fn new(state: &AppState) -> Self {
        Self {
            diesel_pool: state.diesel_pool.clone(),
        }
    }

    /// Fetch the caller's profile, creating one with a random nickname on
    /// first contact. Concurrent first calls race on the insert; the
    /// loser re-reads the winner's row.
    #[instrument(skip(self))]
    pub async fn get_or_create(
        &self,
        user_id: Option<Uuid>,
    ) -> Result<ProfileResponse, ServiceError> {
        use crate::schema::profiles::dsl;

        let owner = user_id.ok_or(ServiceError::LoginRequired)?;

        let mut conn = self.diesel_pool.get().await.map_err(|e| {
            ServiceError::DatabaseError(format!("Failed to get connection: {}", e))
        })?;

        let existing: Option<Profile> = dsl::profiles
            .filter(dsl::id.eq(owner))
            .first(&mut conn)
            .await
            .optional()?;

        if let Some(profile) = existing {
            return Ok(profile.to_response());
        }

        let now = Utc::now();
        let new_profile = NewProfile {
            id: owner,
            nickname: generate_random_nickname(),
            created_at: now,
            updated_at: now,
        };

        let inserted: Option<Profile> = diesel::insert_into(dsl::profiles)
            .values(&new_profile)
            .on_conflict(dsl::id)
            .do_nothing()
            .get_result(&mut conn)
            .await
            .optional()?;

        match inserted {
            Some(profile) => {
                info!("Created profile for user {}", owner);
                Ok(profile.to_response())
            },
            None => {
                let profile: Profile = dsl::profiles
                    .filter(dsl::id.eq(owner))
                    .first(&mut conn)
                    .await?;
                Ok(profile.to_response())
            },
        }
    }

    /// Rename the caller. Nicknames are globally unique; a collision
    /// surfaces as a validation error, not a database one.
    #[instrument(skip(self, request))]
    pub async fn update_nickname(
        &self,
        user_id: Option<Uuid>,
        request: UpdateNicknameRequest,
    ) -> Result<ProfileResponse, ServiceError> {
        use crate::schema::profiles::dsl;

        let owner = user_id.ok_or(ServiceError::LoginRequired)?;
        request.validate()?;

        // Make sure the row exists before updating it
        self.get_or_create(Some(owner)).await?;

        let mut conn = self.diesel_pool.get().await.map_err(|e| {
            ServiceError::DatabaseError(format!("Failed to get connection: {}", e))
        })?;

        let updated = diesel::update(dsl::profiles.filter(dsl::id.eq(owner)))
            .set((
                dsl::nickname.eq(request.nickname.trim()),
                dsl::updated_at.eq(Utc::now()),
            ))
            .get_result::<Profile>(&mut conn)
            .await;

        match updated {
            Ok(profile) => Ok(profile.to_response()),
            Err(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            )) => Err(ServiceError::ValidationError(
                "Nickname is already taken".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }
}
