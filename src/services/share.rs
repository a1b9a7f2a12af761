// Share token lifecycle and resolution. Two generations coexist: share
// tokens (expiring, revocable, access-counted) and legacy shared links
// that remain readable forever. Resolution funnels both through one
// code path so viewers get the same read-only payload either way.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    app::AppState,
    db::DieselPool,
    models::{
        place::Place,
        profile::ANONYMOUS_NICKNAME,
        share::{
            CreateShareTokenRequest, NewShareToken, ShareIdentifier, ShareResolutionResponse,
            ShareToken, ShareTokenResponse, SharedLink,
        },
    },
    utils::{service_error::ServiceError, share_key::generate_share_token},
};

/// Retries when a freshly generated token collides with an existing row
const TOKEN_GENERATION_ATTEMPTS: usize = 5;

pub struct ShareService {
    diesel_pool: DieselPool,
}

impl ShareService {
    pub fn new(state: &AppState) -> Self {
        Self {
            diesel_pool: state.diesel_pool.clone(),
        }
    }

    /// Mint a share token for the caller. An empty place list creates a
    /// dynamic token that resolves to whatever is public at access time;
    /// a non-empty list freezes a snapshot of those ids.
    #[instrument(skip(self, request))]
    pub async fn create_token(
        &self,
        user_id: Option<Uuid>,
        request: CreateShareTokenRequest,
    ) -> Result<ShareTokenResponse, ServiceError> {
        let owner = user_id.ok_or(ServiceError::LoginRequired)?;

        let place_ids = if request.place_ids.is_empty() {
            None
        } else {
            Some(request.place_ids)
        };

        let mut conn = self.diesel_pool.get().await.map_err(|e| {
            ServiceError::DatabaseError(format!("Failed to get connection: {}", e))
        })?;

        let now = Utc::now();
        let mut last_error = None;

        for _ in 0..TOKEN_GENERATION_ATTEMPTS {
            let new_token = NewShareToken {
                id: Uuid::new_v4(),
                token: generate_share_token(),
                user_id: owner,
                expires_at: request.expiration.expires_at(now),
                place_ids: place_ids.clone(),
                is_active: true,
                access_count: 0,
                last_accessed_at: None,
                created_at: now,
            };

            match diesel::insert_into(crate::schema::share_tokens::table)
                .values(&new_token)
                .get_result::<ShareToken>(&mut conn)
                .await
            {
                Ok(token) => {
                    info!("Created share token {} for user {}", token.id, owner);
                    return Ok(token.to_response());
                },
                Err(diesel::result::Error::DatabaseError(
                    diesel::result::DatabaseErrorKind::UniqueViolation,
                    info,
                )) => {
                    warn!("Share token collision, regenerating");
                    last_error = Some(diesel::result::Error::DatabaseError(
                        diesel::result::DatabaseErrorKind::UniqueViolation,
                        info,
                    ));
                },
                Err(e) => return Err(e.into()),
            }
        }

        Err(last_error
            .map(Into::into)
            .unwrap_or(ServiceError::InternalError))
    }

    /// The caller's active tokens, newest first
    #[instrument(skip(self))]
    pub async fn list_tokens(
        &self,
        user_id: Option<Uuid>,
    ) -> Result<Vec<ShareTokenResponse>, ServiceError> {
        use crate::schema::share_tokens::dsl;

        let owner = user_id.ok_or(ServiceError::LoginRequired)?;

        let mut conn = self.diesel_pool.get().await.map_err(|e| {
            ServiceError::DatabaseError(format!("Failed to get connection: {}", e))
        })?;

        let tokens: Vec<ShareToken> = dsl::share_tokens
            .filter(dsl::user_id.eq(owner))
            .filter(dsl::is_active.eq(true))
            .order(dsl::created_at.desc())
            .load(&mut conn)
            .await?;

        Ok(tokens.iter().map(ShareToken::to_response).collect())
    }

    /// Soft-deactivate a token. The row stays for audit; resolution
    /// treats it the same as a missing token.
    #[instrument(skip(self))]
    pub async fn deactivate(
        &self,
        user_id: Option<Uuid>,
        token_id: Uuid,
    ) -> Result<(), ServiceError> {
        use crate::schema::share_tokens::dsl;

        let owner = user_id.ok_or(ServiceError::LoginRequired)?;

        let mut conn = self.diesel_pool.get().await.map_err(|e| {
            ServiceError::DatabaseError(format!("Failed to get connection: {}", e))
        })?;

        let updated = diesel::update(
            dsl::share_tokens
                .filter(dsl::id.eq(token_id))
                .filter(dsl::user_id.eq(owner)),
        )
        .set(dsl::is_active.eq(false))
        .execute(&mut conn)
        .await?;

        if updated == 0 {
            return Err(ServiceError::NotFound);
        }

        info!("Deactivated share token {} for user {}", token_id, owner);
        Ok(())
    }

    /// Resolve either identifier generation into the viewer payload.
    /// Only public places ever cross this boundary.
    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        identifier: ShareIdentifier,
    ) -> Result<ShareResolutionResponse, ServiceError> {
        match identifier {
            ShareIdentifier::Token(token) => self.resolve_token(&token).await,
            ShareIdentifier::LegacyKey(key) => self.resolve_legacy(&key).await,
        }
    }

    async fn resolve_token(&self, token: &str) -> Result<ShareResolutionResponse, ServiceError> {
        use crate::schema::share_tokens::dsl;

        let mut conn = self.diesel_pool.get().await.map_err(|e| {
            ServiceError::DatabaseError(format!("Failed to get connection: {}", e))
        })?;

        // Inactive rows are indistinguishable from missing ones on purpose
        let share: ShareToken = dsl::share_tokens
            .filter(dsl::token.eq(token))
            .filter(dsl::is_active.eq(true))
            .first(&mut conn)
            .await
            .optional()?
            .ok_or(ServiceError::InvalidShareToken)?;

        if share.expires_at < Utc::now() {
            return Err(ServiceError::ExpiredShareToken);
        }

        // Access accounting is best effort; a failed increment must not
        // block the viewer
        let counted = diesel::update(dsl::share_tokens.filter(dsl::id.eq(share.id)))
            .set((
                dsl::access_count.eq(dsl::access_count + 1),
                dsl::last_accessed_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .await;
        if let Err(e) = counted {
            warn!("Failed to record share access for {}: {}", share.id, e);
        }

        let places = self
            .load_shared_places(share.user_id, share.place_ids.as_deref())
            .await?;
        let owner_nickname = self.nickname_of(share.user_id).await;

        Ok(ShareResolutionResponse {
            owner_nickname,
            read_only: true,
            places,
        })
    }

    async fn resolve_legacy(&self, key: &str) -> Result<ShareResolutionResponse, ServiceError> {
        use crate::schema::shared_links::dsl;

        let mut conn = self.diesel_pool.get().await.map_err(|e| {
            ServiceError::DatabaseError(format!("Failed to get connection: {}", e))
        })?;

        // Legacy links never expire and cannot be revoked
        let link: SharedLink = dsl::shared_links
            .filter(dsl::share_key.eq(key))
            .first(&mut conn)
            .await
            .optional()?
            .ok_or(ServiceError::InvalidShareToken)?;

        let places = self
            .load_shared_places(link.user_id, Some(&link.place_ids))
            .await?;
        let owner_nickname = self.nickname_of(link.user_id).await;

        Ok(ShareResolutionResponse {
            owner_nickname,
            read_only: true,
            places,
        })
    }

    async fn load_shared_places(
        &self,
        owner: Uuid,
        snapshot: Option<&[Uuid]>,
    ) -> Result<Vec<crate::models::place::PlaceResponse>, ServiceError> {
        use crate::schema::places::dsl;

        let mut conn = self.diesel_pool.get().await.map_err(|e| {
            ServiceError::DatabaseError(format!("Failed to get connection: {}", e))
        })?;

        let query = dsl::places
            .filter(dsl::user_id.eq(owner))
            .filter(dsl::is_public.eq(true))
            .order(dsl::created_at.desc());

        let rows: Vec<Place> = match snapshot {
            Some(ids) => {
                query
                    .filter(dsl::id.eq_any(ids.to_vec()))
                    .load(&mut conn)
                    .await?
            },
            None => query.load(&mut conn).await?,
        };

        Ok(rows.iter().map(Place::to_response).collect())
    }

    async fn nickname_of(&self, user_id: Uuid) -> String {
        use crate::schema::profiles::dsl;

        let mut conn = match self.diesel_pool.get().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Failed to get connection for nickname lookup: {}", e);
                return ANONYMOUS_NICKNAME.to_string();
            },
        };

        let nickname: Result<Option<String>, _> = dsl::profiles
            .filter(dsl::id.eq(user_id))
            .select(dsl::nickname)
            .first(&mut conn)
            .await
            .optional();

        match nickname {
            Ok(Some(nickname)) => nickname,
            Ok(None) => ANONYMOUS_NICKNAME.to_string(),
            Err(e) => {
                warn!("Failed to load nickname for {}: {}", user_id, e);
                ANONYMOUS_NICKNAME.to_string()
            },
        }
    }
}
