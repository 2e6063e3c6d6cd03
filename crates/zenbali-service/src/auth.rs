//! Authentication extractors.
//!
//! Bearer tokens are HS256 JWTs signed with the configured secret. The
//! extractors resolve the token's subject to an account and reject missing or
//! deactivated accounts:
//! - `CreatorAuth` - a creator managing their own events
//! - `AdminAuth` - an administrator

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use zenbali_core::{Actor, Admin, AdminId, Creator, CreatorId, MarketError};
use zenbali_store::Store;

use crate::error::ApiError;
use crate::state::AppState;

/// Kind of account a token was issued to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    /// Event creator.
    Creator,
    /// Administrator.
    Admin,
}

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account ID.
    pub sub: String,
    /// Account kind.
    pub user_type: UserType,
    /// Expiry (Unix seconds).
    pub exp: i64,
    /// Issued at (Unix seconds).
    #[serde(default)]
    pub iat: i64,
}

/// Sign a token for an account.
///
/// # Errors
///
/// Returns an error if the token cannot be encoded.
pub fn issue_token(
    secret: &str,
    subject: &str,
    user_type: UserType,
    ttl: chrono::Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: subject.to_string(),
        user_type,
        exp: (now + ttl).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Validate a bearer token and return its claims.
fn validate_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "JWT validation failed");
            ApiError::Unauthorized
        })
}

/// Extract and validate the bearer token of a request.
fn bearer_claims(parts: &Parts, state: &AppState) -> Result<Claims, ApiError> {
    let token = parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    validate_token(token.trim(), &state.config.jwt_secret)
}

/// An authenticated, active creator.
#[derive(Debug, Clone)]
pub struct CreatorAuth {
    /// The creator account.
    pub creator: Creator,
}

impl CreatorAuth {
    /// The creator as an event actor.
    #[must_use]
    pub fn actor(&self) -> Actor {
        Actor::Creator(self.creator.id)
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for CreatorAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?;
        if claims.user_type != UserType::Creator {
            return Err(ApiError::Forbidden);
        }

        let id: CreatorId = claims.sub.parse().map_err(|_| ApiError::Unauthorized)?;
        let creator = state
            .store
            .get_creator(id)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        if !creator.is_active {
            tracing::info!(creator_id = %id, "Rejected inactive creator");
            return Err(MarketError::AccountInactive.into());
        }

        Ok(Self { creator })
    }
}

/// An authenticated, active administrator.
#[derive(Debug, Clone)]
pub struct AdminAuth {
    /// The admin account.
    pub admin: Admin,
}

impl AdminAuth {
    /// The admin's ID.
    #[must_use]
    pub fn id(&self) -> AdminId {
        self.admin.id
    }

    /// The admin as an event actor.
    #[must_use]
    pub fn actor(&self) -> Actor {
        Actor::Admin(self.admin.id)
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?;
        if claims.user_type != UserType::Admin {
            return Err(ApiError::Forbidden);
        }

        let id: AdminId = claims.sub.parse().map_err(|_| ApiError::Unauthorized)?;
        let admin = state
            .store
            .get_admin(id)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        if !admin.is_active {
            tracing::info!(admin_id = %id, "Rejected inactive admin");
            return Err(MarketError::AccountInactive.into());
        }

        Ok(Self { admin })
    }
}
