use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::AppError,
    models::Role,
    repository::RepositoryState,
};

/// Claims
///
/// Payload of the HS256 bearer tokens issued by `POST /users/login`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user id, resolved against the Credential Store on every request.
    pub sub: Uuid,
    /// Expiration Time (exp): seconds since the epoch.
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
}

/// AuthUser
///
/// The resolved identity of an authenticated request: who is asking and with
/// which role. This is the requester every access decision is made for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// AuthUser Extractor Implementation
///
/// 1. Local Bypass: `x-user-id` naming an existing user (Env::Local only).
/// 2. Token Validation: Bearer token extraction and JWT decoding.
/// 3. Credential Store lookup, so deleted users lose access immediately.
///
/// Rejection: `AppError::Unauthenticated` (401); a store failure is `Internal`.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // 1. Local Bypass
        // Lets developers act as any seeded user without minting tokens. Never
        // consulted outside Env::Local; an unknown id falls through to step 2.
        if config.env == Env::Local {
            let bypass_id = parts
                .headers
                .get("x-user-id")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| Uuid::parse_str(value).ok());

            if let Some(user_id) = bypass_id {
                if let Some(user) = repo.get_user(user_id).await? {
                    return Ok(AuthUser {
                        id: user.id,
                        role: user.role,
                    });
                }
            }
        }

        // 2. Token Validation
        // Expects `Authorization: Bearer <jwt>`; anything else is unauthenticated.
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AppError::Unauthenticated)?;

        let claims = decode_token(&config, token)?;

        // 3. Credential Store Lookup
        // The role is read from the store, not the token, so a role change or
        // deletion applies to tokens already issued.
        let user = repo
            .get_user(claims.sub)
            .await?
            .ok_or(AppError::Unauthenticated)?;

        Ok(AuthUser {
            id: user.id,
            role: user.role,
        })
    }
}

/// decode_token
///
/// Validates signature and expiry of a bearer token and returns its claims.
/// Failures are logged at debug level only; callers see `Unauthenticated`.
pub fn decode_token(config: &AppConfig, token: &str) -> Result<Claims, AppError> {
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            AppError::Unauthenticated
        })
}

/// issue_token
///
/// Signs an HS256 access token for `user_id`, valid for `config.jwt_ttl_secs`.
/// Only the user id travels in the token.
pub fn issue_token(config: &AppConfig, user_id: Uuid) -> Result<String, AppError> {
    // Clock values before the epoch are clamped rather than wrapped.
    let now = Utc::now().timestamp().max(0) as usize;
    let claims = Claims {
        sub: user_id,
        iat: now,
        exp: now + config.jwt_ttl_secs.max(0) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))
}

/// hash_password
///
/// Hashes a password with bcrypt at the given cost. bcrypt is slow on purpose,
/// so the work runs on the blocking pool instead of an async worker.
pub async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// verify_password
///
/// Checks a candidate password against a stored bcrypt hash, also on the
/// blocking pool. A malformed stored hash is an internal error.
pub async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("password verification failed: {e}")))
}
