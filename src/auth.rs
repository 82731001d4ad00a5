use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{Role, User},
};

/// Lifetime of every issued session token: seven days.
pub const TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Claims
///
/// Payload of the session token. It is signed with the server secret and carries
/// its own expiry; nothing is stored server-side, so a token stays valid until
/// `exp` even if the account changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's id.
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    /// Issued At (iat), seconds since the epoch.
    pub iat: i64,
    /// Expiration Time (exp), seconds since the epoch.
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Bad signature, malformed token or expired token. Callers never learn which.
    #[error("invalid session token: {0}")]
    Invalid(String),

    #[error("failed to sign session token: {0}")]
    Signing(String),
}

/// issue_token
///
/// Signs a token for `user` that expires `TOKEN_TTL_SECS` from now.
pub fn issue_token(secret: &str, user: &User) -> Result<String, AuthError> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role,
        iat: now,
        exp: now + TOKEN_TTL_SECS,
    };
    sign_claims(secret, &claims)
}

/// Signs arbitrary claims with the HS256 default header.
pub fn sign_claims(secret: &str, claims: &Claims) -> Result<String, AuthError> {
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &key).map_err(|e| AuthError::Signing(e.to_string()))
}

/// verify_token
///
/// Accepts or rejects `token` based on signature and expiry. Never panics; every
/// decoding failure becomes `AuthError::Invalid`.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    match decode::<Claims>(token, &key, &validation) {
        Ok(data) => Ok(data.claims),
        Err(e) => match e.kind() {
            ErrorKind::ExpiredSignature => Err(AuthError::Invalid("expired".to_string())),
            _ => Err(AuthError::Invalid(e.to_string())),
        },
    }
}

/// AuthUser
///
/// The identity resolved by the auth gate for the current request.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// AuthUser Extractor
///
/// The gate verifies the session cookie and stores the identity in the request
/// extensions; this extractor only reads it back. A handler reached without an
/// identity (a public route) rejects with 401.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(ApiError::unauthenticated)
    }
}

/// can_access
///
/// The one authorization predicate: the caller owns the resource, or holds at
/// least `required` role.
pub fn can_access(caller: &AuthUser, owner_id: Option<Uuid>, required: Role) -> bool {
    caller.role >= required || owner_id.is_some_and(|owner| owner == caller.id)
}

/// `can_access` as a guard: `403` when it fails.
pub fn authorize(caller: &AuthUser, owner_id: Option<Uuid>, required: Role) -> Result<(), ApiError> {
    if can_access(caller, owner_id, required) {
        Ok(())
    } else {
        tracing::warn!(user_id = %caller.id, role = ?caller.role, ?owner_id, ?required, "access denied");
        Err(ApiError::forbidden())
    }
}
