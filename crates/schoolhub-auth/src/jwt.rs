//! JWT utilities (HS256).
//!
//! SchoolHub does not run a login flow. Tokens are minted by an external
//! identity service that shares the secret, or locally with
//! `schoolhub-cli issue-token`. The API only verifies them.
//!
//! # Token Structure
//!
//! Access tokens carry:
//! - User ID and email
//! - School ID (for school members)
//! - Role IDs; the well-known system admin role grants access to every school
//! - Permission names such as `schools:manage` or `classes:read`
//!
//! # Example
//!
//! ```ignore
//! use schoolhub_auth::{create_access_token, verify_token};
//! use schoolhub_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//!
//! let token = create_access_token(
//!     user_id,
//!     "teacher@hill.example",
//!     Some(school_id),
//!     vec![],
//!     vec!["classes:read".to_string()],
//!     &config,
//! )?;
//!
//! let claims = verify_token(&token, &config)?;
//! assert_eq!(claims.school_id, Some(school_id));
//! ```

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use schoolhub_config::JwtConfig;
use schoolhub_core::AppError;

use crate::claims::Claims;

/// Creates an access token carrying the caller's school scope and permissions.
///
/// Authorization decisions are made from the claims alone, without a
/// database lookup.
///
/// # Arguments
///
/// * `user_id` - The user's UUID, stored as `sub`
/// * `email` - The user's email address; join requests default to it
/// * `school_id` - School the user belongs to, if any
/// * `role_ids` - Role IDs assigned to the user
/// * `permissions` - Permission names (e.g. `"schools:create"`)
/// * `jwt_config` - Secret and expiry in seconds
///
/// # Errors
///
/// Returns a 500 [`AppError`] if encoding fails.
///
/// # Example
///
/// ```ignore
/// let token = create_access_token(
///     admin_id,
///     "admin@hill.example",
///     None,
///     vec![system_roles::SYSTEM_ADMIN],
///     vec!["schools:create".to_string()],
///     &jwt_config,
/// )?;
/// ```
pub fn create_access_token(
    user_id: Uuid,
    email: &str,
    school_id: Option<Uuid>,
    role_ids: Vec<Uuid>,
    permissions: Vec<String>,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.access_token_expiry.max(0) as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        school_id,
        role_ids,
        permissions,
        exp,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to create token: {}", e)))
}

/// Verifies signature and expiry and returns the claims.
///
/// # Errors
///
/// Any failure (bad signature, malformed token, expiry past the default
/// 60 second leeway) is reported as 401 `"Invalid or expired token"`
/// without further detail.
///
/// # Example
///
/// ```ignore
/// let claims = verify_token(bearer, &state.jwt_config)?;
/// let user_id: Uuid = claims.sub.parse()?;
/// ```
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired token"))
}
