use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use schoolhub_auth::{Claims, verify_token};
use schoolhub_core::AppError;
use schoolhub_models::Viewer;
use schoolhub_models::roles::{permissions, system_roles};
use uuid::Uuid;

use crate::state::AppState;

/// Extractor that validates the bearer token and exposes its claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.0.has_permission(permission)
    }

    pub fn school_id(&self) -> Option<Uuid> {
        self.0.school_id
    }

    pub fn is_system_admin(&self) -> bool {
        system_roles::is_system_admin(&self.0.role_ids)
    }

    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.0.sub)
            .map_err(|_| AppError::unauthorized("Invalid user ID in token"))
    }

    pub fn email(&self) -> &str {
        &self.0.email
    }

    /// The caller as seen by class code visibility checks.
    pub fn viewer(&self) -> Result<Viewer, AppError> {
        Ok(Viewer {
            user_id: self.user_id()?,
            school_id: self.school_id(),
            is_system_admin: self.is_system_admin(),
        })
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("Invalid authorization header format"))?;

        let claims = verify_token(token, &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}

/// Declares an extractor that authenticates the caller and requires one permission.
#[macro_export]
macro_rules! require_permission {
    ($name:ident, $permission:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = schoolhub_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user =
                    $crate::middleware::auth::AuthUser::from_request_parts(parts, state).await?;

                if !auth_user.has_permission($permission) {
                    return Err(schoolhub_core::AppError::forbidden(format!(
                        "Access denied. Missing required permission: {}",
                        $permission
                    )));
                }

                Ok($name(auth_user))
            }
        }
    };
}

require_permission!(RequireSchoolsCreate, permissions::SCHOOLS_CREATE);
require_permission!(RequireSchoolsRead, permissions::SCHOOLS_READ);
require_permission!(RequireSchoolsUpdate, permissions::SCHOOLS_UPDATE);
require_permission!(RequireSchoolsManage, permissions::SCHOOLS_MANAGE);

require_permission!(RequireClassesCreate, permissions::CLASSES_CREATE);
require_permission!(RequireClassesRead, permissions::CLASSES_READ);
require_permission!(RequireClassesUpdate, permissions::CLASSES_UPDATE);
require_permission!(RequireClassesDelete, permissions::CLASSES_DELETE);
