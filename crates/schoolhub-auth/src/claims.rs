use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Claims embedded in an access token.
///
/// Authorization decisions are made from these fields alone, without a
/// database lookup.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub email: String,
    /// School the user belongs to (None for system admins and unaffiliated users)
    pub school_id: Option<Uuid>,
    pub role_ids: Vec<Uuid>,
    /// Permission names such as `schools:create`
    pub permissions: Vec<String>,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}
