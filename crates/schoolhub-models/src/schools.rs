//! School entities and DTOs.

use chrono::{DateTime, Utc};
use schoolhub_core::{PaginationMeta, PaginationParams, serde::deserialize_optional_trimmed};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::classes::ClassResponse;
use crate::validation::{validate_phone, validate_username};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "school_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SchoolType {
    #[default]
    Public,
    Private,
    GovernmentAided,
}

/// A school row. Invitation code hashes live in [`SchoolCodeHashes`] and
/// are never selected into this type.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct School {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub description: Option<String>,
    pub school_type: SchoolType,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    /// Storage key of the logo image
    pub logo: Option<String>,
    pub creator_id: Option<Uuid>,
    /// Last curriculum selection used to generate the academic structure
    #[schema(value_type = Option<Object>)]
    pub academic_profile: Option<serde_json::Value>,
    pub total_students: i32,
    pub total_teachers: i32,
    pub total_staff: i32,
    pub total_classes: i32,
    pub total_modules: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// bcrypt hashes of the four invitation codes.
#[derive(Debug, Clone, FromRow)]
pub struct SchoolCodeHashes {
    pub student_code_hash: Option<String>,
    pub teacher_code_hash: Option<String>,
    pub staff_code_hash: Option<String>,
    pub parent_code_hash: Option<String>,
}

impl SchoolCodeHashes {
    pub fn is_empty(&self) -> bool {
        self.student_code_hash.is_none()
            && self.teacher_code_hash.is_none()
            && self.staff_code_hash.is_none()
            && self.parent_code_hash.is_none()
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSchoolDto {
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    #[validate(length(min = 3, max = 50), custom(function = "validate_username"))]
    pub username: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[serde(default)]
    pub school_type: SchoolType,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSchoolDto {
    #[validate(length(min = 1, max = 150))]
    pub name: Option<String>,
    #[validate(length(min = 3, max = 50), custom(function = "validate_username"))]
    pub username: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub school_type: Option<SchoolType>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SchoolFilterParams {
    /// Partial, case-insensitive match on the name
    #[serde(default, deserialize_with = "deserialize_optional_trimmed")]
    pub name: Option<String>,
    /// Partial, case-insensitive match on the username
    #[serde(default, deserialize_with = "deserialize_optional_trimmed")]
    pub username: Option<String>,
    pub school_type: Option<SchoolType>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginatedSchoolsResponse {
    pub data: Vec<School>,
    pub meta: PaginationMeta,
}

/// Plaintext invitation codes. Only returned once, at generation time.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InvitationCodesResponse {
    pub student_code: String,
    pub teacher_code: String,
    pub staff_code: String,
    pub parent_code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AcademicStructureResponse {
    pub classes_created: usize,
    pub classes_skipped: usize,
    pub modules_created: usize,
    pub classes: Vec<ClassResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadImageResponse {
    /// Storage key
    pub key: String,
    pub url: String,
}
