//! Translation of database errors into API errors.
//!
//! Uniqueness is enforced by the schema; services react to the violated
//! constraint after the fact.

use schoolhub_core::AppError;
use schoolhub_db::unique_violation;
use tracing::error;

pub const CLASS_CODE_CONSTRAINT: &str = "classes_code_key";

/// User-facing message for a violated unique constraint.
pub fn conflict_message(constraint: &str) -> &'static str {
    match constraint {
        "schools_username_key" => "School username is already taken",
        "classes_username_key" => "Class username is already taken",
        CLASS_CODE_CONSTRAINT => "Class code is already in use",
        "course_content_modules_class_code_key" => "Module code already exists in this class",
        "school_join_requests_email_key"
        | "school_join_requests_phone_key"
        | "school_join_requests_user_key" => {
            "A pending join request already exists for this role"
        }
        _ => "Resource already exists",
    }
}

/// Maps unique violations to 409 and everything else to 500.
pub fn map_db_error(err: sqlx::Error) -> AppError {
    if let Some(constraint) = unique_violation(&err) {
        return AppError::conflict(conflict_message(constraint));
    }
    error!(error = %err, "Database error");
    AppError::internal(err)
}
