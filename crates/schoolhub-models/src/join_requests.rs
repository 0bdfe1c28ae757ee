//! School join requests.

use chrono::{DateTime, Utc};
use schoolhub_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::validation::validate_phone;

pub const MAX_BULK_JOIN_REQUESTS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "join_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JoinRole {
    Student,
    Teacher,
    Staff,
    Parent,
}

impl JoinRole {
    pub const ALL: [JoinRole; 4] = [Self::Student, Self::Teacher, Self::Staff, Self::Parent];

    /// Prefix of the invitation code granting this role.
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Student => "STU",
            Self::Teacher => "TCH",
            Self::Staff => "STF",
            Self::Parent => "PRT",
        }
    }

    /// School counter incremented when a request for this role is accepted.
    pub fn counter_column(self) -> Option<&'static str> {
        match self {
            Self::Student => Some("total_students"),
            Self::Teacher => Some("total_teachers"),
            Self::Staff => Some("total_staff"),
            Self::Parent => None,
        }
    }

    /// Parents are linked to a school through their children, not as members.
    pub fn joins_school(self) -> bool {
        self != Self::Parent
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Staff => "staff",
            Self::Parent => "parent",
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "join_request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JoinRequestStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SchoolJoinRequest {
    pub id: Uuid,
    pub school_id: Uuid,
    pub role: JoinRole,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub user_id: Option<Uuid>,
    pub status: JoinRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct JoinRequestItem {
    pub role: JoinRole,
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
}

impl JoinRequestItem {
    pub fn has_contact(&self) -> bool {
        self.email.as_deref().is_some_and(|e| !e.trim().is_empty())
            || self.phone.as_deref().is_some_and(|p| !p.trim().is_empty())
    }

    /// Lowercases the email and trims every field; blank contacts become `None`.
    pub fn normalized(&self) -> JoinRequestItem {
        JoinRequestItem {
            role: self.role,
            name: self.name.trim().to_string(),
            email: self
                .email
                .as_deref()
                .map(|e| e.trim().to_lowercase())
                .filter(|e| !e.is_empty()),
            phone: self
                .phone
                .as_deref()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BulkJoinRequestDto {
    #[validate(length(min = 1, max = 500), nested)]
    pub requests: Vec<JoinRequestItem>,
}

impl BulkJoinRequestDto {
    /// Index of the first item with neither an email nor a phone.
    pub fn first_missing_contact(&self) -> Option<usize> {
        self.requests.iter().position(|item| !item.has_contact())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkJoinResponse {
    pub created: usize,
    /// Duplicates within the batch plus requests that already existed
    pub skipped: usize,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct JoinWithCodeDto {
    #[validate(length(min = 1, max = 32))]
    pub code: String,
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
}

fn validate_decision(status: &JoinRequestStatus) -> Result<(), ValidationError> {
    if *status == JoinRequestStatus::Pending {
        let mut err = ValidationError::new("status");
        err.message = Some("status must be accepted or rejected".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RespondJoinRequestDto {
    #[validate(custom(function = "validate_decision"))]
    pub status: JoinRequestStatus,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct JoinRequestFilterParams {
    pub status: Option<JoinRequestStatus>,
    pub role: Option<JoinRole>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedJoinRequestsResponse {
    pub data: Vec<SchoolJoinRequest>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(email: Option<&str>, phone: Option<&str>) -> JoinRequestItem {
        JoinRequestItem {
            role: JoinRole::Teacher,
            name: " Grace ".to_string(),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
        }
    }

    #[test]
    fn test_first_missing_contact() {
        let dto = BulkJoinRequestDto {
            requests: vec![
                item(Some("a@hill.example"), None),
                item(None, Some("0788123456")),
                item(Some("  "), None),
            ],
        };
        assert_eq!(dto.first_missing_contact(), Some(2));

        let dto = BulkJoinRequestDto {
            requests: vec![item(Some("a@hill.example"), None)],
        };
        assert_eq!(dto.first_missing_contact(), None);
    }

    #[test]
    fn test_normalized_item() {
        let normalized = item(Some(" Grace@Hill.Example "), Some("")).normalized();
        assert_eq!(normalized.name, "Grace");
        assert_eq!(normalized.email.as_deref(), Some("grace@hill.example"));
        assert!(normalized.phone.is_none());
    }

    #[test]
    fn test_bulk_size_limits() {
        let empty = BulkJoinRequestDto { requests: vec![] };
        assert!(empty.validate().is_err());

        let too_many = BulkJoinRequestDto {
            requests: vec![item(Some("a@hill.example"), None); MAX_BULK_JOIN_REQUESTS + 1],
        };
        assert!(too_many.validate().is_err());

        let max = BulkJoinRequestDto {
            requests: vec![item(Some("a@hill.example"), None); MAX_BULK_JOIN_REQUESTS],
        };
        assert!(max.validate().is_ok());
    }

    #[test]
    fn test_nested_items_are_validated() {
        let dto = BulkJoinRequestDto {
            requests: vec![item(Some("not-an-email"), None)],
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_respond_rejects_pending() {
        let dto: RespondJoinRequestDto = serde_json::from_str(r#"{"status":"pending"}"#).unwrap();
        assert!(dto.validate().is_err());
        let dto: RespondJoinRequestDto = serde_json::from_str(r#"{"status":"accepted"}"#).unwrap();
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_role_mappings() {
        assert_eq!(JoinRole::Student.counter_column(), Some("total_students"));
        assert_eq!(JoinRole::Parent.counter_column(), None);
        assert!(!JoinRole::Parent.joins_school());
        let prefixes: Vec<_> = JoinRole::ALL.iter().map(|r| r.code_prefix()).collect();
        assert_eq!(prefixes, vec!["STU", "TCH", "STF", "PRT"]);
    }
}
