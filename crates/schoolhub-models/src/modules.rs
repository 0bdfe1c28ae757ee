use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// How a module relates to the class it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "module_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ModuleType {
    /// Subject of the grade or combination.
    Core,
    /// Shared cross-cutting module such as General Studies.
    General,
    /// Trade-specific TVET module.
    Specific,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CourseContentModule {
    pub id: Uuid,
    pub title: String,
    pub code: String,
    pub module_type: ModuleType,
    pub class_id: Uuid,
    pub created_at: DateTime<Utc>,
}
