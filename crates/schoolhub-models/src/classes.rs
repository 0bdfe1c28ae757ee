//! Class entities, DTOs and the class code visibility rule.

use chrono::{DateTime, Utc};
use schoolhub_core::{
    PaginationMeta, PaginationParams,
    serde::{deserialize_optional_trimmed, deserialize_optional_uuid},
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::validation::validate_username;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "class_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClassType {
    /// Anyone may see the join code.
    #[default]
    Public,
    /// Only the creator and the class teacher see the code.
    Private,
    /// A class belonging to a school's academic structure.
    SchoolClass,
}

impl ClassType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::SchoolClass => "school_class",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Class {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub code: String,
    pub class_type: ClassType,
    pub description: Option<String>,
    pub image: Option<String>,
    pub school_id: Option<Uuid>,
    pub creator_id: Option<Uuid>,
    pub class_teacher_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Who is looking at a class, as far as code visibility is concerned.
#[derive(Debug, Clone, Copy)]
pub struct Viewer {
    pub user_id: Uuid,
    pub school_id: Option<Uuid>,
    pub is_system_admin: bool,
}

impl Class {
    pub fn is_creator_or_teacher(&self, user_id: Uuid) -> bool {
        self.creator_id == Some(user_id) || self.class_teacher_id == Some(user_id)
    }

    pub fn code_visible_to(&self, viewer: &Viewer) -> bool {
        match self.class_type {
            ClassType::Public => true,
            ClassType::Private => self.is_creator_or_teacher(viewer.user_id),
            ClassType::SchoolClass => {
                self.is_creator_or_teacher(viewer.user_id)
                    || viewer.is_system_admin
                    || (self.school_id.is_some() && viewer.school_id == self.school_id)
            }
        }
    }

    /// Shapes the row for `viewer`, omitting the code when it must stay hidden.
    pub fn into_response(self, viewer: &Viewer) -> ClassResponse {
        let code = self.code_visible_to(viewer).then_some(self.code);
        ClassResponse {
            id: self.id,
            name: self.name,
            username: self.username,
            code,
            class_type: self.class_type,
            description: self.description,
            image: self.image,
            school_id: self.school_id,
            creator_id: self.creator_id,
            class_teacher_id: self.class_teacher_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClassResponse {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    /// Join code; omitted when the caller may not see it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub class_type: ClassType,
    pub description: Option<String>,
    /// Storage key of the class image
    pub image: Option<String>,
    pub school_id: Option<Uuid>,
    pub creator_id: Option<Uuid>,
    pub class_teacher_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateClassDto {
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    #[validate(length(min = 3, max = 50), custom(function = "validate_username"))]
    pub username: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[serde(default)]
    pub class_type: ClassType,
    /// Required for `school_class`
    pub school_id: Option<Uuid>,
    pub class_teacher_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateClassDto {
    #[validate(length(min = 1, max = 150))]
    pub name: Option<String>,
    #[validate(length(min = 3, max = 50), custom(function = "validate_username"))]
    pub username: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub class_type: Option<ClassType>,
    pub school_id: Option<Uuid>,
}

/// `{"teacher_id": null}` unassigns the current teacher.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AssignTeacherDto {
    pub teacher_id: Option<Uuid>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ClassFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
    pub class_type: Option<ClassType>,
    #[serde(default, deserialize_with = "deserialize_optional_trimmed")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub class_teacher_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedClassesResponse {
    pub data: Vec<ClassResponse>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(class_type: ClassType) -> Class {
        Class {
            id: Uuid::new_v4(),
            name: "S4 PCM A".to_string(),
            username: "hill-s4-pcm-a".to_string(),
            code: "K7M2QX9P".to_string(),
            class_type,
            description: None,
            image: None,
            school_id: Some(Uuid::new_v4()),
            creator_id: Some(Uuid::new_v4()),
            class_teacher_id: Some(Uuid::new_v4()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn stranger() -> Viewer {
        Viewer {
            user_id: Uuid::new_v4(),
            school_id: None,
            is_system_admin: false,
        }
    }

    #[test]
    fn test_public_code_is_always_visible() {
        assert!(class(ClassType::Public).code_visible_to(&stranger()));
    }

    #[test]
    fn test_private_code_visibility() {
        let class = class(ClassType::Private);
        let creator = Viewer {
            user_id: class.creator_id.unwrap(),
            ..stranger()
        };
        let teacher = Viewer {
            user_id: class.class_teacher_id.unwrap(),
            ..stranger()
        };
        let admin = Viewer {
            is_system_admin: true,
            ..stranger()
        };
        let same_school = Viewer {
            school_id: class.school_id,
            ..stranger()
        };

        assert!(class.code_visible_to(&creator));
        assert!(class.code_visible_to(&teacher));
        assert!(!class.code_visible_to(&admin));
        assert!(!class.code_visible_to(&same_school));
        assert!(!class.code_visible_to(&stranger()));
    }

    #[test]
    fn test_school_class_code_visibility() {
        let class = class(ClassType::SchoolClass);
        let admin = Viewer {
            is_system_admin: true,
            ..stranger()
        };
        let same_school = Viewer {
            school_id: class.school_id,
            ..stranger()
        };
        let other_school = Viewer {
            school_id: Some(Uuid::new_v4()),
            ..stranger()
        };

        assert!(class.code_visible_to(&admin));
        assert!(class.code_visible_to(&same_school));
        assert!(!class.code_visible_to(&other_school));
        assert!(!class.code_visible_to(&stranger()));
    }

    #[test]
    fn test_school_class_without_school_hides_code_from_unaffiliated() {
        let mut class = class(ClassType::SchoolClass);
        class.school_id = None;
        assert!(!class.code_visible_to(&stranger()));
    }

    #[test]
    fn test_hidden_code_is_omitted_from_json() {
        let response = class(ClassType::Private).into_response(&stranger());
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("code").is_none());
        assert_eq!(json["class_type"], "private");

        let response = class(ClassType::Public).into_response(&stranger());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["code"], "K7M2QX9P");
    }

    #[test]
    fn test_create_class_dto_validation() {
        let dto: CreateClassDto =
            serde_json::from_str(r#"{"name":"Robotics","username":"robotics-club"}"#).unwrap();
        assert_eq!(dto.class_type, ClassType::Public);
        assert!(dto.validate().is_ok());

        let dto: CreateClassDto =
            serde_json::from_str(r#"{"name":"","username":"robotics-club"}"#).unwrap();
        assert!(dto.validate().is_err());

        let dto: CreateClassDto =
            serde_json::from_str(r#"{"name":"Robotics","username":"Robotics Club"}"#).unwrap();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_assign_teacher_accepts_null() {
        let dto: AssignTeacherDto = serde_json::from_str(r#"{"teacher_id":null}"#).unwrap();
        assert!(dto.teacher_id.is_none());
    }
}
