use schoolhub_core::AppError;
use schoolhub_models::roles::permissions;
use schoolhub_models::{Class, School};

use crate::middleware::auth::AuthUser;

/// System admins, members whose token carries the school, and the school's creator.
pub fn can_access_school(auth_user: &AuthUser, school: &School) -> bool {
    if auth_user.is_system_admin() || auth_user.school_id() == Some(school.id) {
        return true;
    }

    match auth_user.user_id() {
        Ok(user_id) => school.creator_id == Some(user_id),
        Err(_) => false,
    }
}

pub fn ensure_school_access(auth_user: &AuthUser, school: &School) -> Result<(), AppError> {
    if can_access_school(auth_user, school) {
        Ok(())
    } else {
        Err(AppError::forbidden("You do not have access to this school"))
    }
}

/// System admin, the class creator or teacher, or a school member holding
/// `classes:manage` for the class's school.
pub fn can_manage_class(auth_user: &AuthUser, class: &Class) -> bool {
    if auth_user.is_system_admin() {
        return true;
    }

    if let Ok(user_id) = auth_user.user_id()
        && class.is_creator_or_teacher(user_id)
    {
        return true;
    }

    class.school_id.is_some()
        && auth_user.school_id() == class.school_id
        && auth_user.has_permission(permissions::CLASSES_MANAGE)
}

pub fn ensure_can_manage_class(auth_user: &AuthUser, class: &Class) -> Result<(), AppError> {
    if can_manage_class(auth_user, class) {
        Ok(())
    } else {
        Err(AppError::forbidden("You cannot manage this class"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use schoolhub_auth::Claims;
    use schoolhub_models::ClassType;
    use schoolhub_models::SchoolType;
    use schoolhub_models::roles::system_roles;
    use uuid::Uuid;

    fn user(
        user_id: Uuid,
        school_id: Option<Uuid>,
        role_ids: Vec<Uuid>,
        permissions: &[&str],
    ) -> AuthUser {
        AuthUser(Claims {
            sub: user_id.to_string(),
            email: "member@example.com".to_string(),
            school_id,
            role_ids,
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            exp: 9999999999,
            iat: 1234567890,
        })
    }

    fn school(creator_id: Option<Uuid>) -> School {
        School {
            id: Uuid::new_v4(),
            name: "Hill Academy".to_string(),
            username: "hill".to_string(),
            description: None,
            school_type: SchoolType::Public,
            email: None,
            phone: None,
            website: None,
            address: None,
            logo: None,
            creator_id,
            academic_profile: None,
            total_students: 0,
            total_teachers: 0,
            total_staff: 0,
            total_classes: 0,
            total_modules: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn class(school_id: Option<Uuid>, creator_id: Option<Uuid>, teacher: Option<Uuid>) -> Class {
        Class {
            id: Uuid::new_v4(),
            name: "S4 PCM A".to_string(),
            username: "hill-s4-pcm-a".to_string(),
            code: "K7M2QX9P".to_string(),
            class_type: ClassType::SchoolClass,
            description: None,
            image: None,
            school_id,
            creator_id,
            class_teacher_id: teacher,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_school_access() {
        let creator = Uuid::new_v4();
        let school = school(Some(creator));

        let admin = user(Uuid::new_v4(), None, vec![system_roles::SYSTEM_ADMIN], &[]);
        let member = user(Uuid::new_v4(), Some(school.id), vec![], &[]);
        let owner = user(creator, None, vec![], &[]);
        let outsider = user(Uuid::new_v4(), Some(Uuid::new_v4()), vec![], &[]);

        assert!(can_access_school(&admin, &school));
        assert!(can_access_school(&member, &school));
        assert!(can_access_school(&owner, &school));
        assert!(!can_access_school(&outsider, &school));

        let err = ensure_school_access(&outsider, &school).unwrap_err();
        assert_eq!(err.status.as_u16(), 403);
    }

    #[test]
    fn test_class_manage_rights() {
        let school_id = Uuid::new_v4();
        let creator = Uuid::new_v4();
        let teacher = Uuid::new_v4();
        let class = class(Some(school_id), Some(creator), Some(teacher));

        assert!(can_manage_class(&user(creator, None, vec![], &[]), &class));
        assert!(can_manage_class(&user(teacher, None, vec![], &[]), &class));
        assert!(can_manage_class(
            &user(Uuid::new_v4(), None, vec![system_roles::SYSTEM_ADMIN], &[]),
            &class
        ));
        assert!(can_manage_class(
            &user(Uuid::new_v4(), Some(school_id), vec![], &["classes:manage"]),
            &class
        ));

        // Same school without the manage permission.
        assert!(!can_manage_class(
            &user(Uuid::new_v4(), Some(school_id), vec![], &["classes:update"]),
            &class
        ));
        assert!(!can_manage_class(
            &user(Uuid::new_v4(), Some(Uuid::new_v4()), vec![], &["classes:manage"]),
            &class
        ));
    }

    #[test]
    fn test_schoolless_class_requires_owner() {
        let class = class(None, Some(Uuid::new_v4()), None);
        let member = user(Uuid::new_v4(), None, vec![], &["classes:manage"]);
        assert!(!can_manage_class(&member, &class));
        assert!(ensure_can_manage_class(&member, &class).is_err());
    }
}
