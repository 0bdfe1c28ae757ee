//! Well-known role ids and permission names carried in access tokens.

pub mod system_roles {
    use uuid::Uuid;

    /// Full access to every school.
    pub const SYSTEM_ADMIN: Uuid = Uuid::from_u128(0x00000000_0000_0000_0000_000000000001);
    /// School-scoped administration.
    pub const SCHOOL_ADMIN: Uuid = Uuid::from_u128(0x00000000_0000_0000_0000_000000000002);
    pub const TEACHER: Uuid = Uuid::from_u128(0x00000000_0000_0000_0000_000000000003);
    pub const STUDENT: Uuid = Uuid::from_u128(0x00000000_0000_0000_0000_000000000004);

    pub fn is_system_admin(role_ids: &[Uuid]) -> bool {
        role_ids.contains(&SYSTEM_ADMIN)
    }
}

pub mod permissions {
    pub const SCHOOLS_CREATE: &str = "schools:create";
    pub const SCHOOLS_READ: &str = "schools:read";
    pub const SCHOOLS_UPDATE: &str = "schools:update";
    pub const SCHOOLS_MANAGE: &str = "schools:manage";

    pub const CLASSES_CREATE: &str = "classes:create";
    pub const CLASSES_READ: &str = "classes:read";
    pub const CLASSES_UPDATE: &str = "classes:update";
    pub const CLASSES_DELETE: &str = "classes:delete";
    pub const CLASSES_MANAGE: &str = "classes:manage";

    pub fn all() -> Vec<&'static str> {
        vec![
            SCHOOLS_CREATE,
            SCHOOLS_READ,
            SCHOOLS_UPDATE,
            SCHOOLS_MANAGE,
            CLASSES_CREATE,
            CLASSES_READ,
            CLASSES_UPDATE,
            CLASSES_DELETE,
            CLASSES_MANAGE,
        ]
    }
}
