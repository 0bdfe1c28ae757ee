use schoolhub_models::SchoolType;

/// Seed data for creating a school.
#[derive(Debug, Clone)]
pub struct SchoolSeed {
    pub name: String,
    pub username: String,
    pub school_type: SchoolType,
    pub email: String,
    pub address: String,
}
