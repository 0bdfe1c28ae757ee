//! Fake data seeding for local development.

pub mod models;
pub mod schools;

pub use models::SchoolSeed;
pub use schools::{clear_schools, generate_schools, seed_schools};
