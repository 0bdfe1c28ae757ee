//! # SchoolHub CLI
//!
//! Development and administration helpers used by the `schoolhub-cli`
//! binary: fake school seeding and a plain-text rendering of academic
//! structure plans.
//!
//! ```ignore
//! use schoolhub_cli::seeder::seed_schools;
//!
//! let ids = seed_schools(&pool, 10).await?;
//! ```

pub mod preview;
pub mod seeder;
