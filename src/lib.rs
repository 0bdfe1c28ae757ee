//! # SchoolHub API
//!
//! A multi-tenant school management backend built with Axum and PostgreSQL.
//! Schools publish invitation codes, generate their academic structure
//! (classes and course modules) from a fixed curriculum, and route join
//! requests from students, teachers, staff and parents. Classes carry an
//! internal code whose visibility depends on the class type.
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── middleware/       # AuthUser and permission extractors
//! ├── modules/
//! │   ├── schools/      # schools, logos, invitation codes, academic structure
//! │   ├── join_requests/
//! │   └── classes/
//! └── utils/            # access checks, upload parsing, database error mapping
//! crates/
//! ├── schoolhub-core    # AppError, pagination, file storage, secrets
//! ├── schoolhub-config  # environment configuration
//! ├── schoolhub-db      # pool, migrations, constraint inspection
//! ├── schoolhub-auth    # JWT verification
//! ├── schoolhub-models  # entities, DTOs, curriculum planner
//! ├── schoolhub-cache   # optional Redis cache
//! ├── schoolhub-observability
//! └── schoolhub-cli
//! ```
//!
//! Each feature module has `controller.rs` (handlers with OpenAPI
//! annotations), `service.rs` (queries and business rules) and `router.rs`.
//!
//! ## Authentication
//!
//! Tokens are issued by the identity provider and verified here. Claims
//! carry the user id, email, optional school id, role ids and permission
//! names such as `schools:manage` or `classes:create`.
//!
//! ## API documentation
//!
//! - Scalar: `http://localhost:3000/scalar`
//! - OpenAPI JSON: `http://localhost:3000/api-docs/openapi.json`

pub mod docs;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod utils;
pub mod validator;

pub use schoolhub_auth;
pub use schoolhub_config;
pub use schoolhub_core;
pub use schoolhub_db;
pub use schoolhub_models;
