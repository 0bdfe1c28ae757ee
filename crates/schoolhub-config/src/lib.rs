//! # SchoolHub Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`server`]: listener addresses
//! - [`jwt`]: token verification settings
//! - [`cors`]: allowed browser origins
//! - [`storage`]: upload directory and public URL
//!
//! Every struct exposes `from_env()`; missing or unparsable variables fall
//! back to development defaults.

pub mod cors;
pub mod jwt;
pub mod server;
pub mod storage;

pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use server::ServerConfig;
pub use storage::StorageConfig;

pub(crate) fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
