//! # SchoolHub Cache
//!
//! Optional Redis cache for school and class rows.
//!
//! The cache is strictly an accelerator: reads fall back to the database on
//! any miss or Redis error, and writes invalidate the affected keys. Every
//! helper takes `Option<&RedisCache>` so callers never branch on whether
//! caching is configured.
//!
//! ```ignore
//! use schoolhub_cache::{CacheConfig, RedisCache, keys};
//!
//! let config = CacheConfig::from_env();
//! let cache = RedisCache::connect(&config).await?;
//! cache.set(&keys::schools::by_id(id), &school).await?;
//! ```

pub mod config;
pub mod keys;
pub mod redis;

pub use config::CacheConfig;
pub use keys::{hash_filters, invalidate};
pub use redis::{CacheError, RedisCache};
