//! # SchoolHub Core
//!
//! Foundational types shared by every SchoolHub crate:
//!
//! - [`errors`]: [`AppError`] with HTTP response conversion
//! - [`pagination`]: pagination parameters and response metadata
//! - [`file_storage`]: the [`FileStorage`] trait and a local filesystem backend
//! - [`secrets`]: random codes and bcrypt hashing
//! - [`serde`]: lenient deserializers for query strings

pub mod errors;
pub mod file_storage;
pub mod pagination;
pub mod secrets;
pub mod serde;

pub use errors::AppError;
pub use file_storage::{FileStorage, LocalFileStorage, StorageError};
pub use pagination::{PaginationMeta, PaginationParams};
