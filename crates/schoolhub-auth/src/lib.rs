//! # SchoolHub Auth
//!
//! Access tokens are issued by the identity provider; this crate verifies
//! them and exposes the embedded [`Claims`]. [`create_access_token`] mints
//! tokens with the same shape for the CLI and tests.

pub mod claims;
pub mod jwt;

pub use claims::Claims;
pub use jwt::{create_access_token, verify_token};
