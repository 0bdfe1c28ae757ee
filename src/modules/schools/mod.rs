//! Schools: CRUD, logos, invitation codes and academic structure generation.

pub mod controller;
pub mod invitations;
pub mod router;
pub mod service;
pub mod structure;
