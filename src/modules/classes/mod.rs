//! Classes: CRUD, teacher assignment, images and class code visibility.

pub mod controller;
pub mod router;
pub mod service;
