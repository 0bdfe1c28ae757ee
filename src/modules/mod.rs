pub mod classes;
pub mod join_requests;
pub mod schools;
