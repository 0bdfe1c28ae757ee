pub mod auth_helpers;
pub mod db_errors;
pub mod upload;
