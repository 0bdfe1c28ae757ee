use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::modules::join_requests::router::init_join_requests_router;
use crate::state::AppState;

use super::controller::{
    create_school, delete_school_logo, generate_academic_structure, generate_invitation_codes,
    get_all_schools, get_school, get_school_by_username, update_school, upload_school_logo,
};

/// Multipart framing on top of the largest accepted image.
pub(crate) fn upload_body_limit(max_upload_bytes: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_upload_bytes + 64 * 1024)
}

pub fn init_schools_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", post(create_school).get(get_all_schools))
        .route("/username/{username}", get(get_school_by_username))
        .route("/{id}", get(get_school).patch(update_school))
        .route(
            "/{id}/logo",
            post(upload_school_logo)
                .delete(delete_school_logo)
                .layer(upload_body_limit(max_upload_bytes)),
        )
        .route("/{id}/invitation-codes", post(generate_invitation_codes))
        .route("/{id}/academic-structure", post(generate_academic_structure))
        .merge(init_join_requests_router())
}
