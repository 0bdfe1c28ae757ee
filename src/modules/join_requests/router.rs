use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    create_join_requests, join_with_code, list_join_requests, respond_to_join_request,
};

/// School-scoped routes, merged into the schools router.
pub fn init_join_requests_router() -> Router<AppState> {
    Router::new()
        .route("/{id}/join", post(join_with_code))
        .route("/{id}/join-requests", get(list_join_requests))
        .route("/{id}/join-requests/bulk", post(create_join_requests))
        .route("/{id}/join-requests/{request_id}", patch(respond_to_join_request))
}
