use axum::{
    Router,
    routing::{get, post, put},
};

use crate::modules::schools::router::upload_body_limit;
use crate::state::AppState;

use super::controller::{
    assign_class_teacher, create_class, delete_class, delete_class_image, get_class,
    get_class_by_username, get_class_modules, get_classes, update_class, upload_class_image,
};

pub fn init_classes_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", post(create_class).get(get_classes))
        .route("/username/{username}", get(get_class_by_username))
        .route(
            "/{id}",
            get(get_class).patch(update_class).delete(delete_class),
        )
        .route("/{id}/teacher", put(assign_class_teacher))
        .route(
            "/{id}/image",
            post(upload_class_image)
                .delete(delete_class_image)
                .layer(upload_body_limit(max_upload_bytes)),
        )
        .route("/{id}/modules", get(get_class_modules))
}
