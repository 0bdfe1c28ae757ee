use axum::{
    Json,
    extract::{Multipart, Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use schoolhub_core::AppError;
use schoolhub_models::{
    AssignTeacherDto, ClassFilterParams, ClassResponse, CourseContentModule, CreateClassDto,
    PaginatedClassesResponse, UpdateClassDto, UploadImageResponse,
};
use uuid::Uuid;

use crate::middleware::auth::{
    AuthUser, RequireClassesCreate, RequireClassesDelete, RequireClassesRead, RequireClassesUpdate,
};
use crate::modules::schools::service::SchoolService;
use crate::state::AppState;
use crate::utils::auth_helpers::{ensure_can_manage_class, ensure_school_access};
use crate::utils::upload::read_image;
use crate::validator::ValidatedJson;

use super::service::ClassService;

/// A class may only be attached to an existing school the caller can act on.
async fn check_target_school(
    state: &AppState,
    auth_user: &AuthUser,
    school_id: Option<Uuid>,
) -> Result<(), AppError> {
    if let Some(school_id) = school_id {
        let school = SchoolService::get_school(&state.db, state.cache(), school_id).await?;
        ensure_school_access(auth_user, &school)?;
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/classes",
    request_body = CreateClassDto,
    responses(
        (status = 201, description = "Class created", body = ClassResponse),
        (status = 400, description = "school_class without a school"),
        (status = 403, description = "No access to the target school"),
        (status = 404, description = "School or class teacher not found"),
        (status = 409, description = "Username already taken"),
        (status = 422, description = "Validation error")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
pub async fn create_class(
    State(state): State<AppState>,
    RequireClassesCreate(auth_user): RequireClassesCreate,
    ValidatedJson(dto): ValidatedJson<CreateClassDto>,
) -> Result<(StatusCode, Json<ClassResponse>), AppError> {
    let viewer = auth_user.viewer()?;
    check_target_school(&state, &auth_user, dto.school_id).await?;

    let class = ClassService::create_class(&state.db, viewer.user_id, dto).await?;
    Ok((StatusCode::CREATED, Json(class.into_response(&viewer))))
}

#[utoipa::path(
    get,
    path = "/api/classes",
    params(ClassFilterParams),
    responses(
        (status = 200, description = "Paginated list of classes", body = PaginatedClassesResponse),
        (status = 400, description = "Invalid query parameters"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing classes:read")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
pub async fn get_classes(
    State(state): State<AppState>,
    RequireClassesRead(auth_user): RequireClassesRead,
    filters: Result<Query<ClassFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedClassesResponse>, AppError> {
    let Query(filters) = filters
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;
    let viewer = auth_user.viewer()?;

    let (classes, meta) = ClassService::get_classes(&state.db, &filters).await?;
    Ok(Json(PaginatedClassesResponse {
        data: classes
            .into_iter()
            .map(|class| class.into_response(&viewer))
            .collect(),
        meta,
    }))
}

#[utoipa::path(
    get,
    path = "/api/classes/{id}",
    params(("id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Class details; `code` only when visible to the caller", body = ClassResponse),
        (status = 404, description = "Class not found")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
pub async fn get_class(
    State(state): State<AppState>,
    RequireClassesRead(auth_user): RequireClassesRead,
    Path(id): Path<Uuid>,
) -> Result<Json<ClassResponse>, AppError> {
    let viewer = auth_user.viewer()?;
    let class = ClassService::get_class(&state.db, state.cache(), id).await?;
    Ok(Json(class.into_response(&viewer)))
}

#[utoipa::path(
    get,
    path = "/api/classes/username/{username}",
    params(("username" = String, Path, description = "Class username")),
    responses(
        (status = 200, description = "Class details", body = ClassResponse),
        (status = 404, description = "Class not found")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
pub async fn get_class_by_username(
    State(state): State<AppState>,
    RequireClassesRead(auth_user): RequireClassesRead,
    Path(username): Path<String>,
) -> Result<Json<ClassResponse>, AppError> {
    let viewer = auth_user.viewer()?;
    let class = ClassService::get_class_by_username(&state.db, &username).await?;
    Ok(Json(class.into_response(&viewer)))
}

#[utoipa::path(
    patch,
    path = "/api/classes/{id}",
    params(("id" = Uuid, Path, description = "Class ID")),
    request_body = UpdateClassDto,
    responses(
        (status = 200, description = "Class updated", body = ClassResponse),
        (status = 400, description = "school_class without a school"),
        (status = 403, description = "Caller cannot manage this class"),
        (status = 404, description = "Class not found"),
        (status = 409, description = "Username already taken")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
pub async fn update_class(
    State(state): State<AppState>,
    RequireClassesUpdate(auth_user): RequireClassesUpdate,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateClassDto>,
) -> Result<Json<ClassResponse>, AppError> {
    let viewer = auth_user.viewer()?;
    let class = ClassService::get_class(&state.db, state.cache(), id).await?;
    ensure_can_manage_class(&auth_user, &class)?;
    check_target_school(&state, &auth_user, dto.school_id).await?;

    let class = ClassService::update_class(&state.db, state.cache(), &class, dto).await?;
    Ok(Json(class.into_response(&viewer)))
}

#[utoipa::path(
    put,
    path = "/api/classes/{id}/teacher",
    params(("id" = Uuid, Path, description = "Class ID")),
    request_body = AssignTeacherDto,
    responses(
        (status = 200, description = "Class teacher assigned or cleared", body = ClassResponse),
        (status = 403, description = "Caller cannot manage this class"),
        (status = 404, description = "Class or teacher not found")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
pub async fn assign_class_teacher(
    State(state): State<AppState>,
    RequireClassesUpdate(auth_user): RequireClassesUpdate,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<AssignTeacherDto>,
) -> Result<Json<ClassResponse>, AppError> {
    let viewer = auth_user.viewer()?;
    let class = ClassService::get_class(&state.db, state.cache(), id).await?;
    ensure_can_manage_class(&auth_user, &class)?;

    let class = ClassService::assign_teacher(&state.db, state.cache(), id, dto.teacher_id).await?;
    Ok(Json(class.into_response(&viewer)))
}

#[utoipa::path(
    delete,
    path = "/api/classes/{id}",
    params(("id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 204, description = "Class deleted"),
        (status = 403, description = "Caller cannot manage this class"),
        (status = 404, description = "Class not found")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
pub async fn delete_class(
    State(state): State<AppState>,
    RequireClassesDelete(auth_user): RequireClassesDelete,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let class = ClassService::get_class(&state.db, state.cache(), id).await?;
    ensure_can_manage_class(&auth_user, &class)?;

    ClassService::delete_class(&state.db, state.cache(), &state.file_storage, &class).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/classes/{id}/image",
    params(("id" = Uuid, Path, description = "Class ID")),
    request_body(content_type = "multipart/form-data", description = "Image in the `file` field (PNG, JPEG or WebP, at most 5 MiB)"),
    responses(
        (status = 200, description = "Image stored", body = UploadImageResponse),
        (status = 403, description = "Caller cannot manage this class"),
        (status = 404, description = "Class not found"),
        (status = 413, description = "File too large"),
        (status = 415, description = "Unsupported image format")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
pub async fn upload_class_image(
    State(state): State<AppState>,
    RequireClassesUpdate(auth_user): RequireClassesUpdate,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<UploadImageResponse>, AppError> {
    let class = ClassService::get_class(&state.db, state.cache(), id).await?;
    ensure_can_manage_class(&auth_user, &class)?;

    let upload = read_image(multipart, state.storage_config.max_upload_bytes).await?;
    let response =
        ClassService::set_image(&state.db, state.cache(), &state.file_storage, &class, upload)
            .await?;
    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/api/classes/{id}/image",
    params(("id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 204, description = "Image removed"),
        (status = 403, description = "Caller cannot manage this class"),
        (status = 404, description = "Class not found")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
pub async fn delete_class_image(
    State(state): State<AppState>,
    RequireClassesUpdate(auth_user): RequireClassesUpdate,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let class = ClassService::get_class(&state.db, state.cache(), id).await?;
    ensure_can_manage_class(&auth_user, &class)?;

    ClassService::delete_image(&state.db, state.cache(), &state.file_storage, &class).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/classes/{id}/modules",
    params(("id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Modules of the class ordered by code", body = Vec<CourseContentModule>),
        (status = 404, description = "Class not found")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
pub async fn get_class_modules(
    State(state): State<AppState>,
    _auth_user: RequireClassesRead,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CourseContentModule>>, AppError> {
    let class = ClassService::get_class(&state.db, state.cache(), id).await?;
    let modules = ClassService::get_class_modules(&state.db, class.id).await?;
    Ok(Json(modules))
}
