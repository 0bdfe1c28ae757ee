use axum::{
    Json,
    extract::{Multipart, Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use schoolhub_core::AppError;
use schoolhub_models::{
    AcademicSelection, AcademicStructureResponse, CreateSchoolDto, InvitationCodesResponse,
    PaginatedSchoolsResponse, School, SchoolFilterParams, UpdateSchoolDto, UploadImageResponse,
};
use uuid::Uuid;

use crate::middleware::auth::{
    RequireSchoolsCreate, RequireSchoolsManage, RequireSchoolsRead, RequireSchoolsUpdate,
};
use crate::state::AppState;
use crate::utils::auth_helpers::ensure_school_access;
use crate::utils::upload::read_image;
use crate::validator::ValidatedJson;

use super::invitations::InvitationService;
use super::service::SchoolService;
use super::structure::StructureService;

#[utoipa::path(
    post,
    path = "/api/schools",
    request_body = CreateSchoolDto,
    responses(
        (status = 201, description = "School created", body = School),
        (status = 400, description = "Malformed body"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing schools:create"),
        (status = 409, description = "Username already taken"),
        (status = 422, description = "Validation error")
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
pub async fn create_school(
    State(state): State<AppState>,
    RequireSchoolsCreate(auth_user): RequireSchoolsCreate,
    ValidatedJson(dto): ValidatedJson<CreateSchoolDto>,
) -> Result<(StatusCode, Json<School>), AppError> {
    let creator_id = auth_user.user_id()?;
    let school = SchoolService::create_school(&state.db, state.cache(), creator_id, dto).await?;
    Ok((StatusCode::CREATED, Json(school)))
}

#[utoipa::path(
    get,
    path = "/api/schools",
    params(SchoolFilterParams),
    responses(
        (status = 200, description = "Paginated list of schools", body = PaginatedSchoolsResponse),
        (status = 400, description = "Invalid query parameters"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing schools:read")
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
pub async fn get_all_schools(
    State(state): State<AppState>,
    _auth_user: RequireSchoolsRead,
    filters: Result<Query<SchoolFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedSchoolsResponse>, AppError> {
    let Query(filters) = filters
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;
    let schools = SchoolService::get_all_schools(&state.db, state.cache(), filters).await?;
    Ok(Json(schools))
}

#[utoipa::path(
    get,
    path = "/api/schools/{id}",
    params(("id" = Uuid, Path, description = "School ID")),
    responses(
        (status = 200, description = "School details", body = School),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "School not found")
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
pub async fn get_school(
    State(state): State<AppState>,
    _auth_user: RequireSchoolsRead,
    Path(id): Path<Uuid>,
) -> Result<Json<School>, AppError> {
    let school = SchoolService::get_school(&state.db, state.cache(), id).await?;
    Ok(Json(school))
}

#[utoipa::path(
    get,
    path = "/api/schools/username/{username}",
    params(("username" = String, Path, description = "School username")),
    responses(
        (status = 200, description = "School details", body = School),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "School not found")
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
pub async fn get_school_by_username(
    State(state): State<AppState>,
    _auth_user: RequireSchoolsRead,
    Path(username): Path<String>,
) -> Result<Json<School>, AppError> {
    let school = SchoolService::get_school_by_username(&state.db, &username).await?;
    Ok(Json(school))
}

#[utoipa::path(
    patch,
    path = "/api/schools/{id}",
    params(("id" = Uuid, Path, description = "School ID")),
    request_body = UpdateSchoolDto,
    responses(
        (status = 200, description = "School updated", body = School),
        (status = 403, description = "No access to this school"),
        (status = 404, description = "School not found"),
        (status = 409, description = "Username already taken"),
        (status = 422, description = "Validation error")
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
pub async fn update_school(
    State(state): State<AppState>,
    RequireSchoolsUpdate(auth_user): RequireSchoolsUpdate,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateSchoolDto>,
) -> Result<Json<School>, AppError> {
    let school = SchoolService::get_school(&state.db, state.cache(), id).await?;
    ensure_school_access(&auth_user, &school)?;

    let school = SchoolService::update_school(&state.db, state.cache(), id, dto).await?;
    Ok(Json(school))
}

#[utoipa::path(
    post,
    path = "/api/schools/{id}/logo",
    params(("id" = Uuid, Path, description = "School ID")),
    request_body(content_type = "multipart/form-data", description = "Image in the `file` field (PNG, JPEG or WebP, at most 5 MiB)"),
    responses(
        (status = 200, description = "Logo stored", body = UploadImageResponse),
        (status = 400, description = "Missing or empty file"),
        (status = 403, description = "No access to this school"),
        (status = 404, description = "School not found"),
        (status = 413, description = "File too large"),
        (status = 415, description = "Unsupported image format")
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
pub async fn upload_school_logo(
    State(state): State<AppState>,
    RequireSchoolsUpdate(auth_user): RequireSchoolsUpdate,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<UploadImageResponse>, AppError> {
    let school = SchoolService::get_school(&state.db, state.cache(), id).await?;
    ensure_school_access(&auth_user, &school)?;

    let upload = read_image(multipart, state.storage_config.max_upload_bytes).await?;
    let response = SchoolService::set_logo(
        &state.db,
        state.cache(),
        &state.file_storage,
        &school,
        upload,
    )
    .await?;
    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/api/schools/{id}/logo",
    params(("id" = Uuid, Path, description = "School ID")),
    responses(
        (status = 204, description = "Logo removed"),
        (status = 403, description = "No access to this school"),
        (status = 404, description = "School not found")
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
pub async fn delete_school_logo(
    State(state): State<AppState>,
    RequireSchoolsUpdate(auth_user): RequireSchoolsUpdate,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let school = SchoolService::get_school(&state.db, state.cache(), id).await?;
    ensure_school_access(&auth_user, &school)?;

    SchoolService::delete_logo(&state.db, state.cache(), &state.file_storage, &school).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/schools/{id}/invitation-codes",
    params(("id" = Uuid, Path, description = "School ID")),
    responses(
        (status = 200, description = "Fresh invitation codes, shown only once", body = InvitationCodesResponse),
        (status = 403, description = "No access to this school"),
        (status = 404, description = "School not found")
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
pub async fn generate_invitation_codes(
    State(state): State<AppState>,
    RequireSchoolsManage(auth_user): RequireSchoolsManage,
    Path(id): Path<Uuid>,
) -> Result<Json<InvitationCodesResponse>, AppError> {
    let school = SchoolService::get_school(&state.db, state.cache(), id).await?;
    ensure_school_access(&auth_user, &school)?;

    let codes = InvitationService::regenerate_codes(&state.db, state.cache(), id).await?;
    Ok(Json(codes))
}

#[utoipa::path(
    post,
    path = "/api/schools/{id}/academic-structure",
    params(("id" = Uuid, Path, description = "School ID")),
    request_body = AcademicSelection,
    responses(
        (status = 200, description = "Classes and modules generated", body = AcademicStructureResponse),
        (status = 400, description = "Empty selection or unknown curriculum code"),
        (status = 403, description = "No access to this school"),
        (status = 404, description = "School not found")
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
pub async fn generate_academic_structure(
    State(state): State<AppState>,
    RequireSchoolsManage(auth_user): RequireSchoolsManage,
    Path(id): Path<Uuid>,
    ValidatedJson(selection): ValidatedJson<AcademicSelection>,
) -> Result<Json<AcademicStructureResponse>, AppError> {
    let school = SchoolService::get_school(&state.db, state.cache(), id).await?;
    ensure_school_access(&auth_user, &school)?;

    let viewer = auth_user.viewer()?;
    let outcome = StructureService::generate(
        &state.db,
        state.cache(),
        &school,
        viewer.user_id,
        &selection,
    )
    .await?;

    Ok(Json(AcademicStructureResponse {
        classes_created: outcome.created.len(),
        classes_skipped: outcome.skipped,
        modules_created: outcome.modules_created as usize,
        classes: outcome
            .created
            .into_iter()
            .map(|class| class.into_response(&viewer))
            .collect(),
    }))
}
