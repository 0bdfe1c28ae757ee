use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use schoolhub_core::AppError;
use schoolhub_models::{
    BulkJoinRequestDto, BulkJoinResponse, JoinRequestFilterParams, JoinWithCodeDto,
    PaginatedJoinRequestsResponse, RespondJoinRequestDto, SchoolJoinRequest,
};
use uuid::Uuid;

use crate::middleware::auth::{AuthUser, RequireSchoolsManage};
use crate::modules::schools::service::SchoolService;
use crate::state::AppState;
use crate::utils::auth_helpers::ensure_school_access;
use crate::validator::ValidatedJson;

use super::service::JoinRequestService;

#[utoipa::path(
    post,
    path = "/api/schools/{id}/join-requests/bulk",
    params(("id" = Uuid, Path, description = "School ID")),
    request_body = BulkJoinRequestDto,
    responses(
        (status = 201, description = "Join requests created", body = BulkJoinResponse),
        (status = 403, description = "No access to this school"),
        (status = 404, description = "School not found"),
        (status = 422, description = "Invalid item or item without contact")
    ),
    tag = "Join Requests",
    security(("bearer_auth" = []))
)]
pub async fn create_join_requests(
    State(state): State<AppState>,
    RequireSchoolsManage(auth_user): RequireSchoolsManage,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<BulkJoinRequestDto>,
) -> Result<(StatusCode, Json<BulkJoinResponse>), AppError> {
    let school = SchoolService::get_school(&state.db, state.cache(), id).await?;
    ensure_school_access(&auth_user, &school)?;

    let response = JoinRequestService::create_bulk(&state.db, id, dto).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/schools/{id}/join",
    params(("id" = Uuid, Path, description = "School ID")),
    request_body = JoinWithCodeDto,
    responses(
        (status = 201, description = "Pending join request created", body = SchoolJoinRequest),
        (status = 400, description = "School has no invitation codes"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Invalid invitation code"),
        (status = 404, description = "School not found"),
        (status = 409, description = "A pending request already exists for this role")
    ),
    tag = "Join Requests",
    security(("bearer_auth" = []))
)]
pub async fn join_with_code(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<JoinWithCodeDto>,
) -> Result<(StatusCode, Json<SchoolJoinRequest>), AppError> {
    let user_id = auth_user.user_id()?;
    let request =
        JoinRequestService::join_with_code(&state.db, id, user_id, auth_user.email(), dto).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[utoipa::path(
    get,
    path = "/api/schools/{id}/join-requests",
    params(("id" = Uuid, Path, description = "School ID"), JoinRequestFilterParams),
    responses(
        (status = 200, description = "Paginated join requests", body = PaginatedJoinRequestsResponse),
        (status = 403, description = "No access to this school"),
        (status = 404, description = "School not found")
    ),
    tag = "Join Requests",
    security(("bearer_auth" = []))
)]
pub async fn list_join_requests(
    State(state): State<AppState>,
    RequireSchoolsManage(auth_user): RequireSchoolsManage,
    Path(id): Path<Uuid>,
    filters: Result<Query<JoinRequestFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedJoinRequestsResponse>, AppError> {
    let Query(filters) = filters
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;

    let school = SchoolService::get_school(&state.db, state.cache(), id).await?;
    ensure_school_access(&auth_user, &school)?;

    let requests = JoinRequestService::list(&state.db, id, filters).await?;
    Ok(Json(requests))
}

#[utoipa::path(
    patch,
    path = "/api/schools/{id}/join-requests/{request_id}",
    params(
        ("id" = Uuid, Path, description = "School ID"),
        ("request_id" = Uuid, Path, description = "Join request ID")
    ),
    request_body = RespondJoinRequestDto,
    responses(
        (status = 200, description = "Join request answered", body = SchoolJoinRequest),
        (status = 400, description = "No user account matches the request"),
        (status = 403, description = "No access to this school"),
        (status = 404, description = "Join request not found"),
        (status = 409, description = "Join request already answered"),
        (status = 422, description = "Status must be accepted or rejected")
    ),
    tag = "Join Requests",
    security(("bearer_auth" = []))
)]
pub async fn respond_to_join_request(
    State(state): State<AppState>,
    RequireSchoolsManage(auth_user): RequireSchoolsManage,
    Path((id, request_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(dto): ValidatedJson<RespondJoinRequestDto>,
) -> Result<Json<SchoolJoinRequest>, AppError> {
    let school = SchoolService::get_school(&state.db, state.cache(), id).await?;
    ensure_school_access(&auth_user, &school)?;

    let request =
        JoinRequestService::respond(&state.db, state.cache(), id, request_id, dto.status).await?;
    Ok(Json(request))
}
