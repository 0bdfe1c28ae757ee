use schoolhub_core::{PaginationMeta, PaginationParams};
use schoolhub_models::curriculum::{ALevelSelection, TvetSelection};
use schoolhub_models::{
    AcademicSelection, AcademicStructureResponse, AssignTeacherDto, BulkJoinRequestDto,
    BulkJoinResponse, ClassFilterParams, ClassResponse, ClassType, CourseContentModule,
    CreateClassDto, CreateSchoolDto, InvitationCodesResponse, JoinRequestFilterParams,
    JoinRequestItem, JoinRequestStatus, JoinRole, JoinWithCodeDto, ModuleType,
    PaginatedClassesResponse, PaginatedJoinRequestsResponse, PaginatedSchoolsResponse,
    RespondJoinRequestDto, School, SchoolFilterParams, SchoolJoinRequest, SchoolType,
    UpdateClassDto, UpdateSchoolDto, UploadImageResponse,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::schools::controller::create_school,
        crate::modules::schools::controller::get_all_schools,
        crate::modules::schools::controller::get_school,
        crate::modules::schools::controller::get_school_by_username,
        crate::modules::schools::controller::update_school,
        crate::modules::schools::controller::upload_school_logo,
        crate::modules::schools::controller::delete_school_logo,
        crate::modules::schools::controller::generate_invitation_codes,
        crate::modules::schools::controller::generate_academic_structure,
        crate::modules::join_requests::controller::create_join_requests,
        crate::modules::join_requests::controller::join_with_code,
        crate::modules::join_requests::controller::list_join_requests,
        crate::modules::join_requests::controller::respond_to_join_request,
        crate::modules::classes::controller::create_class,
        crate::modules::classes::controller::get_classes,
        crate::modules::classes::controller::get_class,
        crate::modules::classes::controller::get_class_by_username,
        crate::modules::classes::controller::update_class,
        crate::modules::classes::controller::assign_class_teacher,
        crate::modules::classes::controller::delete_class,
        crate::modules::classes::controller::upload_class_image,
        crate::modules::classes::controller::delete_class_image,
        crate::modules::classes::controller::get_class_modules,
    ),
    components(
        schemas(
            School,
            SchoolType,
            CreateSchoolDto,
            UpdateSchoolDto,
            SchoolFilterParams,
            PaginatedSchoolsResponse,
            InvitationCodesResponse,
            AcademicSelection,
            ALevelSelection,
            TvetSelection,
            AcademicStructureResponse,
            UploadImageResponse,
            ClassResponse,
            ClassType,
            CreateClassDto,
            UpdateClassDto,
            AssignTeacherDto,
            ClassFilterParams,
            PaginatedClassesResponse,
            CourseContentModule,
            ModuleType,
            SchoolJoinRequest,
            JoinRole,
            JoinRequestStatus,
            JoinRequestItem,
            BulkJoinRequestDto,
            BulkJoinResponse,
            JoinWithCodeDto,
            RespondJoinRequestDto,
            JoinRequestFilterParams,
            PaginatedJoinRequestsResponse,
            PaginationMeta,
            PaginationParams,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Schools", description = "Schools, logos, invitation codes and academic structure"),
        (name = "Join Requests", description = "Requests to join a school as student, teacher, staff or parent"),
        (name = "Classes", description = "Classes, teachers, images and modules")
    ),
    info(
        title = "SchoolHub API",
        version = "0.1.0",
        description = "Multi-tenant school management: schools, classes, course modules and join requests.",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/api/schools",
            "/api/schools/{id}",
            "/api/schools/username/{username}",
            "/api/schools/{id}/logo",
            "/api/schools/{id}/invitation-codes",
            "/api/schools/{id}/academic-structure",
            "/api/schools/{id}/join",
            "/api/schools/{id}/join-requests",
            "/api/schools/{id}/join-requests/bulk",
            "/api/schools/{id}/join-requests/{request_id}",
            "/api/classes",
            "/api/classes/{id}",
            "/api/classes/username/{username}",
            "/api/classes/{id}/teacher",
            "/api/classes/{id}/image",
            "/api/classes/{id}/modules",
        ] {
            assert!(paths.contains(&expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
