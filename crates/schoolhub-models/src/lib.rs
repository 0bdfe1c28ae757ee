//! # SchoolHub Models
//!
//! Database entities, request/response DTOs and the fixed curriculum
//! taxonomy used to generate academic structures.
//!
//! - [`schools`]: schools, invitation codes, academic structure responses
//! - [`classes`]: classes and the class code visibility rule
//! - [`modules`]: course content modules
//! - [`join_requests`]: school join requests
//! - [`curriculum`]: taxonomy and the academic structure planner
//! - [`roles`]: well-known role ids and permission names

pub mod classes;
pub mod curriculum;
pub mod join_requests;
pub mod modules;
pub mod roles;
pub mod schools;
pub mod validation;

pub use classes::{
    AssignTeacherDto, Class, ClassFilterParams, ClassResponse, ClassType, CreateClassDto,
    PaginatedClassesResponse, UpdateClassDto, Viewer,
};
pub use curriculum::{AcademicPlan, AcademicSelection, CurriculumError, plan_academic_structure};
pub use join_requests::{
    BulkJoinRequestDto, BulkJoinResponse, JoinRequestFilterParams, JoinRequestItem,
    JoinRequestStatus, JoinRole, JoinWithCodeDto, PaginatedJoinRequestsResponse,
    RespondJoinRequestDto, SchoolJoinRequest,
};
pub use modules::{CourseContentModule, ModuleType};
pub use schools::{
    AcademicStructureResponse, CreateSchoolDto, InvitationCodesResponse, PaginatedSchoolsResponse,
    School, SchoolCodeHashes, SchoolFilterParams, SchoolType, UpdateSchoolDto,
    UploadImageResponse,
};
