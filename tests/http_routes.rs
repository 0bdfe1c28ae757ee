//! Requests rejected before the service layer touches the database.

mod common;

use axum::http::StatusCode;
use common::{TestCaller, body_json, empty_request, json_request, offline_app};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = offline_app();
    let response = app
        .oneshot(empty_request("GET", "/api/schools", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Missing authorization header");
}

#[tokio::test]
async fn test_malformed_token_is_unauthorized() {
    let app = offline_app();
    let response = app
        .oneshot(empty_request("GET", "/api/classes", Some("not-a-jwt")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn test_missing_permission_is_forbidden() {
    let app = offline_app();
    let token = TestCaller::new(&["classes:read"]).token();
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/schools",
            Some(&token),
            json!({"name": "Hill Academy", "username": "hill-academy"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "Access denied. Missing required permission: schools:create"
    );
}

#[tokio::test]
async fn test_create_school_validation_is_unprocessable() {
    let app = offline_app();
    let token = TestCaller::new(&["schools:create"]).token();
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/schools",
            Some(&token),
            json!({"name": "Hill Academy", "username": "Hill Academy!"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_create_school_missing_field_is_bad_request() {
    let app = offline_app();
    let token = TestCaller::new(&["schools:create"]).token();
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/schools",
            Some(&token),
            json!({"name": "Hill Academy"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "username is required");
}

#[tokio::test]
async fn test_school_class_without_school_is_bad_request() {
    let app = offline_app();
    let token = TestCaller::new(&["classes:create"]).token();
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/classes",
            Some(&token),
            json!({"name": "S1 A", "username": "s1-a", "class_type": "school_class"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_bulk_join_is_unprocessable() {
    let app = offline_app();
    let token = TestCaller::system_admin().token();
    let uri = format!("/api/schools/{}/join-requests/bulk", Uuid::new_v4());
    let response = app
        .oneshot(json_request("POST", &uri, Some(&token), json!({"requests": []})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_bulk_join_nested_item_errors_name_the_index() {
    let app = offline_app();
    let token = TestCaller::system_admin().token();
    let uri = format!("/api/schools/{}/join-requests/bulk", Uuid::new_v4());
    let response = app
        .oneshot(json_request(
            "POST",
            &uri,
            Some(&token),
            json!({"requests": [
                {"role": "teacher", "name": "Grace", "email": "grace@example.com"},
                {"role": "student", "name": "Paul", "email": "not-an-email"}
            ]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"], "requests[1].email is invalid");
}

#[tokio::test]
async fn test_responding_with_pending_is_unprocessable() {
    let app = offline_app();
    let token = TestCaller::system_admin().token();
    let uri = format!(
        "/api/schools/{}/join-requests/{}",
        Uuid::new_v4(),
        Uuid::new_v4()
    );
    let response = app
        .oneshot(json_request("PATCH", &uri, Some(&token), json!({"status": "pending"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"], "status must be accepted or rejected");
}

#[tokio::test]
async fn test_invalid_path_uuid_is_bad_request() {
    let app = offline_app();
    let token = TestCaller::new(&["classes:read"]).token();
    let response = app
        .oneshot(empty_request("GET", "/api/classes/not-a-uuid", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_query_is_bad_request() {
    let app = offline_app();
    let token = TestCaller::new(&["schools:read"]).token();
    let response = app
        .oneshot(empty_request("GET", "/api/schools?limit=ten", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = offline_app();
    let response = app
        .oneshot(empty_request("GET", "/api-docs/openapi.json", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["info"]["title"], "SchoolHub API");
    assert!(body["paths"]["/api/schools/{id}/academic-structure"].is_object());
}

#[tokio::test]
async fn test_malformed_academic_selection_is_json_bad_request() {
    let app = offline_app();
    let token = TestCaller::system_admin().token();
    let uri = format!("/api/schools/{}/academic-structure", Uuid::new_v4());
    let response = app
        .oneshot(json_request("POST", &uri, Some(&token), json!({"streams": "A"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid field type in request");
}

#[tokio::test]
async fn test_malformed_teacher_assignment_is_json_bad_request() {
    let app = offline_app();
    let token = TestCaller::system_admin().token();
    let uri = format!("/api/classes/{}/teacher", Uuid::new_v4());
    let response = app
        .oneshot(json_request("PUT", &uri, Some(&token), json!({"teacher_id": 42})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].is_string());
}
