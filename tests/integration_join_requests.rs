//! Database-backed join request tests.

mod common;

use axum::http::StatusCode;
use common::{
    TestCaller, body_json, create_test_user, empty_request, json_request, setup_test_app,
    unique_username,
};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

async fn create_school(pool: &PgPool, admin: &TestCaller) -> Uuid {
    let app = setup_test_app(pool.clone());
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/schools",
            Some(&admin.token()),
            json!({"name": "Lake View", "username": unique_username("lake")}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_str().unwrap().parse().unwrap()
}

async fn bulk(pool: &PgPool, admin: &TestCaller, school_id: Uuid, body: serde_json::Value) -> serde_json::Value {
    let app = setup_test_app(pool.clone());
    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/api/schools/{}/join-requests/bulk", school_id),
            Some(&admin.token()),
            body,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[sqlx::test(migrations = "./migrations")]
async fn test_bulk_requests_skip_duplicates(pool: PgPool) {
    let admin = TestCaller::system_admin();
    let school_id = create_school(&pool, &admin).await;
    let body = json!({"requests": [
        {"role": "teacher", "name": "Grace", "email": "Grace@Lake.example"},
        {"role": "teacher", "name": "Grace again", "email": "grace@lake.example"},
        {"role": "student", "name": "Grace", "email": "grace@lake.example"},
        {"role": "parent", "name": "Eric", "phone": "+250788000111"}
    ]});

    let first = bulk(&pool, &admin, school_id, body.clone()).await;
    assert_eq!(first["created"], 3);
    assert_eq!(first["skipped"], 1);

    let second = bulk(&pool, &admin, school_id, body).await;
    assert_eq!(second["created"], 0);
    assert_eq!(second["skipped"], 4);

    let app = setup_test_app(pool);
    let response = app
        .oneshot(empty_request(
            "GET",
            &format!("/api/schools/{}/join-requests?role=teacher", school_id),
            Some(&admin.token()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let list = body_json(response).await;
    assert_eq!(list["meta"]["total"], 1);
    assert_eq!(list["data"][0]["email"], "grace@lake.example");
    assert_eq!(list["data"][0]["status"], "pending");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_bulk_request_without_contact_is_rejected(pool: PgPool) {
    let admin = TestCaller::system_admin();
    let school_id = create_school(&pool, &admin).await;

    let app = setup_test_app(pool);
    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/api/schools/{}/join-requests/bulk", school_id),
            Some(&admin.token()),
            json!({"requests": [
                {"role": "teacher", "name": "Grace", "email": "grace@lake.example"},
                {"role": "staff", "name": "Nobody"}
            ]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body_json(response).await["error"],
        "requests[1] must include an email or a phone"
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_bulk_links_existing_users(pool: PgPool) {
    let admin = TestCaller::system_admin();
    let school_id = create_school(&pool, &admin).await;
    let user_id = create_test_user(&pool, Some("Jean@Lake.example"), None).await;

    bulk(
        &pool,
        &admin,
        school_id,
        json!({"requests": [{"role": "student", "name": "Jean", "email": "jean@lake.example"}]}),
    )
    .await;

    let linked: Option<Uuid> =
        sqlx::query_scalar("SELECT user_id FROM school_join_requests WHERE school_id = $1")
            .bind(school_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(linked, Some(user_id));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_join_with_invitation_code(pool: PgPool) {
    let admin = TestCaller::system_admin();
    let school_id = create_school(&pool, &admin).await;
    let joiner = TestCaller::new(&[]);

    // No codes issued yet.
    let app = setup_test_app(pool.clone());
    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/api/schools/{}/join", school_id),
            Some(&joiner.token()),
            json!({"code": "TCH-AAAAAAAA", "name": "Grace"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let app = setup_test_app(pool.clone());
    let response = app
        .oneshot(empty_request(
            "POST",
            &format!("/api/schools/{}/invitation-codes", school_id),
            Some(&admin.token()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let codes = body_json(response).await;
    let teacher_code = codes["teacher_code"].as_str().unwrap().to_string();
    assert!(teacher_code.starts_with("TCH-"));

    let app = setup_test_app(pool.clone());
    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/api/schools/{}/join", school_id),
            Some(&joiner.token()),
            json!({"code": "STU-WRONGONE", "name": "Grace"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let app = setup_test_app(pool.clone());
    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/api/schools/{}/join", school_id),
            Some(&joiner.token()),
            json!({"code": teacher_code.to_lowercase(), "name": "Grace"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let request = body_json(response).await;
    assert_eq!(request["role"], "teacher");
    assert_eq!(request["email"], joiner.email);
    assert_eq!(request["user_id"], joiner.id.to_string());

    let app = setup_test_app(pool);
    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/api/schools/{}/join", school_id),
            Some(&joiner.token()),
            json!({"code": teacher_code, "name": "Grace"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_accepting_request_attaches_member(pool: PgPool) {
    let admin = TestCaller::system_admin();
    let school_id = create_school(&pool, &admin).await;
    let user_id = create_test_user(&pool, None, Some("+250788000222")).await;

    bulk(
        &pool,
        &admin,
        school_id,
        json!({"requests": [
            {"role": "student", "name": "Aline", "phone": "+250788000222"},
            {"role": "teacher", "name": "Ghost", "email": "ghost@lake.example"}
        ]}),
    )
    .await;

    let ids: Vec<(Uuid, String)> = sqlx::query_as(
        "SELECT id, name FROM school_join_requests WHERE school_id = $1 ORDER BY name",
    )
    .bind(school_id)
    .fetch_all(&pool)
    .await
    .unwrap();
    let (aline, ghost) = (ids[0].0, ids[1].0);

    let respond = |request_id: Uuid, status: &str| {
        json_request(
            "PATCH",
            &format!("/api/schools/{}/join-requests/{}", school_id, request_id),
            Some(&admin.token()),
            json!({"status": status}),
        )
    };

    let app = setup_test_app(pool.clone());
    let response = app.oneshot(respond(aline, "accepted")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "accepted");
    assert_eq!(body["user_id"], user_id.to_string());

    let (school, students): (Option<Uuid>, i32) = sqlx::query_as(
        "SELECT u.school_id, s.total_students FROM users u, schools s
         WHERE u.id = $1 AND s.id = $2",
    )
    .bind(user_id)
    .bind(school_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(school, Some(school_id));
    assert_eq!(students, 1);

    // Already answered.
    let app = setup_test_app(pool.clone());
    let response = app.oneshot(respond(aline, "rejected")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // No account matches the contact.
    let app = setup_test_app(pool.clone());
    let response = app.oneshot(respond(ghost, "accepted")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let app = setup_test_app(pool.clone());
    let response = app.oneshot(respond(ghost, "rejected")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "rejected");

    let app = setup_test_app(pool);
    let response = app.oneshot(respond(Uuid::new_v4(), "accepted")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_regenerated_codes_replace_old_ones(pool: PgPool) {
    let admin = TestCaller::system_admin();
    let school_id = create_school(&pool, &admin).await;
    let codes_uri = format!("/api/schools/{}/invitation-codes", school_id);
    let join_uri = format!("/api/schools/{}/join", school_id);

    let mut teacher_codes = Vec::new();
    for _ in 0..2 {
        let app = setup_test_app(pool.clone());
        let response = app
            .oneshot(empty_request("POST", &codes_uri, Some(&admin.token())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let codes = body_json(response).await;
        teacher_codes.push(codes["teacher_code"].as_str().unwrap().to_string());
    }
    assert_ne!(teacher_codes[0], teacher_codes[1]);

    let joiner = TestCaller::new(&[]);
    let app = setup_test_app(pool.clone());
    let response = app
        .oneshot(json_request(
            "POST",
            &join_uri,
            Some(&joiner.token()),
            json!({"code": teacher_codes[0], "name": "Grace"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let app = setup_test_app(pool);
    let response = app
        .oneshot(json_request(
            "POST",
            &join_uri,
            Some(&joiner.token()),
            json!({"code": teacher_codes[1], "name": "Grace"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}
