// tests/api_tests.rs

mod common;

use axum::{body::Body, http::Request};
use common::{PASSWORD, spawn_app, test_config, unique_name};
use onlinecourse::{grading::GradingMode, routes, state::AppState};
use serde_json::{Value, json};
use tower::ServiceExt;

#[tokio::test]
async fn unknown_path_is_404() {
    // Arrange: drive the router directly, no socket needed
    let pool = common::memory_pool().await;
    let app = routes::create_router(AppState::new(pool, test_config(GradingMode::Lenient)));

    // Act
    let response = app
        .oneshot(
            Request::builder()
                .uri("/random_path_that_does_not_exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_works() {
    let app = spawn_app().await;
    let username = unique_name("u");

    let response = app.register(&username).await;

    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["type"], "Bearer");
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["user"]["username"], username.as_str());
    assert_eq!(body["user"]["first_name"], "Test");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("password").is_none(), "password hash must not leak");
}

#[tokio::test]
async fn register_fails_validation() {
    let app = spawn_app().await;

    // Username too short
    let response = app
        .post(
            "/api/auth/register",
            None,
            json!({ "username": "yo", "password": "password123" }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn register_duplicate_username_conflicts() {
    let app = spawn_app().await;
    let username = unique_name("dup");

    assert_eq!(app.register(&username).await.status().as_u16(), 201);
    let response = app.register(&username).await;

    assert_eq!(response.status().as_u16(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "User already exists.");
}

#[tokio::test]
async fn login_works_and_rejects_bad_credentials() {
    let app = spawn_app().await;
    let username = unique_name("u");
    app.register(&username).await;

    let ok = app.login(&username, PASSWORD).await;
    assert_eq!(ok.status().as_u16(), 200);
    let body: Value = ok.json().await.unwrap();
    assert!(body["token"].as_str().is_some());

    let wrong_password = app.login(&username, "not-the-password").await;
    assert_eq!(wrong_password.status().as_u16(), 401);

    let unknown_user = app.login("nobody_here", PASSWORD).await;
    assert_eq!(unknown_user.status().as_u16(), 401);
}

#[tokio::test]
async fn protected_routes_require_token() {
    let app = spawn_app().await;

    let response = app.post("/api/courses/1/enroll", None, json!({})).await;
    assert_eq!(response.status().as_u16(), 401);

    let response = app
        .post("/api/courses/1/enroll", Some("garbage.token.value"), json!({}))
        .await;
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn admin_routes_reject_students() {
    let app = spawn_app().await;
    let token = app.student_token().await;

    let response = app
        .post("/api/admin/courses", Some(&token), json!({ "name": "Nope" }))
        .await;
    assert_eq!(response.status().as_u16(), 403);

    let response = app
        .post("/api/admin/courses", None, json!({ "name": "Nope" }))
        .await;
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn admin_manages_courses_and_questions() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    // Invalid image URL is rejected
    let response = app
        .post(
            "/api/admin/courses",
            Some(&admin),
            json!({ "name": "Broken", "image_url": "not a url" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);

    // Description is sanitised
    let response = app
        .post(
            "/api/admin/courses",
            Some(&admin),
            json!({
                "name": "Safe",
                "description": "<p>Hello</p><script>alert(1)</script>",
                "image_url": "https://cdn.example.com/safe.png"
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let course: Value = response.json().await.unwrap();
    assert_eq!(course["description"], "<p>Hello</p>");
    assert_eq!(course["total_enrollment"], 0);
    let course_id = course["id"].as_i64().unwrap();

    // Question on a missing course
    let response = app
        .post(
            "/api/admin/courses/9999/questions",
            Some(&admin),
            json!({ "content": "Q", "grade": 1, "choices": [{ "content": "A", "is_correct": true }] }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 404);

    // Question without choices
    let response = app
        .post(
            &format!("/api/admin/courses/{}/questions", course_id),
            Some(&admin),
            json!({ "content": "Q", "grade": 1, "choices": [] }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);

    let (question_id, choice_ids) = app
        .create_question(&admin, course_id, 4, &[("A", true), ("B", false)])
        .await;
    assert_eq!(choice_ids.len(), 2);

    let response = app
        .delete(&format!("/api/admin/questions/{}", question_id), &admin)
        .await;
    assert_eq!(response.status().as_u16(), 204);
    let response = app
        .delete(&format!("/api/admin/questions/{}", question_id), &admin)
        .await;
    assert_eq!(response.status().as_u16(), 404);

    let response = app
        .delete(&format!("/api/admin/courses/{}", course_id), &admin)
        .await;
    assert_eq!(response.status().as_u16(), 204);
    let response = app.get(&format!("/api/courses/{}", course_id), None).await;
    assert_eq!(response.status().as_u16(), 404);
}
