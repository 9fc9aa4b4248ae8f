// tests/common/mod.rs

#![allow(dead_code)]

use std::net::SocketAddr;

use onlinecourse::{config::Config, db, grading::GradingMode, routes, state::AppState};
use serde_json::{Value, json};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const PASSWORD: &str = "password123";

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub client: reqwest::Client,
}

pub fn test_config(grading_mode: GradingMode) -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        admin_username: Some(ADMIN_USERNAME.to_string()),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
        grading_mode,
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
    }
}

/// A fresh, migrated in-memory database.
/// One connection only: every connection to `sqlite::memory:` is its own database.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    db::migrate(&pool).await.expect("Failed to migrate database");
    pool
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(GradingMode::Lenient).await
}

/// Spawns the app on a random port with its own database.
pub async fn spawn_app_with(grading_mode: GradingMode) -> TestApp {
    let pool = memory_pool().await;
    let config = test_config(grading_mode);

    db::seed_admin_user(&pool, &config)
        .await
        .expect("Failed to seed admin");

    let app = routes::create_router(AppState::new(pool.clone(), config));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        pool,
        client: reqwest::Client::new(),
    }
}

pub fn unique_name(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().to_string()[..8])
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn register(&self, username: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "username": username,
                "password": PASSWORD,
                "first_name": "Test",
                "last_name": "User"
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Registers a fresh user and returns their token.
    pub async fn student_token(&self) -> String {
        let response = self.register(&unique_name("u")).await;
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.unwrap();
        body["token"].as_str().expect("Token not found").to_string()
    }

    pub async fn admin_token(&self) -> String {
        let body: Value = self
            .login(ADMIN_USERNAME, ADMIN_PASSWORD)
            .await
            .json()
            .await
            .unwrap();
        body["token"].as_str().expect("Admin token not found").to_string()
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("Failed to execute request")
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> reqwest::Response {
        let mut request = self.client.post(self.url(path)).json(&body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Creates a course through the admin API and returns its id.
    pub async fn create_course(&self, admin_token: &str, name: &str) -> i64 {
        let response = self
            .post(
                "/api/admin/courses",
                Some(admin_token),
                json!({ "name": name, "description": "<p>About</p>" }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.unwrap();
        body["id"].as_i64().unwrap()
    }

    /// Adds a question; returns (question id, choice ids in the given order).
    pub async fn create_question(
        &self,
        admin_token: &str,
        course_id: i64,
        grade: i64,
        choices: &[(&str, bool)],
    ) -> (i64, Vec<i64>) {
        let choices: Vec<Value> = choices
            .iter()
            .map(|(content, is_correct)| json!({ "content": content, "is_correct": is_correct }))
            .collect();

        let response = self
            .post(
                &format!("/api/admin/courses/{}/questions", course_id),
                Some(admin_token),
                json!({ "content": "Which ones?", "grade": grade, "choices": choices }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.unwrap();
        let ids = body["choices"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_i64().unwrap())
            .collect();
        (body["id"].as_i64().unwrap(), ids)
    }

    pub async fn enroll(&self, token: &str, course_id: i64) -> Value {
        let response = self
            .post(&format!("/api/courses/{}/enroll", course_id), Some(token), json!({}))
            .await;
        assert_eq!(response.status().as_u16(), 200);
        response.json().await.unwrap()
    }

    pub async fn submit(&self, token: &str, course_id: i64, selected: Value) -> reqwest::Response {
        self.post(
            &format!("/api/courses/{}/submit", course_id),
            Some(token),
            json!({ "selected_choices": selected }),
        )
        .await
    }

    /// Submits and grades in one go; returns the result body.
    pub async fn submit_and_grade(&self, token: &str, course_id: i64, selected: Value) -> Value {
        let response = self.submit(token, course_id, selected).await;
        assert_eq!(response.status().as_u16(), 201);
        let created: Value = response.json().await.unwrap();
        let submission_id = created["submission_id"].as_i64().unwrap();

        let response = self
            .get(
                &format!("/api/courses/{}/submissions/{}/result", course_id, submission_id),
                Some(token),
            )
            .await;
        assert_eq!(response.status().as_u16(), 200);
        response.json().await.unwrap()
    }
}

/// `question_id -> is_correct` from a result body.
pub fn correctness(result: &Value, question_id: i64) -> bool {
    result["question_results"]
        .as_array()
        .unwrap()
        .iter()
        .find(|q| q["question_id"] == question_id)
        .map(|q| q["is_correct"].as_bool().unwrap())
        .expect("question missing from result")
}
