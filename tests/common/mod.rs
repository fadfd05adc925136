#![allow(dead_code)]

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, header::AUTHORIZATION};
use axum_test::TestServer;
use chrono::Duration;
use sqlx::SqlitePool;
use tempfile::TempDir;

use studyboard::api;
use studyboard::db;
use studyboard::models::{AuthResponse, NewCourseRequest, RegisterRequest};
use studyboard::services::DiskStorage;
use studyboard::state::AppState;

pub struct TestApp {
    pub db: SqlitePool,
    pub state: AppState,
    pub uploads: TempDir,
}

pub async fn setup() -> TestApp {
    // a single connection keeps the in-memory database alive and shared
    let pool = db::connect("sqlite::memory:", 1)
        .await
        .expect("Failed to create database");
    db::migrate(&pool).await.expect("Failed to migrate");

    let uploads = tempfile::tempdir().expect("Failed to create upload dir");
    let state = AppState {
        db: pool.clone(),
        storage: Arc::new(DiskStorage::new(uploads.path(), "/uploads")),
        session_ttl: Duration::hours(1),
    };

    TestApp {
        db: pool,
        state,
        uploads,
    }
}

impl TestApp {
    pub fn server(&self) -> TestServer {
        let app = api::app(self.state.clone(), "/uploads", self.uploads.path());
        TestServer::new(app).expect("Failed to create test server")
    }

    /// Registers a user directly through the service and returns its id.
    pub async fn user(&self, email: &str) -> String {
        self.session(email).await.user.id
    }

    pub async fn session(&self, email: &str) -> AuthResponse {
        self.state
            .auth()
            .register(RegisterRequest {
                name: "Student".to_string(),
                email: email.to_string(),
                password: "hunter22".to_string(),
            })
            .await
            .expect("Failed to register user")
    }
}

pub fn course_req(code: &str) -> NewCourseRequest {
    NewCourseRequest {
        name: format!("Course {code}"),
        code: code.to_string(),
        semester: "Fall 2025".to_string(),
        instructor: "Dr. Hopper".to_string(),
        description: String::new(),
    }
}

pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).expect("valid header"),
    )
}
