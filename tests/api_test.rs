mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use studyboard::models::{AuthResponse, Block, Course, CourseBlock, User};

use common::{bearer, setup};

async fn register(server: &TestServer, email: &str) -> AuthResponse {
    let response = server
        .post("/api/auth/register")
        .json(&json!({ "name": "Ada", "email": email, "password": "hunter22" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<AuthResponse>()
}

async fn create_course(server: &TestServer, token: &str, code: &str) -> Course {
    let (name, value) = bearer(token);
    let response = server
        .post("/api/courses")
        .add_header(name, value)
        .json(&json!({
            "name": format!("Course {code}"),
            "code": code,
            "semester": "Fall 2025",
            "instructor": "Dr. Hopper",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Course>()
}

async fn create_block(server: &TestServer, token: &str, body: Value) -> Block {
    let (name, value) = bearer(token);
    let response = server.post("/api/blocks").add_header(name, value).json(&body).await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Block>()
}

mod auth {
    use super::*;

    #[tokio::test]
    async fn register_login_and_me() {
        let app = setup().await;
        let server = app.server();

        let registered = register(&server, "Ada@Example.com").await;
        assert_eq!(registered.user.email, "ada@example.com");

        let response = server
            .post("/api/auth/login")
            .json(&json!({ "email": "ada@example.com", "password": "hunter22" }))
            .await;
        response.assert_status_ok();
        let login = response.json::<AuthResponse>();
        assert_ne!(login.token, registered.token);

        let (name, value) = bearer(&login.token);
        let me = server.get("/api/auth/me").add_header(name, value).await;
        me.assert_status_ok();
        assert_eq!(me.json::<User>().id, registered.user.id);
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let app = setup().await;
        let server = app.server();
        register(&server, "ada@example.com").await;

        server
            .post("/api/auth/login")
            .json(&json!({ "email": "ada@example.com", "password": "nope-nope" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let app = setup().await;
        let server = app.server();
        register(&server, "ada@example.com").await;

        server
            .post("/api/auth/register")
            .json(&json!({ "name": "Ada", "email": "ada@example.com", "password": "hunter22" }))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn protected_routes_need_a_valid_token() {
        let app = setup().await;
        let server = app.server();

        server.get("/api/courses").await.assert_status(StatusCode::UNAUTHORIZED);

        let (name, value) = bearer("not-a-real-token");
        server
            .get("/api/courses")
            .add_header(name, value)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_revokes_the_token() {
        let app = setup().await;
        let server = app.server();
        let session = register(&server, "ada@example.com").await;

        let (name, value) = bearer(&session.token);
        server
            .post("/api/auth/logout")
            .add_header(name.clone(), value.clone())
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .get("/api/auth/me")
            .add_header(name, value)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}

mod courses {
    use super::*;

    #[tokio::test]
    async fn duplicate_code_is_a_bad_request() {
        let app = setup().await;
        let server = app.server();
        let session = register(&server, "ada@example.com").await;
        create_course(&server, &session.token, "CS101").await;

        let (name, value) = bearer(&session.token);
        let response = server
            .post("/api/courses")
            .add_header(name, value)
            .json(&json!({
                "name": "Again",
                "code": "CS101",
                "semester": "Fall 2025",
                "instructor": "Dr. Hopper",
            }))
            .await;
        response.assert_status_bad_request();
        assert_eq!(
            response.json::<Value>()["message"],
            "Course code already exists for this user"
        );
    }

    #[tokio::test]
    async fn malformed_body_is_a_validation_error() {
        let app = setup().await;
        let server = app.server();
        let session = register(&server, "ada@example.com").await;

        let (name, value) = bearer(&session.token);
        server
            .post("/api/courses")
            .add_header(name, value)
            .json(&json!({ "name": "No code" }))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn other_users_course_is_not_found() {
        let app = setup().await;
        let server = app.server();
        let ada = register(&server, "ada@example.com").await;
        let bob = register(&server, "bob@example.com").await;
        let course = create_course(&server, &ada.token, "CS101").await;

        let (name, value) = bearer(&bob.token);
        server
            .get(&format!("/api/courses/{}", course.id))
            .add_header(name, value)
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn update_and_cascading_delete() {
        let app = setup().await;
        let server = app.server();
        let session = register(&server, "ada@example.com").await;
        let course = create_course(&server, &session.token, "CS101").await;
        for title in ["one", "two"] {
            create_block(
                &server,
                &session.token,
                json!({ "courseId": course.id, "type": "note", "title": title, "content": { "text": "" } }),
            )
            .await;
        }

        let (name, value) = bearer(&session.token);
        let updated = server
            .put(&format!("/api/courses/{}", course.id))
            .add_header(name.clone(), value.clone())
            .json(&json!({ "semester": "Spring 2026" }))
            .await;
        updated.assert_status_ok();
        let updated = updated.json::<Course>();
        assert_eq!(updated.semester, "Spring 2026");
        assert_eq!(updated.name, course.name);

        let deleted = server
            .delete(&format!("/api/courses/{}", course.id))
            .add_header(name.clone(), value.clone())
            .await;
        deleted.assert_status_ok();
        assert_eq!(deleted.json::<Value>()["blocksDeleted"], 2);

        server
            .get(&format!("/api/blocks/course/{}", course.id))
            .add_header(name.clone(), value.clone())
            .await
            .assert_status_not_found();
        let remaining = server.get("/api/blocks").add_header(name, value).await;
        assert!(remaining.json::<Vec<CourseBlock>>().is_empty());
    }
}

mod blocks {
    use super::*;

    #[tokio::test]
    async fn create_in_missing_course_is_not_found() {
        let app = setup().await;
        let server = app.server();
        let session = register(&server, "ada@example.com").await;

        let (name, value) = bearer(&session.token);
        server
            .post("/api/blocks")
            .add_header(name, value)
            .json(&json!({ "courseId": "missing", "type": "note", "title": "x", "content": {} }))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn unknown_type_is_a_validation_error() {
        let app = setup().await;
        let server = app.server();
        let session = register(&server, "ada@example.com").await;
        let course = create_course(&server, &session.token, "CS101").await;

        let (name, value) = bearer(&session.token);
        server
            .post("/api/blocks")
            .add_header(name, value)
            .json(&json!({ "courseId": course.id, "type": "video", "title": "x", "content": {} }))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn json_shape_matches_type_and_content() {
        let app = setup().await;
        let server = app.server();
        let session = register(&server, "ada@example.com").await;
        let course = create_course(&server, &session.token, "CS101").await;

        let (name, value) = bearer(&session.token);
        let response = server
            .post("/api/blocks")
            .add_header(name, value)
            .json(&json!({
                "courseId": course.id,
                "type": "task",
                "title": "Problem set 1",
                "content": { "text": "1-10", "dueDate": "2025-09-30", "priority": "high", "extra": true },
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let body = response.json::<Value>();
        assert_eq!(body["type"], "task");
        assert_eq!(body["courseId"], course.id.as_str());
        assert_eq!(
            body["content"],
            json!({ "text": "1-10", "dueDate": "2025-09-30", "status": "incomplete", "priority": "high" })
        );
    }

    #[tokio::test]
    async fn upload_twice_and_fetch_both() {
        let app = setup().await;
        let server = app.server();
        let session = register(&server, "ada@example.com").await;
        let course = create_course(&server, &session.token, "CS101").await;

        let mut urls = Vec::new();
        for payload in [b"first".as_slice(), b"second".as_slice()] {
            let form = MultipartForm::new()
                .add_text("courseId", &course.id)
                .add_text("title", "Lecture notes")
                .add_text("fileType", "lecture")
                .add_part(
                    "file",
                    Part::bytes(payload.to_vec())
                        .file_name("notes.pdf")
                        .mime_type("application/pdf"),
                );
            let (name, value) = bearer(&session.token);
            let response = server
                .post("/api/blocks/upload")
                .add_header(name, value)
                .multipart(form)
                .await;
            response.assert_status(StatusCode::CREATED);

            let body = response.json::<Value>();
            assert_eq!(body["type"], "file");
            assert_eq!(body["content"]["filename"], "notes.pdf");
            assert_eq!(body["content"]["fileType"], "lecture");
            urls.push(body["content"]["url"].as_str().unwrap().to_string());
        }

        assert_ne!(urls[0], urls[1]);
        assert_eq!(server.get(&urls[0]).await.text(), "first");
        assert_eq!(server.get(&urls[1]).await.text(), "second");
    }

    #[tokio::test]
    async fn upload_without_file_is_a_bad_request() {
        let app = setup().await;
        let server = app.server();
        let session = register(&server, "ada@example.com").await;
        let course = create_course(&server, &session.token, "CS101").await;

        let form = MultipartForm::new()
            .add_text("courseId", &course.id)
            .add_text("title", "Nothing attached");
        let (name, value) = bearer(&session.token);
        let response = server
            .post("/api/blocks/upload")
            .add_header(name, value)
            .multipart(form)
            .await;

        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["message"], "No file uploaded");
    }

    #[tokio::test]
    async fn file_block_cannot_point_at_another_users_upload() {
        let app = setup().await;
        let server = app.server();
        let ada = register(&server, "ada@example.com").await;
        let bob = register(&server, "bob@example.com").await;
        let ada_course = create_course(&server, &ada.token, "CS101").await;
        let bob_course = create_course(&server, &bob.token, "CS101").await;

        let form = MultipartForm::new()
            .add_text("courseId", &ada_course.id)
            .add_text("title", "Lecture notes")
            .add_part("file", Part::bytes(b"ada's notes".to_vec()).file_name("notes.pdf"));
        let (name, value) = bearer(&ada.token);
        let uploaded = server
            .post("/api/blocks/upload")
            .add_header(name, value)
            .multipart(form)
            .await
            .json::<Value>();
        let url = uploaded["content"]["url"].as_str().unwrap().to_string();

        let (name, value) = bearer(&bob.token);
        server
            .post("/api/blocks")
            .add_header(name, value)
            .json(&json!({
                "courseId": bob_course.id,
                "type": "file",
                "title": "borrowed",
                "content": { "filename": "x", "url": url },
            }))
            .await
            .assert_status_bad_request();

        let (name, value) = bearer(&bob.token);
        let listed = server.get("/api/blocks").add_header(name, value).await;
        assert!(listed.json::<Vec<CourseBlock>>().is_empty());
        assert_eq!(server.get(&url).await.text(), "ada's notes");
    }
}

mod views {
    use super::*;

    #[tokio::test]
    async fn dashboard_reports_overdue_and_due_soon() {
        let app = setup().await;
        let server = app.server();
        let session = register(&server, "ada@example.com").await;
        let course = create_course(&server, &session.token, "CS101").await;
        let now = Utc::now();

        for (title, due, status) in [
            ("late", now - Duration::days(1), "incomplete"),
            ("late but done", now - Duration::days(1), "complete"),
            ("soon", now + Duration::days(2), "incomplete"),
            ("later", now + Duration::days(10), "incomplete"),
        ] {
            create_block(
                &server,
                &session.token,
                json!({
                    "courseId": course.id,
                    "type": "task",
                    "title": title,
                    "content": { "dueDate": due.to_rfc3339(), "status": status },
                }),
            )
            .await;
        }

        let (name, value) = bearer(&session.token);
        let response = server.get("/api/dashboard?tz=0").add_header(name, value).await;
        response.assert_status_ok();
        let body = response.json::<Value>();

        let titles = |key: &str| -> Vec<String> {
            body[key]
                .as_array()
                .unwrap()
                .iter()
                .map(|b| b["title"].as_str().unwrap().to_string())
                .collect()
        };
        assert_eq!(titles("overdueTasks"), vec!["late"]);
        assert_eq!(titles("dueSoonTasks"), vec!["soon"]);
        assert_eq!(titles("upcomingTasks"), vec!["soon", "later"]);
        assert_eq!(body["dueSoonTasks"][0]["daysLeft"], 2);
        assert_eq!(body["dueSoonTasks"][0]["course"]["code"], "CS101");
        assert_eq!(body["courses"][0]["id"], course.id.as_str());
    }

    #[tokio::test]
    async fn calendar_month_with_course_filter() {
        let app = setup().await;
        let server = app.server();
        let session = register(&server, "ada@example.com").await;
        let a = create_course(&server, &session.token, "A").await;
        let b = create_course(&server, &session.token, "B").await;

        for course in [&a, &b] {
            create_block(
                &server,
                &session.token,
                json!({
                    "courseId": course.id,
                    "type": "event",
                    "title": format!("{} exam", course.code),
                    "content": { "date": "2025-03-14T09:00", "eventType": "exam" },
                }),
            )
            .await;
        }

        let (name, value) = bearer(&session.token);
        let all = server
            .get("/api/calendar?view=month&year=2025&month=3&tz=0")
            .add_header(name.clone(), value.clone())
            .await;
        all.assert_status_ok();
        let days = all.json::<Value>();
        assert_eq!(days.as_array().unwrap().len(), 31);
        assert_eq!(days[13]["date"], "2025-03-14");
        assert_eq!(days[13]["events"].as_array().unwrap().len(), 2);

        let filtered = server
            .get(&format!("/api/calendar?year=2025&month=3&tz=0&course={}", b.id))
            .add_header(name.clone(), value.clone())
            .await
            .json::<Value>();
        assert_eq!(filtered[13]["events"].as_array().unwrap().len(), 1);
        assert_eq!(filtered[13]["events"][0]["title"], "B exam");

        let week = server
            .get("/api/calendar?view=week&date=2025-03-12&tz=0")
            .add_header(name.clone(), value.clone())
            .await
            .json::<Value>();
        assert_eq!(week.as_array().unwrap().len(), 7);
        assert_eq!(week[0]["date"], "2025-03-09");
        assert_eq!(week[5]["events"].as_array().unwrap().len(), 2);

        server
            .get("/api/calendar?year=2025&month=13")
            .add_header(name.clone(), value.clone())
            .await
            .assert_status_bad_request();

        let response = server
            .get("/api/calendar?view=week&date=-262143-01-01")
            .add_header(name, value)
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["message"], "invalid calendar range");
    }
}
