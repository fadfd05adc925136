mod agenda;
mod auth;
mod blocks;
mod courses;
pub mod extract;

use std::path::Path;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Router, extract::State, http::StatusCode};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::error::AppError;
use crate::state::AppState;

pub use extract::{CurrentUser, Params, Payload};

const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// JSON API, mounted under `/api` by [`app`].
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/auth/logout", post(auth::logout))
        .route("/courses", get(courses::list_courses).post(courses::create_course))
        .route(
            "/courses/{id}",
            get(courses::get_course)
                .put(courses::update_course)
                .delete(courses::delete_course),
        )
        .route("/blocks", get(blocks::list_all_blocks).post(blocks::create_block))
        .route("/blocks/course/{course_id}", get(blocks::list_course_blocks))
        .route(
            "/blocks/upload",
            post(blocks::upload_file_block).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/blocks/{id}",
            get(blocks::get_block)
                .put(blocks::update_block)
                .delete(blocks::delete_block),
        )
        .route("/dashboard", get(agenda::dashboard))
        .route("/calendar", get(agenda::calendar))
}

/// The whole service: the API plus stored uploads served as static files.
pub fn app(state: AppState, upload_url_prefix: &str, upload_dir: &Path) -> Router {
    Router::new()
        .nest("/api", router())
        .nest_service(upload_url_prefix, ServeDir::new(upload_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}
