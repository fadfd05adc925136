use axum::{Json, extract::{Path, State}, http::StatusCode};
use serde::Serialize;

use super::{CurrentUser, Payload};
use crate::error::AppError;
use crate::models::{Course, NewCourseRequest, UpdateCourseRequest};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDeleted {
    pub message: &'static str,
    pub blocks_deleted: u64,
}

pub async fn list_courses(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Course>>, AppError> {
    let courses = state.courses().list(user.id()).await?;
    Ok(Json(courses))
}

pub async fn get_course(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Course>, AppError> {
    let course = state.courses().get(user.id(), &id).await?;
    Ok(Json(course))
}

pub async fn create_course(
    State(state): State<AppState>,
    user: CurrentUser,
    Payload(req): Payload<NewCourseRequest>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let course = state.courses().create(user.id(), req).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

pub async fn update_course(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Payload(req): Payload<UpdateCourseRequest>,
) -> Result<Json<Course>, AppError> {
    let course = state.courses().update(user.id(), &id, req).await?;
    Ok(Json(course))
}

pub async fn delete_course(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<CourseDeleted>, AppError> {
    let blocks_deleted = state.courses().delete(user.id(), &id).await?;
    Ok(Json(CourseDeleted {
        message: "Course and associated blocks deleted",
        blocks_deleted,
    }))
}
