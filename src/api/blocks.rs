use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::{Json, extract::{Path, State}, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CurrentUser, Params, Payload};
use crate::error::AppError;
use crate::models::{Block, CourseBlock, NewBlockRequest, UpdateBlockRequest};
use crate::services::{Upload, UploadRequest};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BlockListParams {
    pub course: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BlockDeleted {
    pub message: &'static str,
}

pub async fn list_all_blocks(
    State(state): State<AppState>,
    user: CurrentUser,
    Params(params): Params<BlockListParams>,
) -> Result<Json<Vec<CourseBlock>>, AppError> {
    let blocks = state
        .blocks()
        .list_for_owner(user.id(), params.course.as_deref())
        .await?;
    Ok(Json(blocks))
}

pub async fn list_course_blocks(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<Block>>, AppError> {
    let blocks = state.blocks().list_by_course(user.id(), &course_id).await?;
    Ok(Json(blocks))
}

pub async fn get_block(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Block>, AppError> {
    let block = state.blocks().get(user.id(), &id).await?;
    Ok(Json(block))
}

pub async fn create_block(
    State(state): State<AppState>,
    user: CurrentUser,
    Payload(req): Payload<NewBlockRequest>,
) -> Result<(StatusCode, Json<Block>), AppError> {
    let block = state.blocks().create(user.id(), req).await?;
    Ok((StatusCode::CREATED, Json(block)))
}

pub async fn update_block(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Payload(req): Payload<UpdateBlockRequest>,
) -> Result<Json<Block>, AppError> {
    let block = state.blocks().update(user.id(), &id, req).await?;
    Ok(Json(block))
}

pub async fn delete_block(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<BlockDeleted>, AppError> {
    state.blocks().delete(user.id(), &id).await?;
    Ok(Json(BlockDeleted {
        message: "Block deleted",
    }))
}

pub async fn upload_file_block(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Block>), AppError> {
    let multipart = multipart.map_err(|e| AppError::Validation(e.body_text()))?;
    let req = read_upload(multipart).await.map_err(|e| AppError::Validation(e.body_text()))?;

    let block = state.blocks().create_from_upload(user.id(), req).await?;
    Ok((StatusCode::CREATED, Json(block)))
}

async fn read_upload(mut multipart: Multipart) -> Result<UploadRequest, MultipartError> {
    let mut req = UploadRequest::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "courseId" => req.course_id = Some(field.text().await?),
            "title" => req.title = Some(field.text().await?),
            "fileType" => req.file_type = Some(field.text().await?),
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                // browsers send an empty unnamed part when no file was picked
                if filename.is_empty() && bytes.is_empty() {
                    continue;
                }
                req.file = Some(Upload {
                    filename: if filename.is_empty() { "file".to_string() } else { filename },
                    bytes: bytes.to_vec(),
                });
            }
            other => debug!("ignoring multipart field {other:?}"),
        }
    }

    Ok(req)
}
