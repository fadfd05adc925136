use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::db::repository::{self, CourseBlockRow};
use crate::error::AppError;
use crate::models::{
    Block, BlockBody, BlockKind, BlockRow, CourseBlock, FileContent, NewBlockRequest,
    UpdateBlockRequest,
};
use crate::services::storage::FileStorage;

const UPLOAD_ONLY: &str = "file blocks can only be created by uploading a file";

/// A file received from a client, not yet persisted.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub course_id: Option<String>,
    pub title: Option<String>,
    pub file_type: Option<String>,
    pub file: Option<Upload>,
}

pub struct BlockService {
    db: SqlitePool,
    storage: Arc<dyn FileStorage>,
}

impl BlockService {
    pub fn new(db: SqlitePool, storage: Arc<dyn FileStorage>) -> Self {
        Self { db, storage }
    }

    pub async fn list_by_course(&self, owner_id: &str, course_id: &str) -> Result<Vec<Block>, AppError> {
        self.ensure_course(owner_id, course_id).await?;
        repository::fetch_blocks_by_course(&self.db, course_id)
            .await?
            .into_iter()
            .map(decode_row)
            .collect()
    }

    /// All blocks of every course the owner has, each tagged with its course.
    pub async fn list_for_owner(
        &self,
        owner_id: &str,
        course_id: Option<&str>,
    ) -> Result<Vec<CourseBlock>, AppError> {
        repository::fetch_blocks_for_owner(&self.db, owner_id, course_id)
            .await?
            .into_iter()
            .map(decode_course_row)
            .collect()
    }

    pub async fn get(&self, owner_id: &str, id: &str) -> Result<Block, AppError> {
        let row = repository::find_block_for_owner(&self.db, owner_id, id)
            .await?
            .ok_or(AppError::NotFound("Block"))?;
        decode_row(row)
    }

    pub async fn create(&self, owner_id: &str, req: NewBlockRequest) -> Result<Block, AppError> {
        self.ensure_course(owner_id, &req.course_id).await?;

        if req.kind == BlockKind::File {
            return Err(AppError::validation(UPLOAD_ONLY));
        }

        let title = required_title(&req.title)?;
        let body = build_body(req.kind, req.content)?;
        self.insert(&req.course_id, &title, body).await
    }

    /// Shallow merge over `title`, `type` and `content`. A provided content
    /// object replaces the stored one; omitted content fields fall back to
    /// their defaults rather than keeping old values. A file block can change
    /// its `fileType` but never the payload it points at; turning it into
    /// another kind releases that payload.
    pub async fn update(&self, owner_id: &str, id: &str, req: UpdateBlockRequest) -> Result<Block, AppError> {
        let current = self.get(owner_id, id).await?;

        let title = match req.title {
            Some(title) => required_title(&title)?,
            None => current.title,
        };
        let body = match (req.kind, req.content) {
            (None, None) => current.body.clone(),
            (kind, Some(content)) => build_body(kind.unwrap_or(current.body.kind()), content)?,
            (Some(kind), None) if kind == current.body.kind() => current.body.clone(),
            (Some(kind), None) => {
                let existing = current
                    .body
                    .content_value()
                    .map_err(|e| AppError::Internal(e.to_string()))?;
                build_body(kind, existing)?
            }
        };

        // a file body may only keep the payload it already points at
        let released = match (&current.body, &body) {
            (BlockBody::File(old), BlockBody::File(new)) => {
                if old.url != new.url || old.filename != new.filename {
                    return Err(AppError::validation(UPLOAD_ONLY));
                }
                None
            }
            (_, BlockBody::File(_)) => return Err(AppError::validation(UPLOAD_ONLY)),
            (BlockBody::File(old), _) => Some(old.url.clone()),
            _ => None,
        };

        let content = encode_content(&body)?;
        let updated_at = Utc::now();
        if !repository::update_block(&self.db, id, &title, &body, &content, updated_at).await? {
            return Err(AppError::NotFound("Block"));
        }
        if let Some(url) = released {
            release_payload(self.storage.as_ref(), &url).await;
        }

        Ok(Block {
            id: current.id,
            course_id: current.course_id,
            title,
            body,
            created_at: current.created_at,
            updated_at,
        })
    }

    pub async fn delete(&self, owner_id: &str, id: &str) -> Result<(), AppError> {
        let block = self.get(owner_id, id).await?;
        if !repository::delete_block(&self.db, id).await? {
            return Err(AppError::NotFound("Block"));
        }

        if let BlockBody::File(file) = &block.body {
            release_payload(self.storage.as_ref(), &file.url).await;
        }
        Ok(())
    }

    pub async fn create_from_upload(&self, owner_id: &str, req: UploadRequest) -> Result<Block, AppError> {
        let file = req
            .file
            .ok_or_else(|| AppError::validation("No file uploaded"))?;
        let course_id = req
            .course_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AppError::validation("courseId is required"))?;
        let title = required_title(req.title.as_deref().unwrap_or_default())?;

        self.ensure_course(owner_id, &course_id).await?;

        let stored = self.storage.store(&file.filename, &file.bytes).await?;
        let body = BlockBody::File(FileContent {
            file_type: req.file_type.unwrap_or_default(),
            filename: file.filename,
            url: stored.url.clone(),
        });

        match self.insert(&course_id, &title, body).await {
            Ok(block) => Ok(block),
            Err(e) => {
                if let Err(cleanup) = self.storage.remove(&stored.url).await {
                    error!("orphaned upload {}: {}", stored.url, cleanup);
                }
                Err(e)
            }
        }
    }

    async fn ensure_course(&self, owner_id: &str, course_id: &str) -> Result<(), AppError> {
        repository::find_course(&self.db, owner_id, course_id)
            .await?
            .map(|_| ())
            .ok_or(AppError::NotFound("Course"))
    }

    async fn insert(&self, course_id: &str, title: &str, body: BlockBody) -> Result<Block, AppError> {
        let content = encode_content(&body)?;
        let row = repository::insert_block(&self.db, course_id, title, &body, &content).await?;
        info!("created {} block {} in course {}", body.kind().as_str(), row.id, course_id);

        Ok(Block {
            id: row.id,
            course_id: row.course_id,
            title: row.title,
            body,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Best-effort removal of a stored upload; failures are only logged.
pub(crate) async fn release_payload(storage: &dyn FileStorage, url: &str) {
    if let Err(e) = storage.remove(url).await {
        warn!("failed to remove stored payload {}: {}", url, e);
    }
}

fn build_body(kind: BlockKind, content: Value) -> Result<BlockBody, AppError> {
    BlockBody::from_parts(kind, content)
        .map_err(|e| AppError::validation(format!("invalid {} content: {}", kind.as_str(), e)))
}

fn encode_content(body: &BlockBody) -> Result<String, AppError> {
    body.content_json()
        .map_err(|e| AppError::Internal(format!("failed to encode block content: {e}")))
}

fn required_title(title: &str) -> Result<String, AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        Err(AppError::validation("title is required"))
    } else {
        Ok(trimmed.to_string())
    }
}

fn decode_row(row: BlockRow) -> Result<Block, AppError> {
    let id = row.id.clone();
    Block::try_from(row).map_err(|e| AppError::Internal(format!("corrupt block {id}: {e}")))
}

pub(crate) fn decode_course_row(row: CourseBlockRow) -> Result<CourseBlock, AppError> {
    let course = row.course_ref();
    Ok(CourseBlock {
        block: decode_row(row.block)?,
        course,
    })
}
