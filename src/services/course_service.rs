use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::repository;
use crate::error::AppError;
use crate::models::{Block, BlockBody, Course, NewCourseRequest, UpdateCourseRequest};
use crate::services::block_service::release_payload;
use crate::services::storage::FileStorage;

const DUPLICATE_CODE: &str = "Course code already exists for this user";

pub struct CourseService {
    db: SqlitePool,
    storage: Arc<dyn FileStorage>,
}

impl CourseService {
    pub fn new(db: SqlitePool, storage: Arc<dyn FileStorage>) -> Self {
        Self { db, storage }
    }

    /// Courses owned by `owner_id`, newest first.
    pub async fn list(&self, owner_id: &str) -> Result<Vec<Course>, AppError> {
        Ok(repository::fetch_courses(&self.db, owner_id).await?)
    }

    pub async fn get(&self, owner_id: &str, id: &str) -> Result<Course, AppError> {
        repository::find_course(&self.db, owner_id, id)
            .await?
            .ok_or(AppError::NotFound("Course"))
    }

    pub async fn create(&self, owner_id: &str, mut req: NewCourseRequest) -> Result<Course, AppError> {
        req.name = required("name", &req.name)?;
        req.code = required("code", &req.code)?;
        req.semester = required("semester", &req.semester)?;
        req.instructor = required("instructor", &req.instructor)?;

        if repository::find_course_by_code(&self.db, owner_id, &req.code)
            .await?
            .is_some()
        {
            return Err(AppError::DuplicateKey(DUPLICATE_CODE.to_string()));
        }

        let course = repository::insert_course(&self.db, owner_id, req)
            .await
            .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_CODE))?;
        info!("created course {} ({})", course.id, course.code);
        Ok(course)
    }

    /// Shallow merge of the provided fields into the stored course.
    pub async fn update(
        &self,
        owner_id: &str,
        id: &str,
        req: UpdateCourseRequest,
    ) -> Result<Course, AppError> {
        let mut current = self.get(owner_id, id).await?;

        if let Some(name) = req.name {
            current.name = required("name", &name)?;
        }
        if let Some(code) = req.code {
            let code = required("code", &code)?;
            if code != current.code {
                if let Some(other) = repository::find_course_by_code(&self.db, owner_id, &code).await? {
                    if other.id != current.id {
                        return Err(AppError::DuplicateKey(DUPLICATE_CODE.to_string()));
                    }
                }
            }
            current.code = code;
        }
        if let Some(semester) = req.semester {
            current.semester = required("semester", &semester)?;
        }
        if let Some(instructor) = req.instructor {
            current.instructor = required("instructor", &instructor)?;
        }
        if let Some(description) = req.description {
            current.description = description;
        }

        let updated = repository::update_course(&self.db, &current)
            .await
            .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_CODE))?;
        if !updated {
            return Err(AppError::NotFound("Course"));
        }
        Ok(current)
    }

    /// Deletes the course and its blocks, returning how many blocks went
    /// with it. Stored uploads of its file blocks are released once the rows
    /// are gone. The two deletes are independent statements; a failure in
    /// between leaves the blocks gone and the course in place.
    pub async fn delete(&self, owner_id: &str, id: &str) -> Result<u64, AppError> {
        let course = self.get(owner_id, id).await?;

        let payloads: Vec<String> = repository::fetch_blocks_by_course(&self.db, &course.id)
            .await?
            .into_iter()
            .filter_map(|row| match Block::try_from(row) {
                Ok(Block { body: BlockBody::File(file), .. }) => Some(file.url),
                Ok(_) => None,
                Err(e) => {
                    warn!("skipping undecodable block in course {}: {}", course.id, e);
                    None
                }
            })
            .collect();

        let removed = repository::delete_blocks_by_course(&self.db, &course.id).await?;
        for url in &payloads {
            release_payload(self.storage.as_ref(), url).await;
        }
        if !repository::delete_course(&self.db, &course.id).await? {
            warn!("course {} vanished during cascade delete", course.id);
            return Err(AppError::NotFound("Course"));
        }

        info!("deleted course {} and {} blocks", course.id, removed);
        Ok(removed)
    }
}

fn required(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AppError::validation(format!("{field} is required")))
    } else {
        Ok(trimmed.to_string())
    }
}
