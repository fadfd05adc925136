use sqlx::SqlitePool;
use tracing::debug;

use crate::agenda::{self, AgendaClock, CalendarDay, CalendarRange, Dashboard};
use crate::db::repository;
use crate::error::AppError;
use crate::models::CourseBlock;
use crate::services::block_service::decode_course_row;

/// Builds the dashboard and calendar from one batched block query per view.
pub struct AgendaService {
    db: SqlitePool,
}

impl AgendaService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn dashboard(
        &self,
        owner_id: &str,
        course_id: Option<&str>,
        clock: &AgendaClock,
    ) -> Result<Dashboard, AppError> {
        let courses = repository::fetch_courses(&self.db, owner_id).await?;
        let blocks = self.blocks(owner_id).await?;
        let scoped = agenda::filter_course(&blocks, course_id);
        debug!("dashboard over {} of {} blocks", scoped.len(), blocks.len());

        Ok(agenda::build_dashboard(&scoped, &courses, clock))
    }

    pub async fn calendar(
        &self,
        owner_id: &str,
        course_id: Option<&str>,
        range: CalendarRange,
        clock: &AgendaClock,
    ) -> Result<Vec<CalendarDay>, AppError> {
        let blocks = self.blocks(owner_id).await?;
        let scoped = agenda::filter_course(&blocks, course_id);

        agenda::build_calendar(&scoped, range, clock.offset)
            .ok_or_else(|| AppError::validation("invalid calendar range"))
    }

    async fn blocks(&self, owner_id: &str) -> Result<Vec<CourseBlock>, AppError> {
        repository::fetch_blocks_for_owner(&self.db, owner_id, None)
            .await?
            .into_iter()
            .map(decode_course_row)
            .collect()
    }
}
