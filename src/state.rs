use std::sync::Arc;

use chrono::Duration;
use sqlx::SqlitePool;

use crate::services::{AgendaService, AuthService, BlockService, CourseService, FileStorage};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub storage: Arc<dyn FileStorage>,
    pub session_ttl: Duration,
}

impl AppState {
    pub fn auth(&self) -> AuthService {
        AuthService::new(self.db.clone(), self.session_ttl)
    }

    pub fn courses(&self) -> CourseService {
        CourseService::new(self.db.clone(), self.storage.clone())
    }

    pub fn blocks(&self) -> BlockService {
        BlockService::new(self.db.clone(), self.storage.clone())
    }

    pub fn agenda(&self) -> AgendaService {
        AgendaService::new(self.db.clone())
    }
}
