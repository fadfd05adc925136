pub mod agenda_service;
pub mod auth_service;
pub mod block_service;
pub mod course_service;
pub mod storage;

pub use agenda_service::AgendaService;
pub use auth_service::AuthService;
pub use block_service::{BlockService, Upload, UploadRequest};
pub use course_service::CourseService;
pub use storage::{DiskStorage, FileStorage, StoredFile};
