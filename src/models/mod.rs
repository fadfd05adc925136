pub mod block;
pub mod course;
pub mod moment;
pub mod user;

pub use block::{
    Block, BlockBody, BlockKind, BlockRow, CourseBlock, CourseRef, EventContent, FileContent,
    NewBlockRequest, NoteContent, Priority, TaskContent, TaskStatus, UpdateBlockRequest,
};
pub use course::{Course, NewCourseRequest, UpdateCourseRequest};
pub use moment::{Moment, ParseMomentError};
pub use user::{AuthResponse, LoginRequest, RegisterRequest, Session, User, UserCredentials};
