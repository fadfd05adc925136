use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use super::Moment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Note,
    Task,
    Event,
    File,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Note => "note",
            BlockKind::Task => "task",
            BlockKind::Event => "event",
            BlockKind::File => "file",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Incomplete,
    Complete,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteContent {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskContent {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Moment>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventContent {
    #[serde(default)]
    pub text: String,
    pub date: Moment,
    #[serde(default)]
    pub event_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContent {
    #[serde(default)]
    pub file_type: String,
    pub filename: String,
    pub url: String,
}

/// The `type` + `content` pair of a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum BlockBody {
    Note(NoteContent),
    Task(TaskContent),
    Event(EventContent),
    File(FileContent),
}

impl BlockBody {
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockBody::Note(_) => BlockKind::Note,
            BlockBody::Task(_) => BlockKind::Task,
            BlockBody::Event(_) => BlockKind::Event,
            BlockBody::File(_) => BlockKind::File,
        }
    }

    /// Builds a body from a stored or submitted kind and a raw content object.
    pub fn from_parts(kind: BlockKind, content: Value) -> Result<Self, serde_json::Error> {
        let content = if content.is_null() {
            Value::Object(Default::default())
        } else {
            content
        };
        Ok(match kind {
            BlockKind::Note => BlockBody::Note(serde_json::from_value(content)?),
            BlockKind::Task => BlockBody::Task(serde_json::from_value(content)?),
            BlockKind::Event => BlockBody::Event(serde_json::from_value(content)?),
            BlockKind::File => BlockBody::File(serde_json::from_value(content)?),
        })
    }

    pub fn content_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            BlockBody::Note(c) => serde_json::to_value(c),
            BlockBody::Task(c) => serde_json::to_value(c),
            BlockBody::Event(c) => serde_json::to_value(c),
            BlockBody::File(c) => serde_json::to_value(c),
        }
    }

    pub fn content_json(&self) -> Result<String, serde_json::Error> {
        match self {
            BlockBody::Note(c) => serde_json::to_string(c),
            BlockBody::Task(c) => serde_json::to_string(c),
            BlockBody::Event(c) => serde_json::to_string(c),
            BlockBody::File(c) => serde_json::to_string(c),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    pub course_id: String,
    pub title: String,
    #[serde(flatten)]
    pub body: BlockBody,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row shape of the `blocks` table; `content` holds the payload as JSON text.
#[derive(Debug, Clone, FromRow)]
pub struct BlockRow {
    pub id: String,
    pub course_id: String,
    pub kind: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BlockRow> for Block {
    type Error = serde_json::Error;

    fn try_from(row: BlockRow) -> Result<Self, Self::Error> {
        let kind: BlockKind = serde_json::from_value(Value::String(row.kind))?;
        let content: Value = serde_json::from_str(&row.content)?;
        Ok(Block {
            id: row.id,
            course_id: row.course_id,
            title: row.title,
            body: BlockBody::from_parts(kind, content)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Minimal view of the course a block belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRef {
    pub id: String,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseBlock {
    #[serde(flatten)]
    pub block: Block,
    pub course: CourseRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBlockRequest {
    pub course_id: String,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub title: String,
    #[serde(default)]
    pub content: Value,
}

/// Partial update. A provided `content` replaces the stored one wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlockRequest {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<BlockKind>,
    pub content: Option<Value>,
}
