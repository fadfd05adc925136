use chrono::{DateTime, Duration, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::models::{BlockBody, BlockRow, Course, CourseRef, NewCourseRequest, Session, User, UserCredentials};

const BLOCK_COLUMNS: &str =
    "b.id, b.course_id, b.kind, b.title, b.content, b.created_at, b.updated_at";

// ---- users & sessions ----

pub async fn insert_user(
    db: &SqlitePool,
    name: &str,
    email: &str,
    password_hash: &str,
    password_salt: &str,
) -> Result<User, sqlx::Error> {
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        email: email.to_string(),
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, password_salt, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(password_hash)
    .bind(password_salt)
    .bind(user.created_at)
    .execute(db)
    .await?;

    Ok(user)
}

pub async fn find_user_by_id(db: &SqlitePool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT id, name, email, created_at FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_credentials_by_email(
    db: &SqlitePool,
    email: &str,
) -> Result<Option<UserCredentials>, sqlx::Error> {
    sqlx::query_as::<_, UserCredentials>(
        "SELECT id, password_hash, password_salt FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(db)
    .await
}

pub async fn insert_session(
    db: &SqlitePool,
    user_id: &str,
    ttl: Duration,
) -> Result<Session, sqlx::Error> {
    let now = Utc::now();
    let session = Session {
        token: Uuid::new_v4().simple().to_string(),
        user_id: user_id.to_string(),
        created_at: now,
        expires_at: now + ttl,
    };

    sqlx::query("INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)")
        .bind(&session.token)
        .bind(&session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(db)
        .await?;

    Ok(session)
}

pub async fn find_session(db: &SqlitePool, token: &str) -> Result<Option<Session>, sqlx::Error> {
    sqlx::query_as::<_, Session>(
        "SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = ?",
    )
    .bind(token)
    .fetch_optional(db)
    .await
}

pub async fn delete_session(db: &SqlitePool, token: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

// ---- courses ----

pub async fn fetch_courses(db: &SqlitePool, owner_id: &str) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        r#"
        SELECT id, name, code, semester, instructor, description, owner_id, created_at
        FROM courses
        WHERE owner_id = ?
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .bind(owner_id)
    .fetch_all(db)
    .await
}

pub async fn find_course(
    db: &SqlitePool,
    owner_id: &str,
    id: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        "SELECT id, name, code, semester, instructor, description, owner_id, created_at FROM courses WHERE id = ? AND owner_id = ?",
    )
    .bind(id)
    .bind(owner_id)
    .fetch_optional(db)
    .await
}

pub async fn find_course_by_code(
    db: &SqlitePool,
    owner_id: &str,
    code: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        "SELECT id, name, code, semester, instructor, description, owner_id, created_at FROM courses WHERE code = ? AND owner_id = ?",
    )
    .bind(code)
    .bind(owner_id)
    .fetch_optional(db)
    .await
}

pub async fn insert_course(
    db: &SqlitePool,
    owner_id: &str,
    req: NewCourseRequest,
) -> Result<Course, sqlx::Error> {
    let course = Course {
        id: Uuid::new_v4().to_string(),
        name: req.name,
        code: req.code,
        semester: req.semester,
        instructor: req.instructor,
        description: req.description,
        owner_id: owner_id.to_string(),
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO courses
            (id, name, code, semester, instructor, description, owner_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&course.id)
    .bind(&course.name)
    .bind(&course.code)
    .bind(&course.semester)
    .bind(&course.instructor)
    .bind(&course.description)
    .bind(&course.owner_id)
    .bind(course.created_at)
    .execute(db)
    .await?;

    Ok(course)
}

pub async fn update_course(db: &SqlitePool, course: &Course) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE courses
        SET name = ?, code = ?, semester = ?, instructor = ?, description = ?
        WHERE id = ?
        "#,
    )
    .bind(&course.name)
    .bind(&course.code)
    .bind(&course.semester)
    .bind(&course.instructor)
    .bind(&course.description)
    .bind(&course.id)
    .execute(db)
    .await?
    .rows_affected();

    Ok(result > 0)
}

pub async fn delete_course(db: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM courses WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

// ---- blocks ----

/// A block row joined with the summary of its course.
#[derive(Debug, Clone, FromRow)]
pub struct CourseBlockRow {
    #[sqlx(flatten)]
    pub block: BlockRow,
    pub course_name: String,
    pub course_code: String,
}

impl CourseBlockRow {
    pub fn course_ref(&self) -> CourseRef {
        CourseRef {
            id: self.block.course_id.clone(),
            name: self.course_name.clone(),
            code: self.course_code.clone(),
        }
    }
}

pub async fn fetch_blocks_by_course(
    db: &SqlitePool,
    course_id: &str,
) -> Result<Vec<BlockRow>, sqlx::Error> {
    sqlx::query_as::<_, BlockRow>(&format!(
        "SELECT {BLOCK_COLUMNS} FROM blocks b WHERE b.course_id = ? ORDER BY b.created_at DESC, b.rowid DESC"
    ))
    .bind(course_id)
    .fetch_all(db)
    .await
}

/// Every block of every course owned by `owner_id` in one round trip.
pub async fn fetch_blocks_for_owner(
    db: &SqlitePool,
    owner_id: &str,
    course_id: Option<&str>,
) -> Result<Vec<CourseBlockRow>, sqlx::Error> {
    sqlx::query_as::<_, CourseBlockRow>(&format!(
        r#"
        SELECT {BLOCK_COLUMNS}, c.name AS course_name, c.code AS course_code
        FROM blocks b
        JOIN courses c ON c.id = b.course_id
        WHERE c.owner_id = ?1 AND (?2 IS NULL OR c.id = ?2)
        ORDER BY b.created_at DESC, b.rowid DESC
        "#
    ))
    .bind(owner_id)
    .bind(course_id)
    .fetch_all(db)
    .await
}

pub async fn find_block_for_owner(
    db: &SqlitePool,
    owner_id: &str,
    id: &str,
) -> Result<Option<BlockRow>, sqlx::Error> {
    sqlx::query_as::<_, BlockRow>(&format!(
        r#"
        SELECT {BLOCK_COLUMNS}
        FROM blocks b
        JOIN courses c ON c.id = b.course_id
        WHERE b.id = ? AND c.owner_id = ?
        "#
    ))
    .bind(id)
    .bind(owner_id)
    .fetch_optional(db)
    .await
}

pub async fn insert_block(
    db: &SqlitePool,
    course_id: &str,
    title: &str,
    body: &BlockBody,
    content_json: &str,
) -> Result<BlockRow, sqlx::Error> {
    let now = Utc::now();
    let row = BlockRow {
        id: Uuid::new_v4().to_string(),
        course_id: course_id.to_string(),
        kind: body.kind().as_str().to_string(),
        title: title.to_string(),
        content: content_json.to_string(),
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO blocks (id, course_id, kind, title, content, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&row.id)
    .bind(&row.course_id)
    .bind(&row.kind)
    .bind(&row.title)
    .bind(&row.content)
    .bind(row.created_at)
    .bind(row.updated_at)
    .execute(db)
    .await?;

    Ok(row)
}

pub async fn update_block(
    db: &SqlitePool,
    id: &str,
    title: &str,
    body: &BlockBody,
    content_json: &str,
    updated_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE blocks
        SET title = ?, kind = ?, content = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(title)
    .bind(body.kind().as_str())
    .bind(content_json)
    .bind(updated_at)
    .bind(id)
    .execute(db)
    .await?
    .rows_affected();

    Ok(result > 0)
}

pub async fn delete_block(db: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM blocks WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn delete_blocks_by_course(db: &SqlitePool, course_id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM blocks WHERE course_id = ?")
        .bind(course_id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result)
}

pub async fn count_blocks_by_course(db: &SqlitePool, course_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM blocks WHERE course_id = ?")
        .bind(course_id)
        .fetch_one(db)
        .await
}
