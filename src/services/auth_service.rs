use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::repository;
use crate::error::AppError;
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, User};

const MIN_PASSWORD_LEN: usize = 6;

pub struct AuthService {
    db: SqlitePool,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(db: SqlitePool, session_ttl: Duration) -> Self {
        Self { db, session_ttl }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse, AppError> {
        let name = req.name.trim();
        let email = normalize_email(&req.email);
        if name.is_empty() {
            return Err(AppError::validation("name is required"));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::validation("a valid email is required"));
        }
        if req.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        if repository::find_credentials_by_email(&self.db, &email).await?.is_some() {
            return Err(AppError::DuplicateKey("Email already exists".to_string()));
        }

        let salt = Uuid::new_v4().simple().to_string();
        let hash = hash_password(&salt, &req.password);
        let user = repository::insert_user(&self.db, name, &email, &hash, &salt)
            .await
            .map_err(|e| AppError::from_unique_violation(e, "Email already exists"))?;
        info!("registered user {}", user.id);

        self.issue(user).await
    }

    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, AppError> {
        let email = normalize_email(&req.email);
        let creds = repository::find_credentials_by_email(&self.db, &email)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid credentials"))?;

        if hash_password(&creds.password_salt, &req.password) != creds.password_hash {
            debug!("password mismatch for user {}", creds.id);
            return Err(AppError::unauthorized("Invalid credentials"));
        }

        let user = repository::find_user_by_id(&self.db, &creds.id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("credentials without user {}", creds.id)))?;

        self.issue(user).await
    }

    /// Resolves a bearer token to the account it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let session = repository::find_session(&self.db, token)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid token"))?;

        if session.expires_at <= Utc::now() {
            repository::delete_session(&self.db, token).await?;
            return Err(AppError::unauthorized("Token expired"));
        }

        repository::find_user_by_id(&self.db, &session.user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid token"))
    }

    pub async fn logout(&self, token: &str) -> Result<(), AppError> {
        repository::delete_session(&self.db, token).await?;
        Ok(())
    }

    async fn issue(&self, user: User) -> Result<AuthResponse, AppError> {
        let session = repository::insert_session(&self.db, &user.id, self.session_ttl).await?;
        Ok(AuthResponse {
            token: session.token,
            user,
        })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
