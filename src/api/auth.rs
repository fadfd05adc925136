use axum::{Json, extract::State, http::StatusCode};

use super::{CurrentUser, Payload};
use crate::error::AppError;
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, User};
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    Payload(req): Payload<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let auth = state.auth().register(req).await?;
    Ok((StatusCode::CREATED, Json(auth)))
}

pub async fn login(
    State(state): State<AppState>,
    Payload(req): Payload<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let auth = state.auth().login(req).await?;
    Ok(Json(auth))
}

pub async fn me(user: CurrentUser) -> Json<User> {
    Json(user.user)
}

pub async fn logout(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<StatusCode, AppError> {
    state.auth().logout(&user.token).await?;
    Ok(StatusCode::NO_CONTENT)
}
