use axum::{Json, extract::State};
use chrono::{Datelike, FixedOffset, Local, NaiveDate, Offset, Utc};
use serde::Deserialize;

use super::{CurrentUser, Params};
use crate::agenda::{AgendaClock, CalendarDay, CalendarRange, Dashboard};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    pub course: Option<String>,
    /// Viewer offset in minutes east of UTC.
    pub tz: Option<i32>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarView {
    #[default]
    Month,
    Week,
}

#[derive(Debug, Default, Deserialize)]
pub struct CalendarParams {
    pub course: Option<String>,
    pub tz: Option<i32>,
    #[serde(default)]
    pub view: CalendarView,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub date: Option<NaiveDate>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    user: CurrentUser,
    Params(params): Params<DashboardParams>,
) -> Result<Json<Dashboard>, AppError> {
    let clock = clock_for(params.tz)?;
    let dashboard = state
        .agenda()
        .dashboard(user.id(), params.course.as_deref(), &clock)
        .await?;
    Ok(Json(dashboard))
}

pub async fn calendar(
    State(state): State<AppState>,
    user: CurrentUser,
    Params(params): Params<CalendarParams>,
) -> Result<Json<Vec<CalendarDay>>, AppError> {
    let clock = clock_for(params.tz)?;
    let today = clock.today();
    let range = match params.view {
        CalendarView::Month => CalendarRange::Month {
            year: params.year.unwrap_or(today.year()),
            month: params.month.unwrap_or(today.month()),
        },
        CalendarView::Week => CalendarRange::Week {
            containing: params.date.unwrap_or(today),
        },
    };

    let days = state
        .agenda()
        .calendar(user.id(), params.course.as_deref(), range, &clock)
        .await?;
    Ok(Json(days))
}

fn clock_for(tz_minutes: Option<i32>) -> Result<AgendaClock, AppError> {
    let offset = match tz_minutes {
        Some(minutes) => minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| AppError::validation(format!("invalid tz offset {minutes}")))?,
        None => Local::now().offset().fix(),
    };
    Ok(AgendaClock::new(Utc::now(), offset))
}
