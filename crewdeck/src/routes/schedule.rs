use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use crewdeck_roster::{build_calendar, build_grid, CalendarCell, MonthSchedule, PORTAL_TZ};
use mycrew::Window;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{error::AppError, AppState, Result};

/// Schedules only change when the airline publishes a new roster, so clients
/// may hold on to them for a bit.
const CACHE_CONTROL: &str = "private, max-age=300";

#[derive(Debug, Deserialize)]
struct ScheduleQuery {
    crew: Option<String>,
    year: Option<i32>,
    month: Option<u32>,
}

async fn load_month(state: &AppState, query: &ScheduleQuery) -> Result<MonthSchedule> {
    let (year, month) = match (query.year, query.month) {
        (Some(year), Some(month)) => (year, month),
        _ => {
            return Err(AppError::BadRequest(
                "year and month are required".to_owned(),
            ))
        }
    };

    let crew = query
        .crew
        .as_deref()
        .or(state.default_crew.as_deref())
        .ok_or_else(|| AppError::BadRequest("no crew member given".to_owned()))?;

    let today = Utc::now().with_timezone(&PORTAL_TZ).date_naive();
    let window = Window::for_month(year, month, today)
        .ok_or_else(|| AppError::BadRequest(format!("{year}-{month:02} is not a month")))?;

    let records = state.portal.assignments(crew, window).await?;

    MonthSchedule::build(year, month, records)
        .ok_or_else(|| AppError::BadRequest(format!("{year}-{month:02} is not a month")))
}

#[derive(Debug, Serialize)]
struct MonthResponse {
    #[serde(flatten)]
    schedule: MonthSchedule,
    total_assignments: usize,
    total_duty_minutes: i64,
}

impl MonthResponse {
    fn new(schedule: MonthSchedule) -> Self {
        Self {
            total_assignments: schedule.assignment_count(),
            total_duty_minutes: schedule.duty_minutes(),
            schedule,
        }
    }
}

#[instrument(skip(state))]
async fn month(
    state: State<AppState>,
    query: Query<ScheduleQuery>,
) -> Result<impl IntoResponse> {
    let schedule = load_month(&state, &query).await?;

    Ok((
        [(header::CACHE_CONTROL, CACHE_CONTROL)],
        Json(MonthResponse::new(schedule)),
    ))
}

#[derive(Debug, Serialize)]
struct GridResponse {
    year: i32,
    month: u32,
    cells: Vec<CalendarCell>,
}

#[instrument(skip(state))]
async fn calendar(
    state: State<AppState>,
    query: Query<ScheduleQuery>,
) -> Result<impl IntoResponse> {
    let schedule = load_month(&state, &query).await?;

    Ok((
        [(header::CACHE_CONTROL, CACHE_CONTROL)],
        Json(GridResponse {
            year: schedule.year,
            month: schedule.month,
            cells: build_grid(&schedule),
        }),
    ))
}

#[instrument(skip(state))]
async fn ical(
    state: State<AppState>,
    query: Query<ScheduleQuery>,
) -> Result<impl IntoResponse> {
    let schedule = load_month(&state, &query).await?;
    let calendar = build_calendar(schedule.days.iter().flat_map(|day| day.assignments.iter()));

    Ok((
        [
            (header::CACHE_CONTROL, CACHE_CONTROL),
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8"),
        ],
        calendar.to_string(),
    ))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(month))
        .route("/calendar", get(calendar))
        .route("/ical", get(ical))
}
