use std::sync::Arc;

use axum::{
    extract::State,
    routing::get,
    Router,
};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, TimeZone, Utc};
use serde::Deserialize;

use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::build_schedule;
use crate::response::ApiResponse;
use crate::routes::{
    auth::DeviceAuth,
    extract::{ApiPath, ApiQuery},
    not_found,
};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/v1/schedule/:student_id",
        get(get_schedule).fallback(not_found),
    )
}

#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    /// Unix timestamp; defaults to Monday 00:00:00 of the current week.
    pub start: Option<String>,
    /// Unix timestamp; defaults to Sunday 23:59:59 of the current week.
    pub end: Option<String>,
}

async fn get_schedule(
    _auth: DeviceAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(student_id): ApiPath<String>,
    ApiQuery(query): ApiQuery<ScheduleQuery>,
) -> AppResult<ApiResponse> {
    let (week_start, week_end) = week_bounds(&Local::now());
    let start = parse_timestamp("start", query.start.as_deref())?.unwrap_or(week_start);
    let end = parse_timestamp("end", query.end.as_deref())?.unwrap_or(week_end);

    let reply = state
        .zermelo
        .get_schedule_appointments(&student_id, start, end, None, None)
        .await?;
    if !reply.is_success() {
        return Err(AppError::from_zermelo(&reply, state.zermelo.debug()));
    }

    ApiResponse::ok(&build_schedule(reply.data))
}

fn parse_timestamp(name: &str, value: Option<&str>) -> AppResult<Option<i64>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse::<i64>().map(Some).map_err(|_| {
            AppError::new(ErrorCode::ParameterInvalid)
                .with_details(format!("De parameter '{}' moet een Unix-tijdstempel zijn", name))
        }),
    }
}

/// Monday 00:00:00 and Sunday 23:59:59 of the week containing `now`, in the
/// time zone of `now`.
pub fn week_bounds<Tz: TimeZone>(now: &DateTime<Tz>) -> (i64, i64) {
    let tz = now.timezone();
    let today = now.date_naive();
    let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    let sunday = monday + Duration::days(6);

    (
        local_timestamp(&tz, monday, 0, 0, 0),
        local_timestamp(&tz, sunday, 23, 59, 59),
    )
}

fn local_timestamp<Tz: TimeZone>(tz: &Tz, date: NaiveDate, h: u32, m: u32, s: u32) -> i64 {
    let naive = date.and_hms_opt(h, m, s).unwrap_or_default();
    match tz.from_local_datetime(&naive).earliest() {
        Some(local) => local.timestamp(),
        // Skipped by a DST transition.
        None => Utc.from_utc_datetime(&naive).timestamp(),
    }
}
