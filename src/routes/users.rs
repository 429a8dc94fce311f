use std::sync::Arc;

use axum::{
    extract::State,
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::{Student, Teacher, UserKind, ZermeloUser};
use crate::response::ApiResponse;
use crate::routes::{
    auth::DeviceAuth,
    extract::{ApiPath, ApiQuery},
    not_found, parse_id,
};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/v1/schools/:school_in_school_year_id/user/:user_id",
        get(get_user).fallback(not_found),
    )
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    /// `student` or `teacher`; both are tried when absent.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Resolve a scanned badge code to a student or teacher.
async fn get_user(
    _auth: DeviceAuth,
    State(state): State<Arc<AppState>>,
    ApiPath((school_in_school_year, user_id)): ApiPath<(String, String)>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> AppResult<ApiResponse> {
    let school_in_school_year = parse_id("schoolInSchoolYear", &school_in_school_year)?;

    let kind = query
        .kind
        .as_deref()
        .map(str::parse::<UserKind>)
        .transpose()?;

    let user = match kind {
        Some(UserKind::Student) => find_student(&state, &user_id, school_in_school_year).await?,
        Some(UserKind::Teacher) => find_teacher(&state, &user_id, school_in_school_year).await?,
        None => match find_student(&state, &user_id, school_in_school_year).await? {
            Some(user) => Some(user),
            None => find_teacher(&state, &user_id, school_in_school_year).await?,
        },
    };

    let user = user.ok_or_else(|| AppError::new(ErrorCode::ZermeloUserNotFound))?;
    ApiResponse::ok(&vec![user])
}

async fn find_student(
    state: &AppState,
    user_id: &str,
    school_in_school_year: i64,
) -> AppResult<Option<ZermeloUser>> {
    let reply = state
        .zermelo
        .get_student_details(user_id, school_in_school_year, None)
        .await?;
    if !reply.is_success() {
        return Err(AppError::from_zermelo(&reply, state.zermelo.debug()));
    }

    Ok(reply
        .data
        .into_iter()
        .next()
        .map(|raw| ZermeloUser::from(Student::from(raw))))
}

async fn find_teacher(
    state: &AppState,
    user_id: &str,
    school_in_school_year: i64,
) -> AppResult<Option<ZermeloUser>> {
    let reply = state
        .zermelo
        .get_teacher_details(user_id, school_in_school_year, None)
        .await?;
    if !reply.is_success() {
        return Err(AppError::from_zermelo(&reply, state.zermelo.debug()));
    }

    Ok(reply
        .data
        .into_iter()
        .next()
        .map(|raw| ZermeloUser::from(Teacher::from(raw))))
}
