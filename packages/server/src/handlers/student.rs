use axum::{
    Json,
    extract::{Path, State},
};
use common::{EventKind, EventStatus};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{contest_problem, event, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::contest::StudentProblemResponse;
use crate::models::event::{StudentEventResponse, is_eligible};
use crate::models::profile::*;
use crate::services::ledger::ScoreLedger;
use crate::services::scoring::decode_questions;
use crate::state::AppState;
use crate::utils::account::find_active_user;
use crate::utils::event::find_open_event;
use crate::utils::hash;

#[utoipa::path(
    get,
    path = "/events",
    tag = "Student",
    operation_id = "listStudentEvents",
    summary = "Events open to the caller",
    description = "Lists active and published events available to the caller's department. Correct answers are stripped.",
    responses(
        (status = 200, description = "Open events", body = Vec<StudentEventResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a student (PERMISSION_DENIED, ACCOUNT_BANNED)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_events(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<StudentEventResponse>>, AppError> {
    auth_user.require_student()?;
    let student = find_active_user(&state.db, auth_user.user_id).await?;

    let events = event::Entity::find()
        .filter(event::Column::Status.is_in([EventStatus::Active, EventStatus::Published]))
        .order_by_desc(event::Column::Id)
        .all(&state.db)
        .await?;

    let mut data = Vec::with_capacity(events.len());
    for event in events {
        if !is_eligible(&event, student.department.as_deref()) {
            continue;
        }
        match decode_questions(&event) {
            Ok(questions) => data.push(StudentEventResponse::new(event, &questions)),
            Err(e) => tracing::warn!(error = %e, "Skipping event with unreadable questions"),
        }
    }

    Ok(Json(data))
}

#[utoipa::path(
    get,
    path = "/events/{id}",
    tag = "Student",
    operation_id = "getStudentEvent",
    summary = "One open event",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event without answers", body = StudentEventResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a student (PERMISSION_DENIED, ACCOUNT_BANNED)", body = ErrorBody),
        (status = 404, description = "Not found, closed, or not available to the caller (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn get_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<StudentEventResponse>, AppError> {
    auth_user.require_student()?;
    let student = find_active_user(&state.db, auth_user.user_id).await?;
    let event = find_open_event(&state.db, &student, id).await?;
    let questions = decode_questions(&event)?;
    Ok(Json(StudentEventResponse::new(event, &questions)))
}

#[utoipa::path(
    get,
    path = "/events/{id}/problems",
    tag = "Student",
    operation_id = "listStudentProblems",
    summary = "Problems of an open coding contest",
    description = "Hidden test cases are omitted; `testCaseCount` still counts them.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Problems in display order", body = Vec<StudentProblemResponse>),
        (status = 400, description = "Event is not a coding contest (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a student (PERMISSION_DENIED, ACCOUNT_BANNED)", body = ErrorBody),
        (status = 404, description = "Not found, closed, or not available to the caller (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn list_event_problems(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<StudentProblemResponse>>, AppError> {
    auth_user.require_student()?;
    let student = find_active_user(&state.db, auth_user.user_id).await?;
    let event = find_open_event(&state.db, &student, id).await?;
    if event.kind != EventKind::Coding {
        return Err(AppError::Validation("Event is not a coding contest".into()));
    }

    let problems = contest_problem::Entity::find()
        .filter(contest_problem::Column::EventId.eq(event.id))
        .order_by_asc(contest_problem::Column::Position)
        .order_by_asc(contest_problem::Column::Id)
        .all(&state.db)
        .await?;

    let problems = problems
        .into_iter()
        .map(StudentProblemResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(problems))
}

#[utoipa::path(
    get,
    path = "/profile",
    tag = "Student",
    operation_id = "getProfile",
    summary = "Own profile and score summary",
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Account banned (ACCOUNT_BANNED)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = find_active_user(&state.db, auth_user.user_id).await?;
    let summary = ScoreLedger::new(&state.db).user_summary(user.id).await?;

    Ok(Json(ProfileResponse {
        user: user.into(),
        summary: summary.into(),
    }))
}

#[utoipa::path(
    patch,
    path = "/profile",
    tag = "Student",
    operation_id = "updateProfile",
    summary = "Update own name or password",
    description = "Changing the password requires `currentPassword`.",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = ProfileResponse),
        (status = 400, description = "Validation error or wrong current password (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Account banned (ACCOUNT_BANNED)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    validate_update_profile(&payload)?;
    let user = find_active_user(&state.db, auth_user.user_id).await?;

    let user = if payload == UpdateProfileRequest::default() {
        user
    } else {
        let mut active: user::ActiveModel = user.clone().into();

        if let Some(name) = payload.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(new_password) = payload.new_password {
            let current = payload.current_password.unwrap_or_default();
            let matches = hash::verify_password(&current, &user.password)
                .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
            if !matches {
                return Err(AppError::Validation("Current password is incorrect".into()));
            }
            let hashed = hash::hash_password(&new_password)
                .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;
            active.password = Set(hashed);
        }
        active.updated_at = Set(chrono::Utc::now());
        active.update(&state.db).await?
    };

    let summary = ScoreLedger::new(&state.db).user_summary(user.id).await?;
    Ok(Json(ProfileResponse {
        user: user.into(),
        summary: summary.into(),
    }))
}
