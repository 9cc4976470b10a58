use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use common::EventKind;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::Func;
use sea_orm::*;
use tracing::instrument;

use crate::entity::contest_problem;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::contest::*;
use crate::state::AppState;
use crate::utils::event::{find_event, find_problem};

fn test_cases_json(cases: &[TestCase]) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(cases)
        .map_err(|e| AppError::Internal(format!("Test case encode error: {}", e)))
}

/// Next free position at the end of an event's problem list.
async fn next_position<C: ConnectionTrait>(db: &C, event_id: i32) -> Result<i32, AppError> {
    let max: Option<Option<i32>> = contest_problem::Entity::find()
        .select_only()
        .column_as(
            Expr::expr(Func::max(Expr::col(contest_problem::Column::Position))),
            "max_position",
        )
        .filter(contest_problem::Column::EventId.eq(event_id))
        .into_tuple()
        .one(db)
        .await?;
    Ok(max.flatten().map_or(0, |p| p + 1))
}

#[utoipa::path(
    post,
    path = "/{id}/problems",
    tag = "Contest Problems",
    operation_id = "createContestProblem",
    summary = "Add a problem to a coding event",
    params(("id" = i32, Path, description = "Event ID")),
    request_body = CreateProblemRequest,
    responses(
        (status = 201, description = "Problem created", body = ProblemResponse),
        (status = 400, description = "Validation error or not a coding event (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, title = %payload.title))]
pub async fn create_problem(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<CreateProblemRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;
    validate_create_problem(&payload)?;

    let event = find_event(&state.db, id).await?;
    if event.kind != EventKind::Coding {
        return Err(AppError::Validation(
            "Problems can only be added to coding events".into(),
        ));
    }

    let position = match payload.position {
        Some(p) => p,
        None => next_position(&state.db, event.id).await?,
    };

    let now = chrono::Utc::now();
    let model = contest_problem::ActiveModel {
        event_id: Set(event.id),
        title: Set(payload.title.trim().to_string()),
        statement: Set(payload.statement),
        points: Set(payload.points),
        position: Set(position),
        test_cases: Set(test_cases_json(&payload.test_cases)?),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(ProblemResponse::try_from(model)?)))
}

#[utoipa::path(
    get,
    path = "/{id}/problems",
    tag = "Contest Problems",
    operation_id = "listContestProblems",
    summary = "List the problems of an event",
    description = "Full view, hidden test cases included.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Problems in display order", body = Vec<ProblemResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn list_problems(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<ProblemResponse>>, AppError> {
    auth_user.require_admin()?;
    let event = find_event(&state.db, id).await?;

    let problems = contest_problem::Entity::find()
        .filter(contest_problem::Column::EventId.eq(event.id))
        .order_by_asc(contest_problem::Column::Position)
        .order_by_asc(contest_problem::Column::Id)
        .all(&state.db)
        .await?;

    let problems = problems
        .into_iter()
        .map(ProblemResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(problems))
}

#[utoipa::path(
    get,
    path = "/{id}/problems/{problem_id}",
    tag = "Contest Problems",
    operation_id = "getContestProblem",
    summary = "Get a problem",
    params(
        ("id" = i32, Path, description = "Event ID"),
        ("problem_id" = i32, Path, description = "Problem ID"),
    ),
    responses(
        (status = 200, description = "Problem", body = ProblemResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Problem not found in this event (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, problem_id))]
pub async fn get_problem(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, problem_id)): Path<(i32, i32)>,
) -> Result<Json<ProblemResponse>, AppError> {
    auth_user.require_admin()?;
    let model = find_problem(&state.db, id, problem_id).await?;
    Ok(Json(ProblemResponse::try_from(model)?))
}

#[utoipa::path(
    patch,
    path = "/{id}/problems/{problem_id}",
    tag = "Contest Problems",
    operation_id = "updateContestProblem",
    summary = "Update a problem",
    description = "PATCH semantics. Changing points or test cases does not rescore earlier submissions.",
    params(
        ("id" = i32, Path, description = "Event ID"),
        ("problem_id" = i32, Path, description = "Problem ID"),
    ),
    request_body = UpdateProblemRequest,
    responses(
        (status = 200, description = "Problem updated", body = ProblemResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Problem not found in this event (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, problem_id))]
pub async fn update_problem(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, problem_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<UpdateProblemRequest>,
) -> Result<Json<ProblemResponse>, AppError> {
    auth_user.require_admin()?;
    validate_update_problem(&payload)?;

    let existing = find_problem(&state.db, id, problem_id).await?;
    if payload == UpdateProblemRequest::default() {
        return Ok(Json(ProblemResponse::try_from(existing)?));
    }

    let mut active: contest_problem::ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(statement) = payload.statement {
        active.statement = Set(statement);
    }
    if let Some(points) = payload.points {
        active.points = Set(points);
    }
    if let Some(position) = payload.position {
        active.position = Set(position);
    }
    if let Some(cases) = payload.test_cases {
        active.test_cases = Set(test_cases_json(&cases)?);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await?;
    Ok(Json(ProblemResponse::try_from(model)?))
}

#[utoipa::path(
    delete,
    path = "/{id}/problems/{problem_id}",
    tag = "Contest Problems",
    operation_id = "deleteContestProblem",
    summary = "Remove a problem",
    description = "Scores already recorded for the problem stay in students' results.",
    params(
        ("id" = i32, Path, description = "Event ID"),
        ("problem_id" = i32, Path, description = "Problem ID"),
    ),
    responses(
        (status = 204, description = "Problem deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Problem not found in this event (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, problem_id))]
pub async fn delete_problem(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, problem_id)): Path<(i32, i32)>,
) -> Result<StatusCode, AppError> {
    auth_user.require_admin()?;
    let problem = find_problem(&state.db, id, problem_id).await?;
    contest_problem::Entity::delete_by_id(problem.id)
        .exec(&state.db)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
