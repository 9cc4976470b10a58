use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use common::EventKind;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{contest_problem, event};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::event::*;
use crate::models::leaderboard::{EventLeaderboardEntry, EventLeaderboardResponse, LeaderboardQuery};
use crate::models::shared::{Pagination, page_bounds};
use crate::services::ledger::ScoreLedger;
use crate::state::AppState;
use crate::utils::account::users_by_id;
use crate::utils::event::find_event;

fn questions_json(questions: &[common::Question]) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(questions)
        .map_err(|e| AppError::Internal(format!("Question encode error: {}", e)))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Events",
    operation_id = "createEvent",
    summary = "Create an event",
    description = "Creates a quiz or coding event in the `queue` status. Coding events take their problems through the problems endpoints.",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;
    validate_create_event(&payload)?;

    let departments = normalize_departments(payload.departments);
    let now = chrono::Utc::now();
    let model = event::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description),
        kind: Set(payload.kind),
        questions: Set(questions_json(&payload.questions)?),
        points_per_question: Set(payload.points_per_question),
        departments: Set(serde_json::json!(departments)),
        status: Set(Default::default()),
        created_by: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    tracing::info!(event_id = model.id, kind = %model.kind, "Event created");
    Ok((StatusCode::CREATED, Json(EventResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Events",
    operation_id = "listEvents",
    summary = "List events",
    description = "Paginated, newest first. Includes correct answers.",
    params(EventListQuery),
    responses(
        (status = 200, description = "Events", body = EventListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_events(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<EventListQuery>,
) -> Result<Json<EventListResponse>, AppError> {
    auth_user.require_admin()?;
    let (page, per_page) = page_bounds(query.page, query.per_page);

    let mut select = event::Entity::find();
    if let Some(status) = query.status {
        select = select.filter(event::Column::Status.eq(status));
    }
    if let Some(kind) = query.kind {
        select = select.filter(event::Column::Kind.eq(kind));
    }

    let paginator = select
        .order_by_desc(event::Column::Id)
        .paginate(&state.db, per_page);
    let total = paginator.num_items().await?;
    let data = paginator
        .fetch_page(page - 1)
        .await?
        .into_iter()
        .map(EventResponse::from)
        .collect();

    Ok(Json(EventListResponse {
        data,
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages: total.div_ceil(per_page),
        },
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Events",
    operation_id = "getEvent",
    summary = "Get an event",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event, correct answers included", body = EventResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<EventResponse>, AppError> {
    auth_user.require_admin()?;
    let model = find_event(&state.db, id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Events",
    operation_id = "updateEvent",
    summary = "Update an event",
    description = "PATCH semantics. Status changes go through the status endpoint. Editing questions does not regrade earlier submissions.",
    params(("id" = i32, Path, description = "Event ID")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateEventRequest>,
) -> Result<Json<EventResponse>, AppError> {
    auth_user.require_admin()?;
    validate_update_event(&payload)?;

    let existing = find_event(&state.db, id).await?;
    if payload == UpdateEventRequest::default() {
        return Ok(Json(existing.into()));
    }
    if existing.kind == EventKind::Coding
        && payload.questions.as_ref().is_some_and(|q| !q.is_empty())
    {
        return Err(AppError::Validation(
            "Coding events take problems, not quiz questions".into(),
        ));
    }

    let mut active: event::ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(questions) = payload.questions {
        active.questions = Set(questions_json(&questions)?);
    }
    if let Some(points) = payload.points_per_question {
        active.points_per_question = Set(points);
    }
    if let Some(departments) = payload.departments {
        active.departments = Set(serde_json::json!(normalize_departments(departments)));
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    put,
    path = "/{id}/status",
    tag = "Events",
    operation_id = "setEventStatus",
    summary = "Move an event through its lifecycle",
    description = "Allowed: queue to active or published, active to published and back, active or published to ended. Setting the current status again is a no-op.",
    params(("id" = i32, Path, description = "Event ID")),
    request_body = UpdateEventStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = EventResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Transition not allowed (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, status = %payload.status))]
pub async fn set_event_status(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateEventStatusRequest>,
) -> Result<Json<EventResponse>, AppError> {
    auth_user.require_admin()?;

    let existing = find_event(&state.db, id).await?;
    if existing.status == payload.status {
        return Ok(Json(existing.into()));
    }
    if !existing.status.can_transition_to(payload.status) {
        return Err(AppError::Conflict(format!(
            "Cannot move event from {} to {}",
            existing.status, payload.status
        )));
    }

    let from = existing.status;
    let mut active: event::ActiveModel = existing.into();
    active.status = Set(payload.status);
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&state.db).await?;

    tracing::info!(%from, to = %model.status, "Event status changed");
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Events",
    operation_id = "deleteEvent",
    summary = "Delete an event",
    description = "Removes the event and its contest problems. Attempts and results are kept, so scores already earned still count toward student totals.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    auth_user.require_admin()?;

    let txn = state.db.begin().await?;
    let event = find_event(&txn, id).await?;
    contest_problem::Entity::delete_many()
        .filter(contest_problem::Column::EventId.eq(event.id))
        .exec(&txn)
        .await?;
    event::Entity::delete_by_id(event.id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(event_id = id, "Event deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{id}/leaderboard",
    tag = "Events",
    operation_id = "getEventLeaderboard",
    summary = "Event leaderboard",
    description = "Best points first; ties go to whoever reached their score earlier.",
    params(("id" = i32, Path, description = "Event ID"), LeaderboardQuery),
    responses(
        (status = 200, description = "Standings", body = EventLeaderboardResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(id))]
pub async fn event_leaderboard(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<EventLeaderboardResponse>, AppError> {
    auth_user.require_admin()?;
    let event = find_event(&state.db, id).await?;

    let standings = ScoreLedger::new(&state.db)
        .event_standings(event.id, query.limit())
        .await?;
    let users = users_by_id(&state.db, standings.iter().map(|r| r.user_id)).await?;

    let data = standings
        .into_iter()
        .filter_map(|r| {
            let user = users.get(&r.user_id)?;
            Some((r, user))
        })
        .enumerate()
        .map(|(i, (r, user))| EventLeaderboardEntry {
            rank: i + 1,
            user_id: r.user_id,
            name: user.name.clone(),
            department: user.department.clone(),
            points: r.points,
            submission_count: r.submission_count,
            submitted_at: r.submitted_at,
        })
        .collect();

    Ok(Json(EventLeaderboardResponse {
        event_id: event.id,
        data,
    }))
}
