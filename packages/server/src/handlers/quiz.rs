use axum::{Json, extract::State, http::StatusCode};
use common::QUIZ_KEY;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::quiz::*;
use crate::services::attempts::{self, StartOutcome};
use crate::services::ledger::{LedgerError, ScoreLedger};
use crate::services::scoring;
use crate::state::AppState;
use crate::utils::account::find_active_user;
use crate::utils::event::find_open_event;

/// Message returned to the student when a graded submission could not be stored.
pub(crate) fn ledger_failure_message(err: &LedgerError) -> String {
    match err {
        LedgerError::NotStarted { .. } => "Event has not been started".into(),
        LedgerError::Contended { .. } => {
            "Another submission was being recorded at the same time; please resubmit".into()
        }
        LedgerError::CorruptBreakdown { .. } | LedgerError::Db(_) => {
            "Failed to record submission".into()
        }
    }
}

#[utoipa::path(
    post,
    path = "/validate-quiz",
    tag = "Student",
    operation_id = "validateQuiz",
    summary = "Submit quiz answers",
    description = "Grades the answers against the stored questions and records the score. The quiz must be open (active or published) and open to the student's department; otherwise it reads as 404. A lower score never replaces an earlier, higher one. If grading succeeds but recording fails (for example the event was never started), the grade is still returned with status 200 and an `error` field.",
    request_body = ValidateQuizRequest,
    responses(
        (status = 200, description = "Graded; `error` is present when the score was not recorded", body = QuizSubmissionResponse),
        (status = 400, description = "Missing fields or not a quiz (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a student or banned (PERMISSION_DENIED, ACCOUNT_BANNED)", body = ErrorBody),
        (status = 404, description = "Quiz not found, closed or not open to the student (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, quiz_id = tracing::field::Empty))]
pub async fn validate_quiz(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ValidateQuizRequest>,
) -> Result<Json<QuizSubmissionResponse>, AppError> {
    auth_user.require_student()?;
    let (quiz_id, answers) = validate_quiz_request(payload)?;
    tracing::Span::current().record("quiz_id", quiz_id);

    let student = find_active_user(&state.db, auth_user.user_id).await?;
    let event = find_open_event(&state.db, &student, quiz_id).await?;
    let grade = scoring::validate_quiz_answers(&event, &answers)?;
    let points = grade.total_points();

    let ledger = ScoreLedger::new(&state.db);
    match ledger
        .record(student.id, event.id, QUIZ_KEY, points)
        .await
    {
        Ok(_) => Ok(Json(QuizSubmissionResponse::recorded(grade))),
        Err(e) => {
            tracing::warn!(error = %e, points, "Quiz graded but not recorded");
            let message = ledger_failure_message(&e);
            Ok(Json(QuizSubmissionResponse::unrecorded(grade, message)))
        }
    }
}

#[utoipa::path(
    post,
    path = "/check-status",
    tag = "Student",
    operation_id = "checkEventStatus",
    summary = "Attempt status for an event",
    description = "Returns `not_started`, `in_progress` or `completed`. A failed lookup reports `unknown` instead of an error.",
    request_body = EventIdRequest,
    responses(
        (status = 200, description = "Attempt status", body = EventStatusResponse),
        (status = 400, description = "Missing eventId (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a student (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn check_status(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<EventIdRequest>,
) -> Result<Json<EventStatusResponse>, AppError> {
    auth_user.require_student()?;
    let event_id = payload.require()?;

    let report = attempts::get_event_status(&state.db, event_id, auth_user.user_id).await;

    Ok(Json(EventStatusResponse {
        event_status: report.state,
        data: report.attempt.map(AttemptResponse::from),
    }))
}

#[utoipa::path(
    post,
    path = "/start-event",
    tag = "Student",
    operation_id = "startEvent",
    summary = "Start an event",
    description = "Creates the in-progress attempt. Starting twice is not an error; the second call reports that the event was already started. The event must be open and available to the student's department.",
    request_body = EventIdRequest,
    responses(
        (status = 201, description = "Attempt created", body = StartEventResponse),
        (status = 200, description = "Already started", body = StartEventResponse),
        (status = 400, description = "Missing eventId (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a student (PERMISSION_DENIED, ACCOUNT_BANNED)", body = ErrorBody),
        (status = 404, description = "Event not found or not open (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn start_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<EventIdRequest>,
) -> Result<(StatusCode, Json<StartEventResponse>), AppError> {
    auth_user.require_student()?;
    let event_id = payload.require()?;

    let student = find_active_user(&state.db, auth_user.user_id).await?;
    find_open_event(&state.db, &student, event_id).await?;

    let response = match attempts::start_event(&state.db, event_id, student.id).await? {
        StartOutcome::Started => (
            StatusCode::CREATED,
            Json(StartEventResponse {
                success: true,
                message: "Event started".into(),
            }),
        ),
        StartOutcome::AlreadyStarted => (
            StatusCode::OK,
            Json(StartEventResponse {
                success: true,
                message: "Event already started".into(),
            }),
        ),
    };
    Ok(response)
}

#[utoipa::path(
    post,
    path = "/event-result",
    tag = "Student",
    operation_id = "getEventResult",
    summary = "Recorded result for an event",
    request_body = EventIdRequest,
    responses(
        (status = 200, description = "Best recorded result", body = EventResultResponse),
        (status = 400, description = "Missing eventId (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a student (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "No submission recorded (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn event_result(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<EventIdRequest>,
) -> Result<Json<EventResultResponse>, AppError> {
    auth_user.require_student()?;
    let event_id = payload.require()?;

    let result = ScoreLedger::new(&state.db)
        .result_for(auth_user.user_id, event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No result recorded for this event".into()))?;

    Ok(Json(EventResultResponse {
        result: result.into(),
    }))
}
