use axum::{Json, extract::State};
use common::{EventKind, problem_key};
use tracing::instrument;

use super::quiz::ledger_failure_message;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::contest::*;
use crate::runner::{RunOutcome, RunRequest};
use crate::services::ledger::ScoreLedger;
use crate::state::AppState;
use crate::utils::account::find_active_user;
use crate::utils::event::{find_open_event, find_problem};

#[utoipa::path(
    post,
    path = "/run-code",
    tag = "Student",
    operation_id = "runCode",
    summary = "Run code once",
    description = "Runs the program once on the given stdin and returns its output. Nothing is recorded.",
    request_body = RunCodeRequest,
    responses(
        (status = 200, description = "Execution result", body = RunOutcome),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a student (PERMISSION_DENIED)", body = ErrorBody),
        (status = 502, description = "Code runner unavailable (UPSTREAM_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, language_id = payload.language_id))]
pub async fn run_code(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<RunCodeRequest>,
) -> Result<Json<RunOutcome>, AppError> {
    auth_user.require_student()?;
    validate_source(&payload.source_code)?;

    let outcome = state
        .runner
        .run(&RunRequest {
            language_id: payload.language_id,
            source_code: payload.source_code,
            stdin: payload.stdin,
            expected_output: None,
        })
        .await?;

    Ok(Json(outcome))
}

#[utoipa::path(
    post,
    path = "/submit-contest",
    tag = "Student",
    operation_id = "submitContest",
    summary = "Submit a solution to a contest problem",
    description = "Runs the solution against every test case of the problem. Points are the problem's points scaled by the share of passed cases, and the best score per problem is kept. As with quizzes, a judged submission that cannot be recorded still returns 200 with an `error` field.",
    request_body = SubmitContestRequest,
    responses(
        (status = 200, description = "Judged; `error` is present when the score was not recorded", body = ContestSubmissionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a student (PERMISSION_DENIED, ACCOUNT_BANNED)", body = ErrorBody),
        (status = 404, description = "Event or problem not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Code runner unavailable (UPSTREAM_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(
    skip(state, auth_user, payload),
    fields(user_id = auth_user.user_id, event_id = payload.event_id, problem_id = payload.problem_id)
)]
pub async fn submit_contest(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<SubmitContestRequest>,
) -> Result<Json<ContestSubmissionResponse>, AppError> {
    auth_user.require_student()?;
    validate_source(&payload.source_code)?;

    let student = find_active_user(&state.db, auth_user.user_id).await?;
    let event = find_open_event(&state.db, &student, payload.event_id).await?;
    if event.kind != EventKind::Coding {
        return Err(AppError::Validation("Event is not a coding contest".into()));
    }
    let problem = find_problem(&state.db, event.id, payload.problem_id).await?;
    let cases = problem_test_cases(&problem)?;

    let mut verdicts = Vec::with_capacity(cases.len());
    for (index, case) in cases.iter().enumerate() {
        let outcome = state
            .runner
            .run(&RunRequest {
                language_id: payload.language_id,
                source_code: payload.source_code.clone(),
                stdin: case.input.clone(),
                expected_output: Some(case.expected_output.clone()),
            })
            .await?;
        verdicts.push(CaseVerdict::new(index, case, outcome));
    }

    let passed = verdicts.iter().filter(|v| v.passed).count();
    let total = verdicts.len();
    let points = partial_points(problem.points, passed, total);

    let error = match ScoreLedger::new(&state.db)
        .record(student.id, event.id, &problem_key(problem.id), points)
        .await
    {
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, points, "Contest submission judged but not recorded");
            Some(ledger_failure_message(&e))
        }
    };

    let message = if error.is_some() {
        "Solution judged, but the submission could not be recorded"
    } else {
        "Solution submitted successfully"
    };

    Ok(Json(ContestSubmissionResponse {
        message: message.into(),
        problem_id: problem.id,
        passed,
        total,
        points,
        verdicts,
        error,
    }))
}
