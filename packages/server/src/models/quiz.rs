use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{AttemptState, AttemptStatus, QuestionOutcome, QuizGrade, StudentAnswers};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{event_attempt, event_result};
use crate::error::AppError;

/// Request body for submitting quiz answers.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateQuizRequest {
    /// Event ID of the quiz.
    #[schema(example = 12)]
    pub quiz_id: Option<i32>,
    /// Answers keyed by zero-based question index, or an array in question order.
    #[schema(value_type = Object, example = json!({"0": "B", "1": "A", "2": "D"}))]
    pub student_answers: Option<StudentAnswers>,
}

pub fn validate_quiz_request(payload: ValidateQuizRequest) -> Result<(i32, StudentAnswers), AppError> {
    let quiz_id = payload
        .quiz_id
        .ok_or_else(|| AppError::Validation("quizId is required".into()))?;
    let answers = payload
        .student_answers
        .ok_or_else(|| AppError::Validation("studentAnswers is required".into()))?;
    Ok((quiz_id, answers))
}

/// Graded quiz. `error` is set when the score could not be recorded; the
/// grading itself is still authoritative.
#[derive(Serialize, utoipa::ToSchema)]
pub struct QuizSubmissionResponse {
    pub message: String,
    /// Per-question outcome keyed by zero-based index.
    #[serde(rename = "QuizResult")]
    pub quiz_result: BTreeMap<usize, QuestionOutcome>,
    #[serde(rename = "CorrectAnswerCount")]
    #[schema(example = 2)]
    pub correct_answer_count: usize,
    #[serde(rename = "Points")]
    #[schema(example = 20.0)]
    pub points: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QuizSubmissionResponse {
    pub fn recorded(grade: QuizGrade) -> Self {
        Self::build(grade, "Quiz submitted successfully".into(), None)
    }

    pub fn unrecorded(grade: QuizGrade, error: String) -> Self {
        Self::build(
            grade,
            "Quiz validated, but the submission could not be recorded".into(),
            Some(error),
        )
    }

    fn build(grade: QuizGrade, message: String, error: Option<String>) -> Self {
        let points = grade.total_points();
        Self {
            message,
            quiz_result: grade.results,
            correct_answer_count: grade.correct_answer_count,
            points,
            error,
        }
    }
}

/// Request body carrying just an event ID.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventIdRequest {
    #[schema(example = 12)]
    pub event_id: Option<i32>,
}

impl EventIdRequest {
    pub fn require(&self) -> Result<i32, AppError> {
        self.event_id
            .ok_or_else(|| AppError::Validation("eventId is required".into()))
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttemptResponse {
    pub user_id: i32,
    pub event_id: i32,
    pub status: AttemptStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result_id: Option<i32>,
}

impl From<event_attempt::Model> for AttemptResponse {
    fn from(m: event_attempt::Model) -> Self {
        Self {
            user_id: m.user_id,
            event_id: m.event_id,
            status: m.status,
            started_at: m.started_at,
            completed_at: m.completed_at,
            result_id: m.result_id,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventStatusResponse {
    /// `not_started`, `in_progress`, `completed`, or `unknown` when the lookup failed.
    pub event_status: AttemptState,
    pub data: Option<AttemptResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct StartEventResponse {
    pub success: bool,
    #[schema(example = "Event started")]
    pub message: String,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResultResponse {
    pub id: i32,
    pub user_id: i32,
    pub event_id: i32,
    /// Best total reached so far.
    #[schema(example = 20.0)]
    pub points: f64,
    pub last_points: f64,
    /// Best score per key (`quiz` or `problem:<id>`).
    #[schema(value_type = Object)]
    pub breakdown: Value,
    pub submission_count: i32,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<event_result::Model> for ResultResponse {
    fn from(m: event_result::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            event_id: m.event_id,
            points: m.points,
            last_points: m.last_points,
            breakdown: m.breakdown,
            submission_count: m.submission_count,
            submitted_at: m.submitted_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EventResultResponse {
    pub result: ResultResponse,
}
