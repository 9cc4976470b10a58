use common::{EventKind, Question, QuizGrade, StudentAnswers, grade_answers};
use thiserror::Error;
use tracing::instrument;

use crate::entity::event;
use crate::error::AppError;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("event {0} is not a quiz")]
    NotAQuiz(i32),
    #[error("event {event_id} has malformed questions: {detail}")]
    MalformedData { event_id: i32, detail: String },
}

impl From<ScoringError> for AppError {
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::NotAQuiz(_) => AppError::Validation("Event is not a quiz".into()),
            ScoringError::MalformedData { .. } => AppError::Internal(err.to_string()),
        }
    }
}

/// Decode the stored question list of an event.
pub fn decode_questions(event: &event::Model) -> Result<Vec<Question>, ScoringError> {
    if !event.questions.is_array() {
        return Err(ScoringError::MalformedData {
            event_id: event.id,
            detail: "question list is not an array".into(),
        });
    }
    serde_json::from_value(event.questions.clone()).map_err(|e| ScoringError::MalformedData {
        event_id: event.id,
        detail: e.to_string(),
    })
}

/// Grade `answers` against a quiz event the caller has already loaded and
/// cleared for the student. Writes nothing.
///
/// The caller computes the total with [`QuizGrade::total_points`] and decides
/// what to persist.
#[instrument(skip_all, fields(event_id = event.id))]
pub fn validate_quiz_answers(
    event: &event::Model,
    answers: &StudentAnswers,
) -> Result<QuizGrade, ScoringError> {
    if event.kind != EventKind::Quiz {
        return Err(ScoringError::NotAQuiz(event.id));
    }

    let questions = decode_questions(event)?;
    Ok(grade_answers(&questions, event.points_per_question, answers))
}
