pub mod attempt_status;
pub mod breakdown;
pub mod event_status;
pub mod scoring;

pub use attempt_status::{AttemptState, AttemptStatus};
pub use breakdown::{QUIZ_KEY, ScoreBreakdown, problem_key};
pub use event_status::{EventKind, EventStatus};
pub use scoring::{
    PublicQuestion, Question, QuestionOutcome, QuizGrade, StudentAnswers, grade_answers,
};
