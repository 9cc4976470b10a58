//! Quiz grading.
//!
//! Grading is pure: it compares a student's answers with the stored questions
//! and reports per-question outcomes. Persisting the score is the caller's job.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A stored quiz question.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Question text.
    #[schema(example = "Which planet is largest?")]
    pub question: String,
    /// Choices offered to the student.
    #[serde(default)]
    pub options: Vec<Value>,
    /// The value a correct answer must equal.
    pub correct_answer: Value,
}

/// A question as shown to students: no correct answer.
#[derive(Clone, Debug, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub question: String,
    pub options: Vec<Value>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            question: q.question.clone(),
            options: q.options.clone(),
        }
    }
}

/// The answers a student submitted.
///
/// Accepts either an object keyed by zero-based question index
/// (`{"0": "B", "2": "C"}`) or a plain array in question order.
#[derive(Clone, Debug, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum StudentAnswers {
    Ordered(Vec<Value>),
    Indexed(BTreeMap<String, Value>),
}

impl StudentAnswers {
    /// The answer given for question `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Value> {
        match self {
            Self::Ordered(answers) => answers.get(index),
            Self::Indexed(answers) => answers.get(&index.to_string()),
        }
    }
}

/// Correct and submitted answer for one question.
#[derive(Clone, Debug, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOutcome {
    pub correct_answer: Value,
    /// `null` when the question was left unanswered.
    pub student_answer: Value,
}

impl QuestionOutcome {
    /// An unanswered question is never correct, even if the stored answer is `null`.
    pub fn is_correct(&self) -> bool {
        !self.student_answer.is_null() && self.student_answer == self.correct_answer
    }
}

/// Result of grading one submission.
#[derive(Clone, Debug, PartialEq)]
pub struct QuizGrade {
    pub results: BTreeMap<usize, QuestionOutcome>,
    pub correct_answer_count: usize,
    pub points_per_question: f64,
}

impl QuizGrade {
    /// `correct_answer_count × points_per_question`, with no rounding.
    pub fn total_points(&self) -> f64 {
        self.correct_answer_count as f64 * self.points_per_question
    }
}

/// Grade `answers` against `questions`.
///
/// Answers are compared by JSON value equality, so `"1"` and `1` differ.
/// Answers for indices past the last question are ignored.
pub fn grade_answers(
    questions: &[Question],
    points_per_question: f64,
    answers: &StudentAnswers,
) -> QuizGrade {
    let mut results = BTreeMap::new();
    let mut correct_answer_count = 0;

    for (index, question) in questions.iter().enumerate() {
        let outcome = QuestionOutcome {
            correct_answer: question.correct_answer.clone(),
            student_answer: answers.get(index).cloned().unwrap_or(Value::Null),
        };
        if outcome.is_correct() {
            correct_answer_count += 1;
        }
        results.insert(index, outcome);
    }

    QuizGrade {
        results,
        correct_answer_count,
        points_per_question,
    }
}
