use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::validate_title;
use crate::entity::contest_problem;
use crate::error::AppError;
use crate::runner::RunOutcome;

/// Largest accepted source file, in bytes.
pub const MAX_SOURCE_BYTES: usize = 64 * 1024;
/// Most test cases one problem may carry.
pub const MAX_TEST_CASES: usize = 50;

/// One input/output pair of a contest problem.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    #[schema(example = "1 2\n")]
    pub input: String,
    #[schema(example = "3\n")]
    pub expected_output: String,
    /// Hidden cases count for scoring but are never shown to students.
    #[serde(default)]
    pub hidden: bool,
}

/// Test cases stored on a problem.
///
/// Stored cases that no longer decode are an internal error, never an empty
/// list, so a broken problem cannot judge every submission as zero.
pub fn problem_test_cases(problem: &contest_problem::Model) -> Result<Vec<TestCase>, AppError> {
    serde_json::from_value(problem.test_cases.clone()).map_err(|e| {
        AppError::Internal(format!(
            "problem {} has unreadable test cases: {e}",
            problem.id
        ))
    })
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProblemRequest {
    #[schema(example = "A + B")]
    pub title: String,
    /// Problem statement in Markdown.
    #[serde(default)]
    pub statement: String,
    /// Points for passing every test case.
    #[schema(example = 100.0)]
    pub points: f64,
    /// Display order within the contest. Defaults to the end of the list.
    pub position: Option<i32>,
    pub test_cases: Vec<TestCase>,
}

pub fn validate_create_problem(payload: &CreateProblemRequest) -> Result<(), AppError> {
    validate_title(&payload.title)?;
    validate_problem_points(payload.points)?;
    validate_test_cases(&payload.test_cases)?;
    Ok(())
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProblemRequest {
    pub title: Option<String>,
    pub statement: Option<String>,
    pub points: Option<f64>,
    pub position: Option<i32>,
    pub test_cases: Option<Vec<TestCase>>,
}

pub fn validate_update_problem(payload: &UpdateProblemRequest) -> Result<(), AppError> {
    if let Some(ref title) = payload.title {
        validate_title(title)?;
    }
    if let Some(points) = payload.points {
        validate_problem_points(points)?;
    }
    if let Some(ref cases) = payload.test_cases {
        validate_test_cases(cases)?;
    }
    Ok(())
}

fn validate_problem_points(points: f64) -> Result<(), AppError> {
    if !points.is_finite() || points < 0.0 {
        return Err(AppError::Validation(
            "points must be a non-negative number".into(),
        ));
    }
    Ok(())
}

fn validate_test_cases(cases: &[TestCase]) -> Result<(), AppError> {
    if cases.is_empty() || cases.len() > MAX_TEST_CASES {
        return Err(AppError::Validation(format!(
            "A problem needs 1-{MAX_TEST_CASES} test cases"
        )));
    }
    Ok(())
}

/// Full problem view for admins, hidden cases included.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProblemResponse {
    pub id: i32,
    pub event_id: i32,
    pub title: String,
    pub statement: String,
    pub points: f64,
    pub position: i32,
    pub test_cases: Vec<TestCase>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<contest_problem::Model> for ProblemResponse {
    type Error = AppError;

    fn try_from(m: contest_problem::Model) -> Result<Self, AppError> {
        let test_cases = problem_test_cases(&m)?;
        Ok(Self {
            id: m.id,
            event_id: m.event_id,
            title: m.title,
            statement: m.statement,
            points: m.points,
            position: m.position,
            test_cases,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}

/// Problem as shown to students: only the visible sample cases.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentProblemResponse {
    pub id: i32,
    pub title: String,
    pub statement: String,
    pub points: f64,
    pub position: i32,
    pub samples: Vec<TestCase>,
    /// Number of cases judged on submission, hidden ones included.
    pub test_case_count: usize,
}

impl TryFrom<contest_problem::Model> for StudentProblemResponse {
    type Error = AppError;

    fn try_from(m: contest_problem::Model) -> Result<Self, AppError> {
        let cases = problem_test_cases(&m)?;
        let test_case_count = cases.len();
        Ok(Self {
            id: m.id,
            title: m.title,
            statement: m.statement,
            points: m.points,
            position: m.position,
            samples: cases.into_iter().filter(|c| !c.hidden).collect(),
            test_case_count,
        })
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunCodeRequest {
    /// Judge0 language id (e.g. 71 = Python 3, 54 = C++).
    #[schema(example = 71)]
    pub language_id: i32,
    #[schema(example = "print(sum(map(int, input().split())))")]
    pub source_code: String,
    #[serde(default)]
    pub stdin: String,
}

pub fn validate_source(source_code: &str) -> Result<(), AppError> {
    if source_code.trim().is_empty() {
        return Err(AppError::Validation("sourceCode must not be empty".into()));
    }
    if source_code.len() > MAX_SOURCE_BYTES {
        return Err(AppError::Validation(format!(
            "sourceCode must be at most {MAX_SOURCE_BYTES} bytes"
        )));
    }
    Ok(())
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitContestRequest {
    #[schema(example = 7)]
    pub event_id: i32,
    #[schema(example = 3)]
    pub problem_id: i32,
    #[schema(example = 71)]
    pub language_id: i32,
    pub source_code: String,
}

/// Outcome of one test case. Hidden cases carry no input or output.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaseVerdict {
    pub index: usize,
    pub passed: bool,
    pub hidden: bool,
    #[schema(example = "Accepted")]
    pub status: String,
    pub time: Option<String>,
    pub memory: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
}

impl CaseVerdict {
    pub fn new(index: usize, case: &TestCase, outcome: RunOutcome) -> Self {
        Self {
            index,
            passed: outcome.is_accepted(),
            hidden: case.hidden,
            status: outcome.status,
            time: outcome.time,
            memory: outcome.memory,
            stdout: if case.hidden { None } else { outcome.stdout },
        }
    }
}

/// Points earned for passing `passed` of `total` cases.
pub fn partial_points(points: f64, passed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    points * passed as f64 / total as f64
}

/// Judged submission. As with quizzes, `error` is set when the score could
/// not be recorded.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContestSubmissionResponse {
    pub message: String,
    pub problem_id: i32,
    pub passed: usize,
    pub total: usize,
    pub points: f64,
    pub verdicts: Vec<CaseVerdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
