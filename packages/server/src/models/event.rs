use chrono::{DateTime, Utc};
use common::{EventKind, EventStatus, PublicQuestion, Question};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::shared::{Pagination, validate_title};
use crate::entity::event;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[schema(example = "Weekly Quiz #3")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub kind: EventKind,
    /// Quiz questions in order. Must be empty for coding events.
    #[serde(default)]
    pub questions: Vec<Question>,
    /// Points per correct answer. May be fractional.
    #[serde(default)]
    #[schema(example = 10.0)]
    pub points_per_question: f64,
    /// Departments allowed to take part. Empty means everyone.
    #[serde(default)]
    #[schema(example = json!(["CSE", "ECE"]))]
    pub departments: Vec<String>,
}

pub fn validate_create_event(payload: &CreateEventRequest) -> Result<(), AppError> {
    validate_title(&payload.title)?;
    validate_points_per_question(payload.points_per_question)?;
    validate_departments(&payload.departments)?;
    if payload.kind == EventKind::Coding && !payload.questions.is_empty() {
        return Err(AppError::Validation(
            "Coding events take problems, not quiz questions".into(),
        ));
    }
    Ok(())
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub questions: Option<Vec<Question>>,
    pub points_per_question: Option<f64>,
    pub departments: Option<Vec<String>>,
}

pub fn validate_update_event(payload: &UpdateEventRequest) -> Result<(), AppError> {
    if let Some(ref title) = payload.title {
        validate_title(title)?;
    }
    if let Some(points) = payload.points_per_question {
        validate_points_per_question(points)?;
    }
    if let Some(ref departments) = payload.departments {
        validate_departments(departments)?;
    }
    Ok(())
}

fn validate_points_per_question(points: f64) -> Result<(), AppError> {
    if !points.is_finite() || points < 0.0 {
        return Err(AppError::Validation(
            "pointsPerQuestion must be a non-negative number".into(),
        ));
    }
    Ok(())
}

fn validate_departments(departments: &[String]) -> Result<(), AppError> {
    if departments.iter().any(|d| d.trim().is_empty()) {
        return Err(AppError::Validation(
            "Department names must not be empty".into(),
        ));
    }
    Ok(())
}

/// Trim department names and drop duplicates, keeping first-seen order.
pub fn normalize_departments(departments: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(departments.len());
    for d in departments {
        let d = d.trim().to_string();
        if !out.contains(&d) {
            out.push(d);
        }
    }
    out
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateEventStatusRequest {
    pub status: EventStatus,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct EventListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub status: Option<EventStatus>,
    pub kind: Option<EventKind>,
}

/// Department list stored on an event.
pub fn event_departments(event: &event::Model) -> Result<Vec<String>, serde_json::Error> {
    serde_json::from_value(event.departments.clone())
}

/// Whether a student from `department` may take part in `event`.
///
/// An unreadable department list admits nobody.
pub fn is_eligible(event: &event::Model, department: Option<&str>) -> bool {
    match event_departments(event) {
        Ok(departments) => {
            departments.is_empty()
                || department.is_some_and(|d| departments.iter().any(|allowed| allowed == d))
        }
        Err(e) => {
            tracing::warn!(event_id = event.id, error = %e, "Unreadable department list");
            false
        }
    }
}

/// Full event view for admins, correct answers included.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub kind: EventKind,
    pub questions: Value,
    pub points_per_question: f64,
    pub departments: Vec<String>,
    pub status: EventStatus,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<event::Model> for EventResponse {
    fn from(m: event::Model) -> Self {
        // Shown empty so an admin can still open the event and rewrite the list.
        let departments = event_departments(&m).unwrap_or_default();
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            kind: m.kind,
            questions: m.questions,
            points_per_question: m.points_per_question,
            departments,
            status: m.status,
            created_by: m.created_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EventListResponse {
    pub data: Vec<EventResponse>,
    pub pagination: Pagination,
}

/// Event as shown to students: correct answers stripped.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentEventResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub kind: EventKind,
    pub status: EventStatus,
    pub points_per_question: f64,
    pub question_count: usize,
    pub questions: Vec<PublicQuestion>,
}

impl StudentEventResponse {
    pub fn new(m: event::Model, questions: &[Question]) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            kind: m.kind,
            status: m.status,
            points_per_question: m.points_per_question,
            question_count: questions.len(),
            questions: questions.iter().map(PublicQuestion::from).collect(),
        }
    }
}
