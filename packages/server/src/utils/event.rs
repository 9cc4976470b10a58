use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::entity::{contest_problem, event, user};
use crate::error::AppError;
use crate::models::event::is_eligible;

/// Look up an event by ID, returning 404 if not found.
pub async fn find_event<C: sea_orm::ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<event::Model, AppError> {
    event::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}

/// Look up a problem of an event, returning 404 if it belongs elsewhere.
pub async fn find_problem<C: sea_orm::ConnectionTrait>(
    db: &C,
    event_id: i32,
    problem_id: i32,
) -> Result<contest_problem::Model, AppError> {
    contest_problem::Entity::find_by_id(problem_id)
        .filter(contest_problem::Column::EventId.eq(event_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Problem not found".into()))
}

/// Load an event a student is about to take part in.
///
/// Closed events and events outside the student's department read as 404
/// so their existence is not leaked.
pub async fn find_open_event<C: sea_orm::ConnectionTrait>(
    db: &C,
    student: &user::Model,
    id: i32,
) -> Result<event::Model, AppError> {
    let event = find_event(db, id).await?;
    if !event.status.is_open() || !is_eligible(&event, student.department.as_deref()) {
        return Err(AppError::NotFound("Event not found".into()));
    }
    Ok(event)
}
