use common::{AttemptState, AttemptStatus};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::instrument;

use crate::entity::event_attempt;

/// Result of a status lookup.
#[derive(Debug, Clone)]
pub struct EventStatusReport {
    pub state: AttemptState,
    pub attempt: Option<event_attempt::Model>,
}

/// Look up the attempt for (user, event).
///
/// Never fails: a store error is logged and reported as [`AttemptState::Unknown`]
/// so a transient read failure does not lock a student out.
#[instrument(skip(db))]
pub async fn get_event_status<C: ConnectionTrait>(
    db: &C,
    event_id: i32,
    user_id: i32,
) -> EventStatusReport {
    match event_attempt::Entity::find_by_id((user_id, event_id))
        .one(db)
        .await
    {
        Ok(attempt) => EventStatusReport {
            state: AttemptState::from(attempt.as_ref().map(|a| a.status)),
            attempt,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Attempt lookup failed; reporting status as unknown");
            EventStatusReport {
                state: AttemptState::Unknown,
                attempt: None,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// An attempt row already existed; nothing was written.
    AlreadyStarted,
}

/// Create the in-progress attempt for (user, event).
///
/// The (user_id, event_id) primary key makes this idempotent: of two racing
/// starts, exactly one inserts and the other sees `AlreadyStarted`.
#[instrument(skip(db))]
pub async fn start_event<C: ConnectionTrait>(
    db: &C,
    event_id: i32,
    user_id: i32,
) -> Result<StartOutcome, DbErr> {
    let model = event_attempt::ActiveModel {
        user_id: Set(user_id),
        event_id: Set(event_id),
        status: Set(AttemptStatus::InProgress),
        version: Set(0),
        started_at: Set(chrono::Utc::now()),
        completed_at: Set(None),
        result_id: Set(None),
    };

    let result = event_attempt::Entity::insert(model)
        .on_conflict(
            OnConflict::columns([
                event_attempt::Column::UserId,
                event_attempt::Column::EventId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(0) | Err(DbErr::RecordNotInserted) => Ok(StartOutcome::AlreadyStarted),
        Ok(_) => Ok(StartOutcome::Started),
        Err(e) => Err(e),
    }
}
