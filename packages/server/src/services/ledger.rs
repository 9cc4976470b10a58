//! The single place scores are written.
//!
//! Every submission goes through [`ScoreLedger::record`], which completes the
//! student's attempt and folds the score into the (user, event) result in one
//! transaction. User totals, participation counts and leaderboards are derived
//! from `event_result` on read; nothing else stores a running total.

use chrono::Utc;
use common::{AttemptStatus, ScoreBreakdown};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::Func;
use sea_orm::*;
use thiserror::Error;
use tracing::instrument;

use crate::entity::{event_attempt, event_result};

/// How many times `record` re-reads the attempt after losing a version race.
const MAX_RECORD_ROUNDS: usize = 3;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("user {user_id} has not started event {event_id}")]
    NotStarted { user_id: i32, event_id: i32 },
    #[error("attempt of user {user_id} on event {event_id} kept changing during the write")]
    Contended { user_id: i32, event_id: i32 },
    #[error("stored breakdown of result {result_id} is unreadable")]
    CorruptBreakdown {
        result_id: i32,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Totals for one user, derived from their results.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSummary {
    pub total_score: f64,
    pub contests_participated: u64,
    pub submission_count: i64,
    /// Events with a recorded score, oldest best first.
    pub event_ids: Vec<i32>,
}

/// Sum of best scores for one user across all events.
#[derive(Debug, Clone, FromQueryResult)]
pub struct UserTotal {
    pub user_id: i32,
    pub total: f64,
    pub events: i64,
}

pub struct ScoreLedger<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ScoreLedger<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Record `points` for (user, event) under `key`, keeping the best score per key.
    ///
    /// Fails with [`LedgerError::NotStarted`] and writes nothing when the user
    /// has no attempt for the event. Resubmitting after completion is allowed;
    /// a lower score never replaces a higher one.
    #[instrument(skip(self))]
    pub async fn record(
        &self,
        user_id: i32,
        event_id: i32,
        key: &str,
        points: f64,
    ) -> Result<event_result::Model, LedgerError> {
        for round in 0..MAX_RECORD_ROUNDS {
            if let Some(result) = self.try_record(user_id, event_id, key, points).await? {
                return Ok(result);
            }
            tracing::warn!(round, "Attempt version moved during record, retrying");
        }
        Err(LedgerError::Contended { user_id, event_id })
    }

    /// One compare-and-swap round. `Ok(None)` means another writer won the race.
    async fn try_record(
        &self,
        user_id: i32,
        event_id: i32,
        key: &str,
        points: f64,
    ) -> Result<Option<event_result::Model>, LedgerError> {
        let txn = self.db.begin().await?;

        let attempt = event_attempt::Entity::find_by_id((user_id, event_id))
            .one(&txn)
            .await?
            .ok_or(LedgerError::NotStarted { user_id, event_id })?;

        let now = Utc::now();

        let claimed = event_attempt::Entity::update_many()
            .col_expr(
                event_attempt::Column::Status,
                Expr::value(AttemptStatus::Completed.as_str()),
            )
            .col_expr(
                event_attempt::Column::Version,
                Expr::value(attempt.version + 1),
            )
            .col_expr(
                event_attempt::Column::CompletedAt,
                Expr::value(attempt.completed_at.unwrap_or(now)),
            )
            .filter(event_attempt::Column::UserId.eq(user_id))
            .filter(event_attempt::Column::EventId.eq(event_id))
            .filter(event_attempt::Column::Version.eq(attempt.version))
            .exec(&txn)
            .await?;

        if claimed.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(None);
        }

        let existing = event_result::Entity::find()
            .filter(event_result::Column::UserId.eq(user_id))
            .filter(event_result::Column::EventId.eq(event_id))
            .one(&txn)
            .await?;

        let result = match existing {
            Some(existing) => {
                // Rebuilding from an unreadable breakdown could lower the stored best.
                let mut breakdown =
                    ScoreBreakdown::from_json(&existing.breakdown).map_err(|source| {
                        tracing::warn!(result_id = existing.id, error = %source, "Unreadable breakdown");
                        LedgerError::CorruptBreakdown {
                            result_id: existing.id,
                            source,
                        }
                    })?;
                let improved = breakdown.offer(key, points);
                let submission_count = existing.submission_count + 1;

                let mut active: event_result::ActiveModel = existing.into();
                if improved {
                    active.points = Set(breakdown.total());
                    active.breakdown = Set(breakdown.to_json());
                    active.submitted_at = Set(now);
                }
                active.last_points = Set(points);
                active.submission_count = Set(submission_count);
                active.updated_at = Set(now);
                active.update(&txn).await?
            }
            None => {
                let mut breakdown = ScoreBreakdown::default();
                breakdown.offer(key, points);

                event_result::ActiveModel {
                    user_id: Set(user_id),
                    event_id: Set(event_id),
                    points: Set(breakdown.total()),
                    last_points: Set(points),
                    breakdown: Set(breakdown.to_json()),
                    submission_count: Set(1),
                    submitted_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&txn)
                .await?
            }
        };

        if attempt.result_id != Some(result.id) {
            event_attempt::Entity::update_many()
                .col_expr(event_attempt::Column::ResultId, Expr::value(result.id))
                .filter(event_attempt::Column::UserId.eq(user_id))
                .filter(event_attempt::Column::EventId.eq(event_id))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;

        tracing::info!(
            points,
            best = result.points,
            submissions = result.submission_count,
            "Recorded score"
        );
        Ok(Some(result))
    }

    /// The stored result for (user, event), if any submission was recorded.
    pub async fn result_for(
        &self,
        user_id: i32,
        event_id: i32,
    ) -> Result<Option<event_result::Model>, DbErr> {
        event_result::Entity::find()
            .filter(event_result::Column::UserId.eq(user_id))
            .filter(event_result::Column::EventId.eq(event_id))
            .one(self.db)
            .await
    }

    pub async fn user_summary(&self, user_id: i32) -> Result<UserSummary, DbErr> {
        let results = event_result::Entity::find()
            .filter(event_result::Column::UserId.eq(user_id))
            .order_by_asc(event_result::Column::SubmittedAt)
            .all(self.db)
            .await?;

        Ok(UserSummary {
            total_score: results.iter().map(|r| r.points).sum(),
            contests_participated: results.len() as u64,
            submission_count: results.iter().map(|r| i64::from(r.submission_count)).sum(),
            event_ids: results.iter().map(|r| r.event_id).collect(),
        })
    }

    /// Results for one event, best first; ties go to whoever got there earlier.
    pub async fn event_standings(
        &self,
        event_id: i32,
        limit: u64,
    ) -> Result<Vec<event_result::Model>, DbErr> {
        event_result::Entity::find()
            .filter(event_result::Column::EventId.eq(event_id))
            .order_by_desc(event_result::Column::Points)
            .order_by_asc(event_result::Column::SubmittedAt)
            .limit(limit)
            .all(self.db)
            .await
    }

    /// Per-user totals across all events, highest first.
    pub async fn overall_standings(&self, limit: usize) -> Result<Vec<UserTotal>, DbErr> {
        let mut totals = event_result::Entity::find()
            .select_only()
            .column(event_result::Column::UserId)
            .column_as(
                Expr::expr(Func::sum(Expr::col(event_result::Column::Points))),
                "total",
            )
            .column_as(
                Expr::expr(Func::count(Expr::col(event_result::Column::Id))),
                "events",
            )
            .group_by(event_result::Column::UserId)
            .into_model::<UserTotal>()
            .all(self.db)
            .await?;

        totals.sort_by(|a, b| {
            b.total
                .total_cmp(&a.total)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        totals.truncate(limit);
        Ok(totals)
    }
}
