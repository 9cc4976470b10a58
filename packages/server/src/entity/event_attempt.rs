use common::AttemptStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per (user, event). A missing row means the event was never started.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event_attempt")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub user_id: i32,
    #[sea_orm(primary_key)]
    pub event_id: i32,

    pub status: AttemptStatus,
    /// Bumped on every recorded submission; writers compare-and-swap on it.
    pub version: i32,

    pub started_at: DateTimeUtc,
    pub completed_at: Option<DateTimeUtc>,
    pub result_id: Option<i32>,
}

impl ActiveModelBehavior for ActiveModel {}
