use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Authoritative score for one (user, event) pair.
///
/// Uniqueness of (user_id, event_id) is enforced by an index created in `database::init_db`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event_result")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,
    pub event_id: i32,

    /// Sum of the best score per key in `breakdown`.
    pub points: f64,
    /// Score of the most recent submission, best or not.
    pub last_points: f64,
    /// Best score per key: `{"quiz": 20.0}` or `{"problem:3": 50.0, ...}`.
    #[sea_orm(column_type = "JsonBinary")]
    pub breakdown: Json,
    pub submission_count: i32,

    /// When the current best total was reached.
    pub submitted_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
