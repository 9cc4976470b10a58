use common::{EventKind, EventStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    pub description: String,
    pub kind: EventKind,

    /// Ordered quiz questions as a JSON array of `{question, options, correctAnswer}`.
    /// Empty for coding contests, whose problems live in `contest_problem`.
    #[sea_orm(column_type = "JsonBinary")]
    pub questions: Json,
    pub points_per_question: f64,

    /// JSON array of department names. Empty means open to every department.
    #[sea_orm(column_type = "JsonBinary")]
    pub departments: Json,

    pub status: EventStatus,
    pub created_by: i32,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
