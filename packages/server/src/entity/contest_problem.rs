use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contest_problem")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub event_id: i32,
    pub title: String,
    pub statement: String, // in Markdown
    pub points: f64,
    pub position: i32,

    /// JSON array of `{input, expectedOutput, hidden}`.
    #[sea_orm(column_type = "JsonBinary")]
    pub test_cases: Json,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
