use std::time::Duration;

use sea_orm::sea_query::{Index, IndexCreateStatement, PostgresQueryBuilder, SqliteQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::entity::{event_attempt, event_result};

/// Connect, sync the entity schema and make sure the composite indexes exist.
pub async fn init_db(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(config.url.to_owned());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("quiz_server::entity::*")
        .sync(&db)
        .await?;
    ensure_indexes(&db).await?;

    Ok(db)
}

/// Indexes schema sync cannot express: it creates tables and single-column
/// constraints only.
fn composite_indexes() -> Vec<IndexCreateStatement> {
    vec![
        // One result row per (user, event). The ledger relies on it.
        Index::create()
            .if_not_exists()
            .unique()
            .name("idx_event_result_user_event")
            .table(event_result::Entity)
            .col(event_result::Column::UserId)
            .col(event_result::Column::EventId)
            .to_owned(),
        // Event leaderboard: WHERE event_id = ? ORDER BY points DESC
        Index::create()
            .if_not_exists()
            .name("idx_event_result_event_points")
            .table(event_result::Entity)
            .col(event_result::Column::EventId)
            .col(event_result::Column::Points)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_event_attempt_event")
            .table(event_attempt::Entity)
            .col(event_attempt::Column::EventId)
            .to_owned(),
    ]
}

async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    for index in composite_indexes() {
        let stmt = match backend {
            DbBackend::Sqlite => index.to_string(SqliteQueryBuilder),
            _ => index.to_string(PostgresQueryBuilder),
        };
        db.execute_unprepared(&stmt).await?;
    }
    info!("Database indexes in place");
    Ok(())
}
