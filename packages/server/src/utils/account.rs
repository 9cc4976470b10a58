use std::collections::HashMap;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, SqlErr};

use crate::entity::user::{self, UserStatus};
use crate::error::AppError;

/// Look up a user by ID, returning 404 if not found.
pub async fn find_user<C: sea_orm::ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Load the caller's own account. A deleted or banned account is rejected
/// even while its token is still valid.
pub async fn find_active_user<C: sea_orm::ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<user::Model, AppError> {
    let user = user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::TokenInvalid)?;
    if user.status == UserStatus::Banned {
        return Err(AppError::AccountBanned);
    }
    Ok(user)
}

pub async fn email_taken<C: sea_orm::ConnectionTrait>(
    db: &C,
    email: &str,
) -> Result<bool, AppError> {
    Ok(user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?
        .is_some())
}

/// Map a unique-constraint violation on insert to `EMAIL_TAKEN`.
pub fn map_email_conflict(err: sea_orm::DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::EmailTaken,
        _ => AppError::from(err),
    }
}

/// Users keyed by ID, for decorating leaderboard rows.
pub async fn users_by_id<C: sea_orm::ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = i32>,
) -> Result<HashMap<i32, user::Model>, AppError> {
    let ids: Vec<i32> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let users = user::Entity::find()
        .filter(user::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(users.into_iter().map(|u| (u.id, u)).collect())
}
