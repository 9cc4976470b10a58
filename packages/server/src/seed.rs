use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::info;

use crate::config::SeedConfig;
use crate::entity::user::{self, UserStatus};
use crate::models::shared::normalize_email;
use crate::utils::hash;

/// Create the configured super-admin unless the email is already registered.
///
/// Does nothing when the seed section is incomplete.
pub async fn seed_super_admin(db: &DatabaseConnection, seed: &SeedConfig) -> Result<(), DbErr> {
    let (Some(email), Some(password)) = (&seed.super_email, &seed.super_password) else {
        return Ok(());
    };

    let password_hash = hash::hash_password(password)
        .map_err(|e| DbErr::Custom(format!("Password hash error: {}", e)))?;

    let now = chrono::Utc::now();
    let model = user::ActiveModel {
        name: Set(seed
            .super_name
            .clone()
            .unwrap_or_else(|| "Super Admin".to_string())),
        email: Set(normalize_email(email)),
        password: Set(password_hash),
        roll_number: Set(None),
        department: Set(None),
        is_admin: Set(true),
        is_student: Set(false),
        is_super: Set(true),
        status: Set(UserStatus::Active),
        created_by: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let result = user::Entity::insert(model)
        .on_conflict(
            OnConflict::column(user::Column::Email)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(0) | Err(DbErr::RecordNotInserted) => {}
        Ok(_) => info!("Seeded super-admin {}", normalize_email(email)),
        Err(e) => return Err(e),
    }

    Ok(())
}
