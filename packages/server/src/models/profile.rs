use serde::{Deserialize, Serialize};

use super::shared::{validate_name, validate_password};
use super::user::UserResponse;
use crate::error::AppError;
use crate::services::ledger::UserSummary;

/// Scores derived from the student's results.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    #[schema(example = 120.0)]
    pub total_score: f64,
    pub contests_participated: u64,
    pub submission_count: i64,
    /// Events the student has a recorded score for.
    pub quiz_ids: Vec<i32>,
}

impl From<UserSummary> for SummaryResponse {
    fn from(s: UserSummary) -> Self {
        Self {
            total_score: s.total_score,
            contests_participated: s.contests_participated,
            submission_count: s.submission_count,
            quiz_ids: s.event_ids,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub summary: SummaryResponse,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    /// Required when `newPassword` is set.
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

pub fn validate_update_profile(payload: &UpdateProfileRequest) -> Result<(), AppError> {
    if let Some(ref name) = payload.name {
        validate_name(name)?;
    }
    if let Some(ref password) = payload.new_password {
        validate_password(password)?;
        if payload.current_password.as_deref().is_none_or(str::is_empty) {
            return Err(AppError::Validation(
                "currentPassword is required to change the password".into(),
            ));
        }
    }
    Ok(())
}
