#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Persisted status of a student's attempt at an event.
///
/// "Not started" is never stored: it is the absence of an attempt row.
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    /// The student has started the event and not yet submitted.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "in_progress"))]
    InProgress,
    /// At least one submission has been recorded.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "completed"))]
    Completed,
}

impl AttemptStatus {
    pub const ALL: &'static [AttemptStatus] = &[Self::InProgress, Self::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    /// Returns true once a score has been recorded for the attempt.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an invalid attempt status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAttemptStatusError {
    invalid: String,
}

impl fmt::Display for ParseAttemptStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid attempt status '{}'. Valid values: {}",
            self.invalid,
            AttemptStatus::ALL
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseAttemptStatusError {}

impl FromStr for AttemptStatus {
    type Err = ParseAttemptStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseAttemptStatusError {
                invalid: s.to_string(),
            }),
        }
    }
}

/// What a status lookup reports back to a student.
///
/// `Unknown` is distinct from `NotStarted`: it means the attempt store could
/// not be read, so the caller cannot tell whether an attempt exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    NotStarted,
    InProgress,
    Completed,
    Unknown,
}

impl From<Option<AttemptStatus>> for AttemptState {
    fn from(status: Option<AttemptStatus>) -> Self {
        match status {
            None => Self::NotStarted,
            Some(AttemptStatus::InProgress) => Self::InProgress,
            Some(AttemptStatus::Completed) => Self::Completed,
        }
    }
}
