#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of an event: `queue` → `active`/`published` → `ended`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Drafted, not visible to students.
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "queue"))]
    Queue,
    /// Running; students may start and submit.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "active"))]
    Active,
    /// Visible and open, typically with results shown.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "published"))]
    Published,
    /// Closed for good.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ended"))]
    Ended,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queue => "queue",
            Self::Active => "active",
            Self::Published => "published",
            Self::Ended => "ended",
        }
    }

    /// Students can see the event and start or submit attempts.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Active | Self::Published)
    }

    /// Whether an admin may move an event from `self` to `next`.
    pub fn can_transition_to(&self, next: EventStatus) -> bool {
        matches!(
            (self, next),
            (Self::Queue, Self::Active | Self::Published)
                | (Self::Active, Self::Published | Self::Ended)
                | (Self::Published, Self::Active | Self::Ended)
        )
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of contest an event is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Multiple-choice questions graded against stored answers.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "quiz"))]
    Quiz,
    /// Programming problems judged by running test cases.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "coding"))]
    Coding,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quiz => f.write_str("quiz"),
            Self::Coding => f.write_str("coding"),
        }
    }
}
