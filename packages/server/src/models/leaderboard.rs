use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaderboardQuery {
    /// Number of entries (1-500). Default: 100.
    pub limit: Option<u64>,
}

impl LeaderboardQuery {
    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(100).clamp(1, 500)
    }
}

/// One row of the global leaderboard.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    #[schema(example = 1)]
    pub rank: usize,
    pub user_id: i32,
    pub name: String,
    pub department: Option<String>,
    /// Sum of best scores across all events.
    #[schema(example = 120.0)]
    pub total_score: f64,
    pub contests_participated: i64,
}

/// One row of an event leaderboard.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventLeaderboardEntry {
    pub rank: usize,
    pub user_id: i32,
    pub name: String,
    pub department: Option<String>,
    pub points: f64,
    pub submission_count: i32,
    /// When the best score was reached; earlier wins ties.
    pub submitted_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LeaderboardResponse {
    pub data: Vec<LeaderboardEntry>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventLeaderboardResponse {
    pub event_id: i32,
    pub data: Vec<EventLeaderboardEntry>,
}
