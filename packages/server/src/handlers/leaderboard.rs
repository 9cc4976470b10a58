use axum::{
    Json,
    extract::{Query, State},
};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::leaderboard::*;
use crate::services::ledger::ScoreLedger;
use crate::state::AppState;
use crate::utils::account::users_by_id;

#[utoipa::path(
    get,
    path = "/",
    tag = "Leaderboard",
    operation_id = "getLeaderboard",
    summary = "Global leaderboard",
    description = "Students ranked by the sum of their best score in every event.",
    params(LeaderboardQuery),
    responses(
        (status = 200, description = "Standings", body = LeaderboardResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn get_leaderboard(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    let totals = ScoreLedger::new(&state.db)
        .overall_standings(query.limit() as usize)
        .await?;
    let users = users_by_id(&state.db, totals.iter().map(|t| t.user_id)).await?;

    let data = totals
        .into_iter()
        .filter_map(|t| users.get(&t.user_id).map(|u| (t, u)))
        .enumerate()
        .map(|(i, (t, user))| LeaderboardEntry {
            rank: i + 1,
            user_id: t.user_id,
            name: user.name.clone(),
            department: user.department.clone(),
            total_score: t.total,
            contests_participated: t.events,
        })
        .collect();

    Ok(Json(LeaderboardResponse { data }))
}
