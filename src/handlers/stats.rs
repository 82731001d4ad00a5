use axum::{Json, extract::State};

use crate::{AppState, auth::AuthUser, error::ApiResult, models::DashboardStats};

/// get_stats
///
/// [Authenticated Route] Dashboard counters.
#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "Counters", body = DashboardStats),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn get_stats(_caller: AuthUser, State(state): State<AppState>) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(state.repo.get_stats().await?))
}
