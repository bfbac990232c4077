//! Dashboard KPIs

use axum::{Json, Router, extract::State, routing::get};
use shared::models::DashboardStats;

use crate::core::ServerState;
use crate::utils::AppResult;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/dashboard", get(stats))
}

/// GET /api/dashboard - camelCase keys, `completedToday` in the business time zone
async fn stats(State(state): State<ServerState>) -> AppResult<Json<DashboardStats>> {
    Ok(Json(state.dashboard.stats().await?))
}
