//! Dashboard statistics endpoint

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, AppState};

use super::AuthenticatedUser;

/// Library-wide counters for the staff dashboard
#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    pub total_books: i64,
    pub total_copies: i64,
    pub available_copies: i64,
    pub total_borrowers: i64,
    pub active_assignments: i64,
    pub overdue_assignments: i64,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub unpaid_fines: Decimal,
}

/// Library-wide counters (staff only)
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current counters", body = StatsResponse),
        (status = 403, description = "Not authorized")
    )
)]
pub async fn get_stats(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<StatsResponse>> {
    claims.require_ledger_read()?;

    let stats = state.services.stats.library_stats().await?;

    Ok(Json(StatsResponse {
        total_books: stats.total_books,
        total_copies: stats.total_copies,
        available_copies: stats.available_copies,
        total_borrowers: stats.total_borrowers,
        active_assignments: stats.active_assignments,
        overdue_assignments: stats.overdue_assignments,
        unpaid_fines: stats.unpaid_fines,
    }))
}
