//! Assignment ledger endpoints: borrow, return, fines

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::assignment::{AssignmentDetails, AssignmentQuery},
    AppState,
};

use super::{books::PaginatedResponse, AuthenticatedUser};

/// Borrow request
#[derive(Deserialize, ToSchema)]
pub struct CreateAssignment {
    pub book_id: i32,
    pub borrower_id: i32,
    /// Optional due date. Must be in the future; when omitted the
    /// configured loan period applies.
    pub due_at: Option<DateTime<Utc>>,
}

/// Search the ledger (staff only)
#[utoipa::path(
    get,
    path = "/assignments",
    tag = "assignments",
    params(AssignmentQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Ledger entries matching the filters", body = PaginatedResponse<AssignmentDetails>),
        (status = 403, description = "Not authorized")
    )
)]
pub async fn list_assignments(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<AssignmentQuery>,
) -> AppResult<Json<PaginatedResponse<AssignmentDetails>>> {
    claims.require_ledger_read()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let (assignments, total) = state.services.circulation.search_assignments(&query).await?;

    Ok(Json(PaginatedResponse::new(assignments, total, page, per_page)))
}

/// Get one ledger entry. Staff see every entry; a borrower only their own.
#[utoipa::path(
    get,
    path = "/assignments/{id}",
    tag = "assignments",
    params(("id" = i32, Path, description = "Assignment id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The ledger entry", body = AssignmentDetails),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Assignment not found")
    )
)]
pub async fn get_assignment(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<AssignmentDetails>> {
    let details = state.services.circulation.get_assignment(id).await?;
    claims.require_self_or_staff(details.borrower.id)?;
    Ok(Json(details))
}

/// Record a borrow (staff only)
#[utoipa::path(
    post,
    path = "/assignments",
    tag = "assignments",
    request_body = CreateAssignment,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Borrow recorded", body = AssignmentDetails),
        (status = 400, description = "Book not available or due date invalid"),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Book or borrower not found"),
        (status = 409, description = "Borrower already holds this book")
    )
)]
pub async fn create_assignment(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateAssignment>,
) -> AppResult<(StatusCode, Json<AssignmentDetails>)> {
    claims.require_circulation()?;

    let details = state
        .services
        .circulation
        .record_borrow(request.book_id, request.borrower_id, request.due_at)
        .await?;

    Ok((StatusCode::CREATED, Json(details)))
}

/// Record a return and assess any fine (staff only)
#[utoipa::path(
    post,
    path = "/assignments/{id}/return",
    tag = "assignments",
    params(("id" = i32, Path, description = "Assignment id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Return recorded", body = AssignmentDetails),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Assignment not found"),
        (status = 409, description = "Book already returned")
    )
)]
pub async fn return_assignment(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<AssignmentDetails>> {
    claims.require_circulation()?;

    let details = state.services.circulation.return_book(id).await?;
    Ok(Json(details))
}

/// Mark an assessed fine as paid (staff only)
#[utoipa::path(
    post,
    path = "/assignments/{id}/pay-fine",
    tag = "assignments",
    params(("id" = i32, Path, description = "Assignment id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Fine settled", body = AssignmentDetails),
        (status = 400, description = "No fine to pay"),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Assignment not found"),
        (status = 409, description = "Fine already paid")
    )
)]
pub async fn pay_fine(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<AssignmentDetails>> {
    claims.require_circulation()?;

    let details = state.services.circulation.pay_fine(id).await?;
    Ok(Json(details))
}
