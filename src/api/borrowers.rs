//! Borrower directory endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        assignment::{AssignmentDetails, AssignmentQuery},
        borrower::{Borrower, BorrowerQuery, CreateBorrower, UpdateBorrower},
    },
    AppState,
};

use super::{books::PaginatedResponse, AuthenticatedUser};

/// Search the borrower directory (staff only)
#[utoipa::path(
    get,
    path = "/borrowers",
    tag = "borrowers",
    params(BorrowerQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Borrowers matching the filters", body = PaginatedResponse<Borrower>),
        (status = 403, description = "Not authorized")
    )
)]
pub async fn list_borrowers(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BorrowerQuery>,
) -> AppResult<Json<PaginatedResponse<Borrower>>> {
    claims.require_borrower_write()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let (borrowers, total) = state.services.borrowers.search_borrowers(&query).await?;

    Ok(Json(PaginatedResponse::new(borrowers, total, page, per_page)))
}

/// Get one borrower. Staff see everyone; a borrower only their own record.
#[utoipa::path(
    get,
    path = "/borrowers/{id}",
    tag = "borrowers",
    params(("id" = i32, Path, description = "Borrower id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The borrower", body = Borrower),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Borrower not found")
    )
)]
pub async fn get_borrower(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Borrower>> {
    claims.require_self_or_staff(id)?;

    let borrower = state.services.borrowers.get_borrower(id).await?;
    Ok(Json(borrower))
}

/// Register a borrower (staff only)
#[utoipa::path(
    post,
    path = "/borrowers",
    tag = "borrowers",
    request_body = CreateBorrower,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Borrower registered", body = Borrower),
        (status = 403, description = "Not authorized"),
        (status = 409, description = "External id or email already registered")
    )
)]
pub async fn create_borrower(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBorrower>,
) -> AppResult<(StatusCode, Json<Borrower>)> {
    claims.require_borrower_write()?;

    let borrower = state.services.borrowers.create_borrower(request).await?;
    Ok((StatusCode::CREATED, Json(borrower)))
}

/// Update a borrower (staff only)
#[utoipa::path(
    put,
    path = "/borrowers/{id}",
    tag = "borrowers",
    params(("id" = i32, Path, description = "Borrower id")),
    request_body = UpdateBorrower,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Borrower updated", body = Borrower),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Borrower not found")
    )
)]
pub async fn update_borrower(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateBorrower>,
) -> AppResult<Json<Borrower>> {
    claims.require_borrower_write()?;

    let borrower = state.services.borrowers.update_borrower(id, request).await?;
    Ok(Json(borrower))
}

/// Remove a borrower (staff only). Fails while they hold an active loan.
#[utoipa::path(
    delete,
    path = "/borrowers/{id}",
    tag = "borrowers",
    params(("id" = i32, Path, description = "Borrower id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Borrower deleted"),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Borrower not found"),
        (status = 409, description = "Borrower has active loans")
    )
)]
pub async fn delete_borrower(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_borrower_write()?;

    state.services.borrowers.delete_borrower(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Ledger entries for one borrower, newest first. Staff see anyone's
/// ledger; a borrower only their own.
#[utoipa::path(
    get,
    path = "/borrowers/{id}/assignments",
    tag = "borrowers",
    params(("id" = i32, Path, description = "Borrower id"), AssignmentQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The borrower's ledger", body = PaginatedResponse<AssignmentDetails>),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Borrower not found")
    )
)]
pub async fn get_borrower_assignments(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Query(query): Query<AssignmentQuery>,
) -> AppResult<Json<PaginatedResponse<AssignmentDetails>>> {
    claims.require_self_or_staff(id)?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let (assignments, total) = state
        .services
        .circulation
        .borrower_assignments(id, &query)
        .await?;

    Ok(Json(PaginatedResponse::new(assignments, total, page, per_page)))
}
