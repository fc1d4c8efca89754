//! Book catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
    AppState,
};

use super::AuthenticatedUser;

/// Paginated response wrapper shared by the list endpoints
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T: for<'a> ToSchema<'a>> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T: for<'a> ToSchema<'a>> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: i64, page: i64, per_page: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };
        Self {
            items,
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

/// Search the catalog
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(BookQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Books matching the filters", body = PaginatedResponse<Book>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<PaginatedResponse<Book>>> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let (books, total) = state.services.catalog.search_books(&query).await?;

    Ok(Json(PaginatedResponse::new(books, total, page, per_page)))
}

/// Get one book by id
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The book", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Add a book to the catalog (staff only)
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = CreateBook,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 403, description = "Not authorized"),
        (status = 409, description = "ISBN already catalogued")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    claims.require_catalog_write()?;

    let book = state.services.catalog.create_book(request).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Update a catalogued book (staff only)
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book id")),
    request_body = UpdateBook,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateBook>,
) -> AppResult<Json<Book>> {
    claims.require_catalog_write()?;

    let book = state.services.catalog.update_book(id, request).await?;
    Ok(Json(book))
}

/// Remove a book from the catalog (staff only). Fails while any copy is
/// still out on loan.
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book has copies on loan")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_catalog_write()?;

    state.services.catalog.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
