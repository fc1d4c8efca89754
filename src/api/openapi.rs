//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{assignments, auth, books, borrowers, health, stats};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Athenaeum API",
        version = "1.0.0",
        description = "College Library Management REST API",
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        auth::change_password,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Borrowers
        borrowers::list_borrowers,
        borrowers::get_borrower,
        borrowers::create_borrower,
        borrowers::update_borrower,
        borrowers::delete_borrower,
        borrowers::get_borrower_assignments,
        // Assignments
        assignments::list_assignments,
        assignments::get_assignment,
        assignments::create_assignment,
        assignments::return_assignment,
        assignments::pay_fine,
        // Stats
        stats::get_stats,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::PrincipalInfo,
            auth::ChangePasswordRequest,
            // Books
            crate::models::book::Book,
            crate::models::book::BookSummary,
            crate::models::book::BookQuery,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Borrowers
            crate::models::borrower::Borrower,
            crate::models::borrower::BorrowerSummary,
            crate::models::borrower::BorrowerQuery,
            crate::models::borrower::CreateBorrower,
            crate::models::borrower::UpdateBorrower,
            crate::models::borrower::BorrowerKind,
            // Assignments
            crate::models::assignment::AssignmentDetails,
            crate::models::assignment::AssignmentQuery,
            crate::models::assignment::AssignmentStatus,
            assignments::CreateAssignment,
            // Staff
            crate::models::staff::Role,
            // Stats
            stats::StatsResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "books", description = "Book catalog management"),
        (name = "borrowers", description = "Borrower directory management"),
        (name = "assignments", description = "Borrow/return ledger"),
        (name = "stats", description = "Statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
