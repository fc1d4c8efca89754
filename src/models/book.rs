//! Book model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: Option<String>,
    pub total_copies: i16,
    pub available_copies: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Short book representation embedded in assignment rows
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: String,
}

/// Book query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Case-insensitive substring match on the title
    pub title: Option<String>,
    /// Case-insensitive substring match on the author
    pub author: Option<String>,
    /// Exact category match
    pub category: Option<String>,
    /// When true only books with copies on the shelf; when false only
    /// fully checked-out books
    pub available: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author must not be empty"))]
    pub author: String,
    #[validate(length(min = 10, message = "ISBN must be at least 10 characters"))]
    pub isbn: String,
    pub category: Option<String>,
    #[validate(range(min = 1, message = "A book needs at least one copy"))]
    pub total_copies: i16,
}

/// Update book request. `total_copies` changes shift `available_copies`
/// by the same delta so copies out on loan stay accounted for.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Author must not be empty"))]
    pub author: Option<String>,
    pub category: Option<String>,
    #[validate(range(min = 1, message = "A book needs at least one copy"))]
    pub total_copies: Option<i16>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn request(total_copies: i16) -> CreateBook {
        CreateBook {
            title: "The Rust Programming Language".to_string(),
            author: "Klabnik & Nichols".to_string(),
            isbn: "978-1593278281".to_string(),
            category: Some("Programming".to_string()),
            total_copies,
        }
    }

    #[test]
    fn create_book_requires_a_copy() {
        assert!(request(1).validate().is_ok());
        assert!(request(0).validate().is_err());
    }

    #[test]
    fn create_book_rejects_short_isbn() {
        let mut req = request(1);
        req.isbn = "123".to_string();
        assert!(req.validate().is_err());
    }
}
