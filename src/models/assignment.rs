//! Assignment (borrow record) model and related types
//!
//! An assignment links one book copy to one borrower from checkout to
//! return. The ledger of assignments is append-only; status is derived
//! from the timestamps at read time, never persisted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::book::BookSummary;
use super::borrower::BorrowerSummary;

/// Lifecycle state of an assignment. `Overdue` is purely time-derived;
/// `Returned` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Borrowed,
    Overdue,
    Returned,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Borrowed => "borrowed",
            AssignmentStatus::Overdue => "overdue",
            AssignmentStatus::Returned => "returned",
        }
    }

    /// Derive the status from the stored timestamps.
    pub fn derive(due_at: DateTime<Utc>, returned_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        if returned_at.is_some() {
            AssignmentStatus::Returned
        } else if due_at < now {
            AssignmentStatus::Overdue
        } else {
            AssignmentStatus::Borrowed
        }
    }
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AssignmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "borrowed" => Ok(AssignmentStatus::Borrowed),
            "overdue" => Ok(AssignmentStatus::Overdue),
            "returned" => Ok(AssignmentStatus::Returned),
            _ => Err(format!("Invalid assignment status: {}", s)),
        }
    }
}

/// Assignment model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Assignment {
    pub id: i32,
    pub book_id: i32,
    pub borrower_id: i32,
    pub borrowed_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    #[serde(with = "rust_decimal::serde::float")]
    pub fine_amount: Decimal,
    pub fine_paid: bool,
}

/// Internal row structure for joined assignment queries
#[derive(Debug, Clone, FromRow)]
pub struct AssignmentDetailsRow {
    pub id: i32,
    pub book_id: i32,
    pub borrower_id: i32,
    pub borrowed_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub fine_amount: Decimal,
    pub fine_paid: bool,
    pub book_title: String,
    pub book_author: String,
    pub book_isbn: String,
    pub borrower_name: String,
    pub borrower_external_id: String,
    pub borrower_kind: super::borrower::BorrowerKind,
}

impl AssignmentDetailsRow {
    pub fn into_details(self, now: DateTime<Utc>) -> AssignmentDetails {
        AssignmentDetails {
            id: self.id,
            book: BookSummary {
                id: self.book_id,
                title: self.book_title,
                author: self.book_author,
                isbn: self.book_isbn,
            },
            borrower: BorrowerSummary {
                id: self.borrower_id,
                name: self.borrower_name,
                external_id: self.borrower_external_id,
                kind: self.borrower_kind,
            },
            borrowed_at: self.borrowed_at,
            due_at: self.due_at,
            returned_at: self.returned_at,
            status: AssignmentStatus::derive(self.due_at, self.returned_at, now),
            fine_amount: self.fine_amount,
            fine_paid: self.fine_paid,
        }
    }
}

/// Assignment with joined book and borrower summaries for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignmentDetails {
    pub id: i32,
    pub book: BookSummary,
    pub borrower: BorrowerSummary,
    pub borrowed_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: AssignmentStatus,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub fine_amount: Decimal,
    pub fine_paid: bool,
}

/// Assignment query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AssignmentQuery {
    pub status: Option<AssignmentStatus>,
    pub borrower_id: Option<i32>,
    pub book_id: Option<i32>,
    /// Lower bound (inclusive) on the borrow date
    pub from: Option<DateTime<Utc>>,
    /// Upper bound (inclusive) on the borrow date
    pub to: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
