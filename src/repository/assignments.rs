//! Assignments (borrow ledger) repository
//!
//! Every lifecycle mutation touches two tables: the ledger row and the
//! book's `available_copies` counter. Each mutation runs in a single
//! transaction with a conditional update so concurrent requests for the
//! last copy cannot double-book it and a double return cannot increment
//! the counter twice.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres};

use crate::{
    error::{is_unique_violation, AppError, AppResult},
    models::assignment::{Assignment, AssignmentDetails, AssignmentDetailsRow, AssignmentQuery},
    services::fines::FinePolicy,
};

#[derive(Clone)]
pub struct AssignmentsRepository {
    pool: Pool<Postgres>,
}

const DETAILS_SELECT: &str = r#"
    SELECT a.id, a.book_id, a.borrower_id, a.borrowed_at, a.due_at, a.returned_at,
           a.fine_amount, a.fine_paid,
           b.title AS book_title, b.author AS book_author, b.isbn AS book_isbn,
           w.name AS borrower_name, w.external_id AS borrower_external_id,
           w.kind AS borrower_kind
    FROM assignments a
    JOIN books b ON a.book_id = b.id
    JOIN borrowers w ON a.borrower_id = w.id
"#;

impl AssignmentsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get an assignment row by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Assignment> {
        sqlx::query_as::<_, Assignment>("SELECT * FROM assignments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Assignment with id {} not found", id)))
    }

    /// Get an assignment with joined book/borrower summaries
    pub async fn get_details(&self, id: i32) -> AppResult<AssignmentDetails> {
        let row = sqlx::query_as::<_, AssignmentDetailsRow>(
            &format!("{} WHERE a.id = $1", DETAILS_SELECT),
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Assignment with id {} not found", id)))?;

        Ok(row.into_details(Utc::now()))
    }

    /// Record a borrow: decrement the book's available counter and insert
    /// the ledger row, atomically.
    ///
    /// The decrement is a compare-and-swap (`WHERE available_copies > 0`),
    /// so with k copies and N concurrent requests exactly min(N, k)
    /// succeed. The partial unique index on active (book, borrower) pairs
    /// backs up the double-borrow pre-check under races.
    pub async fn create(
        &self,
        book_id: i32,
        borrower_id: i32,
        due_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<Assignment> {
        let mut tx = self.pool.begin().await?;

        let borrower_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM borrowers WHERE id = $1)")
                .bind(borrower_id)
                .fetch_one(&mut *tx)
                .await?;
        if !borrower_exists {
            return Err(AppError::NotFound(format!(
                "Borrower with id {} not found",
                borrower_id
            )));
        }

        let already_borrowed: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM assignments WHERE book_id = $1 AND borrower_id = $2 AND returned_at IS NULL)",
        )
        .bind(book_id)
        .bind(borrower_id)
        .fetch_one(&mut *tx)
        .await?;
        if already_borrowed {
            return Err(AppError::Conflict(
                "Borrower already has this book on loan".to_string(),
            ));
        }

        let decremented = sqlx::query(
            "UPDATE books SET available_copies = available_copies - 1, updated_at = NOW() \
             WHERE id = $1 AND available_copies > 0",
        )
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

        if decremented.rows_affected() == 0 {
            let book_exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
                    .bind(book_id)
                    .fetch_one(&mut *tx)
                    .await?;
            return Err(if book_exists {
                AppError::Validation("Book is not available for borrowing".to_string())
            } else {
                AppError::NotFound(format!("Book with id {} not found", book_id))
            });
        }

        let assignment = sqlx::query_as::<_, Assignment>(
            r#"
            INSERT INTO assignments (book_id, borrower_id, borrowed_at, due_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(borrower_id)
        .bind(now)
        .bind(due_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "assignments_active_pair") {
                AppError::Conflict("Borrower already has this book on loan".to_string())
            } else {
                e.into()
            }
        })?;

        tx.commit().await?;
        Ok(assignment)
    }

    /// Return a borrowed book: stamp `returned_at`, assess the fine and
    /// put the copy back on the shelf, atomically.
    ///
    /// The `returned_at IS NULL` guard makes the transition idempotent-
    /// safe: a second return finds no row to update and never increments
    /// the counter again.
    pub async fn return_assignment(
        &self,
        id: i32,
        now: DateTime<Utc>,
        policy: &FinePolicy,
    ) -> AppResult<Assignment> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Assignment>(
            "UPDATE assignments SET returned_at = $2 WHERE id = $1 AND returned_at IS NULL RETURNING *",
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let mut assignment = match updated {
            Some(a) => a,
            None => {
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM assignments WHERE id = $1)")
                        .bind(id)
                        .fetch_one(&mut *tx)
                        .await?;
                return Err(if exists {
                    AppError::Conflict("Book already returned".to_string())
                } else {
                    AppError::NotFound(format!("Assignment with id {} not found", id))
                });
            }
        };

        let fine = policy.fine_for(assignment.due_at, now);
        if fine > Decimal::ZERO {
            sqlx::query("UPDATE assignments SET fine_amount = $2 WHERE id = $1")
                .bind(id)
                .bind(fine)
                .execute(&mut *tx)
                .await?;
            assignment.fine_amount = fine;
        }

        sqlx::query(
            "UPDATE books SET available_copies = available_copies + 1, updated_at = NOW() WHERE id = $1",
        )
        .bind(assignment.book_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(assignment)
    }

    /// Mark a fine as paid. The predicates live in the UPDATE so the
    /// transition is one atomic statement.
    pub async fn pay_fine(&self, id: i32) -> AppResult<Assignment> {
        let paid = sqlx::query_as::<_, Assignment>(
            "UPDATE assignments SET fine_paid = TRUE \
             WHERE id = $1 AND fine_amount > 0 AND fine_paid = FALSE RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match paid {
            Some(a) => Ok(a),
            None => {
                let assignment = self.get_by_id(id).await?;
                if assignment.fine_amount == Decimal::ZERO {
                    Err(AppError::Validation("No fine to pay".to_string()))
                } else {
                    Err(AppError::Conflict("Fine already paid".to_string()))
                }
            }
        }
    }

    /// Search the ledger with filters and offset pagination, newest
    /// borrows first. The status filter matches the derived status, so a
    /// `borrowed` row whose due date has passed shows up under `overdue`.
    pub async fn search(&self, query: &AssignmentQuery) -> AppResult<(Vec<AssignmentDetails>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let status = query.status.map(|s| s.as_str());

        const FILTER: &str = r#"
            WHERE ($1::int4 IS NULL OR a.borrower_id = $1)
              AND ($2::int4 IS NULL OR a.book_id = $2)
              AND ($3::text IS NULL OR
                   CASE WHEN a.returned_at IS NOT NULL THEN 'returned'
                        WHEN a.due_at < NOW() THEN 'overdue'
                        ELSE 'borrowed' END = $3)
              AND ($4::timestamptz IS NULL OR a.borrowed_at >= $4)
              AND ($5::timestamptz IS NULL OR a.borrowed_at <= $5)
        "#;

        let rows = sqlx::query_as::<_, AssignmentDetailsRow>(&format!(
            "{} {} ORDER BY a.borrowed_at DESC LIMIT $6 OFFSET $7",
            DETAILS_SELECT, FILTER
        ))
        .bind(query.borrower_id)
        .bind(query.book_id)
        .bind(status)
        .bind(query.from)
        .bind(query.to)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM assignments a {}",
            FILTER
        ))
        .bind(query.borrower_id)
        .bind(query.book_id)
        .bind(status)
        .bind(query.from)
        .bind(query.to)
        .fetch_one(&self.pool)
        .await?;

        let now = Utc::now();
        Ok((rows.into_iter().map(|r| r.into_details(now)).collect(), total))
    }

    /// Count active (not yet returned) loans
    pub async fn count_active(&self) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM assignments WHERE returned_at IS NULL")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Count overdue loans (derived at query time)
    pub async fn count_overdue(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM assignments WHERE returned_at IS NULL AND due_at < NOW()",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Sum of assessed but unpaid fines
    pub async fn unpaid_fines_total(&self) -> AppResult<Decimal> {
        let total: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(fine_amount), 0) FROM assignments \
             WHERE fine_amount > 0 AND fine_paid = FALSE",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }
}
