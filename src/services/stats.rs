//! Dashboard statistics service

use rust_decimal::Decimal;

use crate::{error::AppResult, repository::Repository};

#[derive(Debug, Clone)]
pub struct LibraryStats {
    pub total_books: i64,
    pub total_copies: i64,
    pub available_copies: i64,
    pub total_borrowers: i64,
    pub active_assignments: i64,
    pub overdue_assignments: i64,
    pub unpaid_fines: Decimal,
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn library_stats(&self) -> AppResult<LibraryStats> {
        let (total_books, total_copies, available_copies): (i64, i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(total_copies), 0)::int8, \
             COALESCE(SUM(available_copies), 0)::int8 FROM books",
        )
        .fetch_one(&self.repository.pool)
        .await?;

        let total_borrowers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM borrowers")
            .fetch_one(&self.repository.pool)
            .await?;

        Ok(LibraryStats {
            total_books,
            total_copies,
            available_copies,
            total_borrowers,
            active_assignments: self.repository.assignments.count_active().await?,
            overdue_assignments: self.repository.assignments.count_overdue().await?,
            unpaid_fines: self.repository.assignments.unpaid_fines_total().await?,
        })
    }
}
