//! Circulation service: the borrow/return/fine lifecycle
//!
//! Owns the preconditions around the ledger repository and sends the
//! borrower their receipts. Email is strictly fire-and-forget: a failed
//! notification is logged and never rolls back or fails the operation.

use chrono::{DateTime, Duration, Utc};

use crate::{
    config::PolicyConfig,
    error::{AppError, AppResult},
    models::assignment::{AssignmentDetails, AssignmentQuery},
    repository::Repository,
    services::{email::EmailService, fines::FinePolicy},
};

#[derive(Clone)]
pub struct CirculationService {
    repository: Repository,
    fine_policy: FinePolicy,
    loan_period_days: i64,
    email: EmailService,
}

impl CirculationService {
    pub fn new(repository: Repository, policy: &PolicyConfig, email: EmailService) -> Self {
        Self {
            repository,
            fine_policy: FinePolicy::from_config(policy),
            loan_period_days: policy.loan_period_days,
            email,
        }
    }

    /// Record a borrow. The due date may be supplied by the caller (any
    /// strictly future instant) or omitted to apply the configured loan
    /// period.
    pub async fn record_borrow(
        &self,
        book_id: i32,
        borrower_id: i32,
        due_at: Option<DateTime<Utc>>,
    ) -> AppResult<AssignmentDetails> {
        let now = Utc::now();
        let due_at = due_at.unwrap_or(now + Duration::days(self.loan_period_days));
        if due_at <= now {
            return Err(AppError::Validation(
                "Due date must be in the future".to_string(),
            ));
        }

        let assignment = self
            .repository
            .assignments
            .create(book_id, borrower_id, due_at, now)
            .await?;

        let details = self.repository.assignments.get_details(assignment.id).await?;
        self.send_borrow_receipt(&details).await;
        Ok(details)
    }

    /// Return a borrowed book and assess any fine
    pub async fn return_book(&self, assignment_id: i32) -> AppResult<AssignmentDetails> {
        let now = Utc::now();
        self.repository
            .assignments
            .return_assignment(assignment_id, now, &self.fine_policy)
            .await?;

        let details = self.repository.assignments.get_details(assignment_id).await?;
        self.send_return_receipt(&details).await;
        Ok(details)
    }

    /// Mark an assessed fine as paid
    pub async fn pay_fine(&self, assignment_id: i32) -> AppResult<AssignmentDetails> {
        self.repository.assignments.pay_fine(assignment_id).await?;
        self.repository.assignments.get_details(assignment_id).await
    }

    pub async fn get_assignment(&self, id: i32) -> AppResult<AssignmentDetails> {
        self.repository.assignments.get_details(id).await
    }

    pub async fn search_assignments(
        &self,
        query: &AssignmentQuery,
    ) -> AppResult<(Vec<AssignmentDetails>, i64)> {
        self.repository.assignments.search(query).await
    }

    /// Ledger entries for one borrower, newest first
    pub async fn borrower_assignments(
        &self,
        borrower_id: i32,
        query: &AssignmentQuery,
    ) -> AppResult<(Vec<AssignmentDetails>, i64)> {
        // Verify the borrower exists so an empty ledger is not confused
        // with an unknown id
        self.repository.borrowers.get_by_id(borrower_id).await?;

        let scoped = AssignmentQuery {
            borrower_id: Some(borrower_id),
            book_id: query.book_id,
            status: query.status,
            from: query.from,
            to: query.to,
            page: query.page,
            per_page: query.per_page,
        };
        self.repository.assignments.search(&scoped).await
    }

    async fn send_borrow_receipt(&self, details: &AssignmentDetails) {
        let borrower = match self.repository.borrowers.get_by_id(details.borrower.id).await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!("Skipping borrow receipt, borrower lookup failed: {}", e);
                return;
            }
        };
        if let Err(e) = self
            .email
            .send_borrow_receipt(&borrower.email, &details.book.title, details.borrowed_at, details.due_at)
            .await
        {
            tracing::warn!("Failed to send borrow receipt: {}", e);
        }
    }

    async fn send_return_receipt(&self, details: &AssignmentDetails) {
        let borrower = match self.repository.borrowers.get_by_id(details.borrower.id).await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!("Skipping return receipt, borrower lookup failed: {}", e);
                return;
            }
        };
        let returned_at = match details.returned_at {
            Some(t) => t,
            None => return,
        };
        if let Err(e) = self
            .email
            .send_return_receipt(&borrower.email, &details.book.title, returned_at, details.fine_amount)
            .await
        {
            tracing::warn!("Failed to send return receipt: {}", e);
        }
    }
}
