//! Borrower directory service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::borrower::{Borrower, BorrowerQuery, CreateBorrower, UpdateBorrower},
    repository::Repository,
    services::auth::AuthService,
};

#[derive(Clone)]
pub struct BorrowersService {
    repository: Repository,
    auth: AuthService,
}

impl BorrowersService {
    pub fn new(repository: Repository, auth: AuthService) -> Self {
        Self { repository, auth }
    }

    pub async fn get_borrower(&self, id: i32) -> AppResult<Borrower> {
        self.repository.borrowers.get_by_id(id).await
    }

    pub async fn search_borrowers(&self, query: &BorrowerQuery) -> AppResult<(Vec<Borrower>, i64)> {
        self.repository.borrowers.search(query).await
    }

    pub async fn create_borrower(&self, borrower: CreateBorrower) -> AppResult<Borrower> {
        borrower
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if self
            .repository
            .borrowers
            .external_id_exists(&borrower.external_id, None)
            .await?
        {
            return Err(AppError::Conflict(format!(
                "External id {} is already registered",
                borrower.external_id
            )));
        }
        if self.repository.borrowers.email_exists(&borrower.email, None).await? {
            return Err(AppError::Conflict(format!(
                "Email {} is already registered",
                borrower.email
            )));
        }

        let password = match &borrower.password {
            Some(p) => Some(self.auth.hash_password(p)?),
            None => None,
        };

        self.repository.borrowers.create(&borrower, password).await
    }

    pub async fn update_borrower(&self, id: i32, borrower: UpdateBorrower) -> AppResult<Borrower> {
        borrower
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        self.repository.borrowers.get_by_id(id).await?;

        if let Some(ref external_id) = borrower.external_id {
            if self
                .repository
                .borrowers
                .external_id_exists(external_id, Some(id))
                .await?
            {
                return Err(AppError::Conflict(format!(
                    "External id {} is already registered",
                    external_id
                )));
            }
        }
        if let Some(ref email) = borrower.email {
            if self.repository.borrowers.email_exists(email, Some(id)).await? {
                return Err(AppError::Conflict(format!(
                    "Email {} is already registered",
                    email
                )));
            }
        }

        let password = match &borrower.password {
            Some(p) => Some(self.auth.hash_password(p)?),
            None => None,
        };

        self.repository.borrowers.update(id, &borrower, password).await
    }

    pub async fn delete_borrower(&self, id: i32) -> AppResult<()> {
        self.repository.borrowers.delete(id).await
    }
}
