//! Borrowers repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{is_unique_violation, AppError, AppResult},
    models::borrower::{Borrower, BorrowerQuery, CreateBorrower, UpdateBorrower},
};

#[derive(Clone)]
pub struct BorrowersRepository {
    pool: Pool<Postgres>,
}

impl BorrowersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get borrower by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Borrower> {
        sqlx::query_as::<_, Borrower>("SELECT * FROM borrowers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrower with id {} not found", id)))
    }

    /// Get borrower by external (student/faculty) id, for authentication
    pub async fn get_by_external_id(&self, external_id: &str) -> AppResult<Option<Borrower>> {
        let borrower = sqlx::query_as::<_, Borrower>(
            "SELECT * FROM borrowers WHERE LOWER(external_id) = LOWER($1)",
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(borrower)
    }

    /// Check if an email is already registered
    pub async fn email_exists(&self, email: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM borrowers WHERE LOWER(email) = LOWER($1) AND id != $2)",
            )
            .bind(email)
            .bind(id)
            .fetch_one(&self.pool)
            .await?
        } else {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM borrowers WHERE LOWER(email) = LOWER($1))")
                .bind(email)
                .fetch_one(&self.pool)
                .await?
        };
        Ok(exists)
    }

    /// Check if an external id is already registered
    pub async fn external_id_exists(&self, external_id: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM borrowers WHERE LOWER(external_id) = LOWER($1) AND id != $2)",
            )
            .bind(external_id)
            .bind(id)
            .fetch_one(&self.pool)
            .await?
        } else {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM borrowers WHERE LOWER(external_id) = LOWER($1))",
            )
            .bind(external_id)
            .fetch_one(&self.pool)
            .await?
        };
        Ok(exists)
    }

    /// Search borrowers with filters and offset pagination, ordered by name
    pub async fn search(&self, query: &BorrowerQuery) -> AppResult<(Vec<Borrower>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let search = query.search.as_deref();
        let kind = query.kind.map(|k| k.as_str());
        let department = query.department.as_deref();

        let borrowers = sqlx::query_as::<_, Borrower>(
            r#"
            SELECT * FROM borrowers
            WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%' OR email ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR kind = $2)
              AND ($3::text IS NULL OR department = $3)
            ORDER BY name
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(search)
        .bind(kind)
        .bind(department)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM borrowers
            WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%' OR email ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR kind = $2)
              AND ($3::text IS NULL OR department = $3)
            "#,
        )
        .bind(search)
        .bind(kind)
        .bind(department)
        .fetch_one(&self.pool)
        .await?;

        Ok((borrowers, total))
    }

    /// Create a new borrower. `password` is already hashed by the caller.
    pub async fn create(&self, borrower: &CreateBorrower, password: Option<String>) -> AppResult<Borrower> {
        sqlx::query_as::<_, Borrower>(
            r#"
            INSERT INTO borrowers (name, external_id, email, department, kind, password)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&borrower.name)
        .bind(&borrower.external_id)
        .bind(&borrower.email)
        .bind(&borrower.department)
        .bind(borrower.kind)
        .bind(password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "borrowers_external_id_key") {
                AppError::Conflict(format!("External id {} is already registered", borrower.external_id))
            } else if is_unique_violation(&e, "borrowers_email_key") {
                AppError::Conflict(format!("Email {} is already registered", borrower.email))
            } else {
                e.into()
            }
        })
    }

    /// Update a borrower. `password` is already hashed by the caller.
    pub async fn update(&self, id: i32, borrower: &UpdateBorrower, password: Option<String>) -> AppResult<Borrower> {
        sqlx::query_as::<_, Borrower>(
            r#"
            UPDATE borrowers
            SET name = COALESCE($2, name),
                external_id = COALESCE($3, external_id),
                email = COALESCE($4, email),
                department = COALESCE($5, department),
                kind = COALESCE($6, kind),
                password = COALESCE($7, password),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&borrower.name)
        .bind(&borrower.external_id)
        .bind(&borrower.email)
        .bind(&borrower.department)
        .bind(borrower.kind)
        .bind(password)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Borrower with id {} not found", id)))
    }

    /// Replace a borrower password. `password` is already hashed by the caller.
    pub async fn set_password(&self, id: i32, password: &str) -> AppResult<()> {
        let updated = sqlx::query(
            "UPDATE borrowers SET password = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password)
        .execute(&self.pool)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Borrower with id {} not found", id)));
        }
        Ok(())
    }

    /// Delete a borrower. Blocked while they hold an active loan; their
    /// returned ledger entries are removed administratively.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM borrowers WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(AppError::NotFound(format!("Borrower with id {} not found", id)));
        }

        let active: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM assignments WHERE borrower_id = $1 AND returned_at IS NULL)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if active {
            return Err(AppError::Conflict(
                "Borrower has books out on loan and cannot be deleted".to_string(),
            ));
        }

        sqlx::query("DELETE FROM assignments WHERE borrower_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM borrowers WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
