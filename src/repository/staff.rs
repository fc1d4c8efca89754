//! Staff (librarian/admin) accounts repository

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::staff::{Role, Staff},
};

#[derive(Clone)]
pub struct StaffRepository {
    pool: Pool<Postgres>,
}

impl StaffRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get staff account by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Staff> {
        sqlx::query_as::<_, Staff>("SELECT * FROM staff WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Staff account with id {} not found", id)))
    }

    /// Get staff account by username, for authentication
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<Staff>> {
        let staff = sqlx::query_as::<_, Staff>(
            "SELECT * FROM staff WHERE LOWER(username) = LOWER($1)",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(staff)
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM staff")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Create a staff account. `password` is already hashed by the caller.
    pub async fn create(
        &self,
        username: &str,
        password: &str,
        name: Option<&str>,
        role: Role,
    ) -> AppResult<Staff> {
        let staff = sqlx::query_as::<_, Staff>(
            r#"
            INSERT INTO staff (username, password, name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(password)
        .bind(name)
        .bind(role)
        .fetch_one(&self.pool)
        .await?;
        Ok(staff)
    }

    /// Replace a staff password. `password` is already hashed by the caller.
    pub async fn set_password(&self, id: i32, password: &str) -> AppResult<()> {
        let updated = sqlx::query("UPDATE staff SET password = $2 WHERE id = $1")
            .bind(id)
            .bind(password)
            .execute(&self.pool)
            .await?;
        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Staff account with id {} not found", id)));
        }
        Ok(())
    }
}
