//! Repository layer for database operations

pub mod assignments;
pub mod books;
pub mod borrowers;
pub mod staff;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub borrowers: borrowers::BorrowersRepository,
    pub assignments: assignments::AssignmentsRepository,
    pub staff: staff::StaffRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            borrowers: borrowers::BorrowersRepository::new(pool.clone()),
            assignments: assignments::AssignmentsRepository::new(pool.clone()),
            staff: staff::StaffRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round-trip the database, for the readiness probe
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
