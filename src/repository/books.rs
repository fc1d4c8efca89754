//! Books repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{is_unique_violation, AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Check if an ISBN is already catalogued
    pub async fn isbn_exists(&self, isbn: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1 AND id != $2)")
                .bind(isbn)
                .bind(id)
                .fetch_one(&self.pool)
                .await?
        } else {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1)")
                .bind(isbn)
                .fetch_one(&self.pool)
                .await?
        };
        Ok(exists)
    }

    /// Search books with filters and offset pagination, ordered by title
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let title = query.title.as_deref();
        let author = query.author.as_deref();
        let category = query.category.as_deref();

        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books
            WHERE ($1::text IS NULL OR title ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR author ILIKE '%' || $2 || '%')
              AND ($3::text IS NULL OR category = $3)
              AND ($4::bool IS NULL
                   OR ($4 = TRUE AND available_copies > 0)
                   OR ($4 = FALSE AND available_copies = 0))
            ORDER BY title
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(title)
        .bind(author)
        .bind(category)
        .bind(query.available)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM books
            WHERE ($1::text IS NULL OR title ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR author ILIKE '%' || $2 || '%')
              AND ($3::text IS NULL OR category = $3)
              AND ($4::bool IS NULL
                   OR ($4 = TRUE AND available_copies > 0)
                   OR ($4 = FALSE AND available_copies = 0))
            "#,
        )
        .bind(title)
        .bind(author)
        .bind(category)
        .bind(query.available)
        .fetch_one(&self.pool)
        .await?;

        Ok((books, total))
    }

    /// Create a new book. All copies start on the shelf.
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, isbn, category, total_copies, available_copies)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.category)
        .bind(book.total_copies)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "books_isbn_key") {
                AppError::Conflict(format!("ISBN {} is already catalogued", book.isbn))
            } else {
                e.into()
            }
        })
    }

    /// Update a book. A change to `total_copies` shifts `available_copies`
    /// by the same delta; the table CHECK rejects a shrink below the number
    /// of copies currently out on loan.
    pub async fn update(&self, id: i32, book: &UpdateBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = COALESCE($2, title),
                author = COALESCE($3, author),
                category = COALESCE($4, category),
                available_copies = available_copies + (COALESCE($5, total_copies) - total_copies),
                total_copies = COALESCE($5, total_copies),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.category)
        .bind(book.total_copies)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_check_violation() => AppError::Validation(
                "Cannot reduce copies below the number currently on loan".to_string(),
            ),
            _ => AppError::from(e),
        })?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Delete a book. Blocked while any copy is out on loan; returned
    /// ledger entries referencing it are removed administratively.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        let active: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM assignments WHERE book_id = $1 AND returned_at IS NULL)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if active {
            return Err(AppError::Conflict(
                "Book has copies out on loan and cannot be deleted".to_string(),
            ));
        }

        sqlx::query("DELETE FROM assignments WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
