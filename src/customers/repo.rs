use sqlx::PgPool;
use uuid::Uuid;

use crate::customers::repo_types::Customer;

const COLUMNS: &str = "id, name, email, username, password_hash, phone_number, created_at";

impl Customer {
    /// Find a customer by email, including the password hash for verification.
    pub async fn find_by_email(db: &PgPool, email: &str) -> sqlx::Result<Option<Customer>> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {COLUMNS} FROM customers WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Customer>> {
        sqlx::query_as::<_, Customer>(&format!("SELECT {COLUMNS} FROM customers WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Insert a new customer. The UNIQUE constraint on email is the
    /// authoritative duplicate check; callers classify the violation.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        username: &str,
        password_hash: &str,
        phone_number: &str,
    ) -> sqlx::Result<Customer> {
        sqlx::query_as::<_, Customer>(&format!(
            r#"
            INSERT INTO customers (name, email, username, password_hash, phone_number)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(name)
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .bind(phone_number)
        .fetch_one(db)
        .await
    }

    /// Write the record back in full; callers merge the partial update first.
    pub async fn save(&self, db: &PgPool) -> sqlx::Result<Customer> {
        sqlx::query_as::<_, Customer>(&format!(
            r#"
            UPDATE customers
            SET name = $2, email = $3, username = $4, password_hash = $5, phone_number = $6
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.email)
        .bind(&self.username)
        .bind(&self.password_hash)
        .bind(&self.phone_number)
        .fetch_one(db)
        .await
    }

    /// Remove a customer; returns the number of rows deleted.
    pub async fn delete_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<u64> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Postgres unique_violation, the storage-level duplicate-email signal.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|d| d.code())
        .map(|c| c == "23505")
        .unwrap_or(false)
}
