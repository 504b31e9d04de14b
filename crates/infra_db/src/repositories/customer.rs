//! Customer repository
//!
//! Partitions map to the `withheld` column; ordering inside a partition is
//! always `(position, id)`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::DatabaseError;

/// A row of `customers`
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CustomerRow {
    pub id: Uuid,
    pub customer_group_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub mobile_no: String,
    pub address: Option<String>,
    pub due_amount: Decimal,
    pub is_active: bool,
    pub withheld: bool,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const SELECT_CUSTOMER: &str = r#"
    SELECT id, customer_group_id, name, email, mobile_no, address, due_amount,
           is_active, withheld, position, created_at, updated_at
    FROM customers
"#;

/// Data access for `customers`
pub struct CustomerRepository;

impl CustomerRepository {
    pub async fn find(conn: &mut PgConnection, id: Uuid) -> Result<Option<CustomerRow>, DatabaseError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!("{SELECT_CUSTOMER} WHERE id = $1"))
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(row)
    }

    /// Existing customers among `ids`, ordered by id
    pub async fn find_many(conn: &mut PgConnection, ids: &[Uuid]) -> Result<Vec<CustomerRow>, DatabaseError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "{SELECT_CUSTOMER} WHERE id = ANY($1) ORDER BY id"
        ))
        .bind(ids)
        .fetch_all(conn)
        .await?;
        Ok(rows)
    }

    pub async fn in_group(conn: &mut PgConnection, group_id: Uuid) -> Result<Vec<CustomerRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "{SELECT_CUSTOMER} WHERE customer_group_id = $1 ORDER BY id"
        ))
        .bind(group_id)
        .fetch_all(conn)
        .await?;
        Ok(rows)
    }

    /// One partition of a group, locked for the rest of the transaction
    pub async fn in_partition(
        conn: &mut PgConnection,
        group_id: Uuid,
        withheld: bool,
    ) -> Result<Vec<CustomerRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "{SELECT_CUSTOMER} WHERE customer_group_id = $1 AND withheld = $2 ORDER BY position, id FOR UPDATE"
        ))
        .bind(group_id)
        .bind(withheld)
        .fetch_all(conn)
        .await?;
        Ok(rows)
    }

    pub async fn count_in_group(conn: &mut PgConnection, group_id: Uuid) -> Result<i64, DatabaseError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM customers WHERE customer_group_id = $1",
        )
        .bind(group_id)
        .fetch_one(conn)
        .await?;
        Ok(count)
    }

    pub async fn next_position(
        conn: &mut PgConnection,
        group_id: Uuid,
        withheld: bool,
    ) -> Result<i32, DatabaseError> {
        let next = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT COALESCE(MAX(position), 0) + 1
            FROM customers
            WHERE customer_group_id = $1 AND withheld = $2
            "#,
        )
        .bind(group_id)
        .bind(withheld)
        .fetch_one(conn)
        .await?;
        Ok(next)
    }

    pub async fn name_taken(conn: &mut PgConnection, name: &str, except: Uuid) -> Result<bool, DatabaseError> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM customers WHERE lower(name) = lower($1) AND id <> $2)",
        )
        .bind(name)
        .bind(except)
        .fetch_one(conn)
        .await?;
        Ok(taken)
    }

    pub async fn mobile_no_taken(
        conn: &mut PgConnection,
        mobile_no: &str,
        except: Uuid,
    ) -> Result<bool, DatabaseError> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM customers WHERE lower(mobile_no) = lower($1) AND id <> $2)",
        )
        .bind(mobile_no)
        .bind(except)
        .fetch_one(conn)
        .await?;
        Ok(taken)
    }

    pub async fn insert(conn: &mut PgConnection, row: &CustomerRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO customers (
                id, customer_group_id, name, email, mobile_no, address, due_amount,
                is_active, withheld, position, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(row.id)
        .bind(row.customer_group_id)
        .bind(&row.name)
        .bind(&row.email)
        .bind(&row.mobile_no)
        .bind(&row.address)
        .bind(row.due_amount)
        .bind(row.is_active)
        .bind(row.withheld)
        .bind(row.position)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn update(conn: &mut PgConnection, row: &CustomerRow) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE customers SET
                customer_group_id = $2, name = $3, email = $4, mobile_no = $5, address = $6,
                due_amount = $7, is_active = $8, withheld = $9, position = $10, updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(row.id)
        .bind(row.customer_group_id)
        .bind(&row.name)
        .bind(&row.email)
        .bind(&row.mobile_no)
        .bind(&row.address)
        .bind(row.due_amount)
        .bind(row.is_active)
        .bind(row.withheld)
        .bind(row.position)
        .bind(row.updated_at)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Customer", row.id));
        }
        Ok(())
    }

    /// Writes the position column only
    pub async fn write_position(conn: &mut PgConnection, id: Uuid, position: i32) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE customers SET position = $2 WHERE id = $1")
            .bind(id)
            .bind(position)
            .execute(conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Customer", id));
        }
        Ok(())
    }

    /// Moves all withheld customers of `from` into `to` in one statement
    pub async fn reassign_withheld(conn: &mut PgConnection, from: Uuid, to: Uuid) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE customers SET customer_group_id = $2, updated_at = now()
            WHERE customer_group_id = $1 AND withheld
            "#,
        )
        .bind(from)
        .bind(to)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Returns false when no row was deleted
    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn total_due_amount(conn: &mut PgConnection, group_id: Uuid) -> Result<Decimal, DatabaseError> {
        let total = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(due_amount), 0) FROM customers WHERE customer_group_id = $1",
        )
        .bind(group_id)
        .fetch_one(conn)
        .await?;
        Ok(total)
    }
}
