//! Customer group repository

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::DatabaseError;

/// A row of `customer_groups`
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CustomerGroupRow {
    pub id: Uuid,
    pub name: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const SELECT_GROUP: &str = r#"
    SELECT id, name, is_default, created_at, updated_at
    FROM customer_groups
"#;

/// Data access for `customer_groups`
pub struct CustomerGroupRepository;

impl CustomerGroupRepository {
    pub async fn find(conn: &mut PgConnection, id: Uuid) -> Result<Option<CustomerGroupRow>, DatabaseError> {
        let row = sqlx::query_as::<_, CustomerGroupRow>(&format!("{SELECT_GROUP} WHERE id = $1"))
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(row)
    }

    /// Every group flagged default, ordered by id
    pub async fn find_defaults(conn: &mut PgConnection) -> Result<Vec<CustomerGroupRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, CustomerGroupRow>(&format!(
            "{SELECT_GROUP} WHERE is_default ORDER BY id"
        ))
        .fetch_all(conn)
        .await?;
        Ok(rows)
    }

    pub async fn exists(conn: &mut PgConnection, id: Uuid) -> Result<bool, DatabaseError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM customer_groups WHERE id = $1)",
        )
        .bind(id)
        .fetch_one(conn)
        .await?;
        Ok(exists)
    }

    /// Case-insensitive name lookup ignoring the group `except`
    pub async fn name_taken(conn: &mut PgConnection, name: &str, except: Uuid) -> Result<bool, DatabaseError> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM customer_groups WHERE lower(name) = lower($1) AND id <> $2)",
        )
        .bind(name)
        .bind(except)
        .fetch_one(conn)
        .await?;
        Ok(taken)
    }

    pub async fn insert(conn: &mut PgConnection, row: &CustomerGroupRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO customer_groups (id, name, is_default, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(row.id)
        .bind(&row.name)
        .bind(row.is_default)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn update(conn: &mut PgConnection, row: &CustomerGroupRow) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE customer_groups SET name = $2, is_default = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(row.id)
        .bind(&row.name)
        .bind(row.is_default)
        .bind(row.updated_at)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("CustomerGroup", row.id));
        }
        Ok(())
    }

    /// Returns false when no row was deleted
    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM customer_groups WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
