// Repository layer for database operations

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::*;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create database connection from URL
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .context("Failed to connect to Postgres")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply embedded migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Round trip to the database
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database check failed")?;
        Ok(())
    }

    // ============================================
    // Activity logs
    // ============================================

    pub async fn create_activity(&self, input: CreateActivityRow) -> Result<ActivityRow> {
        let row = sqlx::query_as::<_, ActivityRow>(
            r#"
            INSERT INTO activity_logs (id, timestamp, event_type, value, original_input)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, timestamp, event_type, value, original_input, created_at, updated_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(input.timestamp)
        .bind(&input.event_type)
        .bind(&input.value)
        .bind(&input.original_input)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_activity(&self, id: Uuid) -> Result<Option<ActivityRow>> {
        let row = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT id, timestamp, event_type, value, original_input, created_at, updated_at
            FROM activity_logs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Replace every user-visible column of an activity
    pub async fn update_activity(
        &self,
        id: Uuid,
        input: CreateActivityRow,
    ) -> Result<Option<ActivityRow>> {
        let row = sqlx::query_as::<_, ActivityRow>(
            r#"
            UPDATE activity_logs
            SET
                timestamp = $2,
                event_type = $3,
                value = $4,
                original_input = $5,
                updated_at = now()
            WHERE id = $1
            RETURNING id, timestamp, event_type, value, original_input, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(input.timestamp)
        .bind(&input.event_type)
        .bind(&input.value)
        .bind(&input.original_input)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn delete_activity(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM activity_logs WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_activities(&self) -> Result<Vec<ActivityRow>> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT id, timestamp, event_type, value, original_input, created_at, updated_at
            FROM activity_logs
            ORDER BY timestamp DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Activities in `[start, end)`, newest first
    pub async fn list_activities_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ActivityRow>> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT id, timestamp, event_type, value, original_input, created_at, updated_at
            FROM activity_logs
            WHERE timestamp >= $1 AND timestamp < $2
            ORDER BY timestamp DESC, id DESC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Whether any activity is older than `before`
    pub async fn has_activities_before(&self, before: DateTime<Utc>) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (SELECT 1 FROM activity_logs WHERE timestamp < $1)
            "#,
        )
        .bind(before)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Distinct event types, most recently used first
    pub async fn list_event_types(&self) -> Result<Vec<String>> {
        let types: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT event_type
            FROM activity_logs
            GROUP BY event_type
            ORDER BY MAX(timestamp) DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(types)
    }
}
