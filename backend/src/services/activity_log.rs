//! Activity log service
//!
//! Best-effort audit trail of ledger actions. Writes must never fail or
//! block the primary operation; a failed insert is logged and dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;

/// Activity log service
#[derive(Clone)]
pub struct ActivityLogService {
    db: PgPool,
}

/// A recorded activity entry
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ActivityLog {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub actor_email: String,
    pub actor_name: Option<String>,
    pub action_type: String,
    pub category: String,
    pub description: Option<String>,
    pub target_id: Option<Uuid>,
    pub target_name: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Input for recording an activity entry
#[derive(Debug, Clone)]
pub struct LogActivity {
    pub supplier_id: Uuid,
    pub actor_email: String,
    pub action_type: String,
    pub category: String,
    pub description: Option<String>,
    pub target_id: Option<Uuid>,
    pub target_name: Option<String>,
}

/// Query parameters for listing activity
#[derive(Debug, Default, Deserialize)]
pub struct ActivityQuery {
    pub category: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// One page of activity entries
#[derive(Debug, Serialize)]
pub struct ActivityPage {
    pub logs: Vec<ActivityLog>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

const ACTIVITY_COLUMNS: &str = "id, supplier_id, actor_email, actor_name, action_type, category, \
     description, target_id, target_name, metadata, created_at";

impl ActivityLogService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record an entry. Failures are logged at warn level and swallowed.
    pub async fn log(&self, entry: LogActivity) {
        let result = sqlx::query(
            r#"
            INSERT INTO activity_logs
                (supplier_id, actor_email, action_type, category, description, target_id, target_name)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.supplier_id)
        .bind(&entry.actor_email)
        .bind(&entry.action_type)
        .bind(&entry.category)
        .bind(&entry.description)
        .bind(entry.target_id)
        .bind(&entry.target_name)
        .execute(&self.db)
        .await;

        if let Err(e) = result {
            tracing::warn!("Failed to write activity log: {}", e);
        }
    }

    /// List activity entries for a supplier, newest first
    pub async fn list(&self, supplier_id: Uuid, query: ActivityQuery) -> AppResult<ActivityPage> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * limit;
        let category = query.category.filter(|c| c != "all");

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM activity_logs
            WHERE supplier_id = $1 AND ($2::text IS NULL OR category = $2)
            "#,
        )
        .bind(supplier_id)
        .bind(&category)
        .fetch_one(&self.db)
        .await?;

        let logs: Vec<ActivityLog> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM activity_logs
            WHERE supplier_id = $1 AND ($2::text IS NULL OR category = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
            ACTIVITY_COLUMNS
        ))
        .bind(supplier_id)
        .bind(&category)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(ActivityPage {
            logs,
            total,
            page,
            limit,
        })
    }

    /// Most recent activity entries for the dashboard
    pub async fn recent(&self, supplier_id: Uuid, limit: i64) -> AppResult<Vec<ActivityLog>> {
        let logs: Vec<ActivityLog> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM activity_logs
            WHERE supplier_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
            ACTIVITY_COLUMNS
        ))
        .bind(supplier_id)
        .bind(limit.clamp(1, 100))
        .fetch_all(&self.db)
        .await?;

        Ok(logs)
    }
}
