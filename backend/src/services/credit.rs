//! Credit note service
//!
//! Credits move draft -> approved -> used. A used credit is locked: its
//! content cannot change and it cannot be deleted until the invoice that
//! consumed it reverses the application (see the invoice service).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::activity_log::{ActivityLogService, LogActivity};
use crate::services::numbering::next_document_number;
use shared::models::{CreateCreditInput, CreditReason, CreditStatus, UpdateCreditInput};
use shared::numbering::DocumentKind;
use shared::validation::{validate_buyer_name, validate_credit_patch};

/// Credit note service
#[derive(Clone)]
pub struct CreditService {
    db: PgPool,
    activity: ActivityLogService,
}

/// A credit note row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Credit {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub credit_number: String,
    pub invoice_number: Option<String>,
    pub invoice_id: Option<Uuid>,
    pub buyer_name: String,
    pub product_name: Option<String>,
    pub product_sku: Option<String>,
    pub reason: String,
    pub affected_quantity: Option<i32>,
    pub amount: Decimal,
    pub description: Option<String>,
    pub status: String,
    pub applied_to_pi_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Where a used credit went
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CreditUsage {
    pub pi_id: Uuid,
    pub pi_number: String,
    pub amount: Decimal,
}

/// A credit with its application history
#[derive(Debug, Clone, Serialize)]
pub struct CreditDetail {
    #[serde(flatten)]
    pub credit: Credit,
    pub usages: Vec<CreditUsage>,
}

/// Query parameters for listing credits
#[derive(Debug, Default, Deserialize)]
pub struct ListCreditsQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

const CREDIT_COLUMNS: &str = "id, supplier_id, credit_number, invoice_number, invoice_id, \
     buyer_name, product_name, product_sku, reason, affected_quantity, amount, description, \
     status, applied_to_pi_id, created_at, updated_at";

impl CreditService {
    pub fn new(db: PgPool) -> Self {
        let activity = ActivityLogService::new(db.clone());
        Self { db, activity }
    }

    /// Create a credit note with a generated CR number
    pub async fn create_credit(
        &self,
        supplier_id: Uuid,
        actor_email: &str,
        input: CreateCreditInput,
    ) -> AppResult<Credit> {
        validate_buyer_name(&input.buyer_name).map_err(|msg| AppError::Validation {
            field: "buyer_name".to_string(),
            message: msg.to_string(),
        })?;
        if CreditReason::from_str(&input.reason).is_none() {
            return Err(AppError::Validation {
                field: "reason".to_string(),
                message: "Invalid credit reason".to_string(),
            });
        }
        if input.amount < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "amount".to_string(),
                message: "Credit amount cannot be negative".to_string(),
            });
        }
        if let Some(qty) = input.affected_quantity {
            if qty < 1 {
                return Err(AppError::Validation {
                    field: "affected_quantity".to_string(),
                    message: "Affected quantity must be at least 1".to_string(),
                });
            }
        }
        let status = parse_credit_status(input.status.as_deref())?.unwrap_or(CreditStatus::Draft);
        if status == CreditStatus::Used {
            return Err(AppError::Validation {
                field: "status".to_string(),
                message: "A credit cannot be created as used".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let credit_number =
            next_document_number(&mut *tx, supplier_id, DocumentKind::Credit).await?;

        let credit: Credit = sqlx::query_as(&format!(
            r#"
            INSERT INTO credits
                (supplier_id, credit_number, invoice_number, invoice_id, buyer_name,
                 product_name, product_sku, reason, affected_quantity, amount, description, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            CREDIT_COLUMNS
        ))
        .bind(supplier_id)
        .bind(&credit_number)
        .bind(&input.invoice_number)
        .bind(input.invoice_id)
        .bind(&input.buyer_name)
        .bind(&input.product_name)
        .bind(&input.product_sku)
        .bind(&input.reason)
        .bind(input.affected_quantity)
        .bind(input.amount)
        .bind(&input.description)
        .bind(status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        self.activity
            .log(LogActivity {
                supplier_id,
                actor_email: actor_email.to_string(),
                action_type: "credit.create".to_string(),
                category: "credit".to_string(),
                description: Some(format!("created credit #{}", credit.credit_number)),
                target_id: Some(credit.id),
                target_name: Some(credit.credit_number.clone()),
            })
            .await;

        Ok(credit)
    }

    /// List credits for a supplier, newest first
    pub async fn list_credits(
        &self,
        supplier_id: Uuid,
        query: ListCreditsQuery,
    ) -> AppResult<Vec<Credit>> {
        let status = query.status.filter(|s| s != "all");
        let search = query
            .search
            .filter(|s| !s.trim().is_empty())
            .map(|s| format!("%{}%", s));

        let credits: Vec<Credit> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM credits
            WHERE supplier_id = $1
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR credit_number ILIKE $3 OR buyer_name ILIKE $3
                   OR product_name ILIKE $3)
            ORDER BY created_at DESC
            "#,
            CREDIT_COLUMNS
        ))
        .bind(supplier_id)
        .bind(&status)
        .bind(&search)
        .fetch_all(&self.db)
        .await?;

        Ok(credits)
    }

    /// Approved credits a buyer can still apply
    pub async fn list_credits_for_buyer(
        &self,
        supplier_id: Uuid,
        buyer_name: &str,
    ) -> AppResult<Vec<Credit>> {
        let credits: Vec<Credit> = sqlx::query_as(&format!(
            "SELECT {} FROM credits \
             WHERE supplier_id = $1 AND buyer_name = $2 AND status = 'approved' \
             ORDER BY created_at DESC",
            CREDIT_COLUMNS
        ))
        .bind(supplier_id)
        .bind(buyer_name)
        .fetch_all(&self.db)
        .await?;

        Ok(credits)
    }

    /// Get a credit with its application history
    pub async fn get_credit(&self, supplier_id: Uuid, credit_id: Uuid) -> AppResult<CreditDetail> {
        let credit: Credit = sqlx::query_as(&format!(
            "SELECT {} FROM credits WHERE id = $1 AND supplier_id = $2",
            CREDIT_COLUMNS
        ))
        .bind(credit_id)
        .bind(supplier_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Credit".to_string()))?;

        let usages: Vec<CreditUsage> = sqlx::query_as(
            r#"
            SELECT ca.pi_id, pi.pi_number, ca.amount
            FROM credit_applications ca
            JOIN proforma_invoices pi ON pi.id = ca.pi_id
            WHERE ca.credit_id = $1
            ORDER BY ca.id
            "#,
        )
        .bind(credit_id)
        .fetch_all(&self.db)
        .await?;

        Ok(CreditDetail { credit, usages })
    }

    /// Partially update a credit. Used credits only accept a status change
    /// away from used.
    pub async fn update_credit(
        &self,
        supplier_id: Uuid,
        credit_id: Uuid,
        actor_email: &str,
        input: UpdateCreditInput,
    ) -> AppResult<Credit> {
        if let Some(name) = input.buyer_name.as_deref() {
            validate_buyer_name(name).map_err(|msg| AppError::Validation {
                field: "buyer_name".to_string(),
                message: msg.to_string(),
            })?;
        }
        if let Some(reason) = input.reason.as_deref() {
            if CreditReason::from_str(reason).is_none() {
                return Err(AppError::Validation {
                    field: "reason".to_string(),
                    message: "Invalid credit reason".to_string(),
                });
            }
        }
        if let Some(amount) = input.amount {
            if amount < Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "amount".to_string(),
                    message: "Credit amount cannot be negative".to_string(),
                });
            }
        }
        if let Some(status) = input.status.as_deref() {
            if CreditStatus::from_str(status).is_none() {
                return Err(AppError::Validation {
                    field: "status".to_string(),
                    message: "Invalid credit status".to_string(),
                });
            }
        }

        let mut tx = self.db.begin().await?;

        let existing: Credit = sqlx::query_as(&format!(
            "SELECT {} FROM credits WHERE id = $1 AND supplier_id = $2",
            CREDIT_COLUMNS
        ))
        .bind(credit_id)
        .bind(supplier_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Credit".to_string()))?;

        validate_credit_patch(&existing.status, &input)
            .map_err(|msg| AppError::ValidationError(msg.to_string()))?;

        let credit: Credit = sqlx::query_as(&format!(
            r#"
            UPDATE credits
            SET invoice_number = $1, buyer_name = $2, product_name = $3, product_sku = $4,
                reason = $5, affected_quantity = $6, amount = $7, description = $8,
                status = $9, updated_at = NOW()
            WHERE id = $10
            RETURNING {}
            "#,
            CREDIT_COLUMNS
        ))
        .bind(input.invoice_number.or(existing.invoice_number))
        .bind(input.buyer_name.unwrap_or(existing.buyer_name))
        .bind(input.product_name.or(existing.product_name))
        .bind(input.product_sku.or(existing.product_sku))
        .bind(input.reason.unwrap_or(existing.reason))
        .bind(input.affected_quantity.or(existing.affected_quantity))
        .bind(input.amount.unwrap_or(existing.amount))
        .bind(input.description.or(existing.description))
        .bind(input.status.unwrap_or(existing.status))
        .bind(credit_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        self.activity
            .log(LogActivity {
                supplier_id,
                actor_email: actor_email.to_string(),
                action_type: "credit.update".to_string(),
                category: "credit".to_string(),
                description: Some(format!("updated credit #{}", credit.credit_number)),
                target_id: Some(credit_id),
                target_name: Some(credit.credit_number.clone()),
            })
            .await;

        Ok(credit)
    }

    /// Delete a credit. Used credits cannot be deleted.
    pub async fn delete_credit(
        &self,
        supplier_id: Uuid,
        credit_id: Uuid,
        actor_email: &str,
    ) -> AppResult<()> {
        let detail = self.get_credit(supplier_id, credit_id).await?;
        if detail.credit.status == CreditStatus::Used.as_str() {
            return Err(AppError::ValidationError(
                "Cannot delete a used credit. Reverse the invoice application first.".to_string(),
            ));
        }

        sqlx::query("DELETE FROM credits WHERE id = $1 AND supplier_id = $2")
            .bind(credit_id)
            .bind(supplier_id)
            .execute(&self.db)
            .await?;

        self.activity
            .log(LogActivity {
                supplier_id,
                actor_email: actor_email.to_string(),
                action_type: "credit.delete".to_string(),
                category: "credit".to_string(),
                description: Some(format!("deleted credit #{}", detail.credit.credit_number)),
                target_id: Some(credit_id),
                target_name: Some(detail.credit.credit_number),
            })
            .await;

        Ok(())
    }
}

fn parse_credit_status(status: Option<&str>) -> AppResult<Option<CreditStatus>> {
    match status {
        Some(s) => CreditStatus::from_str(s)
            .map(Some)
            .ok_or_else(|| AppError::Validation {
                field: "status".to_string(),
                message: "Invalid credit status".to_string(),
            }),
        None => Ok(None),
    }
}
