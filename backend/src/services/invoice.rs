//! Proforma invoice service
//!
//! CRUD over proforma_invoices and their items, plus the credit
//! application ledger. The amount rules:
//!
//!   subtotal        = sum of item line totals
//!   credit_discount = sum of applied credit amounts
//!   total_amount    = max(0, subtotal - credit_discount)
//!
//! Credit applications are planned as a whole before any credit is
//! mutated, and every multi-row write runs in one database transaction.
//! Replacing the applied-credit set (even with an empty set) reverses
//! all existing applications: the credits revert to approved and are
//! unlinked before the new set is applied. A failed plan mutates
//! nothing, and the transaction covers the rest.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::activity_log::{ActivityLogService, LogActivity};
use crate::services::numbering::next_document_number;
use shared::models::{
    AppliedCreditInput, CreateInvoiceInput, InvoiceItemInput, InvoiceStatus, PaymentStatus,
    UpdateInvoiceInput,
};
use shared::numbering::DocumentKind;
use shared::validation::{
    invoice_subtotal, invoice_total, plan_credit_replacement, validate_buyer_name,
    validate_invoice_items, CreditApplicationError, CreditRecord, CreditSetError,
};

/// Proforma invoice service
#[derive(Clone)]
pub struct InvoiceService {
    db: PgPool,
    activity: ActivityLogService,
}

/// A proforma invoice row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProformaInvoice {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub pi_number: String,
    pub po_number: Option<String>,
    pub order_id: Option<Uuid>,
    pub buyer_name: String,
    pub buyer_email: Option<String>,
    pub buyer_country: Option<String>,
    pub pi_date: NaiveDate,
    pub valid_until: Option<NaiveDate>,
    pub subtotal: Decimal,
    pub credit_discount: Decimal,
    pub total_amount: Decimal,
    pub currency: String,
    pub incoterms: Option<String>,
    pub payment_method: Option<String>,
    pub remarks: Option<String>,
    pub status: String,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A proforma invoice line item
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InvoiceItem {
    pub id: i64,
    pub pi_id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub product_sku: Option<String>,
    pub quantity: i32,
    pub unit: String,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// A credit application joined to its credit record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CreditApplicationDetail {
    pub credit_id: Uuid,
    pub credit_number: String,
    pub reason: String,
    pub amount: Decimal,
}

/// A proforma invoice with its items
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceWithItems {
    #[serde(flatten)]
    pub invoice: ProformaInvoice,
    pub items: Vec<InvoiceItem>,
}

/// A proforma invoice with items and credit applications
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: ProformaInvoice,
    pub items: Vec<InvoiceItem>,
    pub applied_credits: Vec<CreditApplicationDetail>,
}

/// Query parameters for listing proforma invoices
#[derive(Debug, Default, Deserialize)]
pub struct ListInvoicesQuery {
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub search: Option<String>,
}

const INVOICE_COLUMNS: &str = "id, supplier_id, pi_number, po_number, order_id, buyer_name, \
     buyer_email, buyer_country, pi_date, valid_until, subtotal, credit_discount, total_amount, \
     currency, incoterms, payment_method, remarks, status, payment_status, created_at, updated_at";

const INVOICE_ITEM_COLUMNS: &str =
    "id, pi_id, product_id, product_name, product_sku, quantity, unit, unit_price, subtotal";

impl InvoiceService {
    pub fn new(db: PgPool) -> Self {
        let activity = ActivityLogService::new(db.clone());
        Self { db, activity }
    }

    /// Create a proforma invoice, optionally applying approved credits
    pub async fn create_invoice(
        &self,
        supplier_id: Uuid,
        actor_email: &str,
        input: CreateInvoiceInput,
    ) -> AppResult<InvoiceWithItems> {
        validate_buyer_name(&input.buyer_name).map_err(|msg| AppError::Validation {
            field: "buyer_name".to_string(),
            message: msg.to_string(),
        })?;
        validate_invoice_items(&input.items).map_err(|msg| AppError::Validation {
            field: "items".to_string(),
            message: msg.to_string(),
        })?;
        let status =
            parse_invoice_status(input.status.as_deref())?.unwrap_or(InvoiceStatus::Draft);

        let subtotal = invoice_subtotal(&input.items);
        let applied = input.applied_credits.as_deref().unwrap_or(&[]);

        let mut tx = self.db.begin().await?;

        // Plan the full application set before mutating any credit.
        let records = fetch_credit_records(&mut tx, supplier_id, applied).await?;
        let plan = plan_credit_replacement(subtotal, &input.buyer_name, &[], applied, &records)
            .map_err(|e| credit_set_error(e, &input.buyer_name))?;
        let credit_discount = plan.credit_discount;
        let total_amount = plan.total_amount;

        let pi_number =
            next_document_number(&mut *tx, supplier_id, DocumentKind::ProformaInvoice).await?;

        let invoice: ProformaInvoice = sqlx::query_as(&format!(
            r#"
            INSERT INTO proforma_invoices
                (supplier_id, pi_number, po_number, order_id, buyer_name, buyer_email,
                 buyer_country, pi_date, valid_until, subtotal, credit_discount, total_amount,
                 currency, incoterms, payment_method, remarks, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, CURRENT_DATE), $9, $10, $11, $12,
                    $13, $14, $15, $16, $17)
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(supplier_id)
        .bind(&pi_number)
        .bind(&input.po_number)
        .bind(input.order_id)
        .bind(&input.buyer_name)
        .bind(&input.buyer_email)
        .bind(&input.buyer_country)
        .bind(input.pi_date)
        .bind(input.valid_until)
        .bind(subtotal)
        .bind(credit_discount)
        .bind(total_amount)
        .bind(input.currency.as_deref().unwrap_or("USD"))
        .bind(&input.incoterms)
        .bind(&input.payment_method)
        .bind(&input.remarks)
        .bind(status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let items = insert_invoice_items(&mut tx, invoice.id, &input.items).await?;
        apply_credits(&mut tx, invoice.id, applied).await?;

        tx.commit().await?;

        self.activity
            .log(LogActivity {
                supplier_id,
                actor_email: actor_email.to_string(),
                action_type: "pi.create".to_string(),
                category: "pi".to_string(),
                description: Some(format!("created PI #{}", invoice.pi_number)),
                target_id: Some(invoice.id),
                target_name: Some(invoice.pi_number.clone()),
            })
            .await;

        Ok(InvoiceWithItems { invoice, items })
    }

    /// List proforma invoices for a supplier, newest first, with items
    pub async fn list_invoices(
        &self,
        supplier_id: Uuid,
        query: ListInvoicesQuery,
    ) -> AppResult<Vec<InvoiceWithItems>> {
        let status = query.status.filter(|s| s != "all");
        let payment_status = query.payment_status.filter(|s| s != "all");
        let search = query
            .search
            .filter(|s| !s.trim().is_empty())
            .map(|s| format!("%{}%", s));

        let invoices: Vec<ProformaInvoice> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM proforma_invoices
            WHERE supplier_id = $1
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR payment_status = $3)
              AND ($4::text IS NULL OR pi_number ILIKE $4 OR buyer_name ILIKE $4
                   OR po_number ILIKE $4)
            ORDER BY created_at DESC
            "#,
            INVOICE_COLUMNS
        ))
        .bind(supplier_id)
        .bind(&status)
        .bind(&payment_status)
        .bind(&search)
        .fetch_all(&self.db)
        .await?;

        let ids: Vec<Uuid> = invoices.iter().map(|i| i.id).collect();
        let items: Vec<InvoiceItem> = sqlx::query_as(&format!(
            "SELECT {} FROM proforma_invoice_items WHERE pi_id = ANY($1) ORDER BY id",
            INVOICE_ITEM_COLUMNS
        ))
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        let mut by_invoice: HashMap<Uuid, Vec<InvoiceItem>> = HashMap::new();
        for item in items {
            by_invoice.entry(item.pi_id).or_default().push(item);
        }

        Ok(invoices
            .into_iter()
            .map(|invoice| {
                let items = by_invoice.remove(&invoice.id).unwrap_or_default();
                InvoiceWithItems { invoice, items }
            })
            .collect())
    }

    /// Get a proforma invoice with items and credit applications
    pub async fn get_invoice(&self, supplier_id: Uuid, pi_id: Uuid) -> AppResult<InvoiceDetail> {
        let invoice: ProformaInvoice = sqlx::query_as(&format!(
            "SELECT {} FROM proforma_invoices WHERE id = $1 AND supplier_id = $2",
            INVOICE_COLUMNS
        ))
        .bind(pi_id)
        .bind(supplier_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Proforma invoice".to_string()))?;

        let items: Vec<InvoiceItem> = sqlx::query_as(&format!(
            "SELECT {} FROM proforma_invoice_items WHERE pi_id = $1 ORDER BY id",
            INVOICE_ITEM_COLUMNS
        ))
        .bind(pi_id)
        .fetch_all(&self.db)
        .await?;

        let applied_credits: Vec<CreditApplicationDetail> = sqlx::query_as(
            r#"
            SELECT ca.credit_id, c.credit_number, c.reason, ca.amount
            FROM credit_applications ca
            JOIN credits c ON c.id = ca.credit_id
            WHERE ca.pi_id = $1
            ORDER BY ca.id
            "#,
        )
        .bind(pi_id)
        .fetch_all(&self.db)
        .await?;

        Ok(InvoiceDetail {
            invoice,
            items,
            applied_credits,
        })
    }

    /// Partially update a proforma invoice. A provided item set replaces
    /// the items wholesale; a provided applied-credit set (even empty)
    /// reverses all existing applications before applying the new set.
    pub async fn update_invoice(
        &self,
        supplier_id: Uuid,
        pi_id: Uuid,
        actor_email: &str,
        input: UpdateInvoiceInput,
    ) -> AppResult<InvoiceWithItems> {
        if let Some(name) = input.buyer_name.as_deref() {
            validate_buyer_name(name).map_err(|msg| AppError::Validation {
                field: "buyer_name".to_string(),
                message: msg.to_string(),
            })?;
        }
        if let Some(items) = &input.items {
            validate_invoice_items(items).map_err(|msg| AppError::Validation {
                field: "items".to_string(),
                message: msg.to_string(),
            })?;
        }
        let status = parse_invoice_status(input.status.as_deref())?;
        let payment_status = parse_payment_status(input.payment_status.as_deref())?;

        let mut tx = self.db.begin().await?;

        let existing: ProformaInvoice = sqlx::query_as(&format!(
            "SELECT {} FROM proforma_invoices WHERE id = $1 AND supplier_id = $2",
            INVOICE_COLUMNS
        ))
        .bind(pi_id)
        .bind(supplier_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Proforma invoice".to_string()))?;

        let buyer_name = input
            .buyer_name
            .clone()
            .unwrap_or_else(|| existing.buyer_name.clone());

        let subtotal = match &input.items {
            Some(items) => {
                sqlx::query("DELETE FROM proforma_invoice_items WHERE pi_id = $1")
                    .bind(pi_id)
                    .execute(&mut *tx)
                    .await?;
                let subtotal = invoice_subtotal(items);
                insert_invoice_items(&mut tx, pi_id, items).await?;
                subtotal
            }
            None => existing.subtotal,
        };

        let currently_applied: Vec<Uuid> = sqlx::query_scalar(
            "SELECT credit_id FROM credit_applications WHERE pi_id = $1 ORDER BY id",
        )
        .bind(pi_id)
        .fetch_all(&mut *tx)
        .await?;

        let credit_discount = match &input.applied_credits {
            Some(requested) => {
                let records = fetch_credit_records(&mut tx, supplier_id, requested).await?;
                let plan = plan_credit_replacement(
                    subtotal,
                    &buyer_name,
                    &currently_applied,
                    requested,
                    &records,
                )
                .map_err(|e| credit_set_error(e, &buyer_name))?;
                reverse_credits(&mut tx, pi_id).await?;
                apply_credits(&mut tx, pi_id, requested).await?;
                plan.credit_discount
            }
            None => {
                // A buyer rename must leave the existing applications
                // valid; re-plan the kept set against the new name.
                if buyer_name != existing.buyer_name && !currently_applied.is_empty() {
                    let kept: Vec<AppliedCreditInput> = sqlx::query_as::<_, (Uuid, Decimal)>(
                        "SELECT credit_id, amount FROM credit_applications \
                         WHERE pi_id = $1 ORDER BY id",
                    )
                    .bind(pi_id)
                    .fetch_all(&mut *tx)
                    .await?
                    .into_iter()
                    .map(|(credit_id, amount)| AppliedCreditInput { credit_id, amount })
                    .collect();
                    let records = fetch_credit_records(&mut tx, supplier_id, &kept).await?;
                    plan_credit_replacement(
                        subtotal,
                        &buyer_name,
                        &currently_applied,
                        &kept,
                        &records,
                    )
                    .map_err(|e| credit_set_error(e, &buyer_name))?;
                }
                existing.credit_discount
            }
        };

        let total_amount = invoice_total(subtotal, credit_discount);

        let invoice: ProformaInvoice = sqlx::query_as(&format!(
            r#"
            UPDATE proforma_invoices
            SET buyer_name = $1, buyer_email = $2, buyer_country = $3, valid_until = $4,
                subtotal = $5, credit_discount = $6, total_amount = $7, currency = $8,
                incoterms = $9, payment_method = $10, remarks = $11, status = $12,
                payment_status = $13, updated_at = NOW()
            WHERE id = $14
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(&buyer_name)
        .bind(input.buyer_email.or(existing.buyer_email))
        .bind(input.buyer_country.or(existing.buyer_country))
        .bind(input.valid_until.or(existing.valid_until))
        .bind(subtotal)
        .bind(credit_discount)
        .bind(total_amount)
        .bind(input.currency.unwrap_or(existing.currency))
        .bind(input.incoterms.or(existing.incoterms))
        .bind(input.payment_method.or(existing.payment_method))
        .bind(input.remarks.or(existing.remarks))
        .bind(status.map(|s| s.as_str().to_string()).unwrap_or(existing.status))
        .bind(
            payment_status
                .map(|s| s.as_str().to_string())
                .unwrap_or(existing.payment_status),
        )
        .bind(pi_id)
        .fetch_one(&mut *tx)
        .await?;

        let items: Vec<InvoiceItem> = sqlx::query_as(&format!(
            "SELECT {} FROM proforma_invoice_items WHERE pi_id = $1 ORDER BY id",
            INVOICE_ITEM_COLUMNS
        ))
        .bind(pi_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        self.activity
            .log(LogActivity {
                supplier_id,
                actor_email: actor_email.to_string(),
                action_type: "pi.update".to_string(),
                category: "pi".to_string(),
                description: Some(format!("updated PI #{}", invoice.pi_number)),
                target_id: Some(pi_id),
                target_name: Some(invoice.pi_number.clone()),
            })
            .await;

        Ok(InvoiceWithItems { invoice, items })
    }

    /// Transition a proforma invoice to sent
    pub async fn send_invoice(
        &self,
        supplier_id: Uuid,
        pi_id: Uuid,
        actor_email: &str,
    ) -> AppResult<InvoiceWithItems> {
        let invoice = self
            .update_invoice(
                supplier_id,
                pi_id,
                actor_email,
                UpdateInvoiceInput {
                    status: Some(InvoiceStatus::Sent.as_str().to_string()),
                    ..Default::default()
                },
            )
            .await?;

        self.activity
            .log(LogActivity {
                supplier_id,
                actor_email: actor_email.to_string(),
                action_type: "pi.send".to_string(),
                category: "pi".to_string(),
                description: Some(format!("sent PI #{}", invoice.invoice.pi_number)),
                target_id: Some(pi_id),
                target_name: Some(invoice.invoice.pi_number.clone()),
            })
            .await;

        Ok(invoice)
    }

    /// Delete a proforma invoice. All credit applications are reversed
    /// first; item rows cascade with the invoice row.
    pub async fn delete_invoice(
        &self,
        supplier_id: Uuid,
        pi_id: Uuid,
        actor_email: &str,
    ) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let existing: ProformaInvoice = sqlx::query_as(&format!(
            "SELECT {} FROM proforma_invoices WHERE id = $1 AND supplier_id = $2",
            INVOICE_COLUMNS
        ))
        .bind(pi_id)
        .bind(supplier_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Proforma invoice".to_string()))?;

        reverse_credits(&mut tx, pi_id).await?;

        sqlx::query("DELETE FROM proforma_invoices WHERE id = $1")
            .bind(pi_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.activity
            .log(LogActivity {
                supplier_id,
                actor_email: actor_email.to_string(),
                action_type: "pi.delete".to_string(),
                category: "pi".to_string(),
                description: Some(format!("deleted PI #{}", existing.pi_number)),
                target_id: Some(pi_id),
                target_name: Some(existing.pi_number),
            })
            .await;

        Ok(())
    }
}

fn parse_invoice_status(status: Option<&str>) -> AppResult<Option<InvoiceStatus>> {
    match status {
        Some(s) => InvoiceStatus::from_str(s)
            .map(Some)
            .ok_or_else(|| AppError::Validation {
                field: "status".to_string(),
                message: "Invalid invoice status".to_string(),
            }),
        None => Ok(None),
    }
}

fn parse_payment_status(status: Option<&str>) -> AppResult<Option<PaymentStatus>> {
    match status {
        Some(s) => PaymentStatus::from_str(s)
            .map(Some)
            .ok_or_else(|| AppError::Validation {
                field: "payment_status".to_string(),
                message: "Invalid payment status".to_string(),
            }),
        None => Ok(None),
    }
}

async fn insert_invoice_items(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    pi_id: Uuid,
    items: &[InvoiceItemInput],
) -> AppResult<Vec<InvoiceItem>> {
    let mut inserted = Vec::with_capacity(items.len());
    for item in items {
        let row: InvoiceItem = sqlx::query_as(&format!(
            r#"
            INSERT INTO proforma_invoice_items
                (pi_id, product_id, product_name, product_sku, quantity, unit, unit_price, subtotal)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            INVOICE_ITEM_COLUMNS
        ))
        .bind(pi_id)
        .bind(item.product_id)
        .bind(&item.product_name)
        .bind(&item.product_sku)
        .bind(item.quantity)
        .bind(item.unit.as_deref().unwrap_or("pcs"))
        .bind(item.unit_price)
        .bind(item.line_total())
        .fetch_one(&mut **tx)
        .await?;
        inserted.push(row);
    }
    Ok(inserted)
}

/// Read the current state of every credit a requested set references.
/// Rows missing for this supplier simply do not appear; the planner
/// reports them as unavailable.
async fn fetch_credit_records(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    supplier_id: Uuid,
    requested: &[AppliedCreditInput],
) -> AppResult<Vec<CreditRecord>> {
    let mut records = Vec::with_capacity(requested.len());
    for ac in requested {
        let row: Option<(String, Decimal, String, String)> = sqlx::query_as(
            "SELECT credit_number, amount, buyer_name, status FROM credits \
             WHERE id = $1 AND supplier_id = $2",
        )
        .bind(ac.credit_id)
        .bind(supplier_id)
        .fetch_optional(&mut **tx)
        .await?;

        if let Some((credit_number, amount, buyer_name, status)) = row {
            records.push(CreditRecord {
                credit_id: ac.credit_id,
                credit_number,
                amount,
                buyer_name,
                status,
            });
        }
    }
    Ok(records)
}

fn credit_set_error(error: CreditSetError, invoice_buyer: &str) -> AppError {
    AppError::ValidationError(match error {
        CreditSetError::Duplicate(id) => format!("Credit {} is listed more than once", id),
        CreditSetError::Unknown(id) => {
            format!("Credit {} is not available for application", id)
        }
        CreditSetError::Application {
            credit_number,
            reason,
        } => match reason {
            CreditApplicationError::NotApproved => {
                format!("Credit {} is not available for application", credit_number)
            }
            CreditApplicationError::AmountExceeded => {
                format!("Applied amount exceeds credit {} amount", credit_number)
            }
            CreditApplicationError::BuyerMismatch => {
                format!(
                    "Credit {} does not belong to buyer {}",
                    credit_number, invoice_buyer
                )
            }
            CreditApplicationError::NegativeAmount => {
                format!(
                    "Applied amount for credit {} cannot be negative",
                    credit_number
                )
            }
        },
    })
}

/// Record the applications and mark each credit used
async fn apply_credits(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    pi_id: Uuid,
    applied: &[AppliedCreditInput],
) -> AppResult<()> {
    for ac in applied {
        sqlx::query("INSERT INTO credit_applications (credit_id, pi_id, amount) VALUES ($1, $2, $3)")
            .bind(ac.credit_id)
            .bind(pi_id)
            .bind(ac.amount)
            .execute(&mut **tx)
            .await?;

        sqlx::query(
            "UPDATE credits SET status = 'used', applied_to_pi_id = $1, updated_at = NOW() \
             WHERE id = $2",
        )
        .bind(pi_id)
        .bind(ac.credit_id)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Reverse every application for an invoice: credits revert to approved
/// and are unlinked, then the application rows are removed
async fn reverse_credits(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    pi_id: Uuid,
) -> AppResult<()> {
    sqlx::query(
        "UPDATE credits SET status = 'approved', applied_to_pi_id = NULL, updated_at = NOW() \
         WHERE id IN (SELECT credit_id FROM credit_applications WHERE pi_id = $1)",
    )
    .bind(pi_id)
    .execute(&mut **tx)
    .await?;

    sqlx::query("DELETE FROM credit_applications WHERE pi_id = $1")
        .bind(pi_id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}
