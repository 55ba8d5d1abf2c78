//! Document number generation against the store
//!
//! Read-then-increment with no lock: two concurrent creates for the same
//! supplier and year can read the same maximum. The unique index on
//! (supplier_id, number) is what catches the losing side, surfacing as a
//! duplicate-entry conflict the caller may retry.

use chrono::{Datelike, Utc};
use uuid::Uuid;

use crate::error::AppResult;
use shared::numbering::{format_number, next_sequence, year_prefix, DocumentKind};

fn table_and_column(kind: DocumentKind) -> (&'static str, &'static str) {
    match kind {
        DocumentKind::PurchaseOrder => ("orders", "po_number"),
        DocumentKind::ProformaInvoice => ("proforma_invoices", "pi_number"),
        DocumentKind::Credit => ("credits", "credit_number"),
    }
}

/// Next unused document number for a supplier and kind in the current
/// calendar year. Numbers with a non-numeric suffix are ignored.
pub async fn next_document_number<'e, E>(
    executor: E,
    supplier_id: Uuid,
    kind: DocumentKind,
) -> AppResult<String>
where
    E: sqlx::PgExecutor<'e>,
{
    let year = Utc::now().year();
    let prefix = year_prefix(kind, year);
    let (table, column) = table_and_column(kind);

    let existing: Vec<String> = sqlx::query_scalar(&format!(
        "SELECT {} FROM {} WHERE supplier_id = $1 AND {} LIKE $2",
        column, table, column
    ))
    .bind(supplier_id)
    .bind(format!("{}%", prefix))
    .fetch_all(executor)
    .await?;

    Ok(format_number(kind, year, next_sequence(&existing, &prefix)))
}
