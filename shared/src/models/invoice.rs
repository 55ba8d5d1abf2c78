//! Proforma invoice models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Proforma invoice lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(InvoiceStatus::Draft),
            "sent" => Some(InvoiceStatus::Sent),
            "cancelled" => Some(InvoiceStatus::Cancelled),
            _ => None,
        }
    }
}

/// Payment status of a proforma invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Partial,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Partial => "partial",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "unpaid" => Some(PaymentStatus::Unpaid),
            "paid" => Some(PaymentStatus::Paid),
            "partial" => Some(PaymentStatus::Partial),
            _ => None,
        }
    }
}

/// A proforma invoice line item as submitted by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceItemInput {
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub product_sku: Option<String>,
    pub quantity: i32,
    pub unit: Option<String>,
    pub unit_price: Decimal,
}

impl InvoiceItemInput {
    /// quantity x unit price
    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }
}

/// A credit to apply against an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedCreditInput {
    pub credit_id: Uuid,
    pub amount: Decimal,
}

/// Input for creating a proforma invoice
#[derive(Debug, Clone, Deserialize)]
pub struct CreateInvoiceInput {
    pub po_number: Option<String>,
    pub order_id: Option<Uuid>,
    pub buyer_name: String,
    pub buyer_email: Option<String>,
    pub buyer_country: Option<String>,
    pub pi_date: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub currency: Option<String>,
    pub incoterms: Option<String>,
    pub payment_method: Option<String>,
    pub remarks: Option<String>,
    pub status: Option<String>,
    pub items: Vec<InvoiceItemInput>,
    pub applied_credits: Option<Vec<AppliedCreditInput>>,
}

/// Input for updating a proforma invoice. Absent fields are left
/// untouched. A provided `items` array replaces the item set wholesale;
/// a provided `applied_credits` array (even empty) reverses all existing
/// credit applications before applying the new set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateInvoiceInput {
    pub buyer_name: Option<String>,
    pub buyer_email: Option<String>,
    pub buyer_country: Option<String>,
    pub valid_until: Option<NaiveDate>,
    pub currency: Option<String>,
    pub incoterms: Option<String>,
    pub payment_method: Option<String>,
    pub remarks: Option<String>,
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub items: Option<Vec<InvoiceItemInput>>,
    pub applied_credits: Option<Vec<AppliedCreditInput>>,
}
