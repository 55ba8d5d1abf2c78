//! Credit models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Credit lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditStatus {
    Draft,
    Approved,
    Used,
    Cancelled,
}

impl CreditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditStatus::Draft => "draft",
            CreditStatus::Approved => "approved",
            CreditStatus::Used => "used",
            CreditStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(CreditStatus::Draft),
            "approved" => Some(CreditStatus::Approved),
            "used" => Some(CreditStatus::Used),
            "cancelled" => Some(CreditStatus::Cancelled),
            _ => None,
        }
    }
}

/// Why the credit was granted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditReason {
    Damaged,
    Quality,
    Short,
    Wrong,
    Expired,
    Other,
}

impl CreditReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditReason::Damaged => "damaged",
            CreditReason::Quality => "quality",
            CreditReason::Short => "short",
            CreditReason::Wrong => "wrong",
            CreditReason::Expired => "expired",
            CreditReason::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "damaged" => Some(CreditReason::Damaged),
            "quality" => Some(CreditReason::Quality),
            "short" => Some(CreditReason::Short),
            "wrong" => Some(CreditReason::Wrong),
            "expired" => Some(CreditReason::Expired),
            "other" => Some(CreditReason::Other),
            _ => None,
        }
    }
}

/// Input for creating a credit
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCreditInput {
    pub invoice_number: Option<String>,
    pub invoice_id: Option<Uuid>,
    pub buyer_name: String,
    pub product_name: Option<String>,
    pub product_sku: Option<String>,
    pub reason: String,
    pub affected_quantity: Option<i32>,
    pub amount: Decimal,
    pub description: Option<String>,
    pub status: Option<String>,
}

/// Input for updating a credit. A used credit admits no patch except a
/// status change away from `used`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCreditInput {
    pub invoice_number: Option<String>,
    pub buyer_name: Option<String>,
    pub product_name: Option<String>,
    pub product_sku: Option<String>,
    pub reason: Option<String>,
    pub affected_quantity: Option<i32>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub status: Option<String>,
}

impl UpdateCreditInput {
    /// True when the patch touches anything besides `status`.
    pub fn touches_content(&self) -> bool {
        self.invoice_number.is_some()
            || self.buyer_name.is_some()
            || self.product_name.is_some()
            || self.product_sku.is_some()
            || self.reason.is_some()
            || self.affected_quantity.is_some()
            || self.amount.is_some()
            || self.description.is_some()
    }
}
