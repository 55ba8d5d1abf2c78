//! Validation rules and derived-amount arithmetic for trade documents

use rust_decimal::Decimal;
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    AppliedCreditInput, CreditStatus, InvoiceItemInput, OrderItemInput, UpdateCreditInput,
};

// ============================================================================
// Line items and totals
// ============================================================================

/// Validate a buyer name is present
pub fn validate_buyer_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Buyer name cannot be empty");
    }
    Ok(())
}

/// Validate a purchase order item set: at least one item, each with a
/// product name, quantity >= 1, and a non-negative unit price.
pub fn validate_order_items(items: &[OrderItemInput]) -> Result<(), &'static str> {
    if items.is_empty() {
        return Err("At least one line item is required");
    }
    for item in items {
        if item.product_name.trim().is_empty() {
            return Err("Item product name cannot be empty");
        }
        if item.quantity < 1 {
            return Err("Item quantity must be at least 1");
        }
        if item.unit_price < Decimal::ZERO {
            return Err("Item unit price cannot be negative");
        }
    }
    Ok(())
}

/// Validate a proforma invoice item set, same rules as order items.
pub fn validate_invoice_items(items: &[InvoiceItemInput]) -> Result<(), &'static str> {
    if items.is_empty() {
        return Err("At least one line item is required");
    }
    for item in items {
        if item.product_name.trim().is_empty() {
            return Err("Item product name cannot be empty");
        }
        if item.quantity < 1 {
            return Err("Item quantity must be at least 1");
        }
        if item.unit_price < Decimal::ZERO {
            return Err("Item unit price cannot be negative");
        }
    }
    Ok(())
}

/// Purchase order total: sum of line totals
pub fn order_total(items: &[OrderItemInput]) -> Decimal {
    items.iter().map(|i| i.line_total()).sum()
}

/// Proforma invoice subtotal: sum of line totals
pub fn invoice_subtotal(items: &[InvoiceItemInput]) -> Decimal {
    items.iter().map(|i| i.line_total()).sum()
}

/// Invoice total after credit discount, clamped at zero
pub fn invoice_total(subtotal: Decimal, credit_discount: Decimal) -> Decimal {
    (subtotal - credit_discount).max(Decimal::ZERO)
}

// ============================================================================
// Credit application
// ============================================================================

/// Why a credit cannot be applied to an invoice
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreditApplicationError {
    #[error("credit is not approved")]
    NotApproved,
    #[error("applied amount exceeds the credit amount")]
    AmountExceeded,
    #[error("credit belongs to a different buyer")]
    BuyerMismatch,
    #[error("applied amount cannot be negative")]
    NegativeAmount,
}

/// Check that a credit may be applied against an invoice: the credit must
/// be approved, the applied amount bounded by the credit amount, and the
/// buyer names must match. Violations are hard failures, never clamped.
pub fn validate_credit_application(
    credit_status: &str,
    credit_amount: Decimal,
    credit_buyer: &str,
    applied_amount: Decimal,
    invoice_buyer: &str,
) -> Result<(), CreditApplicationError> {
    if CreditStatus::from_str(credit_status) != Some(CreditStatus::Approved) {
        return Err(CreditApplicationError::NotApproved);
    }
    if applied_amount < Decimal::ZERO {
        return Err(CreditApplicationError::NegativeAmount);
    }
    if applied_amount > credit_amount {
        return Err(CreditApplicationError::AmountExceeded);
    }
    if credit_buyer != invoice_buyer {
        return Err(CreditApplicationError::BuyerMismatch);
    }
    Ok(())
}

/// Gate edits to an existing credit. A used credit admits exactly one
/// kind of patch: a status change away from `used`, touching nothing
/// else. No credit may be patched *to* `used` directly; that transition
/// only happens through invoice application.
pub fn validate_credit_patch(
    current_status: &str,
    patch: &UpdateCreditInput,
) -> Result<(), &'static str> {
    if CreditStatus::from_str(current_status) != Some(CreditStatus::Used) {
        if patch.status.as_deref() == Some("used") {
            return Err("A credit becomes used only by applying it to an invoice.");
        }
        return Ok(());
    }
    if patch.touches_content() {
        return Err("Cannot modify a used credit. Reverse the invoice application first.");
    }
    match patch.status.as_deref() {
        Some(s) if CreditStatus::from_str(s).is_some() && s != "used" => Ok(()),
        _ => Err("Cannot modify a used credit. Reverse the invoice application first."),
    }
}

// ============================================================================
// Credit set replacement
// ============================================================================

/// A credit as read from the store when planning an application set
#[derive(Debug, Clone)]
pub struct CreditRecord {
    pub credit_id: Uuid,
    pub credit_number: String,
    pub amount: Decimal,
    pub buyer_name: String,
    pub status: String,
}

/// Why a requested applied-credit set cannot replace the current one
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreditSetError {
    #[error("credit {0} is listed more than once")]
    Duplicate(Uuid),
    #[error("credit {0} is not available for application")]
    Unknown(Uuid),
    #[error("credit {credit_number}: {reason}")]
    Application {
        credit_number: String,
        reason: CreditApplicationError,
    },
}

/// The planned outcome of replacing an invoice's applied-credit set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditSetReplacement {
    pub reversed_credit_ids: Vec<Uuid>,
    pub credit_discount: Decimal,
    pub total_amount: Decimal,
}

/// Plan the wholesale replacement of an invoice's applied-credit set.
///
/// Every currently applied credit is reversed (back to approved,
/// unlinked), whether or not the requested set keeps it. Reversal
/// precedes validation, so a credit used by this very invoice counts as
/// approved when the requested set references it again; a credit used by
/// another invoice does not. An empty requested set reverses everything
/// and zeroes the discount. Planning performs no mutation; the caller
/// applies the outcome or none of it.
pub fn plan_credit_replacement(
    subtotal: Decimal,
    invoice_buyer: &str,
    currently_applied: &[Uuid],
    requested: &[AppliedCreditInput],
    credits: &[CreditRecord],
) -> Result<CreditSetReplacement, CreditSetError> {
    let mut seen = HashSet::new();
    let mut discount = Decimal::ZERO;

    for req in requested {
        if !seen.insert(req.credit_id) {
            return Err(CreditSetError::Duplicate(req.credit_id));
        }
        let record = credits
            .iter()
            .find(|c| c.credit_id == req.credit_id)
            .ok_or(CreditSetError::Unknown(req.credit_id))?;

        let effective_status =
            if record.status == "used" && currently_applied.contains(&req.credit_id) {
                "approved"
            } else {
                record.status.as_str()
            };

        validate_credit_application(
            effective_status,
            record.amount,
            &record.buyer_name,
            req.amount,
            invoice_buyer,
        )
        .map_err(|reason| CreditSetError::Application {
            credit_number: record.credit_number.clone(),
            reason,
        })?;

        discount += req.amount;
    }

    Ok(CreditSetReplacement {
        reversed_credit_ids: currently_applied.to_vec(),
        credit_discount: discount,
        total_amount: invoice_total(subtotal, discount),
    })
}
