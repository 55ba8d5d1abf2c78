//! Tests for proforma invoice amount rules and credit application
//!
//! total_amount = max(0, subtotal - credit_discount), and a credit may
//! only be applied when it is approved, the applied amount fits within
//! the credit, and the buyer matches the invoice.

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::models::{AppliedCreditInput, InvoiceItemInput};
use shared::validation::{
    invoice_subtotal, invoice_total, plan_credit_replacement, validate_credit_application,
    validate_invoice_items, CreditApplicationError, CreditRecord, CreditSetError,
};
use uuid::Uuid;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn item(name: &str, quantity: i32, unit_price: &str) -> InvoiceItemInput {
    InvoiceItemInput {
        product_id: None,
        product_name: name.to_string(),
        product_sku: None,
        quantity,
        unit: None,
        unit_price: dec(unit_price),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

mod amounts {
    use super::*;

    #[test]
    fn total_is_subtotal_minus_discount() {
        assert_eq!(invoice_total(dec("100.00"), dec("30.00")), dec("70.00"));
    }

    #[test]
    fn total_clamps_at_zero_when_discount_exceeds_subtotal() {
        assert_eq!(invoice_total(dec("50.00"), dec("80.00")), Decimal::ZERO);
    }

    #[test]
    fn zero_discount_leaves_the_subtotal_untouched() {
        assert_eq!(invoice_total(dec("42.42"), Decimal::ZERO), dec("42.42"));
    }

    #[test]
    fn subtotal_sums_line_totals() {
        let items = vec![item("Beans", 10, "8.00"), item("Bags", 100, "0.15")];
        assert_eq!(invoice_subtotal(&items), dec("95.00"));
        assert!(validate_invoice_items(&items).is_ok());
    }
}

mod credit_application {
    use super::*;

    #[test]
    fn approved_matching_credit_within_amount_is_accepted() {
        let result =
            validate_credit_application("approved", dec("50.00"), "Acme", dec("50.00"), "Acme");
        assert!(result.is_ok());
    }

    #[test]
    fn draft_credit_is_rejected() {
        let result =
            validate_credit_application("draft", dec("50.00"), "Acme", dec("10.00"), "Acme");
        assert_eq!(result, Err(CreditApplicationError::NotApproved));
    }

    #[test]
    fn used_credit_is_rejected() {
        let result =
            validate_credit_application("used", dec("50.00"), "Acme", dec("10.00"), "Acme");
        assert_eq!(result, Err(CreditApplicationError::NotApproved));
    }

    #[test]
    fn applied_amount_beyond_the_credit_is_rejected() {
        let result =
            validate_credit_application("approved", dec("50.00"), "Acme", dec("50.01"), "Acme");
        assert_eq!(result, Err(CreditApplicationError::AmountExceeded));
    }

    #[test]
    fn buyer_mismatch_is_rejected() {
        let result =
            validate_credit_application("approved", dec("50.00"), "Acme", dec("10.00"), "Globex");
        assert_eq!(result, Err(CreditApplicationError::BuyerMismatch));
    }

    #[test]
    fn negative_applied_amount_is_rejected() {
        let result =
            validate_credit_application("approved", dec("50.00"), "Acme", dec("-1.00"), "Acme");
        assert_eq!(result, Err(CreditApplicationError::NegativeAmount));
    }
}

mod credit_set_replacement {
    use super::*;

    fn record(id: Uuid, number: &str, amount: &str, buyer: &str, status: &str) -> CreditRecord {
        CreditRecord {
            credit_id: id,
            credit_number: number.to_string(),
            amount: dec(amount),
            buyer_name: buyer.to_string(),
            status: status.to_string(),
        }
    }

    fn applied(id: Uuid, amount: &str) -> AppliedCreditInput {
        AppliedCreditInput {
            credit_id: id,
            amount: dec(amount),
        }
    }

    #[test]
    fn empty_set_reverses_everything_and_zeroes_the_discount() {
        let c1 = Uuid::new_v4();
        let c2 = Uuid::new_v4();
        let plan =
            plan_credit_replacement(dec("100.00"), "Acme", &[c1, c2], &[], &[]).unwrap();
        assert_eq!(plan.reversed_credit_ids, vec![c1, c2]);
        assert_eq!(plan.credit_discount, Decimal::ZERO);
        assert_eq!(plan.total_amount, dec("100.00"));
    }

    #[test]
    fn credit_used_by_this_invoice_can_be_kept() {
        // Reversal precedes validation, so the kept credit counts as
        // approved again even though the store still says used.
        let c1 = Uuid::new_v4();
        let credits = [record(c1, "CR-2026-001", "30.00", "Acme", "used")];
        let plan = plan_credit_replacement(
            dec("100.00"),
            "Acme",
            &[c1],
            &[applied(c1, "30.00")],
            &credits,
        )
        .unwrap();
        assert_eq!(plan.credit_discount, dec("30.00"));
        assert_eq!(plan.total_amount, dec("70.00"));
        assert_eq!(plan.reversed_credit_ids, vec![c1]);
    }

    #[test]
    fn credit_used_by_another_invoice_is_rejected() {
        let c1 = Uuid::new_v4();
        let credits = [record(c1, "CR-2026-001", "30.00", "Acme", "used")];
        let result =
            plan_credit_replacement(dec("100.00"), "Acme", &[], &[applied(c1, "30.00")], &credits);
        assert_eq!(
            result,
            Err(CreditSetError::Application {
                credit_number: "CR-2026-001".to_string(),
                reason: CreditApplicationError::NotApproved,
            })
        );
    }

    #[test]
    fn duplicate_credit_ids_are_rejected() {
        let c1 = Uuid::new_v4();
        let credits = [record(c1, "CR-2026-001", "30.00", "Acme", "approved")];
        let result = plan_credit_replacement(
            dec("100.00"),
            "Acme",
            &[],
            &[applied(c1, "10.00"), applied(c1, "10.00")],
            &credits,
        );
        assert_eq!(result, Err(CreditSetError::Duplicate(c1)));
    }

    #[test]
    fn unknown_credit_id_is_rejected() {
        let c1 = Uuid::new_v4();
        let result =
            plan_credit_replacement(dec("100.00"), "Acme", &[], &[applied(c1, "10.00")], &[]);
        assert_eq!(result, Err(CreditSetError::Unknown(c1)));
    }

    #[test]
    fn buyer_rename_invalidates_the_kept_applications() {
        // Renaming the invoice buyer re-plans the kept set against the
        // new name; a credit granted to the old buyer fails the plan.
        let c1 = Uuid::new_v4();
        let credits = [record(c1, "CR-2026-001", "30.00", "Acme", "used")];
        let result = plan_credit_replacement(
            dec("100.00"),
            "Globex",
            &[c1],
            &[applied(c1, "30.00")],
            &credits,
        );
        assert_eq!(
            result,
            Err(CreditSetError::Application {
                credit_number: "CR-2026-001".to_string(),
                reason: CreditApplicationError::BuyerMismatch,
            })
        );
    }

    #[test]
    fn application_then_removal_restores_the_full_total() {
        // An approved 30.00 credit against a 100.00 invoice, then the
        // set replaced with nothing.
        let c1 = Uuid::new_v4();
        let credits = [record(c1, "CR-2026-001", "30.00", "Acme", "approved")];
        let plan =
            plan_credit_replacement(dec("100.00"), "Acme", &[], &[applied(c1, "30.00")], &credits)
                .unwrap();
        assert_eq!(plan.credit_discount, dec("30.00"));
        assert_eq!(plan.total_amount, dec("70.00"));

        let reversal = plan_credit_replacement(dec("100.00"), "Acme", &[c1], &[], &[]).unwrap();
        assert_eq!(reversal.reversed_credit_ids, vec![c1]);
        assert_eq!(reversal.credit_discount, Decimal::ZERO);
        assert_eq!(reversal.total_amount, dec("100.00"));
    }

    #[test]
    fn cross_buyer_application_is_rejected() {
        let c1 = Uuid::new_v4();
        let credits = [record(c1, "CR-2026-001", "30.00", "Acme", "approved")];
        let result = plan_credit_replacement(
            dec("100.00"),
            "Globex",
            &[],
            &[applied(c1, "30.00")],
            &credits,
        );
        assert!(matches!(
            result,
            Err(CreditSetError::Application {
                reason: CreditApplicationError::BuyerMismatch,
                ..
            })
        ));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// The invoice total is never negative, whatever the discount
    #[test]
    fn prop_total_never_negative(
        subtotal_cents in 0i64..10_000_000,
        discount_cents in 0i64..10_000_000,
    ) {
        let subtotal = Decimal::new(subtotal_cents, 2);
        let discount = Decimal::new(discount_cents, 2);
        let total = invoice_total(subtotal, discount);
        prop_assert!(total >= Decimal::ZERO);
        prop_assert!(total <= subtotal);
    }

    /// Replacing the applied-credit set with nothing always reverses
    /// every application and restores the full subtotal
    #[test]
    fn prop_empty_replacement_restores_the_subtotal(
        subtotal_cents in 0i64..10_000_000,
        n in 0usize..6,
    ) {
        let subtotal = Decimal::new(subtotal_cents, 2);
        let current: Vec<Uuid> = (0..n).map(|_| Uuid::new_v4()).collect();
        let plan = plan_credit_replacement(subtotal, "Acme", &current, &[], &[]).unwrap();
        prop_assert_eq!(plan.reversed_credit_ids, current);
        prop_assert_eq!(plan.credit_discount, Decimal::ZERO);
        prop_assert_eq!(plan.total_amount, subtotal);
    }

    /// An accepted application never exceeds the credit amount
    #[test]
    fn prop_accepted_application_is_bounded(
        credit_cents in 0i64..1_000_000,
        applied_cents in 0i64..1_000_000,
    ) {
        let credit = Decimal::new(credit_cents, 2);
        let applied = Decimal::new(applied_cents, 2);
        let result = validate_credit_application("approved", credit, "Acme", applied, "Acme");
        if result.is_ok() {
            prop_assert!(applied <= credit);
        } else {
            prop_assert_eq!(result, Err(CreditApplicationError::AmountExceeded));
            prop_assert!(applied > credit);
        }
    }
}
