//! Tests for purchase order domain rules
//!
//! The stored total always equals the sum of item line totals, and item
//! sets are validated before any write happens.

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::models::{OrderItemInput, OrderStatus};
use shared::validation::{order_total, validate_buyer_name, validate_order_items};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn item(name: &str, quantity: i32, unit_price: &str) -> OrderItemInput {
    OrderItemInput {
        product_id: None,
        product_name: name.to_string(),
        quantity,
        unit: None,
        unit_price: dec(unit_price),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

mod totals {
    use super::*;

    #[test]
    fn total_is_the_sum_of_line_totals() {
        let items = vec![item("Widget", 3, "10.50"), item("Gadget", 2, "4.25")];
        assert_eq!(order_total(&items), dec("40.00"));
    }

    #[test]
    fn line_total_multiplies_quantity_by_unit_price() {
        let it = item("Widget", 7, "1.99");
        assert_eq!(it.line_total(), dec("13.93"));
    }

    #[test]
    fn item_replacement_recomputes_the_total() {
        let items = vec![item("Olive Oil", 10, "5")];
        assert_eq!(order_total(&items), dec("50"));

        let replaced = vec![item("Olive Oil", 20, "5")];
        assert_eq!(order_total(&replaced), dec("100"));
    }

    #[test]
    fn zero_priced_items_are_allowed() {
        let items = vec![item("Sample", 5, "0")];
        assert!(validate_order_items(&items).is_ok());
        assert_eq!(order_total(&items), Decimal::ZERO);
    }
}

mod validation {
    use super::*;

    #[test]
    fn rejects_an_empty_item_set() {
        assert!(validate_order_items(&[]).is_err());
    }

    #[test]
    fn rejects_zero_quantity() {
        let items = vec![item("Widget", 0, "10.00")];
        assert!(validate_order_items(&items).is_err());
    }

    #[test]
    fn rejects_negative_unit_price() {
        let items = vec![item("Widget", 1, "-0.01")];
        assert!(validate_order_items(&items).is_err());
    }

    #[test]
    fn rejects_blank_product_name() {
        let items = vec![item("   ", 1, "10.00")];
        assert!(validate_order_items(&items).is_err());
    }

    #[test]
    fn rejects_blank_buyer_name() {
        assert!(validate_buyer_name("").is_err());
        assert!(validate_buyer_name("  ").is_err());
        assert!(validate_buyer_name("Acme Imports").is_ok());
    }
}

mod statuses {
    use super::*;

    #[test]
    fn known_statuses_round_trip() {
        for s in ["pending", "confirmed", "cancelled"] {
            let parsed = OrderStatus::from_str(s).unwrap();
            assert_eq!(parsed.as_str(), s);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(OrderStatus::from_str("shipped").is_none());
        assert!(OrderStatus::from_str("CONFIRMED").is_none());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

fn item_strategy() -> impl Strategy<Value = OrderItemInput> {
    ("[a-z]{1,12}", 1i32..1000, 0i64..100_000).prop_map(|(name, quantity, cents)| OrderItemInput {
        product_id: None,
        product_name: name,
        quantity,
        unit: None,
        unit_price: Decimal::new(cents, 2),
    })
}

proptest! {
    /// The order total equals the sum of every item's line total
    #[test]
    fn prop_total_matches_item_sum(items in proptest::collection::vec(item_strategy(), 1..10)) {
        let expected: Decimal = items.iter().map(|i| i.line_total()).sum();
        prop_assert_eq!(order_total(&items), expected);
        prop_assert!(validate_order_items(&items).is_ok());
    }

    /// Valid item sets never produce a negative total
    #[test]
    fn prop_total_is_never_negative(items in proptest::collection::vec(item_strategy(), 1..10)) {
        prop_assert!(order_total(&items) >= Decimal::ZERO);
    }
}
