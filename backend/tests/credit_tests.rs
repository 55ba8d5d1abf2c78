//! Tests for credit note edit rules
//!
//! A used credit is locked: its content may not change, and the only
//! status change it accepts is one away from `used`.

use rust_decimal::Decimal;
use shared::models::{CreditReason, CreditStatus, UpdateCreditInput};
use shared::validation::validate_credit_patch;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

mod used_credit_lock {
    use super::*;

    #[test]
    fn content_edits_on_a_used_credit_are_rejected() {
        let patch = UpdateCreditInput {
            amount: Some(dec("99.00")),
            ..Default::default()
        };
        assert!(validate_credit_patch("used", &patch).is_err());
    }

    #[test]
    fn buyer_change_on_a_used_credit_is_rejected() {
        let patch = UpdateCreditInput {
            buyer_name: Some("Globex".to_string()),
            ..Default::default()
        };
        assert!(validate_credit_patch("used", &patch).is_err());
    }

    #[test]
    fn status_change_away_from_used_is_allowed() {
        for target in ["draft", "approved", "cancelled"] {
            let patch = UpdateCreditInput {
                status: Some(target.to_string()),
                ..Default::default()
            };
            assert!(validate_credit_patch("used", &patch).is_ok());
        }
    }

    #[test]
    fn restating_used_is_rejected() {
        let patch = UpdateCreditInput {
            status: Some("used".to_string()),
            ..Default::default()
        };
        assert!(validate_credit_patch("used", &patch).is_err());
    }

    #[test]
    fn status_change_combined_with_content_is_rejected() {
        let patch = UpdateCreditInput {
            status: Some("approved".to_string()),
            description: Some("adjusted".to_string()),
            ..Default::default()
        };
        assert!(validate_credit_patch("used", &patch).is_err());
    }

    #[test]
    fn empty_patch_on_a_used_credit_is_rejected() {
        assert!(validate_credit_patch("used", &UpdateCreditInput::default()).is_err());
    }
}

mod unused_credits {
    use super::*;

    #[test]
    fn draft_and_approved_credits_accept_content_edits() {
        let patch = UpdateCreditInput {
            amount: Some(dec("12.00")),
            reason: Some("damaged".to_string()),
            ..Default::default()
        };
        assert!(validate_credit_patch("draft", &patch).is_ok());
        assert!(validate_credit_patch("approved", &patch).is_ok());
    }

    #[test]
    fn direct_transition_to_used_is_rejected() {
        // used is reachable only through invoice application
        let patch = UpdateCreditInput {
            status: Some("used".to_string()),
            ..Default::default()
        };
        assert!(validate_credit_patch("draft", &patch).is_err());
        assert!(validate_credit_patch("approved", &patch).is_err());
    }

    #[test]
    fn other_status_transitions_remain_open() {
        for target in ["draft", "approved", "cancelled"] {
            let patch = UpdateCreditInput {
                status: Some(target.to_string()),
                ..Default::default()
            };
            assert!(validate_credit_patch("draft", &patch).is_ok());
            assert!(validate_credit_patch("approved", &patch).is_ok());
        }
    }
}

mod enums {
    use super::*;

    #[test]
    fn credit_statuses_round_trip() {
        for s in ["draft", "approved", "used", "cancelled"] {
            assert_eq!(CreditStatus::from_str(s).unwrap().as_str(), s);
        }
        assert!(CreditStatus::from_str("void").is_none());
    }

    #[test]
    fn credit_reasons_round_trip() {
        for s in ["damaged", "quality", "short", "wrong", "expired", "other"] {
            assert_eq!(CreditReason::from_str(s).unwrap().as_str(), s);
        }
        assert!(CreditReason::from_str("refund").is_none());
    }
}
