//! Sequential document numbers: `PREFIX-YYYY-NNNN`, scoped per supplier
//! and calendar year.
//!
//! The next number is max(existing sequence for the year) + 1. Malformed
//! suffixes are skipped rather than aborting generation. This is
//! best-effort under concurrent load; the unique index on
//! `(supplier_id, number)` is what actually prevents duplicates.

/// The three numbered document types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PurchaseOrder,
    ProformaInvoice,
    Credit,
}

impl DocumentKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            DocumentKind::PurchaseOrder => "PO",
            DocumentKind::ProformaInvoice => "PI",
            DocumentKind::Credit => "CR",
        }
    }

    /// Zero-pad width of the sequence suffix
    pub fn pad_width(&self) -> usize {
        match self {
            DocumentKind::PurchaseOrder => 4,
            DocumentKind::ProformaInvoice => 4,
            DocumentKind::Credit => 3,
        }
    }
}

/// Prefix shared by all numbers of a kind in a year, e.g. `PO-2026-`
pub fn year_prefix(kind: DocumentKind, year: i32) -> String {
    format!("{}-{}-", kind.prefix(), year)
}

/// Numeric suffix of an existing document number, or None when the
/// number does not match the prefix or the suffix is not numeric.
pub fn sequence_of(number: &str, prefix: &str) -> Option<u32> {
    number.strip_prefix(prefix)?.parse().ok()
}

/// Next sequence given the existing numbers for the same kind and year.
/// Starts at 1 when none parse.
pub fn next_sequence<S: AsRef<str>>(existing: &[S], prefix: &str) -> u32 {
    existing
        .iter()
        .filter_map(|n| sequence_of(n.as_ref(), prefix))
        .max()
        .map_or(1, |max| max + 1)
}

/// Render a full document number, e.g. `CR-2026-007`
pub fn format_number(kind: DocumentKind, year: i32, sequence: u32) -> String {
    format!(
        "{}-{}-{:0width$}",
        kind.prefix(),
        year,
        sequence,
        width = kind.pad_width()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_one_when_empty() {
        let existing: Vec<String> = vec![];
        assert_eq!(next_sequence(&existing, "PO-2026-"), 1);
    }

    #[test]
    fn increments_past_the_highest_existing() {
        let existing = vec!["PO-2026-0001", "PO-2026-0007", "PO-2026-0003"];
        assert_eq!(next_sequence(&existing, "PO-2026-"), 8);
    }

    #[test]
    fn malformed_suffixes_are_skipped() {
        let existing = vec!["PO-2026-ABCD", "PO-2026-0002", "PO-2025-0009"];
        assert_eq!(next_sequence(&existing, "PO-2026-"), 3);
    }

    #[test]
    fn formats_with_kind_specific_padding() {
        assert_eq!(format_number(DocumentKind::PurchaseOrder, 2026, 12), "PO-2026-0012");
        assert_eq!(format_number(DocumentKind::Credit, 2026, 12), "CR-2026-012");
    }
}
