//! Shared types and domain logic for the Supplier Trade Ledger
//!
//! This crate contains the document models, status enums, document
//! numbering, and validation rules used by the backend services.

pub mod models;
pub mod numbering;
pub mod validation;

pub use models::*;
pub use numbering::*;
pub use validation::*;
