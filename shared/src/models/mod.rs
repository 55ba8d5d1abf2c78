//! Domain models for the Supplier Trade Ledger

mod credit;
mod invoice;
mod order;

pub use credit::*;
pub use invoice::*;
pub use order::*;
