//! Business logic services for the Supplier Trade Ledger

pub mod activity_log;
pub mod credit;
pub mod invoice;
pub mod numbering;
pub mod order;

pub use activity_log::ActivityLogService;
pub use credit::CreditService;
pub use invoice::InvoiceService;
pub use order::OrderService;
