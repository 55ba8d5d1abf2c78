pub mod activity;
pub mod credit;
pub mod health;
pub mod invoice;
pub mod order;

pub use health::health_check;
