//! Purchase order models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Purchase order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "confirmed" => Some(OrderStatus::Confirmed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

/// A purchase order line item as submitted by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub quantity: i32,
    pub unit: Option<String>,
    pub unit_price: Decimal,
}

impl OrderItemInput {
    /// quantity x unit price
    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }
}

/// Input for creating a purchase order
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderInput {
    pub po_number: Option<String>,
    pub buyer_name: String,
    pub buyer_email: Option<String>,
    pub buyer_contact: Option<String>,
    pub buyer_phone: Option<String>,
    pub buyer_address: Option<String>,
    pub buyer_country: Option<String>,
    pub order_date: Option<DateTime<Utc>>,
    pub currency: Option<String>,
    pub incoterms: Option<String>,
    pub payment_terms: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
    pub items: Vec<OrderItemInput>,
}

/// Input for updating a purchase order. Absent fields are left untouched;
/// a provided `items` array replaces the existing item set wholesale.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateOrderInput {
    pub po_number: Option<String>,
    pub buyer_name: Option<String>,
    pub buyer_email: Option<String>,
    pub buyer_contact: Option<String>,
    pub buyer_phone: Option<String>,
    pub buyer_address: Option<String>,
    pub buyer_country: Option<String>,
    pub order_date: Option<DateTime<Utc>>,
    pub currency: Option<String>,
    pub incoterms: Option<String>,
    pub payment_terms: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
    pub items: Option<Vec<OrderItemInput>>,
}
