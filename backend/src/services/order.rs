//! Purchase order service
//!
//! CRUD over the orders and order_items tables. Item sets are replaced
//! wholesale on update, never patched, and the order total is recomputed
//! from the item set on every replacement. Row and item writes happen in
//! a single database transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::activity_log::{ActivityLogService, LogActivity};
use crate::services::numbering::next_document_number;
use shared::models::{CreateOrderInput, OrderItemInput, OrderStatus, UpdateOrderInput};
use shared::numbering::DocumentKind;
use shared::validation::{order_total, validate_buyer_name, validate_order_items};

/// Purchase order service
#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
    activity: ActivityLogService,
}

/// A purchase order row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub po_number: String,
    pub buyer_name: String,
    pub buyer_email: Option<String>,
    pub buyer_contact: Option<String>,
    pub buyer_phone: Option<String>,
    pub buyer_address: Option<String>,
    pub buyer_country: Option<String>,
    pub order_date: DateTime<Utc>,
    pub total_amount: Decimal,
    pub currency: String,
    pub incoterms: Option<String>,
    pub payment_terms: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A purchase order line item
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub quantity: i32,
    pub unit: String,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// A purchase order with its items
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: PurchaseOrder,
    pub items: Vec<OrderItem>,
}

/// Query parameters for listing purchase orders
#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

const ORDER_COLUMNS: &str = "id, supplier_id, po_number, buyer_name, buyer_email, buyer_contact, \
     buyer_phone, buyer_address, buyer_country, order_date, total_amount, currency, incoterms, \
     payment_terms, notes, status, created_at, updated_at";

const ORDER_ITEM_COLUMNS: &str =
    "id, order_id, product_id, product_name, quantity, unit, unit_price, total_price";

impl OrderService {
    pub fn new(db: PgPool) -> Self {
        let activity = ActivityLogService::new(db.clone());
        Self { db, activity }
    }

    /// Create a purchase order with its items
    pub async fn create_order(
        &self,
        supplier_id: Uuid,
        actor_email: &str,
        input: CreateOrderInput,
    ) -> AppResult<OrderWithItems> {
        validate_buyer_name(&input.buyer_name).map_err(|msg| AppError::Validation {
            field: "buyer_name".to_string(),
            message: msg.to_string(),
        })?;
        validate_order_items(&input.items).map_err(|msg| AppError::Validation {
            field: "items".to_string(),
            message: msg.to_string(),
        })?;
        let status = parse_order_status(input.status.as_deref())?.unwrap_or(OrderStatus::Pending);

        let total_amount = order_total(&input.items);

        let mut tx = self.db.begin().await?;

        let po_number = match input.po_number {
            Some(number) => number,
            None => {
                next_document_number(&mut *tx, supplier_id, DocumentKind::PurchaseOrder).await?
            }
        };

        let order: PurchaseOrder = sqlx::query_as(&format!(
            r#"
            INSERT INTO orders
                (supplier_id, po_number, buyer_name, buyer_email, buyer_contact, buyer_phone,
                 buyer_address, buyer_country, order_date, total_amount, currency, incoterms,
                 payment_terms, notes, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, NOW()), $10, $11, $12, $13, $14, $15)
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(supplier_id)
        .bind(&po_number)
        .bind(&input.buyer_name)
        .bind(&input.buyer_email)
        .bind(&input.buyer_contact)
        .bind(&input.buyer_phone)
        .bind(&input.buyer_address)
        .bind(&input.buyer_country)
        .bind(input.order_date)
        .bind(total_amount)
        .bind(input.currency.as_deref().unwrap_or("USD"))
        .bind(&input.incoterms)
        .bind(&input.payment_terms)
        .bind(&input.notes)
        .bind(status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let items = insert_order_items(&mut tx, order.id, &input.items).await?;

        tx.commit().await?;

        self.activity
            .log(LogActivity {
                supplier_id,
                actor_email: actor_email.to_string(),
                action_type: "po.create".to_string(),
                category: "po".to_string(),
                description: Some(format!("created PO #{}", order.po_number)),
                target_id: Some(order.id),
                target_name: Some(order.po_number.clone()),
            })
            .await;

        Ok(OrderWithItems { order, items })
    }

    /// List purchase orders for a supplier, newest first, with items
    pub async fn list_orders(
        &self,
        supplier_id: Uuid,
        query: ListOrdersQuery,
    ) -> AppResult<Vec<OrderWithItems>> {
        let status = query.status.filter(|s| s != "all");
        let search = query
            .search
            .filter(|s| !s.trim().is_empty())
            .map(|s| format!("%{}%", s));

        let orders: Vec<PurchaseOrder> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM orders
            WHERE supplier_id = $1
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR po_number ILIKE $3 OR buyer_name ILIKE $3)
            ORDER BY created_at DESC
            "#,
            ORDER_COLUMNS
        ))
        .bind(supplier_id)
        .bind(&status)
        .bind(&search)
        .fetch_all(&self.db)
        .await?;

        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let items: Vec<OrderItem> = sqlx::query_as(&format!(
            "SELECT {} FROM order_items WHERE order_id = ANY($1) ORDER BY id",
            ORDER_ITEM_COLUMNS
        ))
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item);
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = by_order.remove(&order.id).unwrap_or_default();
                OrderWithItems { order, items }
            })
            .collect())
    }

    /// Get a purchase order by id with its items
    pub async fn get_order(&self, supplier_id: Uuid, order_id: Uuid) -> AppResult<OrderWithItems> {
        let order: PurchaseOrder = sqlx::query_as(&format!(
            "SELECT {} FROM orders WHERE id = $1 AND supplier_id = $2",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .bind(supplier_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

        let items: Vec<OrderItem> = sqlx::query_as(&format!(
            "SELECT {} FROM order_items WHERE order_id = $1 ORDER BY id",
            ORDER_ITEM_COLUMNS
        ))
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        Ok(OrderWithItems { order, items })
    }

    /// Partially update a purchase order. A provided item set replaces the
    /// existing items wholesale and the total is recomputed.
    pub async fn update_order(
        &self,
        supplier_id: Uuid,
        order_id: Uuid,
        actor_email: &str,
        input: UpdateOrderInput,
    ) -> AppResult<OrderWithItems> {
        if let Some(name) = input.buyer_name.as_deref() {
            validate_buyer_name(name).map_err(|msg| AppError::Validation {
                field: "buyer_name".to_string(),
                message: msg.to_string(),
            })?;
        }
        if let Some(items) = &input.items {
            validate_order_items(items).map_err(|msg| AppError::Validation {
                field: "items".to_string(),
                message: msg.to_string(),
            })?;
        }
        let status = parse_order_status(input.status.as_deref())?;

        let mut tx = self.db.begin().await?;

        let existing: PurchaseOrder = sqlx::query_as(&format!(
            "SELECT {} FROM orders WHERE id = $1 AND supplier_id = $2",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .bind(supplier_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

        let total_amount = match &input.items {
            Some(items) => {
                sqlx::query("DELETE FROM order_items WHERE order_id = $1")
                    .bind(order_id)
                    .execute(&mut *tx)
                    .await?;
                let total = order_total(items);
                insert_order_items(&mut tx, order_id, items).await?;
                total
            }
            None => existing.total_amount,
        };

        let order: PurchaseOrder = sqlx::query_as(&format!(
            r#"
            UPDATE orders
            SET po_number = $1, buyer_name = $2, buyer_email = $3, buyer_contact = $4,
                buyer_phone = $5, buyer_address = $6, buyer_country = $7, order_date = $8,
                total_amount = $9, currency = $10, incoterms = $11, payment_terms = $12,
                notes = $13, status = $14, updated_at = NOW()
            WHERE id = $15
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(input.po_number.unwrap_or(existing.po_number))
        .bind(input.buyer_name.unwrap_or(existing.buyer_name))
        .bind(input.buyer_email.or(existing.buyer_email))
        .bind(input.buyer_contact.or(existing.buyer_contact))
        .bind(input.buyer_phone.or(existing.buyer_phone))
        .bind(input.buyer_address.or(existing.buyer_address))
        .bind(input.buyer_country.or(existing.buyer_country))
        .bind(input.order_date.unwrap_or(existing.order_date))
        .bind(total_amount)
        .bind(input.currency.unwrap_or(existing.currency))
        .bind(input.incoterms.or(existing.incoterms))
        .bind(input.payment_terms.or(existing.payment_terms))
        .bind(input.notes.or(existing.notes))
        .bind(status.map(|s| s.as_str().to_string()).unwrap_or(existing.status))
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        let items: Vec<OrderItem> = sqlx::query_as(&format!(
            "SELECT {} FROM order_items WHERE order_id = $1 ORDER BY id",
            ORDER_ITEM_COLUMNS
        ))
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        self.activity
            .log(LogActivity {
                supplier_id,
                actor_email: actor_email.to_string(),
                action_type: "po.update".to_string(),
                category: "po".to_string(),
                description: Some(format!("updated PO #{}", order.po_number)),
                target_id: Some(order_id),
                target_name: Some(order.po_number.clone()),
            })
            .await;

        Ok(OrderWithItems { order, items })
    }

    /// Transition a purchase order to confirmed
    pub async fn confirm_order(
        &self,
        supplier_id: Uuid,
        order_id: Uuid,
        actor_email: &str,
    ) -> AppResult<OrderWithItems> {
        self.update_order(
            supplier_id,
            order_id,
            actor_email,
            UpdateOrderInput {
                status: Some(OrderStatus::Confirmed.as_str().to_string()),
                ..Default::default()
            },
        )
        .await
    }

    /// Delete a purchase order; item rows cascade
    pub async fn delete_order(
        &self,
        supplier_id: Uuid,
        order_id: Uuid,
        actor_email: &str,
    ) -> AppResult<()> {
        let existing = self.get_order(supplier_id, order_id).await?;

        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order_id)
            .execute(&self.db)
            .await?;

        self.activity
            .log(LogActivity {
                supplier_id,
                actor_email: actor_email.to_string(),
                action_type: "po.delete".to_string(),
                category: "po".to_string(),
                description: Some(format!("deleted PO #{}", existing.order.po_number)),
                target_id: Some(order_id),
                target_name: Some(existing.order.po_number),
            })
            .await;

        Ok(())
    }
}

fn parse_order_status(status: Option<&str>) -> AppResult<Option<OrderStatus>> {
    match status {
        Some(s) => OrderStatus::from_str(s)
            .map(Some)
            .ok_or_else(|| AppError::Validation {
                field: "status".to_string(),
                message: "Invalid order status".to_string(),
            }),
        None => Ok(None),
    }
}

async fn insert_order_items(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    order_id: Uuid,
    items: &[OrderItemInput],
) -> AppResult<Vec<OrderItem>> {
    let mut inserted = Vec::with_capacity(items.len());
    for item in items {
        let row: OrderItem = sqlx::query_as(&format!(
            r#"
            INSERT INTO order_items
                (order_id, product_id, product_name, quantity, unit, unit_price, total_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            ORDER_ITEM_COLUMNS
        ))
        .bind(order_id)
        .bind(item.product_id)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.unit.as_deref().unwrap_or("pcs"))
        .bind(item.unit_price)
        .bind(item.line_total())
        .fetch_one(&mut **tx)
        .await?;
        inserted.push(row);
    }
    Ok(inserted)
}
