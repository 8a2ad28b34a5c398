//! Order Creation Service and Order Status Transition Handler.
//!
//! Creation never touches stock; inventory moves only at confirmation
//! (PENDING -> CONFIRMED) and is restored at cancellation of a confirmed
//! order. All stock movements and the status write share one transaction,
//! with conditional decrements so a concurrent confirmation can never
//! oversell a variant and a failed confirmation leaves every variant
//! untouched.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::domain::order::{classify_transition, OrderStatus, PaymentStatus, StockEffect};
use crate::domain::value_objects::OrderNumber;
use crate::error::ApiError;
use crate::models::{Address, Order, OrderItem, User};
use crate::AppState;

/// Password marker for accounts created implicitly at checkout.
pub const GUEST_PASSWORD_MARKER: &str = "!guest";

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub order_number: Option<String>,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "customer name must not be empty"))]
    pub customer_name: String,
    pub phone: Option<String>,
    pub shipping_address: ShippingAddressRequest,
    #[validate(length(min = 1, message = "order must contain at least one item"))]
    pub items: Vec<OrderItemRequest>,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub discount_amount: Option<Decimal>,
    pub promo_code_id: Option<Uuid>,
    pub total: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ShippingAddressRequest {
    #[validate(length(min = 1, message = "street must not be empty"))]
    pub street: String,
    pub street2: Option<String>,
    #[validate(length(min = 1, message = "city must not be empty"))]
    pub city: String,
    pub state: Option<String>,
    #[validate(length(min = 1, message = "zip must not be empty"))]
    pub zip: String,
    #[validate(length(min = 1, message = "country must not be empty"))]
    pub country: String,
}

// Serialize is required by the length check on `items`: a violation embeds
// the offending collection in the error params.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    #[validate(length(min = 1, message = "product name must not be empty"))]
    pub product_name: String,
    pub color_name: Option<String>,
    pub size_name: Option<String>,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Full creation result: the order with its items, customer and address.
#[derive(Debug, Serialize)]
pub struct OrderGraph {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub customer: User,
    pub address: Address,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

/// Creates an order from a checkout payload.
///
/// Product existence is checked in one batch before any write. The
/// customer is resolved or created by email first, so a failure inside
/// the order transaction cannot orphan rows that belong to the order.
/// Quantities, prices and color/size names are copied verbatim from the
/// request; stock is not touched here.
pub async fn create_order(state: &AppState, req: CreateOrderRequest) -> Result<OrderGraph, ApiError> {
    req.validate()?;
    req.shipping_address.validate()?;
    for item in &req.items {
        item.validate()?;
    }
    for (name, amount) in [
        ("subtotal", req.subtotal),
        ("shipping_cost", req.shipping_cost),
        ("total", req.total),
        ("discount_amount", req.discount_amount.unwrap_or(Decimal::ZERO)),
    ] {
        if amount < Decimal::ZERO {
            return Err(ApiError::Validation {
                field: Some(name.to_string()),
                message: format!("{name} must not be negative"),
            });
        }
    }

    let requested: Vec<Uuid> = req
        .items
        .iter()
        .map(|i| i.product_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let found: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM products WHERE id = ANY($1)")
        .bind(&requested)
        .fetch_all(&state.db)
        .await?;
    let missing = missing_product_ids(&requested, &found);
    if !missing.is_empty() {
        let ids: Vec<String> = missing.iter().map(Uuid::to_string).collect();
        return Err(ApiError::Business {
            code: "UNKNOWN_PRODUCTS",
            message: format!("unknown product ids: {}", ids.join(", ")),
        });
    }

    if let Some(promo_id) = req.promo_code_id {
        let known: Option<Uuid> = sqlx::query_scalar("SELECT id FROM promo_codes WHERE id = $1")
            .bind(promo_id)
            .fetch_optional(&state.db)
            .await?;
        if known.is_none() {
            return Err(ApiError::Business {
                code: "UNKNOWN_PROMO_CODE",
                message: format!("unknown promo code id: {promo_id}"),
            });
        }
    }

    let order_number = match &req.order_number {
        Some(n) => OrderNumber::new(n.clone()).map_err(|e| ApiError::Validation {
            field: Some("order_number".to_string()),
            message: e.to_string(),
        })?,
        None => OrderNumber::generate(),
    };

    let email = req.email.trim().to_lowercase();
    let (first_name, last_name) = split_name(&req.customer_name);
    let customer = sqlx::query_as::<_, User>(
        "INSERT INTO users (id, email, password_hash, first_name, last_name, phone, role) \
         VALUES ($1, $2, $3, $4, $5, $6, 'CLIENT') \
         ON CONFLICT (email) DO UPDATE SET updated_at = NOW() \
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&email)
    .bind(GUEST_PASSWORD_MARKER)
    .bind(first_name)
    .bind(last_name)
    .bind(&req.phone)
    .fetch_one(&state.db)
    .await?;

    let mut tx = state.db.begin().await?;

    // Always a fresh address row, no reuse or dedup.
    let address = sqlx::query_as::<_, Address>(
        "INSERT INTO addresses (id, user_id, recipient_name, street, street2, city, state, zip, country, phone) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(customer.id)
    .bind(&req.customer_name)
    .bind(&req.shipping_address.street)
    .bind(&req.shipping_address.street2)
    .bind(&req.shipping_address.city)
    .bind(&req.shipping_address.state)
    .bind(&req.shipping_address.zip)
    .bind(&req.shipping_address.country)
    .bind(&req.phone)
    .fetch_one(&mut *tx)
    .await?;

    let order = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (id, order_number, user_id, address_id, status, payment_status, \
         subtotal, shipping_cost, discount_amount, total, promo_code_id, \
         customer_email, customer_name, customer_phone) \
         VALUES ($1, $2, $3, $4, 'PENDING', 'PENDING', $5, $6, $7, $8, $9, $10, $11, $12) \
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(order_number.as_str())
    .bind(customer.id)
    .bind(address.id)
    .bind(req.subtotal)
    .bind(req.shipping_cost)
    .bind(req.discount_amount.unwrap_or(Decimal::ZERO))
    .bind(req.total)
    .bind(req.promo_code_id)
    .bind(&email)
    .bind(&req.customer_name)
    .bind(&req.phone)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| ApiError::on_unique(e, "DUPLICATE_ORDER_NUMBER", format!("order number {order_number} already exists")))?;

    let mut items = Vec::with_capacity(req.items.len());
    for item in &req.items {
        let row = sqlx::query_as::<_, OrderItem>(
            "INSERT INTO order_items (id, order_id, product_id, variant_id, product_name, color_name, size_name, quantity, unit_price) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(order.id)
        .bind(item.product_id)
        .bind(item.variant_id)
        .bind(&item.product_name)
        .bind(&item.color_name)
        .bind(&item.size_name)
        .bind(item.quantity)
        .bind(item.unit_price)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(d) if d.is_foreign_key_violation() => ApiError::Business {
                code: "UNKNOWN_VARIANT",
                message: format!("unknown variant id for product {}", item.product_id),
            },
            _ => ApiError::Database(e),
        })?;
        items.push(row);
    }

    tx.commit().await?;
    tracing::info!(order_number = %order.order_number, items = items.len(), "order created");

    publish_event(state, "orders.created", &order).await;
    Ok(OrderGraph { order, items, customer, address })
}

/// Applies a status/payment-status change, carrying its stock effects.
pub async fn transition_status(
    state: &AppState,
    order_id: Uuid,
    req: UpdateOrderStatusRequest,
) -> Result<Order, ApiError> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound("order"))?;

    let current = OrderStatus::from_str(&order.status)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored order status: {e}")))?;
    let current_payment = PaymentStatus::from_str(&order.payment_status)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored payment status: {e}")))?;
    let requested = req.status.unwrap_or(current);
    let requested_payment = req.payment_status.unwrap_or(current_payment);
    let effect = classify_transition(current, requested);

    let mut tx = state.db.begin().await?;
    let items = sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = $1")
    .bind(order_id)
    .fetch_all(&mut *tx)
    .await?;

    match effect {
        StockEffect::Decrement => {
            for item in &items {
                let Some(variant_id) = item.variant_id else {
                    tracing::debug!(order_id = %order_id, product_id = %item.product_id, "item has no variant, skipping stock decrement");
                    continue;
                };
                // Conditional relative decrement: zero rows affected means
                // insufficient stock, and the rollback discards every
                // decrement already applied in this loop.
                let result = sqlx::query(
                    "UPDATE product_variants SET quantity = quantity - $1 WHERE id = $2 AND quantity >= $1",
                )
                .bind(item.quantity)
                .bind(variant_id)
                .execute(&mut *tx)
                .await?;
                if result.rows_affected() == 0 {
                    tx.rollback().await?;
                    return Err(ApiError::Business {
                        code: "INSUFFICIENT_STOCK",
                        message: format!(
                            "insufficient stock for product {} variant {variant_id}",
                            item.product_id
                        ),
                    });
                }
            }
            if let Some(promo_id) = order.promo_code_id {
                sqlx::query("UPDATE promo_codes SET usage_count = usage_count + 1, updated_at = NOW() WHERE id = $1")
                    .bind(promo_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }
        StockEffect::Restore => {
            for item in &items {
                let Some(variant_id) = item.variant_id else {
                    tracing::debug!(order_id = %order_id, product_id = %item.product_id, "item has no variant, skipping stock restore");
                    continue;
                };
                sqlx::query("UPDATE product_variants SET quantity = quantity + $1 WHERE id = $2")
                    .bind(item.quantity)
                    .bind(variant_id)
                    .execute(&mut *tx)
                    .await?;
            }
            if let Some(promo_id) = order.promo_code_id {
                sqlx::query("UPDATE promo_codes SET usage_count = GREATEST(usage_count - 1, 0), updated_at = NOW() WHERE id = $1")
                    .bind(promo_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }
        StockEffect::None => {}
    }

    let updated = sqlx::query_as::<_, Order>(
        "UPDATE orders SET status = $2, payment_status = $3, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(order_id)
    .bind(requested.as_str())
    .bind(requested_payment.as_str())
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    let subject = match effect {
        StockEffect::Decrement => "orders.confirmed",
        StockEffect::Restore => "orders.cancelled",
        StockEffect::None => "orders.updated",
    };
    tracing::info!(order_number = %updated.order_number, status = %updated.status, payment_status = %updated.payment_status, "order status updated");
    publish_event(state, subject, &updated).await;
    Ok(updated)
}

/// Fire-and-forget NATS publication; a broker outage never fails the request.
async fn publish_event(state: &AppState, subject: &str, order: &Order) {
    let Some(nats) = &state.nats else { return };
    let payload = serde_json::json!({
        "order_id": order.id,
        "order_number": order.order_number,
        "status": order.status,
        "payment_status": order.payment_status,
        "total": order.total,
    });
    match serde_json::to_vec(&payload) {
        Ok(bytes) => {
            if let Err(e) = nats.publish(subject.to_string(), bytes.into()).await {
                tracing::warn!(subject, error = %e, "failed to publish order event");
            }
        }
        Err(e) => tracing::warn!(error = %e, "failed to encode order event"),
    }
}

fn missing_product_ids(requested: &[Uuid], found: &[Uuid]) -> Vec<Uuid> {
    requested.iter().filter(|id| !found.contains(id)).copied().collect()
}

fn split_name(full: &str) -> (String, String) {
    match full.trim().split_once(' ') {
        Some((first, last)) => (first.to_string(), last.trim().to_string()),
        None => (full.trim().to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_ids_preserves_request_order() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let c = Uuid::now_v7();
        assert_eq!(missing_product_ids(&[a, b, c], &[b]), vec![a, c]);
        assert!(missing_product_ids(&[a, b], &[b, a]).is_empty());
    }

    #[test]
    fn empty_item_list_fails_validation_with_field_detail() {
        let req = CreateOrderRequest {
            order_number: None,
            email: "nurse@example.com".to_string(),
            customer_name: "Amina Diallo".to_string(),
            phone: None,
            shipping_address: ShippingAddressRequest {
                street: "1 Hospital Rd".to_string(),
                street2: None,
                city: "Lagos".to_string(),
                state: None,
                zip: "100001".to_string(),
                country: "NG".to_string(),
            },
            items: vec![],
            subtotal: Decimal::new(5000, 2),
            shipping_cost: Decimal::ZERO,
            discount_amount: None,
            promo_code_id: None,
            total: Decimal::new(5000, 2),
        };
        let errs = req.validate().unwrap_err();
        assert!(errs.field_errors().contains_key("items"));
    }

    #[test]
    fn split_name_handles_single_and_full_names() {
        assert_eq!(split_name("Amina Diallo"), ("Amina".to_string(), "Diallo".to_string()));
        assert_eq!(split_name("Cher"), ("Cher".to_string(), String::new()));
        assert_eq!(split_name("  Jo  van der Berg "), ("Jo".to_string(), "van der Berg".to_string()));
    }
}
