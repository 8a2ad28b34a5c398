//! Database-backed coverage for order creation and the status transition
//! handler: confirmation decrements stock, cancellation restores it, and a
//! failed confirmation leaves every variant untouched.

use medwear_commerce::domain::order::{OrderStatus, PaymentStatus};
use medwear_commerce::error::ApiError;
use medwear_commerce::services::order_service::{
    self, CreateOrderRequest, OrderItemRequest, ShippingAddressRequest, UpdateOrderStatusRequest,
};
use medwear_commerce::AppState;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

fn state(pool: &PgPool) -> AppState {
    AppState { db: pool.clone(), nats: None }
}

/// Inserts a product with one color, one size and one variant; returns
/// (product_id, variant_id).
async fn seed_variant(pool: &PgPool, quantity: i32) -> (Uuid, Uuid) {
    let product_id = Uuid::now_v7();
    sqlx::query("INSERT INTO products (id, sku, slug, name, price) VALUES ($1, $2, $3, 'Classic Scrub Top', $4)")
        .bind(product_id)
        .bind(format!("SKU-{product_id}"))
        .bind(format!("scrub-top-{product_id}"))
        .bind(Decimal::new(4999, 2))
        .execute(pool)
        .await
        .unwrap();
    let color_id = Uuid::now_v7();
    sqlx::query("INSERT INTO product_colors (id, product_id, color_name, color_code) VALUES ($1, $2, 'Navy', '#1f2a44')")
        .bind(color_id)
        .bind(product_id)
        .execute(pool)
        .await
        .unwrap();
    let size_id = Uuid::now_v7();
    sqlx::query("INSERT INTO sizes (id, label) VALUES ($1, $2)")
        .bind(size_id)
        .bind(format!("M-{size_id}"))
        .execute(pool)
        .await
        .unwrap();
    let variant_id = Uuid::now_v7();
    sqlx::query("INSERT INTO product_variants (id, product_id, color_id, size_id, sku, quantity) VALUES ($1, $2, $3, $4, $5, $6)")
        .bind(variant_id)
        .bind(product_id)
        .bind(color_id)
        .bind(size_id)
        .bind(format!("VAR-{variant_id}"))
        .bind(quantity)
        .execute(pool)
        .await
        .unwrap();
    (product_id, variant_id)
}

async fn seed_promo(pool: &PgPool) -> Uuid {
    let id = Uuid::now_v7();
    sqlx::query("INSERT INTO promo_codes (id, code, discount_type, discount_value) VALUES ($1, $2, 'FIXED', 5)")
        .bind(id)
        .bind(format!("SAVE-{id}"))
        .execute(pool)
        .await
        .unwrap();
    id
}

async fn variant_quantity(pool: &PgPool, variant_id: Uuid) -> i32 {
    sqlx::query_scalar("SELECT quantity FROM product_variants WHERE id = $1")
        .bind(variant_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

fn line(product_id: Uuid, variant_id: Option<Uuid>, quantity: i32) -> OrderItemRequest {
    OrderItemRequest {
        product_id,
        variant_id,
        product_name: "Classic Scrub Top".to_string(),
        color_name: Some("Navy".to_string()),
        size_name: Some("M".to_string()),
        quantity,
        unit_price: Decimal::new(4999, 2),
    }
}

fn checkout(items: Vec<OrderItemRequest>) -> CreateOrderRequest {
    CreateOrderRequest {
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
        items,
        subtotal: Decimal::new(9998, 2),
        shipping_cost: Decimal::ZERO,
        discount_amount: None,
        promo_code_id: None,
        total: Decimal::new(9998, 2),
    }
}

fn confirm() -> UpdateOrderStatusRequest {
    UpdateOrderStatusRequest { status: Some(OrderStatus::Confirmed), payment_status: Some(PaymentStatus::Paid) }
}

fn cancel() -> UpdateOrderStatusRequest {
    UpdateOrderStatusRequest { status: Some(OrderStatus::Cancelled), payment_status: None }
}

#[sqlx::test]
async fn confirm_decrements_and_cancel_restores(pool: PgPool) {
    let state = state(&pool);
    let (product_id, variant_id) = seed_variant(&pool, 10).await;

    let graph = order_service::create_order(&state, checkout(vec![line(product_id, Some(variant_id), 3)]))
        .await
        .unwrap();
    // Creation never touches stock.
    assert_eq!(variant_quantity(&pool, variant_id).await, 10);

    let confirmed = order_service::transition_status(&state, graph.order.id, confirm()).await.unwrap();
    assert_eq!(confirmed.status, "CONFIRMED");
    assert_eq!(variant_quantity(&pool, variant_id).await, 7);

    let cancelled = order_service::transition_status(&state, graph.order.id, cancel()).await.unwrap();
    assert_eq!(cancelled.status, "CANCELLED");
    assert_eq!(variant_quantity(&pool, variant_id).await, 10);
}

#[sqlx::test]
async fn failed_confirmation_leaves_every_variant_untouched(pool: PgPool) {
    let state = state(&pool);
    let (product_a, variant_a) = seed_variant(&pool, 5).await;
    let (product_b, variant_b) = seed_variant(&pool, 1).await;

    let graph = order_service::create_order(
        &state,
        checkout(vec![line(product_a, Some(variant_a), 2), line(product_b, Some(variant_b), 2)]),
    )
    .await
    .unwrap();

    let err = order_service::transition_status(&state, graph.order.id, confirm()).await.unwrap_err();
    match err {
        ApiError::Business { code, .. } => assert_eq!(code, "INSUFFICIENT_STOCK"),
        other => panic!("unexpected error: {other:?}"),
    }
    // The rollback discards any decrement applied before the failing item.
    assert_eq!(variant_quantity(&pool, variant_a).await, 5);
    assert_eq!(variant_quantity(&pool, variant_b).await, 1);
    let status: String = sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
        .bind(graph.order.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, "PENDING");
}

#[sqlx::test]
async fn items_without_variants_skip_stock_effects(pool: PgPool) {
    let state = state(&pool);
    let (product_id, variant_id) = seed_variant(&pool, 4).await;

    let graph = order_service::create_order(&state, checkout(vec![line(product_id, None, 2)]))
        .await
        .unwrap();
    let confirmed = order_service::transition_status(&state, graph.order.id, confirm()).await.unwrap();
    assert_eq!(confirmed.status, "CONFIRMED");
    assert_eq!(variant_quantity(&pool, variant_id).await, 4);
}

#[sqlx::test]
async fn unknown_product_rejects_before_any_write(pool: PgPool) {
    let state = state(&pool);
    let err = order_service::create_order(&state, checkout(vec![line(Uuid::now_v7(), None, 1)]))
        .await
        .unwrap_err();
    match err {
        ApiError::Business { code, .. } => assert_eq!(code, "UNKNOWN_PRODUCTS"),
        other => panic!("unexpected error: {other:?}"),
    }
    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(&pool).await.unwrap();
    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders").fetch_one(&pool).await.unwrap();
    assert_eq!((users, orders), (0, 0));
}

#[sqlx::test]
async fn unknown_promo_code_id_rejects_before_any_write(pool: PgPool) {
    let state = state(&pool);
    let (product_id, variant_id) = seed_variant(&pool, 3).await;
    let mut req = checkout(vec![line(product_id, Some(variant_id), 1)]);
    req.promo_code_id = Some(Uuid::now_v7());

    let err = order_service::create_order(&state, req).await.unwrap_err();
    match err {
        ApiError::Business { code, .. } => assert_eq!(code, "UNKNOWN_PROMO_CODE"),
        other => panic!("unexpected error: {other:?}"),
    }
    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders").fetch_one(&pool).await.unwrap();
    assert_eq!(orders, 0);
}

#[sqlx::test]
async fn promo_usage_follows_confirmation_and_cancellation(pool: PgPool) {
    let state = state(&pool);
    let (product_id, variant_id) = seed_variant(&pool, 5).await;
    let promo_id = seed_promo(&pool).await;
    let mut req = checkout(vec![line(product_id, Some(variant_id), 1)]);
    req.promo_code_id = Some(promo_id);
    let graph = order_service::create_order(&state, req).await.unwrap();

    assert_eq!(usage_count(&pool, promo_id).await, 0);
    order_service::transition_status(&state, graph.order.id, confirm()).await.unwrap();
    assert_eq!(usage_count(&pool, promo_id).await, 1);
    order_service::transition_status(&state, graph.order.id, cancel()).await.unwrap();
    assert_eq!(usage_count(&pool, promo_id).await, 0);
}

async fn usage_count(pool: &PgPool, promo_id: Uuid) -> i32 {
    sqlx::query_scalar("SELECT usage_count FROM promo_codes WHERE id = $1")
        .bind(promo_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test]
async fn deleting_a_color_preserves_order_item_snapshots(pool: PgPool) {
    let state = state(&pool);
    let (product_id, variant_id) = seed_variant(&pool, 5).await;
    let graph = order_service::create_order(&state, checkout(vec![line(product_id, Some(variant_id), 1)]))
        .await
        .unwrap();

    // Cascades product_colors -> product_variants; the order item must
    // survive with its denormalized names and a nulled variant link.
    sqlx::query("DELETE FROM product_colors WHERE product_id = $1")
        .bind(product_id)
        .execute(&pool)
        .await
        .unwrap();

    let (variant, color_name): (Option<Uuid>, Option<String>) = sqlx::query_as(
        "SELECT variant_id, color_name FROM order_items WHERE order_id = $1",
    )
    .bind(graph.order.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(variant, None);
    assert_eq!(color_name.as_deref(), Some("Navy"));
}
