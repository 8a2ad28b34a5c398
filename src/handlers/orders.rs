//! Order handlers: storefront checkout plus the admin order desk.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{Address, Order, OrderItem, User};
use crate::services::order_service::{self, CreateOrderRequest, OrderGraph, UpdateOrderStatusRequest};
use crate::{AppState, ListParams, PaginatedResponse};

pub async fn create_order(
    State(s): State<AppState>,
    Json(r): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderGraph>), ApiError> {
    let graph = order_service::create_order(&s, r).await?;
    Ok((StatusCode::CREATED, Json(graph)))
}

#[derive(Debug, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

pub async fn admin_list_orders(
    State(s): State<AppState>,
    Query(p): Query<ListParams>,
) -> Result<Json<PaginatedResponse<OrderWithItems>>, ApiError> {
    let (page, limit, offset) = p.page_window();
    let status = p.status.as_deref().map(str::to_uppercase);
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE ($1::text IS NULL OR status = $1) \
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(&status)
    .bind(limit)
    .bind(offset)
    .fetch_all(&s.db)
    .await?;
    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE ($1::text IS NULL OR status = $1)")
            .bind(&status)
            .fetch_one(&s.db)
            .await?;

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let items = sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = ANY($1)")
        .bind(&order_ids)
        .fetch_all(&s.db)
        .await?;
    let data = orders
        .into_iter()
        .map(|order| OrderWithItems {
            items: items.iter().filter(|i| i.order_id == order.id).cloned().collect(),
            order,
        })
        .collect();
    Ok(Json(PaginatedResponse { data, total, page }))
}

#[derive(Debug, Serialize)]
pub struct AdminOrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub customer: User,
    pub address: Address,
}

pub async fn admin_get_order(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AdminOrderDetail>, ApiError> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(ApiError::NotFound("order"))?;
    let items = sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = $1")
        .bind(id)
        .fetch_all(&s.db)
        .await?;
    let customer = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(order.user_id)
        .fetch_one(&s.db)
        .await?;
    let address = sqlx::query_as::<_, Address>("SELECT * FROM addresses WHERE id = $1")
        .bind(order.address_id)
        .fetch_one(&s.db)
        .await?;
    Ok(Json(AdminOrderDetail { order, items, customer, address }))
}

pub async fn update_order_status(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<UpdateOrderStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let order = order_service::transition_status(&s, id, r).await?;
    Ok(Json(order))
}

const EXPORT_HEADERS: [&str; 8] =
    ["Order #", "Date", "Customer", "Email", "Status", "Payment", "Subtotal", "Total"];

/// XLSX export of all orders, newest first.
pub async fn export_orders(State(s): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let orders = sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at DESC")
        .fetch_all(&s.db)
        .await?;

    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, header) in EXPORT_HEADERS.iter().enumerate() {
        sheet
            .write_string(0, col as u16, *header)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))?;
    }
    for (row, order) in orders.iter().enumerate() {
        let row = (row + 1) as u32;
        sheet
            .write_string(row, 0, &order.order_number)
            .and_then(|s| s.write_string(row, 1, order.created_at.format("%Y-%m-%d %H:%M").to_string()))
            .and_then(|s| s.write_string(row, 2, &order.customer_name))
            .and_then(|s| s.write_string(row, 3, &order.customer_email))
            .and_then(|s| s.write_string(row, 4, &order.status))
            .and_then(|s| s.write_string(row, 5, &order.payment_status))
            .and_then(|s| s.write_number(row, 6, order.subtotal.to_f64().unwrap_or(0.0)))
            .and_then(|s| s.write_number(row, 7, order.total.to_f64().unwrap_or(0.0)))
            .map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))?;
    }
    let buffer = workbook
        .save_to_buffer()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"orders.xlsx\""),
        ],
        buffer,
    ))
}
