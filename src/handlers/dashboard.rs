//! Admin dashboard rollups: read-only counts and 30-day deltas.

use axum::extract::State;
use axum::Json;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub orders_total: i64,
    pub orders_pending: i64,
    pub orders_confirmed: i64,
    pub revenue_paid: Decimal,
    pub products_active: i64,
    pub customers: i64,
    pub student_verifications_pending: i64,
    pub trends: Trends,
}

/// Current 30-day window against the 30 days before it.
#[derive(Debug, Serialize)]
pub struct Trends {
    pub orders_current: i64,
    pub orders_previous: i64,
    pub revenue_current: Decimal,
    pub revenue_previous: Decimal,
}

pub async fn summary(State(s): State<AppState>) -> Result<Json<DashboardSummary>, ApiError> {
    let orders_total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders").fetch_one(&s.db).await?;
    let orders_pending: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE status = 'PENDING'")
        .fetch_one(&s.db)
        .await?;
    let orders_confirmed: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE status = 'CONFIRMED'")
        .fetch_one(&s.db)
        .await?;
    let revenue_paid: Decimal =
        sqlx::query_scalar("SELECT COALESCE(SUM(total), 0) FROM orders WHERE payment_status = 'PAID'")
            .fetch_one(&s.db)
            .await?;
    let products_active: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active")
        .fetch_one(&s.db)
        .await?;
    let customers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'CLIENT'")
        .fetch_one(&s.db)
        .await?;
    let student_verifications_pending: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM users WHERE is_student AND NOT student_verified \
         AND student_id_front IS NOT NULL AND student_id_back IS NOT NULL",
    )
    .fetch_one(&s.db)
    .await?;

    let orders_current: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE created_at >= NOW() - INTERVAL '30 days'")
            .fetch_one(&s.db)
            .await?;
    let orders_previous: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM orders WHERE created_at >= NOW() - INTERVAL '60 days' \
         AND created_at < NOW() - INTERVAL '30 days'",
    )
    .fetch_one(&s.db)
    .await?;
    let revenue_current: Decimal = sqlx::query_scalar(
        "SELECT COALESCE(SUM(total), 0) FROM orders WHERE payment_status = 'PAID' \
         AND created_at >= NOW() - INTERVAL '30 days'",
    )
    .fetch_one(&s.db)
    .await?;
    let revenue_previous: Decimal = sqlx::query_scalar(
        "SELECT COALESCE(SUM(total), 0) FROM orders WHERE payment_status = 'PAID' \
         AND created_at >= NOW() - INTERVAL '60 days' AND created_at < NOW() - INTERVAL '30 days'",
    )
    .fetch_one(&s.db)
    .await?;

    Ok(Json(DashboardSummary {
        orders_total,
        orders_pending,
        orders_confirmed,
        revenue_paid,
        products_active,
        customers,
        student_verifications_pending,
        trends: Trends { orders_current, orders_previous, revenue_current, revenue_previous },
    }))
}
