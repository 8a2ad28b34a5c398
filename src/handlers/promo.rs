//! Promo code handlers: storefront validation plus admin CRUD.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::domain::promo::{evaluate, DiscountType, PromoRejection};
use crate::error::ApiError;
use crate::models::PromoCode;
use crate::{AppState, ListParams, PaginatedResponse};

#[derive(Debug, Deserialize, Validate)]
pub struct ValidatePromoRequest {
    #[validate(length(min = 1, message = "code must not be empty"))]
    pub code: String,
    pub subtotal: Decimal,
    pub user_id: Option<Uuid>,
}

/// Validates and prices a promo code against a subtotal.
///
/// Success is `{valid: true, discount_amount, new_total}`; every rejection
/// is a 400 with `{valid: false, error, code}`. Validation never mutates
/// the code's usage count.
pub async fn validate_promo(
    State(s): State<AppState>,
    Json(r): Json<ValidatePromoRequest>,
) -> Result<Response, ApiError> {
    r.validate()?;
    if r.subtotal < Decimal::ZERO {
        return Err(ApiError::Validation {
            field: Some("subtotal".to_string()),
            message: "subtotal must not be negative".to_string(),
        });
    }

    let code = r.code.trim().to_uppercase();
    let Some(row) = sqlx::query_as::<_, PromoCode>("SELECT * FROM promo_codes WHERE code = $1")
        .bind(&code)
        .fetch_optional(&s.db)
        .await?
    else {
        return Ok(reject(PromoRejection::UnknownCode));
    };
    let promo = row.to_domain().map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))?;

    // Per-user usage is counted against past orders referencing this code.
    let prior_uses = match (promo.per_user_limit, r.user_id) {
        (Some(_), Some(user_id)) => Some(
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM orders WHERE user_id = $1 AND promo_code_id = $2",
            )
            .bind(user_id)
            .bind(row.id)
            .fetch_one(&s.db)
            .await?,
        ),
        _ => None,
    };

    match evaluate(&promo, r.subtotal, Utc::now(), prior_uses) {
        Ok(quote) => Ok(Json(json!({
            "valid": true,
            "promo_code_id": row.id,
            "discount_amount": quote.discount_amount,
            "new_total": quote.new_total,
        }))
        .into_response()),
        Err(rejection) => Ok(reject(rejection)),
    }
}

fn reject(rejection: PromoRejection) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "valid": false,
            "error": rejection.to_string(),
            "code": rejection.code(),
        })),
    )
        .into_response()
}

pub async fn list_promo_codes(
    State(s): State<AppState>,
    Query(p): Query<ListParams>,
) -> Result<Json<PaginatedResponse<PromoCode>>, ApiError> {
    let (page, limit, offset) = p.page_window();
    let codes = sqlx::query_as::<_, PromoCode>(
        "SELECT * FROM promo_codes WHERE ($1::bool IS NULL OR is_active = $1) \
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(p.active)
    .bind(limit)
    .bind(offset)
    .fetch_all(&s.db)
    .await?;
    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM promo_codes WHERE ($1::bool IS NULL OR is_active = $1)")
            .bind(p.active)
            .fetch_one(&s.db)
            .await?;
    Ok(Json(PaginatedResponse { data: codes, total, page }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct PromoCodeRequest {
    #[validate(length(min = 1, message = "code must not be empty"))]
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_order_amount: Option<Decimal>,
    pub max_discount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub per_user_limit: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

fn check_discount_value(r: &PromoCodeRequest) -> Result<(), ApiError> {
    if r.discount_value <= Decimal::ZERO {
        return Err(ApiError::Validation {
            field: Some("discount_value".to_string()),
            message: "discount value must be positive".to_string(),
        });
    }
    if r.discount_type == DiscountType::Percentage && r.discount_value > Decimal::new(100, 0) {
        return Err(ApiError::Validation {
            field: Some("discount_value".to_string()),
            message: "percentage discount cannot exceed 100".to_string(),
        });
    }
    Ok(())
}

pub async fn create_promo_code(
    State(s): State<AppState>,
    Json(r): Json<PromoCodeRequest>,
) -> Result<(StatusCode, Json<PromoCode>), ApiError> {
    r.validate()?;
    check_discount_value(&r)?;
    let code = r.code.trim().to_uppercase();
    let promo = sqlx::query_as::<_, PromoCode>(
        "INSERT INTO promo_codes (id, code, discount_type, discount_value, min_order_amount, \
         max_discount, usage_limit, per_user_limit, start_date, end_date, is_active) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&code)
    .bind(r.discount_type.as_str())
    .bind(r.discount_value)
    .bind(r.min_order_amount)
    .bind(r.max_discount)
    .bind(r.usage_limit)
    .bind(r.per_user_limit)
    .bind(r.start_date)
    .bind(r.end_date)
    .bind(r.is_active)
    .fetch_one(&s.db)
    .await
    .map_err(|e| ApiError::on_unique(e, "DUPLICATE_CODE", format!("promo code {code} already exists")))?;
    Ok((StatusCode::CREATED, Json(promo)))
}

pub async fn update_promo_code(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<PromoCodeRequest>,
) -> Result<Json<PromoCode>, ApiError> {
    r.validate()?;
    check_discount_value(&r)?;
    let code = r.code.trim().to_uppercase();
    let promo = sqlx::query_as::<_, PromoCode>(
        "UPDATE promo_codes SET code = $2, discount_type = $3, discount_value = $4, \
         min_order_amount = $5, max_discount = $6, usage_limit = $7, per_user_limit = $8, \
         start_date = $9, end_date = $10, is_active = $11, updated_at = NOW() \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&code)
    .bind(r.discount_type.as_str())
    .bind(r.discount_value)
    .bind(r.min_order_amount)
    .bind(r.max_discount)
    .bind(r.usage_limit)
    .bind(r.per_user_limit)
    .bind(r.start_date)
    .bind(r.end_date)
    .bind(r.is_active)
    .fetch_optional(&s.db)
    .await
    .map_err(|e| ApiError::on_unique(e, "DUPLICATE_CODE", format!("promo code {code} already exists")))?
    .ok_or(ApiError::NotFound("promo code"))?;
    Ok(Json(promo))
}

/// Codes referenced by past orders are kept for history; deletion only deactivates.
pub async fn deactivate_promo_code(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("UPDATE promo_codes SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(&s.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("promo code"));
    }
    Ok(StatusCode::NO_CONTENT)
}
