//! Admin customer handlers, including the student-verification review.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::User;
use crate::{AppState, ListParams, PaginatedResponse};

pub async fn list_customers(
    State(s): State<AppState>,
    Query(p): Query<ListParams>,
) -> Result<Json<PaginatedResponse<User>>, ApiError> {
    let (page, limit, offset) = p.page_window();
    let search = p.search.as_deref().map(|t| format!("%{t}%"));
    let customers = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE role = 'CLIENT' \
         AND ($1::text IS NULL OR email ILIKE $1 OR first_name ILIKE $1 OR last_name ILIKE $1) \
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(&search)
    .bind(limit)
    .bind(offset)
    .fetch_all(&s.db)
    .await?;
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM users WHERE role = 'CLIENT' \
         AND ($1::text IS NULL OR email ILIKE $1 OR first_name ILIKE $1 OR last_name ILIKE $1)",
    )
    .bind(&search)
    .fetch_one(&s.db)
    .await?;
    Ok(Json(PaginatedResponse { data: customers, total, page }))
}

#[derive(Debug, Deserialize)]
pub struct StudentVerificationRequest {
    pub approved: bool,
}

/// Manual review of uploaded student IDs. Approval requires both ID images
/// to be on file; rejection simply clears the verified flag.
pub async fn review_student_verification(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<StudentVerificationRequest>,
) -> Result<Json<User>, ApiError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(ApiError::NotFound("customer"))?;

    if r.approved && (user.student_id_front.is_none() || user.student_id_back.is_none()) {
        return Err(ApiError::Business {
            code: "MISSING_STUDENT_ID",
            message: "cannot approve: student ID images are not on file".to_string(),
        });
    }

    let updated = sqlx::query_as::<_, User>(
        "UPDATE users SET student_verified = $2, is_student = CASE WHEN $2 THEN TRUE ELSE is_student END, \
         updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(r.approved)
    .fetch_one(&s.db)
    .await?;
    tracing::info!(customer = %updated.email, approved = r.approved, "student verification reviewed");
    Ok(Json(updated))
}
