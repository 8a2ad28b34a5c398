//! Category handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::domain::value_objects::slugify;
use crate::error::ApiError;
use crate::models::Category;
use crate::AppState;

pub async fn list_categories(State(s): State<AppState>) -> Result<Json<Vec<Category>>, ApiError> {
    let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY position, name")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(categories))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub position: i32,
}

pub async fn create_category(
    State(s): State<AppState>,
    Json(r): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    r.validate()?;
    let slug = slugify(&r.name);
    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (id, name, slug, description, position) VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&r.name)
    .bind(&slug)
    .bind(&r.description)
    .bind(r.position)
    .fetch_one(&s.db)
    .await
    .map_err(|e| ApiError::on_unique(e, "DUPLICATE_SLUG", format!("category slug {slug} already exists")))?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<CategoryRequest>,
) -> Result<Json<Category>, ApiError> {
    r.validate()?;
    let slug = slugify(&r.name);
    let category = sqlx::query_as::<_, Category>(
        "UPDATE categories SET name = $2, slug = $3, description = $4, position = $5 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&r.name)
    .bind(&slug)
    .bind(&r.description)
    .bind(r.position)
    .fetch_optional(&s.db)
    .await
    .map_err(|e| ApiError::on_unique(e, "DUPLICATE_SLUG", format!("category slug {slug} already exists")))?
    .ok_or(ApiError::NotFound("category"))?;
    Ok(Json(category))
}

pub async fn delete_category(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(&s.db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(d) if d.is_foreign_key_violation() => ApiError::Business {
                code: "CATEGORY_IN_USE",
                message: "category still has products assigned".to_string(),
            },
            _ => ApiError::Database(e),
        })?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("category"));
    }
    Ok(StatusCode::NO_CONTENT)
}
