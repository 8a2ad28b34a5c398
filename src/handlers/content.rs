//! Homepage hero-section management.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::models::HeroSection;
use crate::AppState;

/// Storefront: active sections in display order.
pub async fn list_active_hero(State(s): State<AppState>) -> Result<Json<Vec<HeroSection>>, ApiError> {
    let sections = sqlx::query_as::<_, HeroSection>(
        "SELECT * FROM hero_sections WHERE is_active ORDER BY position",
    )
    .fetch_all(&s.db)
    .await?;
    Ok(Json(sections))
}

pub async fn admin_list_hero(State(s): State<AppState>) -> Result<Json<Vec<HeroSection>>, ApiError> {
    let sections = sqlx::query_as::<_, HeroSection>("SELECT * FROM hero_sections ORDER BY position")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(sections))
}

#[derive(Debug, Deserialize, Validate)]
pub struct HeroSectionRequest {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    pub subtitle: Option<String>,
    #[validate(url(message = "image url must be a valid URL"))]
    pub image_url: String,
    pub link_url: Option<String>,
    #[serde(default)]
    pub position: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

pub async fn create_hero(
    State(s): State<AppState>,
    Json(r): Json<HeroSectionRequest>,
) -> Result<(StatusCode, Json<HeroSection>), ApiError> {
    r.validate()?;
    let section = sqlx::query_as::<_, HeroSection>(
        "INSERT INTO hero_sections (id, title, subtitle, image_url, link_url, position, is_active) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&r.title)
    .bind(&r.subtitle)
    .bind(&r.image_url)
    .bind(&r.link_url)
    .bind(r.position)
    .bind(r.is_active)
    .fetch_one(&s.db)
    .await?;
    Ok((StatusCode::CREATED, Json(section)))
}

pub async fn update_hero(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<HeroSectionRequest>,
) -> Result<Json<HeroSection>, ApiError> {
    r.validate()?;
    let section = sqlx::query_as::<_, HeroSection>(
        "UPDATE hero_sections SET title = $2, subtitle = $3, image_url = $4, link_url = $5, \
         position = $6, is_active = $7 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&r.title)
    .bind(&r.subtitle)
    .bind(&r.image_url)
    .bind(&r.link_url)
    .bind(r.position)
    .bind(r.is_active)
    .fetch_optional(&s.db)
    .await?
    .ok_or(ApiError::NotFound("hero section"))?;
    Ok(Json(section))
}

pub async fn delete_hero(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM hero_sections WHERE id = $1").bind(id).execute(&s.db).await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("hero section"));
    }
    Ok(StatusCode::NO_CONTENT)
}
