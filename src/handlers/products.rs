//! Catalog handlers: products, colors, variants and sizes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::value_objects::{slugify, Sku};
use crate::error::ApiError;
use crate::models::{Product, ProductColor, ProductImage, ProductVariant, Size, VariantWithSize};
use crate::{AppState, ListParams, PaginatedResponse};

/// Storefront listing: active products only.
pub async fn list_products(
    State(s): State<AppState>,
    Query(p): Query<ListParams>,
) -> Result<Json<PaginatedResponse<Product>>, ApiError> {
    let (page, limit, offset) = p.page_window();
    let search = p.search.as_deref().map(|t| format!("%{t}%"));
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE is_active \
         AND ($1::uuid IS NULL OR category_id = $1) \
         AND ($2::text IS NULL OR name ILIKE $2) \
         ORDER BY is_featured DESC, created_at DESC LIMIT $3 OFFSET $4",
    )
    .bind(p.category)
    .bind(&search)
    .bind(limit)
    .bind(offset)
    .fetch_all(&s.db)
    .await?;
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM products WHERE is_active \
         AND ($1::uuid IS NULL OR category_id = $1) \
         AND ($2::text IS NULL OR name ILIKE $2)",
    )
    .bind(p.category)
    .bind(&search)
    .fetch_one(&s.db)
    .await?;
    Ok(Json(PaginatedResponse { data: products, total, page }))
}

#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub colors: Vec<ColorDetail>,
}

#[derive(Debug, Serialize)]
pub struct ColorDetail {
    #[serde(flatten)]
    pub color: ProductColor,
    pub images: Vec<ProductImage>,
    pub variants: Vec<VariantWithSize>,
}

/// Storefront product page: product with colors, images and sized variants.
pub async fn get_product(
    State(s): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductDetail>, ApiError> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE slug = $1 AND is_active")
        .bind(&slug)
        .fetch_optional(&s.db)
        .await?
        .ok_or(ApiError::NotFound("product"))?;
    let colors = sqlx::query_as::<_, ProductColor>(
        "SELECT * FROM product_colors WHERE product_id = $1 ORDER BY position",
    )
    .bind(product.id)
    .fetch_all(&s.db)
    .await?;
    let color_ids: Vec<Uuid> = colors.iter().map(|c| c.id).collect();
    let images = sqlx::query_as::<_, ProductImage>(
        "SELECT * FROM product_images WHERE color_id = ANY($1) ORDER BY position",
    )
    .bind(&color_ids)
    .fetch_all(&s.db)
    .await?;
    let variants = sqlx::query_as::<_, VariantWithSize>(
        "SELECT v.id, v.product_id, v.color_id, v.size_id, s.label AS size_label, v.sku, v.quantity, v.price_override \
         FROM product_variants v JOIN sizes s ON s.id = v.size_id \
         WHERE v.product_id = $1 ORDER BY s.position",
    )
    .bind(product.id)
    .fetch_all(&s.db)
    .await?;

    let colors = colors
        .into_iter()
        .map(|color| ColorDetail {
            images: images.iter().filter(|i| i.color_id == color.id).cloned().collect(),
            variants: variants.iter().filter(|v| v.color_id == color.id).cloned().collect(),
            color,
        })
        .collect();
    Ok(Json(ProductDetail { product, colors }))
}

/// Admin listing: includes inactive products, optional active filter.
pub async fn admin_list_products(
    State(s): State<AppState>,
    Query(p): Query<ListParams>,
) -> Result<Json<PaginatedResponse<Product>>, ApiError> {
    let (page, limit, offset) = p.page_window();
    let search = p.search.as_deref().map(|t| format!("%{t}%"));
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE ($1::bool IS NULL OR is_active = $1) \
         AND ($2::text IS NULL OR name ILIKE $2 OR sku ILIKE $2) \
         ORDER BY created_at DESC LIMIT $3 OFFSET $4",
    )
    .bind(p.active)
    .bind(&search)
    .bind(limit)
    .bind(offset)
    .fetch_all(&s.db)
    .await?;
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM products WHERE ($1::bool IS NULL OR is_active = $1) \
         AND ($2::text IS NULL OR name ILIKE $2 OR sku ILIKE $2)",
    )
    .bind(p.active)
    .bind(&search)
    .fetch_one(&s.db)
    .await?;
    Ok(Json(PaginatedResponse { data: products, total, page }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub category_id: Option<Uuid>,
    pub price: Decimal,
    pub compare_price: Option<Decimal>,
    #[serde(default)]
    pub is_featured: bool,
}

pub async fn create_product(
    State(s): State<AppState>,
    Json(r): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    r.validate()?;
    if r.price < Decimal::ZERO {
        return Err(ApiError::Validation {
            field: Some("price".to_string()),
            message: "price must not be negative".to_string(),
        });
    }
    let sku = match &r.sku {
        Some(raw) => Sku::new(raw.clone()).map_err(|e| ApiError::Validation {
            field: Some("sku".to_string()),
            message: e.to_string(),
        })?,
        None => Sku::generate(),
    };
    let slug = slugify(&r.name);
    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products (id, sku, slug, name, description, category_id, price, compare_price, is_featured) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(sku.as_str())
    .bind(&slug)
    .bind(&r.name)
    .bind(&r.description)
    .bind(r.category_id)
    .bind(r.price)
    .bind(r.compare_price)
    .bind(r.is_featured)
    .fetch_one(&s.db)
    .await
    .map_err(|e| ApiError::on_unique(e, "DUPLICATE_SKU", format!("a product with SKU {sku} or slug {slug} already exists")))?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub price: Decimal,
    pub compare_price: Option<Decimal>,
    pub is_active: bool,
    pub is_featured: bool,
}

pub async fn update_product(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<UpdateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    r.validate()?;
    let product = sqlx::query_as::<_, Product>(
        "UPDATE products SET name = $2, description = $3, category_id = $4, price = $5, \
         compare_price = $6, is_active = $7, is_featured = $8, updated_at = NOW() \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&r.name)
    .bind(&r.description)
    .bind(r.category_id)
    .bind(r.price)
    .bind(r.compare_price)
    .bind(r.is_active)
    .bind(r.is_featured)
    .fetch_optional(&s.db)
    .await?
    .ok_or(ApiError::NotFound("product"))?;
    Ok(Json(product))
}

/// Soft delete: orders keep their item snapshots, so products are only deactivated.
pub async fn deactivate_product(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("UPDATE products SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(&s.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("product"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateColorRequest {
    #[validate(length(min = 1, message = "color name must not be empty"))]
    pub color_name: String,
    #[validate(length(min = 1, message = "color code must not be empty"))]
    pub color_code: String,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub images: Vec<ColorImageRequest>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ColorImageRequest {
    #[validate(url(message = "image url must be a valid URL"))]
    pub url: String,
    pub alt: Option<String>,
    #[serde(default)]
    pub position: i32,
}

#[derive(Debug, Serialize)]
pub struct ColorWithImages {
    #[serde(flatten)]
    pub color: ProductColor,
    pub images: Vec<ProductImage>,
}

pub async fn create_color(
    State(s): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(r): Json<CreateColorRequest>,
) -> Result<(StatusCode, Json<ColorWithImages>), ApiError> {
    r.validate()?;
    for image in &r.images {
        image.validate()?;
    }
    let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(&s.db)
        .await?;
    if exists.is_none() {
        return Err(ApiError::NotFound("product"));
    }

    let mut tx = s.db.begin().await?;
    let color = sqlx::query_as::<_, ProductColor>(
        "INSERT INTO product_colors (id, product_id, color_name, color_code, position) \
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(product_id)
    .bind(&r.color_name)
    .bind(&r.color_code)
    .bind(r.position)
    .fetch_one(&mut *tx)
    .await?;
    let mut images = Vec::with_capacity(r.images.len());
    for image in &r.images {
        let row = sqlx::query_as::<_, ProductImage>(
            "INSERT INTO product_images (id, color_id, url, alt, position) VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(color.id)
        .bind(&image.url)
        .bind(&image.alt)
        .bind(image.position)
        .fetch_one(&mut *tx)
        .await?;
        images.push(row);
    }
    tx.commit().await?;
    Ok((StatusCode::CREATED, Json(ColorWithImages { color, images })))
}

pub async fn delete_color(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM product_colors WHERE id = $1").bind(id).execute(&s.db).await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("color"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVariantRequest {
    pub color_id: Uuid,
    pub size_id: Uuid,
    pub sku: Option<String>,
    #[validate(range(min = 0, message = "quantity must not be negative"))]
    #[serde(default)]
    pub quantity: i32,
    pub price_override: Option<Decimal>,
}

pub async fn create_variant(
    State(s): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(r): Json<CreateVariantRequest>,
) -> Result<(StatusCode, Json<ProductVariant>), ApiError> {
    r.validate()?;
    let owner: Option<Uuid> = sqlx::query_scalar("SELECT product_id FROM product_colors WHERE id = $1")
        .bind(r.color_id)
        .fetch_optional(&s.db)
        .await?;
    match owner {
        None => return Err(ApiError::NotFound("color")),
        Some(p) if p != product_id => {
            return Err(ApiError::Business {
                code: "COLOR_MISMATCH",
                message: "color does not belong to this product".to_string(),
            })
        }
        Some(_) => {}
    }
    let sku = match &r.sku {
        Some(raw) => Sku::new(raw.clone()).map_err(|e| ApiError::Validation {
            field: Some("sku".to_string()),
            message: e.to_string(),
        })?,
        None => Sku::generate(),
    };
    let variant = sqlx::query_as::<_, ProductVariant>(
        "INSERT INTO product_variants (id, product_id, color_id, size_id, sku, quantity, price_override) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(product_id)
    .bind(r.color_id)
    .bind(r.size_id)
    .bind(sku.as_str())
    .bind(r.quantity)
    .bind(r.price_override)
    .fetch_one(&s.db)
    .await
    .map_err(|e| ApiError::on_unique(e, "DUPLICATE_VARIANT", "a variant for this color and size (or with this SKU) already exists"))?;
    Ok((StatusCode::CREATED, Json(variant)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVariantRequest {
    #[validate(range(min = 0, message = "quantity must not be negative"))]
    pub quantity: Option<i32>,
    pub price_override: Option<Decimal>,
}

/// Restock / reprice a variant. Quantity is an absolute set, used by the
/// back-office; order confirmation uses relative decrements instead.
pub async fn update_variant(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<UpdateVariantRequest>,
) -> Result<Json<ProductVariant>, ApiError> {
    r.validate()?;
    let variant = sqlx::query_as::<_, ProductVariant>(
        "UPDATE product_variants SET quantity = COALESCE($2, quantity), price_override = $3 \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(r.quantity)
    .bind(r.price_override)
    .fetch_optional(&s.db)
    .await?
    .ok_or(ApiError::NotFound("variant"))?;
    Ok(Json(variant))
}

pub async fn list_sizes(State(s): State<AppState>) -> Result<Json<Vec<Size>>, ApiError> {
    let sizes = sqlx::query_as::<_, Size>("SELECT * FROM sizes ORDER BY position")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(sizes))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSizeRequest {
    #[validate(length(min = 1, message = "label must not be empty"))]
    pub label: String,
    #[serde(default)]
    pub position: i32,
}

pub async fn create_size(
    State(s): State<AppState>,
    Json(r): Json<CreateSizeRequest>,
) -> Result<(StatusCode, Json<Size>), ApiError> {
    r.validate()?;
    let label = r.label.trim().to_uppercase();
    let size = sqlx::query_as::<_, Size>(
        "INSERT INTO sizes (id, label, position) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&label)
    .bind(r.position)
    .fetch_one(&s.db)
    .await
    .map_err(|e| ApiError::on_unique(e, "DUPLICATE_SIZE", format!("size {label} already exists")))?;
    Ok((StatusCode::CREATED, Json(size)))
}
