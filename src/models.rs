//! Row types mapped with `sqlx::FromRow`, mirroring the schema in
//! `migrations/0001_init.sql`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::promo;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: String,
    pub is_student: bool,
    pub student_verified: bool,
    pub student_id_front: Option<String>,
    pub student_id_back: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub sku: String,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub price: Decimal,
    pub compare_price: Option<Decimal>,
    pub is_active: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductColor {
    pub id: Uuid,
    pub product_id: Uuid,
    pub color_name: String,
    pub color_code: String,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductImage {
    pub id: Uuid,
    pub color_id: Uuid,
    pub url: String,
    pub alt: Option<String>,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Size {
    pub id: Uuid,
    pub label: String,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductVariant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub color_id: Uuid,
    pub size_id: Uuid,
    pub sku: String,
    pub quantity: i32,
    pub price_override: Option<Decimal>,
}

/// Variant joined with its size label, as the storefront shows it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct VariantWithSize {
    pub id: Uuid,
    pub product_id: Uuid,
    pub color_id: Uuid,
    pub size_id: Uuid,
    pub size_label: String,
    pub sku: String,
    pub quantity: i32,
    pub price_override: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PromoCode {
    pub id: Uuid,
    pub code: String,
    pub discount_type: String,
    pub discount_value: Decimal,
    pub min_order_amount: Option<Decimal>,
    pub max_discount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub per_user_limit: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub usage_count: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PromoCode {
    /// Domain view for the validation engine. Fails only on a corrupt
    /// `discount_type`, which cannot round-trip through the admin API.
    pub fn to_domain(&self) -> Result<promo::PromoCode, promo::UnknownDiscountType> {
        Ok(promo::PromoCode {
            code: self.code.clone(),
            discount_type: promo::DiscountType::from_str(&self.discount_type)?,
            discount_value: self.discount_value,
            min_order_amount: self.min_order_amount,
            max_discount: self.max_discount,
            usage_limit: self.usage_limit,
            per_user_limit: self.per_user_limit,
            start_date: self.start_date,
            end_date: self.end_date,
            usage_count: self.usage_count,
            is_active: self.is_active,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recipient_name: String,
    pub street: String,
    pub street2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub zip: String,
    pub country: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub address_id: Uuid,
    pub status: String,
    pub payment_status: String,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
    pub promo_code_id: Option<Uuid>,
    pub customer_email: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub product_name: String,
    pub color_name: Option<String>,
    pub size_name: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct HeroSection {
    pub id: Uuid,
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    pub link_url: Option<String>,
    pub position: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
