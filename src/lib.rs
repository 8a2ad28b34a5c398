//! medwear-commerce - storefront and back-office for a medical-apparel retailer.
//!
//! ## Features
//! - Product catalog with color/size variants and per-variant stock
//! - Order lifecycle with confirmation-time inventory reconciliation
//! - Promotional discount engine (percentage and fixed codes)
//! - Student-discount verification workflow
//! - Admin dashboard rollups and XLSX order export

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub nats: Option<async_nats::Client>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub category: Option<Uuid>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub active: Option<bool>,
}

impl ListParams {
    /// Clamped (page, limit, offset) for LIMIT/OFFSET queries.
    pub fn page_window(&self) -> (u32, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).min(100);
        // Offset arithmetic in i64: u32 values can overflow the multiply.
        (page, per_page as i64, (page as i64 - 1) * per_page as i64)
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
}
