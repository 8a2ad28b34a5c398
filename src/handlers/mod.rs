//! HTTP surface: route assembly for the storefront and the admin back-office.

use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub mod categories;
pub mod content;
pub mod customers;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod promo;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "medwear-commerce"})) }))
        // Storefront
        .route("/api/v1/products", get(products::list_products))
        .route("/api/v1/products/:slug", get(products::get_product))
        .route("/api/v1/categories", get(categories::list_categories))
        .route("/api/v1/sizes", get(products::list_sizes))
        .route("/api/v1/content/hero", get(content::list_active_hero))
        .route("/api/v1/orders", post(orders::create_order))
        .route("/api/v1/promo-codes/validate", post(promo::validate_promo))
        // Admin back-office
        .route("/api/v1/admin/dashboard", get(dashboard::summary))
        .route("/api/v1/admin/products", get(products::admin_list_products).post(products::create_product))
        .route("/api/v1/admin/products/:id", put(products::update_product).delete(products::deactivate_product))
        .route("/api/v1/admin/products/:id/colors", post(products::create_color))
        .route("/api/v1/admin/colors/:id", delete(products::delete_color))
        .route("/api/v1/admin/products/:id/variants", post(products::create_variant))
        .route("/api/v1/admin/variants/:id", put(products::update_variant))
        .route("/api/v1/admin/sizes", post(products::create_size))
        .route("/api/v1/admin/categories", post(categories::create_category))
        .route("/api/v1/admin/categories/:id", put(categories::update_category).delete(categories::delete_category))
        .route("/api/v1/admin/orders", get(orders::admin_list_orders))
        .route("/api/v1/admin/orders/export", get(orders::export_orders))
        .route("/api/v1/admin/orders/:id", get(orders::admin_get_order).put(orders::update_order_status))
        .route("/api/v1/admin/customers", get(customers::list_customers))
        .route("/api/v1/admin/customers/:id/student-verification", put(customers::review_student_verification))
        .route("/api/v1/admin/promo-codes", get(promo::list_promo_codes).post(promo::create_promo_code))
        .route("/api/v1/admin/promo-codes/:id", put(promo::update_promo_code).delete(promo::deactivate_promo_code))
        .route("/api/v1/admin/hero", get(content::admin_list_hero).post(content::create_hero))
        .route("/api/v1/admin/hero/:id", put(content::update_hero).delete(content::delete_hero))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
