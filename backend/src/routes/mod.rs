//! Route definitions for the Retail Back-Office Platform

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health::health_check))
        // Protected routes - catalog master data
        .nest("/catalog", catalog_routes())
        // Protected routes - stock lots
        .nest("/stock", stock_routes())
        // Protected routes - sales
        .nest("/sales", sales_routes())
        // Protected routes - customer returns
        .nest("/customer-returns", customer_return_routes())
        // Protected routes - supplier returns
        .nest("/supplier-returns", supplier_return_routes())
        // Protected routes - reports
        .nest("/reports", report_routes())
}

/// Catalog master data routes (protected)
fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/categories",
            get(handlers::catalog::list_categories).post(handlers::catalog::create_category),
        )
        .route(
            "/products",
            get(handlers::catalog::list_products).post(handlers::catalog::create_product),
        )
        .route(
            "/suppliers",
            get(handlers::catalog::list_suppliers).post(handlers::catalog::create_supplier),
        )
        .route(
            "/colors",
            get(handlers::catalog::list_colors).post(handlers::catalog::create_color),
        )
        .route(
            "/sizes",
            get(handlers::catalog::list_sizes).post(handlers::catalog::create_size),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stock lot routes (protected)
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/lots",
            get(handlers::stock_lot::list_lots).post(handlers::stock_lot::stock_in),
        )
        .route("/lots/bulk", post(handlers::stock_lot::bulk_upsert))
        .route("/summary", get(handlers::stock_lot::stock_summary))
        .route(
            "/lots/:lot_id",
            get(handlers::stock_lot::get_lot).patch(handlers::stock_lot::adjust_lot),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Sales routes (protected)
fn sales_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::sales::list_sales).post(handlers::sales::create_sale),
        )
        .route("/credit", get(handlers::sales::list_credit_sales))
        .route("/:sales_id", get(handlers::sales::get_sale))
        .route("/:sales_id/payments", post(handlers::sales::add_payment))
        .route("/:sales_id/bill", get(handlers::sales::get_bill))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Customer return routes (protected)
fn customer_return_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::customer_return::list_returns).post(handlers::customer_return::create_return),
        )
        .route("/:return_id", get(handlers::customer_return::get_return))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Supplier return routes (protected)
fn supplier_return_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::supplier_return::list_returns).post(handlers::supplier_return::create_return),
        )
        .route(
            "/:return_id",
            get(handlers::supplier_return::get_return)
                .delete(handlers::supplier_return::delete_return),
        )
        .route(
            "/:return_id/status",
            patch(handlers::supplier_return::update_status),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Reporting routes (protected)
fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/credit", get(handlers::report::credit_overview))
        .route("/low-stock", get(handlers::report::low_stock))
        .route("/profit", get(handlers::report::profit_summary))
        .route_layer(middleware::from_fn(auth_middleware))
}
