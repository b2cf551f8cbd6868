use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Nested under `/api/admin`. Every handler here authenticates via the
/// `AuthUser` extractor and then checks the admin role before touching the
/// repository, so a customer session gets a 403 without side effects.
pub fn routes() -> Router<AppState> {
    Router::new()
        // GET /admin/products
        // Lists ALL products including soft-disabled ones, for the
        // back-office catalog view.
        .route("/products", get(handlers::list_all_products))
        // GET /admin/stats
        // Dashboard counters (products, categories, tags, inactive products).
        .route("/stats", get(handlers::get_catalog_stats))
}
