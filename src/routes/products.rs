use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Product Router Module
///
/// The storefront reads products anonymously, filtered to `is_active=true`
/// at the repository level. Writes are admin-only. The slug route is
/// registered before the `{id}` route only for readability; Axum matches
/// the literal segment either way.
pub fn routes() -> Router<AppState> {
    Router::new()
        // GET  /products?category=...&search=...
        // POST /products
        .route(
            "/products",
            get(handlers::list_products).post(handlers::create_product),
        )
        // GET /products/slug/{slug}
        // Storefront detail pages link by slug, not id.
        .route("/products/slug/{slug}", get(handlers::get_product_by_slug))
        // GET    /products/{id}
        // PUT    /products/{id}
        // DELETE /products/{id}
        .route(
            "/products/{id}",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
}
