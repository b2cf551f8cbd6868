/// Router Module Index
///
/// Organizes routing by catalog resource rather than by access level: each
/// resource router registers its public reads and admin writes on the same
/// paths, and the role gate is enforced inside the write handlers via the
/// `AuthUser` extractor. This keeps one path from being split across
/// routers, which `Router::merge` rejects.
use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Category catalog routes (tree of storefront/blog groupings).
pub mod categories;

/// Product catalog routes, including the slug-based storefront lookup.
pub mod products;

/// Tag vocabulary routes.
pub mod tags;

/// Admin dashboard routes (full catalog listing and counters).
pub mod admin;

/// Assembles everything under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(categories::routes())
        .merge(products::routes())
        .merge(tags::routes())
        // GET /api/me
        // Profile of the authenticated caller; any valid session may use it.
        .route("/me", get(handlers::get_me))
        .nest("/admin", admin::routes())
}
