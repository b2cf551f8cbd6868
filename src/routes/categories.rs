use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Category Router Module
///
/// Anonymous clients may list and read active categories; create, update and
/// delete require an admin session, enforced in the handlers so the method
/// routers can share a path.
pub fn routes() -> Router<AppState> {
    Router::new()
        // GET  /categories        -> active categories only
        // POST /categories        -> admin create
        .route(
            "/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        // GET    /categories/{id} -> single category (active or not)
        // PUT    /categories/{id} -> admin partial update
        // DELETE /categories/{id} -> admin hard delete; children are detached,
        //                            not removed (parent link set to null)
        .route(
            "/categories/{id}",
            get(handlers::get_category)
                .put(handlers::update_category)
                .delete(handlers::delete_category),
        )
}
