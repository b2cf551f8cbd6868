use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Tag Router Module
///
/// Tags are a flat, public vocabulary; only the admin mutates it.
pub fn routes() -> Router<AppState> {
    Router::new()
        // GET  /tags -> full vocabulary
        // POST /tags -> admin create, unique by name
        .route("/tags", get(handlers::list_tags).post(handlers::create_tag))
        // DELETE /tags/{id}
        .route("/tags/{id}", axum::routing::delete(handlers::delete_tag))
}
