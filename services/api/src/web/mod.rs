pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod ws_handler;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

// Re-export the handlers to make them easily accessible to the binary that
// builds the web server router.
pub use middleware::require_auth;
pub use rest::{
    create_dislike_handler, create_like_handler, delete_dislike_handler, delete_like_handler,
    find_nearby_handler, list_dislikes_handler, list_likes_handler,
};
pub use ws_handler::ws_handler;

use state::AppState;

/// Builds the application router. Cross-cutting layers such as CORS are
/// added by the caller.
pub fn router(app_state: Arc<AppState>) -> Router {
    // The live channel authenticates through its own handshake.
    let public_routes = Router::new().route("/ws", get(ws_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/likes", post(create_like_handler).get(list_likes_handler))
        .route("/likes/{id}", delete(delete_like_handler))
        .route(
            "/dislikes",
            post(create_dislike_handler).get(list_dislikes_handler),
        )
        .route("/dislikes/{id}", delete(delete_dislike_handler))
        .route("/users/nearby", get(find_nearby_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state)
}
