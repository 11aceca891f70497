use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use super::{handlers, middleware::metrics_middleware, session, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let ui_dir = state.config().server.ui_dir.clone();

    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/industries", get(handlers::list_industries))
        // Session views
        .route("/session", get(session::get_session))
        .route("/session/status", get(session::get_status))
        .route("/session/tables", get(session::get_tables))
        // Intents
        .route("/session/file", post(session::select_file))
        .route("/session/industry", post(session::select_industry))
        .route("/session/taxonomy", post(session::run_taxonomy))
        .route("/session/gartner", post(session::run_gartner))
        .route("/session/download/{kind}", post(session::download))
        // Live updates
        .route("/ws", get(ws::ws_handler))
        .with_state(state);

    let router = Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http());

    // Serve operator UI with SPA fallback
    match ui_dir {
        Some(dir) => {
            let index_path = dir.join("index.html");
            let serve_dir = ServeDir::new(&dir).fallback(ServeFile::new(index_path));
            router.fallback_service(serve_dir)
        }
        None => router,
    }
}
