// src/routes.rs

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{config::AppState, handlers};

pub fn build_router(app_state: AppState) -> Router {
    let lead_routes = Router::new()
        .route("/"
               ,post(handlers::leads::create_lead)
               .get(handlers::leads::list_leads)
        )
        .route("/export", get(handlers::leads::export_leads))
        .route("/by-telegram/{telegram_id}", get(handlers::leads::list_by_telegram_id))
        .route("/{id}"
               ,get(handlers::leads::get_lead)
               .patch(handlers::leads::update_lead)
        )
        .route("/{id}/status", put(handlers::leads::change_status));

    Router::new()
        .route("/health", get(handlers::leads::health))
        .route("/", get(handlers::leads::health))
        .nest("/api/leads", lead_routes)
        .with_state(app_state)
}
