//! fieldsales: multi-tenant field-sales backend built around receipt book
//! sequencing, with user directory, collection records and coaching
//! evaluations behind an axum JSON API.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub mod coaching;
pub mod config;
pub mod error;
pub mod messages;
pub mod models;
pub mod receipt_book;
pub mod routes;
pub mod state;
pub mod team;
pub mod telemetry;
pub mod tenant;

use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/users", get(routes::users_index).post(routes::users_create))
        .route("/users/{id}", get(routes::users_show))
        .route(
            "/receipt-books",
            get(routes::receipt_books_index).post(routes::receipt_books_create),
        )
        .route(
            "/receipt-books/{id}",
            get(routes::receipt_books_show)
                .put(routes::receipt_books_update)
                .delete(routes::receipt_books_delete),
        )
        .route(
            "/receipt-books/{id}/validate",
            get(routes::receipt_books_validate),
        )
        .route(
            "/receipt-books/{id}/consume",
            post(routes::receipt_books_consume),
        )
        .route(
            "/receipt-books/{id}/missing",
            get(routes::receipt_books_missing),
        )
        .route("/receipt-books/{id}/stats", get(routes::receipt_books_stats))
        .route(
            "/collections",
            get(routes::collections_index).post(routes::collections_create),
        )
        .route(
            "/coachings",
            get(routes::coachings_index).post(routes::coachings_create),
        )
        .route(
            "/coachings/{id}",
            get(routes::coachings_show)
                .put(routes::coachings_update)
                .delete(routes::coachings_delete),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
