//! HTTP API server for the storefront service.
//!
//! Exposes the auth, catalog, order, and review surfaces over axum, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod seed;

use std::sync::Arc;

use auth::AuthService;
use axum::Router;
use axum::routing::{get, patch, post};
use domain::{CatalogService, OrderService, ReviewService};
use metrics_exporter_prometheus::PrometheusHandle;
use notify::Mailer;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub auth: AuthService<S>,
    pub catalog: CatalogService<S>,
    pub orders: OrderService<S>,
    pub reviews: ReviewService<S>,
}

/// Wires the services over a store and mailer.
pub fn create_state<S: Store + Clone>(
    store: S,
    mailer: Arc<dyn Mailer>,
    config: &Config,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        auth: AuthService::new(
            store.clone(),
            mailer.clone(),
            config.frontend_base_url.clone(),
        ),
        catalog: CatalogService::new(store.clone()),
        orders: OrderService::new(store.clone(), mailer, config.admin_email.clone()),
        reviews: ReviewService::new(store),
    })
}

/// Creates the axum application router with all routes and shared state.
pub fn create_app<S: Store + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/auth/register", post(routes::auth::register::<S>))
        .route("/auth/login", post(routes::auth::login::<S>))
        .route(
            "/auth/password-reset/request",
            post(routes::auth::request_password_reset::<S>),
        )
        .route(
            "/auth/password-reset/confirm",
            post(routes::auth::confirm_password_reset::<S>),
        )
        .route("/items", get(routes::items::list::<S>))
        .route("/items/categories/list", get(routes::items::categories::<S>))
        .route("/items/{id}", get(routes::items::get::<S>))
        .route("/reviews", post(routes::reviews::create::<S>))
        .route("/reviews/all", get(routes::reviews::all::<S>))
        .route("/reviews/item/{id}", get(routes::reviews::for_item::<S>))
        .route("/reviews/user/{id}", get(routes::reviews::for_user::<S>))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders/all", get(routes::orders::all::<S>))
        .route("/orders/user/{id}", get(routes::orders::for_user::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/status", patch(routes::orders::update_status::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
