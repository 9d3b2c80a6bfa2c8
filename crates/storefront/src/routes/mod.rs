//! HTTP route handlers for the storefront JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                          - Liveness
//! GET    /health/ready                    - Readiness (store reachable)
//!
//! # Auth (rate limited)
//! POST   /auth/register                   - Create account and log in
//! POST   /auth/login                      - Log in
//! POST   /auth/logout                     - Log out
//! GET    /auth/me                         - Current customer
//!
//! # Catalog (requires auth)
//! GET    /products                        - Active products
//! GET    /products/search?q=              - Search by name, brand, category
//! GET    /products/featured               - Most expensive products
//! GET    /products/{id}                   - Product detail
//! GET    /categories                      - Categories
//! GET    /categories/{id}/products        - Products in a category
//!
//! # Cart (requires auth)
//! GET    /cart                            - Cart with subtotal
//! POST   /cart/items                      - Add product (merges same size)
//! PUT    /cart/items/{line_id}/quantity   - Set quantity
//! PUT    /cart/items/{line_id}/size       - Change size
//! DELETE /cart/items/{line_id}            - Remove line
//! POST   /cart/checkout                   - Convert cart into an order
//!
//! # Orders (requires auth)
//! GET    /orders                          - Order history
//! GET    /orders/{id}                     - Order with lines
//! ```

pub mod auth;
pub mod cart;
pub mod health;
pub mod orders;
pub mod products;

use std::time::Duration;

use axum::{
    Router,
    extract::FromRequest,
    http::{HeaderValue, Method, header},
    routing::{get, post, put},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::error::AppError;
use crate::middleware::{auth_rate_limiter, create_session_layer, request_id_middleware};
use crate::state::AppState;

/// JSON request body whose rejections render as `AppError::BadRequest`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .layer(auth_rate_limiter())
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/search", get(products::search))
        .route("/featured", get(products::featured))
        .route("/{id}", get(products::show))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::categories))
        .route("/{id}/products", get(products::by_category))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/items", post(cart::add_item))
        .route("/items/{line_id}", axum::routing::delete(cart::remove_item))
        .route("/items/{line_id}/quantity", put(cart::set_quantity))
        .route("/items/{line_id}/size", put(cart::set_size))
        .route("/checkout", post(cart::checkout))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
}

/// Build the complete application: routes, sessions, tracing, CORS and Sentry.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.pool(), state.config());
    let cors = cors_layer(&state.config().cors_origins);

    routes()
        .layer(session_layer)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        customer_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .layer(cors)
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// CORS for browser clients. Without configured origins any origin may
/// read responses but cookies are not sent cross-origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}
