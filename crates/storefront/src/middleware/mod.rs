//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors)
//! 2. CORS
//! 3. `TraceLayer` (request span)
//! 4. Request ID (add unique ID to each request and its span)
//! 5. Session layer (tower-sessions with `PostgreSQL` store)
//! 6. Rate limiting on `/auth` (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{RequireAuth, clear_current_customer, set_current_customer};
pub use rate_limit::auth_rate_limiter;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use session::create_session_layer;
