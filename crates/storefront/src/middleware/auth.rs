//! Authentication extractor and session helpers.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{CurrentCustomer, session_keys};

/// Extractor that requires a logged-in customer.
///
/// Rejects with a `401 Unauthorized` JSON error when the session holds no
/// customer.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(customer): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", customer.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentCustomer);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Unauthorized("Login required".to_string()))?;

        let customer: CurrentCustomer = session
            .get(session_keys::CURRENT_CUSTOMER)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| AppError::Unauthorized("Login required".to_string()))?;

        tracing::Span::current().record("customer_id", customer.id.as_i32());

        Ok(Self(customer))
    }
}

/// Store the logged-in customer in the session.
///
/// The session ID is cycled first so a pre-login ID cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_customer(
    session: &Session,
    customer: &CurrentCustomer,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session
        .insert(session_keys::CURRENT_CUSTOMER, customer)
        .await
}

/// Clear the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_customer(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
