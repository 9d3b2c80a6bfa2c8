//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`.
//!
//! Every error response is JSON:
//!
//! ```json
//! {"error": "InsufficientStock", "message": "not enough stock for Bota: 2 available",
//!  "product": "Bota", "available": 2}
//! ```

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{AuthError, CheckoutError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Customer is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request conflicts with current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Internal(format!("session error: {err}"))
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    available: Option<i32>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::CustomerNotFound => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) | AuthError::InvalidName(_) => {
                    StatusCode::BAD_REQUEST
                }
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart => StatusCode::UNPROCESSABLE_ENTITY,
                CheckoutError::InsufficientStock { .. } => StatusCode::CONFLICT,
                CheckoutError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                CheckoutError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Checkout(CheckoutError::EmptyCart) => "EmptyCart",
            Self::Checkout(CheckoutError::InsufficientStock { .. }) => "InsufficientStock",
            Self::Checkout(CheckoutError::StoreUnavailable(_)) => "StoreUnavailable",
            Self::Auth(AuthError::InvalidCredentials | AuthError::CustomerNotFound) => {
                "InvalidCredentials"
            }
            Self::Auth(AuthError::UserAlreadyExists) => "UserAlreadyExists",
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => "NotFound",
            Self::Database(RepositoryError::Conflict(_)) | Self::Conflict(_) => "Conflict",
            Self::Unauthorized(_) => "Unauthorized",
            Self::BadRequest(_)
            | Self::Database(RepositoryError::InvalidInput(_))
            | Self::Auth(AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) | AuthError::InvalidName(_)) => {
                "BadRequest"
            }
            _ => "InternalError",
        }
    }

    /// Client-facing message. Internal details are never exposed.
    fn message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(msg))
            | Self::Database(RepositoryError::InvalidInput(msg))
            | Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg) => msg.clone(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::CustomerNotFound => {
                    "Invalid credentials".to_string()
                }
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(e) => format!("Invalid email address: {e}"),
                AuthError::InvalidName(e) => format!("Invalid name: {e}"),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Internal server error".to_string()
                }
            },
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart | CheckoutError::InsufficientStock { .. } => {
                    err.to_string()
                }
                CheckoutError::StoreUnavailable(_) => {
                    "The store is busy, please try again".to_string()
                }
                CheckoutError::Repository(_) => "Internal server error".to_string(),
            },
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let (product, available) = match &self {
            Self::Checkout(CheckoutError::InsufficientStock {
                product_name,
                available,
            }) => (Some(product_name.clone()), Some(*available)),
            _ => (None, None),
        };

        let body = ErrorBody {
            error: self.kind(),
            message: self.message(),
            product,
            available,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a customer ID.
///
/// Call this after successful authentication to associate errors with customers.
pub fn set_sentry_user(customer_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(customer_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the customer.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 123".to_string());
        assert_eq!(err.to_string(), "Not found: product 123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Database(RepositoryError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Auth(AuthError::UserAlreadyExists).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Auth(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_checkout_status_codes() {
        assert_eq!(
            AppError::Checkout(CheckoutError::EmptyCart).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Checkout(CheckoutError::InsufficientStock {
                product_name: "Bota".into(),
                available: 1,
            })
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Checkout(CheckoutError::StoreUnavailable(sqlx::Error::PoolTimedOut)).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_quantity_overflow_is_bad_request() {
        let (status, json) = body_json(AppError::Database(RepositoryError::InvalidInput(
            "cart quantity is too large".into(),
        )))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json,
            serde_json::json!({"error": "BadRequest", "message": "cart quantity is too large"})
        );
    }

    #[tokio::test]
    async fn test_empty_cart_body() {
        let (status, json) = body_json(AppError::Checkout(CheckoutError::EmptyCart)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            json,
            serde_json::json!({"error": "EmptyCart", "message": "the cart is empty"})
        );
    }

    #[tokio::test]
    async fn test_insufficient_stock_body_names_product() {
        let (_, json) = body_json(AppError::Checkout(CheckoutError::InsufficientStock {
            product_name: "Zapato 1".into(),
            available: 2,
        }))
        .await;

        assert_eq!(json["error"], "InsufficientStock");
        assert_eq!(json["product"], "Zapato 1");
        assert_eq!(json["available"], 2);
        assert_eq!(json["message"], "not enough stock for Zapato 1: 2 available");
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let (status, json) = body_json(AppError::Database(RepositoryError::DataCorruption(
            "secret detail".into(),
        )))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "InternalError");
        assert_eq!(json["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_store_unavailable_body() {
        let (_, json) = body_json(AppError::Checkout(CheckoutError::StoreUnavailable(
            sqlx::Error::PoolTimedOut,
        )))
        .await;
        assert_eq!(json["error"], "StoreUnavailable");
    }
}
