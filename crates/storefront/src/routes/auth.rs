//! Authentication route handlers.
//!
//! Password login backed by a server-side session. The session cookie is the
//! only credential clients hold.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::JsonBody;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_customer, set_current_customer};
use crate::models::{CurrentCustomer, Customer};
use crate::services::{AuthService, Registration};
use crate::state::AppState;

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Create an account and log it in.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    JsonBody(body): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<Customer>)> {
    let customer = AuthService::new(state.pool())
        .register(Registration {
            name: body.name,
            email: body.email,
            password: body.password,
            phone: body.phone,
            address: body.address,
        })
        .await?;

    start_session(&session, &customer).await?;

    Ok((StatusCode::CREATED, Json(customer)))
}

/// Log in with email and password.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<Json<Customer>> {
    let customer = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await
        .inspect_err(|e| tracing::info!(error = %e, "Login failed"))?;

    start_session(&session, &customer).await?;
    tracing::info!(customer_id = %customer.id, "Customer logged in");

    Ok(Json(customer))
}

/// Log out and discard the session.
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_customer(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The logged-in customer's profile.
pub async fn me(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Customer>> {
    let customer = AuthService::new(state.pool())
        .get_customer(current.id)
        .await?;
    Ok(Json(customer))
}

async fn start_session(session: &Session, customer: &Customer) -> Result<()> {
    set_current_customer(session, &CurrentCustomer::from(customer)).await?;
    set_sentry_user(&customer.id, Some(customer.email.as_str()));
    Ok(())
}
