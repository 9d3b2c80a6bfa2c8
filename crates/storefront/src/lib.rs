//! Tienda storefront library.
//!
//! JSON API for the catalog, cart, checkout and order history, exposed as a
//! library so the router can be driven from tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
