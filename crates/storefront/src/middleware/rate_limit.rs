//! Rate limiting middleware using governor and `tower_governor`.
//!
//! `auth_rate_limiter` guards the login and registration endpoints against
//! credential stuffing (~10 requests per minute per client IP).

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Key extractor that trusts proxy headers first, then the peer address.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();

        // First IP in the X-Forwarded-For chain
        if let Some(ip) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        if let Some(ip) = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        // Set by `into_make_service_with_connect_info`
        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for auth endpoints: ~10 requests per minute per IP.
///
/// Configuration: 1 request every 6 seconds (replenish), burst of 5.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers (`per_second(6)` and `burst_size(5)`), which are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn auth_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(6) // Replenish 1 token every 6 seconds (~10/minute)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tower_governor::key_extractor::KeyExtractor;

    fn request(headers: &[(&str, &str)]) -> Request<()> {
        let mut builder = Request::builder().uri("/auth/login");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn test_forwarded_for_takes_first_hop() {
        let req = request(&[("x-forwarded-for", "203.0.113.7, 10.0.0.1")]);
        let ip = ClientIpKeyExtractor.extract(&req).unwrap();
        assert_eq!(ip, "203.0.113.7".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_real_ip_fallback() {
        let req = request(&[("x-real-ip", "198.51.100.4")]);
        let ip = ClientIpKeyExtractor.extract(&req).unwrap();
        assert_eq!(ip, "198.51.100.4".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_peer_address_fallback() {
        let mut req = request(&[]);
        req.extensions_mut()
            .insert(ConnectInfo("192.0.2.9:5555".parse::<SocketAddr>().unwrap()));
        let ip = ClientIpKeyExtractor.extract(&req).unwrap();
        assert_eq!(ip, "192.0.2.9".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_no_source_is_an_error() {
        assert!(ClientIpKeyExtractor.extract(&request(&[])).is_err());
    }
}
