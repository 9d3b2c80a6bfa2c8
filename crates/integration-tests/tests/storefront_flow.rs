//! A customer's journey through the HTTP API against a real database.

#![allow(clippy::unwrap_used)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use tienda_integration_tests::{Fixture, json_body, test_state, unique};
use tienda_storefront::routes::app;

/// Drives the router with one customer's session cookie.
struct Client {
    app: Router,
    cookie: Option<String>,
}

impl Client {
    async fn send(&mut self, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "198.51.100.20");
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_owned());
        }
        response
    }
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_register_shop_and_checkout() {
    let state = test_state().await;
    let fx = Fixture::new(state.store().clone()).await;
    let product = fx.product(&unique("Zapato"), "30.00", 5).await;

    let mut client = Client {
        app: app(state),
        cookie: None,
    };
    let email = format!("{}@tienda.test", unique("ana").replace(' ', "-"));

    // Register logs the new customer in.
    let response = client
        .send(
            Method::POST,
            "/auth/register",
            Some(json!({"name": "Ana Lopez", "email": email, "password": "zapatos-2024"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(client.cookie.is_some());
    let customer = json_body(response).await;
    assert_eq!(customer["email"], email);
    assert!(customer.get("password_hash").is_none());

    // Registering the same email again is a conflict.
    let response = client
        .send(
            Method::POST,
            "/auth/register",
            Some(json!({"name": "Otra Persona", "email": email, "password": "zapatos-2024"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["error"], "UserAlreadyExists");

    let response = client
        .send(
            Method::POST,
            "/cart/items",
            Some(json!({"product_id": product, "quantity": 3, "size": "38"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cart = json_body(response).await;
    assert_eq!(cart["item_count"], 3);
    assert_eq!(cart["subtotal"], "90.00");

    let response = client.send(Method::POST, "/cart/checkout", None).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let receipt = json_body(response).await;
    assert_eq!(receipt["total"], "90.00");
    assert_eq!(fx.stock(product).await, 2);

    // The cart is gone, so a second checkout is rejected.
    let response = client.send(Method::POST, "/cart/checkout", None).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["error"], "EmptyCart");

    let response = client.send(Method::GET, "/orders", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let orders = json_body(response).await;
    assert_eq!(orders.as_array().unwrap().len(), 1);
    assert_eq!(orders[0]["id"], receipt["order_id"]);

    let uri = format!("/orders/{}", receipt["order_id"]);
    let detail = json_body(client.send(Method::GET, &uri, None).await).await;
    assert_eq!(detail["lines"][0]["unit_price"], "30.00");
    assert_eq!(detail["lines"][0]["size"], "38");

    // Logging out ends the session.
    let response = client.send(Method::POST, "/auth/logout", None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = client.send(Method::GET, "/cart", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_oversized_order_is_rejected_with_product_name() {
    let state = test_state().await;
    let fx = Fixture::new(state.store().clone()).await;
    let name = unique("Sandalia");
    let product = fx.product(&name, "12.00", 1).await;

    let mut client = Client {
        app: app(state),
        cookie: None,
    };
    let email = format!("{}@tienda.test", unique("luis").replace(' ', "-"));
    let response = client
        .send(
            Method::POST,
            "/auth/register",
            Some(json!({"name": "Luis Perez", "email": email, "password": "sandalias-1"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    client
        .send(
            Method::POST,
            "/cart/items",
            Some(json!({"product_id": product, "quantity": 2})),
        )
        .await;

    let response = client.send(Method::POST, "/cart/checkout", None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert_eq!(body["error"], "InsufficientStock");
    assert_eq!(body["product"], name.as_str());
    assert_eq!(body["available"], 1);
    assert_eq!(fx.stock(product).await, 1);
}
