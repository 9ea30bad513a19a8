use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use storefront_auth::{JwtClaims, Role};
use storefront_core::UserId;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(jwt_secret: &str) -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let app = storefront_api::app::build_app(jwt_secret.to_string()).await;
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Mint a token directly with the shared secret, the way an operator
/// bootstraps the first admin.
fn mint_jwt(jwt_secret: &str, role: Role) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: UserId::new(),
        role,
        iat: now.timestamp(),
        exp: (now + ChronoDuration::minutes(10)).timestamp(),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn signup_customer(
    client: &reqwest::Client,
    base_url: &str,
    username: &str,
) -> (String, serde_json::Value) {
    let res = client
        .post(format!("{base_url}/auth/signup"))
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "correct horse battery",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let body: serde_json::Value = res.json().await.unwrap();
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"].clone(),
    )
}

/// Create a category + product as admin; returns the product id.
async fn seed_product(
    client: &reqwest::Client,
    base_url: &str,
    admin_token: &str,
    stock: i64,
    price: &str,
) -> String {
    let res = client
        .post(format!("{base_url}/categories"))
        .bearer_auth(admin_token)
        .json(&json!({ "name": format!("Gadgets-{}", UserId::new()) }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let category: serde_json::Value = res.json().await.unwrap();

    let res = client
        .post(format!("{base_url}/products"))
        .bearer_auth(admin_token)
        .json(&json!({
            "name": "Widget",
            "description": "A widget",
            "price": price,
            "stock_quantity": stock,
            "category_id": category["id"],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let product: serde_json::Value = res.json().await.unwrap();
    product["id"].as_str().unwrap().to_string()
}

async fn product_stock(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    product_id: &str,
) -> i64 {
    let res = client
        .get(format!("{base_url}/products/{product_id}"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    body["stock_quantity"].as_i64().unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn("test-secret").await;

    let res = reqwest::Client::new()
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    for path in ["/whoami", "/products", "/orders", "/users"] {
        let res = client
            .get(format!("{}{path}", srv.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "path {path}");
    }
}

#[tokio::test]
async fn signup_then_login_round_trip() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let (token, user) = signup_customer(&client, &srv.base_url, "alice").await;
    assert_eq!(user["role"], "customer");
    assert!(user.get("password_hash").is_none());

    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["role"], "customer");
    assert_eq!(body["user_id"], user["id"]);

    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "username": "alice", "password": "wrong password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "username": "alice", "password": "correct horse battery" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    signup_customer(&client, &srv.base_url, "alice").await;

    let res = client
        .post(format!("{}/auth/signup", srv.base_url))
        .json(&json!({
            "username": "alice",
            "email": "alice2@example.com",
            "password": "correct horse battery",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn customers_cannot_manage_catalog_or_users() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let (token, _) = signup_customer(&client, &srv.base_url, "alice").await;

    let res = client
        .post(format!("{}/categories", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "Sneaky" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .get(format!("{}/users", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn full_order_flow_with_stock_accounting() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();

    let admin = mint_jwt(jwt_secret, Role::Admin);
    let product_id = seed_product(&client, &srv.base_url, &admin, 5, "10.00").await;
    let (customer, _) = signup_customer(&client, &srv.base_url, "alice").await;

    // Order the whole stock.
    let res = client
        .post(format!("{}/orders", srv.base_url))
        .bearer_auth(&customer)
        .json(&json!({ "product_id": product_id, "quantity": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let order: serde_json::Value = res.json().await.unwrap();
    assert_eq!(order["status"], "pending");
    let order_id = order["id"].as_str().unwrap();

    assert_eq!(product_stock(&client, &srv.base_url, &customer, &product_id).await, 0);

    // The total is exact.
    let res = client
        .get(format!("{}/orders/{order_id}/total", srv.base_url))
        .bearer_auth(&customer)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["total"], "50.00");

    // No stock left: the next order is refused.
    let res = client
        .post(format!("{}/orders", srv.base_url))
        .bearer_auth(&customer)
        .json(&json!({ "product_id": product_id, "quantity": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_stock");

    // Admin moves the order along; once processed it is no longer editable.
    let res = client
        .post(format!("{}/orders/{order_id}/status", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "status": "processed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .put(format!("{}/orders/{order_id}", srv.base_url))
        .bearer_auth(&customer)
        .json(&json!({ "quantity": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Cancelling a processed order returns its units to stock.
    let res = client
        .post(format!("{}/orders/{order_id}/status", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "status": "cancelled" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(product_stock(&client, &srv.base_url, &customer, &product_id).await, 5);
}

#[tokio::test]
async fn order_quantity_must_be_positive() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();

    let admin = mint_jwt(jwt_secret, Role::Admin);
    let product_id = seed_product(&client, &srv.base_url, &admin, 5, "10.00").await;
    let (customer, _) = signup_customer(&client, &srv.base_url, "alice").await;

    for quantity in [0, -3] {
        let res = client
            .post(format!("{}/orders", srv.base_url))
            .bearer_auth(&customer)
            .json(&json!({ "product_id": product_id, "quantity": quantity }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["error"], "invalid_quantity");
    }

    assert_eq!(product_stock(&client, &srv.base_url, &customer, &product_id).await, 5);
}

#[tokio::test]
async fn lifecycle_stages_cannot_be_skipped() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();

    let admin = mint_jwt(jwt_secret, Role::Admin);
    let product_id = seed_product(&client, &srv.base_url, &admin, 5, "10.00").await;
    let (customer, _) = signup_customer(&client, &srv.base_url, "alice").await;

    let res = client
        .post(format!("{}/orders", srv.base_url))
        .bearer_auth(&customer)
        .json(&json!({ "product_id": product_id, "quantity": 1 }))
        .send()
        .await
        .unwrap();
    let order: serde_json::Value = res.json().await.unwrap();
    let order_id = order["id"].as_str().unwrap();

    let res = client
        .post(format!("{}/orders/{order_id}/status", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "status": "delivered" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_status_transition");
}

#[tokio::test]
async fn owners_can_edit_and_delete_pending_orders() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();

    let admin = mint_jwt(jwt_secret, Role::Admin);
    let product_id = seed_product(&client, &srv.base_url, &admin, 5, "10.00").await;
    let (customer, _) = signup_customer(&client, &srv.base_url, "alice").await;

    let res = client
        .post(format!("{}/orders", srv.base_url))
        .bearer_auth(&customer)
        .json(&json!({ "product_id": product_id, "quantity": 2 }))
        .send()
        .await
        .unwrap();
    let order: serde_json::Value = res.json().await.unwrap();
    let order_id = order["id"].as_str().unwrap();
    assert_eq!(product_stock(&client, &srv.base_url, &customer, &product_id).await, 3);

    let res = client
        .put(format!("{}/orders/{order_id}", srv.base_url))
        .bearer_auth(&customer)
        .json(&json!({ "quantity": 4 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(product_stock(&client, &srv.base_url, &customer, &product_id).await, 1);

    let res = client
        .delete(format!("{}/orders/{order_id}", srv.base_url))
        .bearer_auth(&customer)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(product_stock(&client, &srv.base_url, &customer, &product_id).await, 5);
}

#[tokio::test]
async fn customers_cannot_touch_other_peoples_orders() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();

    let admin = mint_jwt(jwt_secret, Role::Admin);
    let product_id = seed_product(&client, &srv.base_url, &admin, 5, "10.00").await;
    let (alice, _) = signup_customer(&client, &srv.base_url, "alice").await;
    let (bob, _) = signup_customer(&client, &srv.base_url, "bob").await;

    let res = client
        .post(format!("{}/orders", srv.base_url))
        .bearer_auth(&alice)
        .json(&json!({ "product_id": product_id, "quantity": 1 }))
        .send()
        .await
        .unwrap();
    let order: serde_json::Value = res.json().await.unwrap();
    let order_id = order["id"].as_str().unwrap();

    let res = client
        .get(format!("{}/orders/{order_id}", srv.base_url))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Bob's own listing stays empty; Alice sees her order.
    let res = client
        .get(format!("{}/orders", srv.base_url))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["items"].as_array().unwrap().is_empty());

    let res = client
        .get(format!("{}/orders", srv.base_url))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
}
