//! HTTP-level tests against a running server backed by the in-memory store.
//!
//! Each test starts its own server on a free local port, so they can run in
//! parallel without any external infrastructure.

use std::sync::Arc;
use std::time::Duration;

use ecommerce_service::clock::{Clock, SystemClock};
use ecommerce_service::config::Config;
use ecommerce_service::domain::event::ProductEventType;
use ecommerce_service::domain::ports::EventLog;
use ecommerce_service::infrastructure::store::{InMemoryStore, KeyValueStore};
use ecommerce_service::infrastructure::KvEventLog;
use ecommerce_service::{build_server, AppState};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

struct TestApp {
    url: String,
    http: Client,
    events: KvEventLog,
}

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .map(|addr| addr.port())
        .expect("no free port")
}

/// Wait until the server accepts connections. Any HTTP response counts.
async fn wait_for_http(http: &Client, url: &str) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        if tokio::time::Instant::now() > deadline {
            panic!("server at {} did not become ready", url);
        }
        if http.get(url).send().await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_app() -> TestApp {
    let config = Config::default();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new(Arc::clone(&clock)));

    let (state, worker) = AppState::new(Arc::clone(&store), Arc::clone(&clock), &config);
    tokio::spawn(worker.run());

    let port = free_port();
    let server = build_server(state, "127.0.0.1", port).expect("failed to bind server");
    tokio::spawn(server);

    let url = format!("http://127.0.0.1:{}", port);
    let http = Client::new();
    wait_for_http(&http, &format!("{}/products", url)).await;

    TestApp {
        url,
        http,
        events: KvEventLog::new(
            store,
            clock,
            config.tables.events,
            chrono::Duration::seconds(config.event_ttl_secs),
        ),
    }
}

impl TestApp {
    async fn create_product(&self, code: &str, price: &str) -> Value {
        let resp = self
            .http
            .post(format!("{}/products", self.url))
            .json(&json!({
                "productName": format!("Product {code}"),
                "code": code,
                "model": "M1",
                "productUrl": format!("https://shop.example.com/{code}"),
                "price": price,
            }))
            .send()
            .await
            .expect("request failed");
        assert_eq!(resp.status(), StatusCode::CREATED);
        resp.json().await.expect("invalid JSON")
    }

    async fn create_order(&self, email: &str, product_ids: &[&str]) -> reqwest::Response {
        self.http
            .post(format!("{}/orders", self.url))
            .json(&json!({
                "email": email,
                "productIds": product_ids,
                "payment": "CREDIT_CARD",
                "shipping": { "type": "ECONOMIC", "carrier": "CORREIOS" },
            }))
            .send()
            .await
            .expect("request failed")
    }

    /// Events are written by a background worker; poll until `wanted` shows up.
    async fn wait_for_event(&self, code: &str, wanted: ProductEventType) -> bool {
        for _ in 0..50 {
            let events = self.events.events_for_product(code).expect("event query failed");
            if events.iter().any(|r| r.event.event_type == wanted) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        false
    }
}

#[tokio::test]
async fn product_lifecycle() {
    let app = spawn_app().await;

    let created = app.create_product("PH-1", "199.90").await;
    let id = created["id"].as_str().expect("id").to_string();
    assert_eq!(created["productName"], "Product PH-1");
    assert_eq!(created["price"], "199.90");

    let fetched: Value = app
        .http
        .get(format!("{}/products/{}", app.url, id))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid JSON");
    assert_eq!(fetched, created);

    let resp = app
        .http
        .put(format!("{}/products/{}", app.url, id))
        .json(&json!({
            "productName": "Phone",
            "code": "PH-1",
            "price": "149.90",
        }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.expect("invalid JSON");
    assert_eq!(updated["id"], id.as_str());
    assert_eq!(updated["price"], "149.90");

    let resp = app
        .http
        .delete(format!("{}/products/{}", app.url, id))
        .header("x-actor-email", "ops@example.com")
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .http
        .get(format!("{}/products/{}", app.url, id))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    assert!(app.wait_for_event("PH-1", ProductEventType::Created).await);
    assert!(app.wait_for_event("PH-1", ProductEventType::Updated).await);
    assert!(app.wait_for_event("PH-1", ProductEventType::Deleted).await);

    let events = app.events.events_for_product("PH-1").expect("event query failed");
    let deleted = events
        .iter()
        .find(|r| r.event.event_type == ProductEventType::Deleted)
        .expect("deleted event");
    assert_eq!(deleted.event.email, "ops@example.com");
}

#[tokio::test]
async fn caller_supplied_product_id_is_ignored() {
    let app = spawn_app().await;
    let fixed = Uuid::new_v4().to_string();

    let resp = app
        .http
        .post(format!("{}/products", app.url))
        .json(&json!({
            "id": fixed,
            "productName": "Tablet",
            "code": "TB-1",
            "price": "10.00",
        }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await.expect("invalid JSON");
    assert_ne!(created["id"], fixed.as_str());
}

#[tokio::test]
async fn unknown_product_returns_404() {
    let app = spawn_app().await;

    let resp = app
        .http
        .get(format!("{}/products/{}", app.url, Uuid::new_v4()))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .http
        .delete(format!("{}/products/{}", app.url, Uuid::new_v4()))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_product_is_rejected() {
    let app = spawn_app().await;

    let resp = app
        .http
        .post(format!("{}/products", app.url))
        .json(&json!({ "productName": "Broken", "code": "BR-1", "price": "-1" }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .http
        .post(format!("{}/products", app.url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn batch_lookup_returns_existing_subset() {
    let app = spawn_app().await;
    let a = app.create_product("A", "1.00").await;
    let b = app.create_product("B", "2.00").await;

    let ids = format!(
        "{},{},{}",
        a["id"].as_str().expect("id"),
        Uuid::new_v4(),
        b["id"].as_str().expect("id")
    );
    let found: Vec<Value> = app
        .http
        .get(format!("{}/products", app.url))
        .query(&[("ids", ids)])
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid JSON");

    let codes: Vec<&str> = found.iter().filter_map(|p| p["code"].as_str()).collect();
    assert_eq!(codes, vec!["A", "B"]);
}

#[tokio::test]
async fn order_total_is_computed_from_product_prices() {
    let app = spawn_app().await;
    let a = app.create_product("A", "10.10").await;
    let b = app.create_product("B", "0.20").await;
    let a_id = a["id"].as_str().expect("id");
    let b_id = b["id"].as_str().expect("id");

    let resp = app.create_order("ana@example.com", &[a_id, b_id]).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.expect("invalid JSON");
    assert_eq!(order["email"], "ana@example.com");
    assert_eq!(order["billing"]["payment"], "CREDIT_CARD");
    assert_eq!(order["billing"]["totalPrice"], "10.30");
    assert_eq!(order["shipping"]["type"], "ECONOMIC");
    assert_eq!(order["products"].as_array().map(Vec::len), Some(2));

    let order_id = order["id"].as_str().expect("id");
    let fetched: Value = app
        .http
        .get(format!("{}/orders", app.url))
        .query(&[("email", "ana@example.com"), ("orderId", order_id)])
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid JSON");
    assert_eq!(fetched, order);

    let mine: Vec<Value> = app
        .http
        .get(format!("{}/orders", app.url))
        .query(&[("email", "ana@example.com")])
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid JSON");
    assert_eq!(mine.len(), 1);

    let resp = app
        .http
        .delete(format!("{}/orders", app.url))
        .query(&[("email", "ana@example.com"), ("orderId", order_id)])
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let all: Vec<Value> = app
        .http
        .get(format!("{}/orders", app.url))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid JSON");
    assert!(all.is_empty());
}

#[tokio::test]
async fn decimal_prices_add_up_exactly() {
    let app = spawn_app().await;
    let a = app.create_product("A", "0.1").await;
    let b = app.create_product("B", "0.2").await;
    assert_eq!(a["price"], "0.1");

    let resp = app
        .create_order(
            "ana@example.com",
            &[a["id"].as_str().expect("id"), b["id"].as_str().expect("id")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.expect("invalid JSON");
    assert_eq!(order["billing"]["totalPrice"], "0.3");
}

#[tokio::test]
async fn numeric_price_is_rejected() {
    let app = spawn_app().await;

    let resp = app
        .http
        .post(format!("{}/products", app.url))
        .json(&json!({ "productName": "Float", "code": "FL-1", "price": 0.1 }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let all: Vec<Value> = app
        .http
        .get(format!("{}/products", app.url))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid JSON");
    assert!(all.is_empty());
}

#[tokio::test]
async fn order_with_missing_product_is_not_stored() {
    let app = spawn_app().await;
    let a = app.create_product("A", "5.00").await;
    let missing = Uuid::new_v4().to_string();

    let resp = app
        .create_order("ana@example.com", &[a["id"].as_str().expect("id"), missing.as_str()])
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("invalid JSON");
    assert_eq!(body["error"], "Some product was not found");
    assert_eq!(body["missingProductIds"], json!([missing]));

    let mine: Vec<Value> = app
        .http
        .get(format!("{}/orders", app.url))
        .query(&[("email", "ana@example.com")])
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid JSON");
    assert!(mine.is_empty());
}

#[tokio::test]
async fn unknown_order_returns_404() {
    let app = spawn_app().await;
    let order_id = Uuid::new_v4().to_string();

    let resp = app
        .http
        .get(format!("{}/orders", app.url))
        .query(&[("email", "ana@example.com"), ("orderId", order_id.as_str())])
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unsupported_routes_and_methods_return_400() {
    let app = spawn_app().await;

    let resp = app
        .http
        .get(format!("{}/nowhere", app.url))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .http
        .patch(format!("{}/products", app.url))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .http
        .get(format!("{}/products/not-a-uuid", app.url))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .http
        .delete(format!("{}/orders", app.url))
        .query(&[("email", "ana@example.com")])
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
