use aerodesk_api::{app, AppState, AuthConfig};
use aerodesk_core::memory::{fixtures, MemoryStore};
use aerodesk_core::repository::PermissionRepository;
use aerodesk_core::{BcryptHasher, PermissionKind, Repositories};
use aerodesk_shared::Masked;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const AGENT_PASSWORD: &str = "welcome-aboard";

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
}

impl TestApp {
    fn new() -> Self {
        let store = MemoryStore::new();
        let state = AppState::new(
            Repositories::from_adapter(store.clone()),
            Arc::new(BcryptHasher::new(4)),
            Masked::new(AGENT_PASSWORD.to_string()),
            AuthConfig {
                secret: "integration-secret".to_string(),
                expiration: 3600,
            },
        );
        Self {
            router: app(state),
            store,
        }
    }

    async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    async fn login(&self, role: &str, identifier: &str, password: &str) -> String {
        let (status, body) = self
            .post(
                "/v1/auth/login",
                None,
                json!({ "role": role, "identifier": identifier, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }

    async fn customer_token(&self, email: &str) -> String {
        let (status, _) = self.post("/v1/auth/signup", None, customer_signup(email)).await;
        assert_eq!(status, StatusCode::CREATED);
        self.login("customer", email, "hunter2").await
    }

    async fn staff_token(&self, airline: &str, username: &str, grants: &[PermissionKind]) -> String {
        fixtures::seed_airline(&self.store, airline).await;
        let (status, _) = self
            .post(
                "/v1/auth/signup",
                None,
                json!({
                    "role": "airline_staff",
                    "username": username,
                    "first_name": "Jane",
                    "last_name": "Doe",
                    "date_of_birth": "1985-06-01",
                    "airline_name": airline,
                    "password": "hunter2"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        for kind in grants {
            self.store.grant(username, *kind).await.unwrap();
        }
        self.login("airline_staff", username, "hunter2").await
    }
}

fn customer_signup(email: &str) -> Value {
    json!({
        "role": "customer",
        "email": email,
        "name": "Ada Lovelace",
        "address": {
            "building_number": "12",
            "street": "Main St",
            "city": "Springfield",
            "state": "IL"
        },
        "phone_number": "555-0100",
        "passport": { "number": "X1234567", "expiration": "2030-01-01", "country": "US" },
        "date_of_birth": "1990-01-01",
        "password": "hunter2"
    })
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_signup_login_and_profile() {
    let app = TestApp::new();
    let token = app.customer_token("ada@example.com").await;

    let (status, profile) = app.get("/v1/customer/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["email"], "ada@example.com");
    assert_eq!(profile["address"], "12 Main St, Springfield, IL");
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() {
    let app = TestApp::new();
    app.customer_token("ada@example.com").await;

    let (status, body) = app.post("/v1/auth/signup", None, customer_signup("ada@example.com")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("ada@example.com"));
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let app = TestApp::new();
    app.customer_token("ada@example.com").await;

    let (status, body) = app
        .post(
            "/v1/auth/login",
            None,
            json!({ "role": "customer", "identifier": "ada@example.com", "password": "nope" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    // Same account, wrong role.
    let (status, _) = app
        .post(
            "/v1/auth/login",
            None,
            json!({ "role": "booking_agent", "identifier": "ada@example.com", "password": "hunter2" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_a_session() {
    let app = TestApp::new();
    let (status, _) = app.get("/v1/customer/profile", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/v1/staff/reports/revenue", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_customer_purchase_until_sold_out() {
    let app = TestApp::new();
    fixtures::seed_flight(&app.store, "Delta", 100, 2).await;
    let token = app.customer_token("ada@example.com").await;
    let purchase = json!({ "airline_name": "Delta", "flight_num": 100 });

    for _ in 0..2 {
        let (status, body) = app.post("/v1/customer/purchases", Some(&token), purchase.clone()).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["customer_email"], "ada@example.com");
        assert!(body["booking_agent_id"].is_null());
    }

    let (status, body) = app.post("/v1/customer/purchases", Some(&token), purchase).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("No tickets"));
    assert_eq!(app.store.purchase_count().await, 2);

    let (status, details) = app.get("/v1/flights/Delta/100", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["availability"]["available"], 0);

    let (status, flights) = app.get("/v1/customer/flights", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flights.as_array().unwrap().len(), 2);

    let (status, history) = app.get("/v1/customer/flights?scope=history", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(history.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_purchase_on_unknown_flight_is_not_found() {
    let app = TestApp::new();
    let token = app.customer_token("ada@example.com").await;

    let (status, _) = app
        .post(
            "/v1/customer/purchases",
            Some(&token),
            json!({ "airline_name": "Delta", "flight_num": 999 }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_customer_cannot_use_agent_or_staff_routes() {
    let app = TestApp::new();
    fixtures::seed_flight(&app.store, "Delta", 100, 2).await;
    let token = app.customer_token("ada@example.com").await;

    let (status, _) = app
        .post(
            "/v1/agent/purchases",
            Some(&token),
            json!({ "airline_name": "Delta", "flight_num": 100, "customer_email": "ada@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get("/v1/staff/reports/top-agents", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.store.purchase_count().await, 0);
}

#[tokio::test]
async fn test_admin_onboards_agent_who_sells_a_ticket() {
    let app = TestApp::new();
    fixtures::seed_flight(&app.store, "Delta", 100, 3).await;
    fixtures::seed_flight(&app.store, "United", 200, 3).await;
    app.customer_token("ada@example.com").await;
    let admin = app.staff_token("Delta", "jane", &[PermissionKind::Admin]).await;

    let (status, agent) = app
        .post("/v1/staff/agents", Some(&admin), json!({ "email": "bob@travel.example" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let agent_id = agent["booking_agent_id"].as_i64().unwrap();

    let agent_token = app.login("booking_agent", "bob@travel.example", AGENT_PASSWORD).await;

    let (status, purchase) = app
        .post(
            "/v1/agent/purchases",
            Some(&agent_token),
            json!({ "airline_name": "Delta", "flight_num": 100, "customer_email": "ada@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(purchase["booking_agent_id"].as_i64(), Some(agent_id));

    // Other airlines are off limits.
    let (status, _) = app
        .post(
            "/v1/agent/purchases",
            Some(&agent_token),
            json!({ "airline_name": "United", "flight_num": 200, "customer_email": "ada@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, bookings) = app.get("/v1/agent/bookings", Some(&agent_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bookings.as_array().unwrap().len(), 1);

    // 5% of 500.00
    let (status, commission) = app.get("/v1/agent/commission", Some(&agent_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(commission["tickets_sold"], 1);
    assert_eq!(commission["total_commission"], 2_500);

    let (status, _) = app.get("/v1/agent/commission?start=2026-01-01", Some(&agent_token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_agent_search_is_narrowed_to_their_airline() {
    let app = TestApp::new();
    let delta = fixtures::seed_flight(&app.store, "Delta", 100, 3).await;
    fixtures::seed_flight(&app.store, "United", 200, 3).await;
    let admin = app.staff_token("Delta", "jane", &[PermissionKind::Admin]).await;
    app.post("/v1/staff/agents", Some(&admin), json!({ "email": "bob@travel.example" }))
        .await;
    let agent_token = app.login("booking_agent", "bob@travel.example", AGENT_PASSWORD).await;

    let (_, all) = app.get("/v1/flights", None).await;
    let date = all[0]["departure_time"].as_str().unwrap()[..10].to_string();
    let uri = format!("/v1/flights/search?source=JFK&destination=PVG&date={}", date);

    let (status, anonymous) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(anonymous.as_array().unwrap().len(), 2);

    let (status, narrowed) = app.get(&uri, Some(&agent_token)).await;
    assert_eq!(status, StatusCode::OK);
    let narrowed = narrowed.as_array().unwrap();
    assert_eq!(narrowed.len(), 1);
    assert_eq!(narrowed[0]["airline_name"], delta.airline_name);

    let (status, _) = app.get("/v1/flights/search?source=JFK&destination=PVG", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_staff_permissions_gate_console_actions() {
    let app = TestApp::new();
    fixtures::seed_flight(&app.store, "Delta", 100, 3).await;
    let plain = app.staff_token("Delta", "jane", &[]).await;
    let operator = app.staff_token("Delta", "omar", &[PermissionKind::Operator]).await;

    let (status, perms) = app.get("/v1/me/permissions", Some(&plain)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(perms["description"], "regular airline staff member");

    let status_change = json!({ "status": "delayed" });
    let (status, _) = app
        .post("/v1/staff/flights/100/status", Some(&plain), status_change.clone())
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post("/v1/staff/flights/100/status", Some(&operator), status_change)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, flights) = app.get("/v1/staff/flights", Some(&plain)).await;
    assert_eq!(flights[0]["status"], "delayed");

    let (status, _) = app
        .post(
            "/v1/staff/airports",
            Some(&operator),
            json!({ "airport_name": "LAX", "airport_city": "Los Angeles" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_creates_flight_with_tickets() {
    let app = TestApp::new();
    let admin = app.staff_token("Delta", "jane", &[PermissionKind::Admin]).await;

    let (status, _) = app
        .post("/v1/staff/airplanes", Some(&admin), json!({ "airplane_id": 7, "seats": 4 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    for (name, city) in [("JFK", "New York"), ("LAX", "Los Angeles")] {
        let (status, _) = app
            .post(
                "/v1/staff/airports",
                Some(&admin),
                json!({ "airport_name": name, "airport_city": city }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, created) = app
        .post(
            "/v1/staff/flights",
            Some(&admin),
            json!({
                "flight_num": 42,
                "departure_airport": "JFK",
                "departure_time": "2030-05-01T08:00:00Z",
                "arrival_airport": "LAX",
                "arrival_time": "2030-05-01T14:00:00Z",
                "price": 30000,
                "airplane_id": 7
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["tickets_created"], 4);
    assert_eq!(created["airline_name"], "Delta");

    let (_, details) = app.get("/v1/flights/Delta/42", None).await;
    assert_eq!(details["availability"]["total"], 4);
    assert_eq!(details["status"], "upcoming");

    let (status, availability) = app.get("/v1/flights/Delta/42/availability", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(availability["available"], 4);

    let (status, body) = app
        .post(
            "/v1/staff/flights",
            Some(&admin),
            json!({
                "flight_num": 43,
                "departure_airport": "JFK",
                "departure_time": "2030-05-02T08:00:00Z",
                "arrival_airport": "LAX",
                "arrival_time": "2030-05-02T14:00:00Z",
                "price": i64::MAX / 4,
                "airplane_id": 7
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("price"));
    let (status, _) = app.get("/v1/flights/Delta/43", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_staff_reports_cover_own_airline() {
    let app = TestApp::new();
    let key = fixtures::seed_flight(&app.store, "Delta", 100, 3).await;
    let staff = app.staff_token("Delta", "jane", &[]).await;
    app.customer_token("ada@example.com").await;
    fixtures::seed_purchase(&app.store, &key, "ada@example.com", None, chrono::Utc::now().date_naive()).await;

    let (status, revenue) = app.get("/v1/staff/reports/revenue", Some(&staff)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(revenue["last_month"]["direct"], 50_000);
    assert_eq!(revenue["last_month"]["indirect"], 0);

    let (status, sales) = app.get("/v1/staff/reports/ticket-sales", Some(&staff)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sales["total"], 1);

    let (status, flights) = app
        .get("/v1/staff/reports/customers/ada@example.com/flights", Some(&staff))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flights.as_array().unwrap().len(), 1);

    let (status, customers) = app.get("/v1/staff/flights/100/customers", Some(&staff)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(customers[0]["email"], "ada@example.com");
}
