//! In-process stand-in for the remote API, bound to an ephemeral port.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{Path, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post, put};
use serde_json::{Value, json};

use crate::config::{ClientConfig, Timeouts};
use crate::gateway::Gateway;
use crate::session::{SessionStore, User};

pub const VALID_TOKEN: &str = "tok-alice";
pub const PASSWORD: &str = "secret";

/// One request as seen by the mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seen {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

#[derive(Clone, Default)]
pub struct MockApi {
    pub base_url: String,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl MockApi {
    pub async fn spawn() -> Self {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let app = router().layer(middleware::from_fn_with_state(Arc::clone(&seen), record_and_check));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("mock api should bind");
        let addr = listener.local_addr().expect("mock api should have an address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock api should serve");
        });

        Self { base_url: format!("http://{addr}"), seen }
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().expect("seen mutex should lock").clone()
    }

    pub fn last(&self) -> Seen {
        self.seen().pop().expect("mock api should have seen a request")
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_base_url(&self.base_url)
            .with_timeouts(Timeouts { request_secs: 1, connect_secs: 1 })
    }

    pub fn gateway(&self, session: Arc<SessionStore>) -> Gateway {
        Gateway::new(&self.config(), session).expect("gateway should build")
    }
}

pub fn alice() -> User {
    User::new(1_i64, "Alice", "alice@example.com")
}

pub fn signed_in_store(token: &str) -> Arc<SessionStore> {
    let store = SessionStore::in_memory();
    store.login(token, alice());
    Arc::new(store)
}

async fn record_and_check(State(seen): State<Arc<Mutex<Vec<Seen>>>>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    seen.lock().expect("seen mutex should lock").push(Seen {
        method: request.method().to_string(),
        path: path.clone(),
        authorization: authorization.clone(),
    });

    let public = path == "/login" || path == "/register" || path.starts_with("/activate");
    if !public && authorization.as_deref() != Some(format!("Bearer {VALID_TOKEN}").as_str()) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthorized" }))).into_response();
    }
    next.run(request).await
}

fn router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/category/get-category", get(categories))
        .route("/category/save-category", post(echo_created))
        .route("/category/update-category", put(echo_ok))
        .route("/category/{kind}", get(categories_by_kind))
        .route("/income/getIncomesForCurrentMonth", get(incomes))
        .route("/income/add", post(echo_created))
        .route("/expense/getExpensesForCurrentMonth", get(expenses))
        .route("/expense/add", post(echo_created))
        .route("/filter", post(filter))
        .route("/dashboard/get-data", get(dashboard))
        .route("/dashboard/reset", delete(reset))
        .route("/boom", get(boom))
        .route("/slow", get(slow))
        .route("/forbidden", get(forbidden))
        .route("/echo-headers", get(echo_headers))
}

async fn login(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    match (email, password) {
        ("alice@example.com", PASSWORD) => Json(json!({
            "token": VALID_TOKEN,
            "user": { "id": 1, "fullName": "Alice", "email": "alice@example.com", "profileImageUrl": null }
        }))
        .into_response(),
        ("half@example.com", PASSWORD) => Json(json!({ "token": "tok-half" })).into_response(),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Invalid credentials" }))).into_response(),
    }
}

async fn register(Json(body): Json<Value>) -> Response {
    if body["email"] == "taken@example.com" {
        return (StatusCode::CONFLICT, Json(json!({ "message": "Email already registered" }))).into_response();
    }
    (StatusCode::CREATED, Json(json!({ "id": 2, "fullName": body["fullName"], "email": body["email"] }))).into_response()
}

fn category_list() -> Vec<Value> {
    vec![
        json!({ "id": 1, "name": "Salary", "type": "income", "icon": "💼" }),
        json!({ "id": 2, "name": "Groceries", "type": "expense", "icon": "🛒" }),
    ]
}

async fn categories() -> Json<Vec<Value>> {
    Json(category_list())
}

async fn categories_by_kind(Path(kind): Path<String>) -> Json<Vec<Value>> {
    Json(category_list().into_iter().filter(|c| c["type"] == kind.as_str()).collect())
}

async fn echo_created(Json(mut body): Json<Value>) -> Response {
    body["id"] = json!(99);
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn echo_ok(Json(body): Json<Value>) -> Json<Value> {
    Json(body)
}

async fn incomes() -> Json<Value> {
    Json(json!([
        { "id": 10, "name": "Paycheck", "amount": 2500.0, "date": "2026-10-01", "icon": "💰",
          "categoryId": 1, "categoryName": "Salary" },
        { "id": 11, "name": "Freelance", "amount": 400.5, "date": "2026-10-09", "icon": null,
          "categoryId": 1, "categoryName": "Salary" }
    ]))
}

async fn expenses() -> Json<Value> {
    Json(json!([
        { "id": 20, "name": "Market", "amount": 82.25, "date": "2026-10-03", "icon": "🛒",
          "categoryId": 2, "categoryName": "Groceries" }
    ]))
}

async fn filter(Json(body): Json<Value>) -> Json<Value> {
    if body["keyword"] == "none" {
        return Json(json!([]));
    }
    Json(json!([
        { "id": 10, "name": "Paycheck", "amount": 2500.0, "date": "2026-10-01", "categoryId": 1 }
    ]))
}

async fn dashboard() -> Json<Value> {
    Json(json!({
        "totalIncome": 2900.5,
        "totalExpenses": 82.25,
        "RecentTransactions": [
            { "id": 20, "name": "Market", "amount": 82.25, "date": "2026-10-03", "type": "expense" }
        ],
        "latest5Income": [
            { "id": 10, "name": "Paycheck", "amount": 2500.0, "date": "2026-10-01" }
        ],
        "latest5expenses": []
    }))
}

async fn reset() -> StatusCode {
    StatusCode::OK
}

async fn boom() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "message": "db down" }))).into_response()
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(3)).await;
    "late"
}

async fn forbidden() -> StatusCode {
    StatusCode::FORBIDDEN
}

async fn echo_headers(headers: HeaderMap) -> Json<Value> {
    let custom = headers.get("x-trace").and_then(|v| v.to_str().ok()).unwrap_or_default();
    Json(json!({ "x-trace": custom }))
}
