//! HTTP API integration tests.
//!
//! Drive the full router (auth extractors, validation, allocation, audit)
//! over the in-memory fakes from `despacho-testing`. The fakes serialize
//! allocation exactly like the production store, so the numbering contract
//! asserted here is the same one the `PostgreSQL` integration tests verify
//! against a real database.

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code uses expect for clear failure messages

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::Duration;
use despacho_auth::mocks::{MemorySessionStore, MemoryUserStore};
use despacho_auth::providers::UserStore;
use despacho_auth::user::NewUser;
use despacho_auth::Authenticator;
use despacho_core::types::Role;
use despacho_server::{build_router, AppState};
use despacho_server::state::AlwaysReady;
use despacho_testing::clock::test_clock;
use despacho_testing::stores::MemoryStores;
use serde_json::{json, Value};
use std::sync::Arc;

async fn test_server() -> TestServer {
    let stores = MemoryStores::new();
    let users = Arc::new(MemoryUserStore::new());
    users
        .create(NewUser::create("admin", "admin123", Role::Admin).expect("valid user"))
        .await
        .expect("seed admin");
    users
        .create(NewUser::create("maria", "secret1", Role::Employee).expect("valid user"))
        .await
        .expect("seed employee");

    let clock = Arc::new(test_clock());
    let auth = Authenticator::new(
        users.clone(),
        Arc::new(MemorySessionStore::new()),
        clock.clone(),
        Duration::days(7),
    );

    let state = AppState {
        dispatches: stores.dispatches.clone(),
        settings: stores.settings.clone(),
        clients: stores.clients.clone(),
        companies: stores.companies.clone(),
        products: stores.products.clone(),
        equipment: stores.equipment.clone(),
        operators: stores.operators.clone(),
        trucks: stores.trucks.clone(),
        audit: stores.audit.clone(),
        users,
        auth,
        clock,
        readiness: Arc::new(AlwaysReady),
    };

    TestServer::new(build_router(state, vec!["http://localhost:3000".to_string()]))
        .expect("test server")
}

async fn login(server: &TestServer, username: &str, password: &str) -> String {
    let response = server
        .post("/api/auth/login")
        .json(&json!({ "username": username, "password": password }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK, "login should work");
    response.json::<Value>()["token"]
        .as_str()
        .expect("token in response")
        .to_string()
}

fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("authorization"),
        HeaderValue::from_str(&format!("Bearer {token}")).expect("valid header"),
    )
}

fn ticket_body(client: &str) -> Value {
    json!({
        "truck_name": "mack granite",
        "plate": "a-123456",
        "client_name": client,
        "total": 4500.0,
        "materials": [
            { "product": "Arena lavada", "quantity": 6.0, "unit_price": 750.0, "amount": 4500.0 }
        ]
    })
}

async fn create_ticket(server: &TestServer, token: &str, client: &str) -> Value {
    let (name, value) = bearer(token);
    let response = server
        .post("/api/dispatches")
        .add_header(name, value)
        .json(&ticket_body(client))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()
}

async fn set_floor(server: &TestServer, token: &str, value: &str) {
    let (name, header) = bearer(token);
    let response = server
        .put("/api/settings/dispatch_start_number")
        .add_header(name, header)
        .json(&json!({ "value": value }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn health_endpoints_are_public() {
    let server = test_server().await;
    assert_eq!(server.get("/health").await.status_code(), StatusCode::OK);
    assert_eq!(server.get("/ready").await.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn first_ticket_gets_number_one_zero_padded() {
    let server = test_server().await;
    let token = login(&server, "maria", "secret1").await;

    let created = create_ticket(&server, &token, "constructora del este").await;
    assert_eq!(created["dispatch_no"], "0000001");

    let next = create_ticket(&server, &token, "obra norte").await;
    assert_eq!(next["dispatch_no"], "0000002");
}

#[tokio::test]
async fn configured_floor_seeds_an_empty_ledger() {
    let server = test_server().await;
    let admin = login(&server, "admin", "admin123").await;

    set_floor(&server, &admin, "5000").await;
    let created = create_ticket(&server, &admin, "a").await;
    assert_eq!(created["dispatch_no"], "0005000");

    // Lowering the floor afterwards does not reuse numbers.
    set_floor(&server, &admin, "1").await;
    let next = create_ticket(&server, &admin, "b").await;
    assert_eq!(next["dispatch_no"], "0005001");
}

#[tokio::test]
async fn raising_the_floor_fast_forwards_the_sequence() {
    let server = test_server().await;
    let admin = login(&server, "admin", "admin123").await;

    for i in 0..10 {
        create_ticket(&server, &admin, &format!("cliente {i}")).await;
    }

    set_floor(&server, &admin, "100").await;
    let next = create_ticket(&server, &admin, "x").await;
    assert_eq!(next["dispatch_no"], "0000100");
}

#[tokio::test]
async fn override_feeds_the_next_allocation_and_width_grows() {
    let server = test_server().await;
    let admin = login(&server, "admin", "admin123").await;

    create_ticket(&server, &admin, "a").await;
    let newest = create_ticket(&server, &admin, "b").await;
    let newest_id = newest["id"].as_i64().expect("id");

    let (name, value) = bearer(&admin);
    let response = server
        .put(&format!("/api/dispatches/{newest_id}/number"))
        .add_header(name, value)
        .json(&json!({ "dispatch_no": "9999999" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    // Next allocation follows the most recently created row, and the format
    // grows past seven digits instead of truncating.
    let next = create_ticket(&server, &admin, "c").await;
    assert_eq!(next["dispatch_no"], "10000000");
}

#[tokio::test]
async fn invalid_floor_values_are_rejected() {
    let server = test_server().await;
    let admin = login(&server, "admin", "admin123").await;

    let (name, value) = bearer(&admin);
    let response = server
        .put("/api/settings/dispatch_start_number")
        .add_header(name, value)
        .json(&json!({ "value": "0" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn employee_cannot_touch_settings_or_overrides() {
    let server = test_server().await;
    let admin = login(&server, "admin", "admin123").await;
    let employee = login(&server, "maria", "secret1").await;

    let created = create_ticket(&server, &employee, "a").await;
    let id = created["id"].as_i64().expect("id");

    let (name, value) = bearer(&employee);
    let forbidden = server
        .put("/api/settings/dispatch_start_number")
        .add_header(name, value)
        .json(&json!({ "value": "100" }))
        .await;
    assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);

    let (name, value) = bearer(&employee);
    let forbidden = server
        .put(&format!("/api/dispatches/{id}/number"))
        .add_header(name, value)
        .json(&json!({ "dispatch_no": "7777777" }))
        .await;
    assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);

    // The rejection happened before any mutation: the number is unchanged
    // and the next allocation is unaffected.
    let (name, value) = bearer(&admin);
    let listing = server
        .get("/api/dispatches")
        .add_header(name, value)
        .await
        .json::<Value>();
    assert_eq!(listing["data"][0]["dispatch_no"], "0000001");
}

#[tokio::test]
async fn validation_failures_consume_no_number() {
    let server = test_server().await;
    let token = login(&server, "maria", "secret1").await;

    let (name, value) = bearer(&token);
    let response = server
        .post("/api/dispatches")
        .add_header(name, value)
        .json(&json!({ "truck_name": "volteo", "client_name": "x", "total": 100.0 }))
        .await;
    // Missing plate: rejected before allocation.
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let (name, value) = bearer(&token);
    let negative_total = server
        .post("/api/dispatches")
        .add_header(name, value)
        .json(&json!({
            "truck_name": "volteo", "plate": "l-1", "client_name": "x", "total": -5.0
        }))
        .await;
    assert_eq!(negative_total.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    // The failed attempts consumed nothing.
    let created = create_ticket(&server, &token, "x").await;
    assert_eq!(created["dispatch_no"], "0000001");
}

#[tokio::test]
async fn dispatch_requests_require_a_session() {
    let server = test_server().await;

    let unauthenticated = server.get("/api/dispatches").await;
    assert_eq!(unauthenticated.status_code(), StatusCode::UNAUTHORIZED);

    let (name, value) = bearer("not-a-real-token");
    let bad_token = server
        .get("/api/dispatches")
        .add_header(name, value)
        .await;
    assert_eq!(bad_token.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_credentials_are_rejected_uniformly() {
    let server = test_server().await;

    let wrong_password = server
        .post("/api/auth/login")
        .json(&json!({ "username": "admin", "password": "nope123" }))
        .await;
    let unknown_user = server
        .post("/api/auth/login")
        .json(&json!({ "username": "ghost", "password": "nope123" }))
        .await;

    assert_eq!(wrong_password.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        wrong_password.json::<Value>()["message"],
        unknown_user.json::<Value>()["message"],
    );
}

#[tokio::test]
async fn logout_revokes_the_session() {
    let server = test_server().await;
    let token = login(&server, "maria", "secret1").await;

    let (name, value) = bearer(&token);
    let me = server.get("/api/auth/me").add_header(name, value).await;
    assert_eq!(me.status_code(), StatusCode::OK);
    assert_eq!(me.json::<Value>()["username"], "maria");

    let (name, value) = bearer(&token);
    let logout = server
        .post("/api/auth/logout")
        .add_header(name, value)
        .await;
    assert_eq!(logout.status_code(), StatusCode::OK);

    let (name, value) = bearer(&token);
    let after = server.get("/api/auth/me").add_header(name, value).await;
    assert_eq!(after.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn ticket_creation_upserts_the_truck_and_is_audited() {
    let server = test_server().await;
    let admin = login(&server, "admin", "admin123").await;

    create_ticket(&server, &admin, "constructora del este").await;

    let (name, value) = bearer(&admin);
    let trucks = server
        .get("/api/trucks?plate=a-123")
        .add_header(name, value)
        .await
        .json::<Value>();
    assert_eq!(trucks["data"][0]["plate"], "A-123456");

    let (name, value) = bearer(&admin);
    let audit = server
        .get("/api/audit")
        .add_header(name, value)
        .await
        .json::<Value>();
    let entries = audit["data"].as_array().expect("audit entries");
    assert!(entries
        .iter()
        .any(|e| e["action"] == "CREATE" && e["entity_type"] == "dispatch"));
    // Login events are recorded too.
    assert!(entries.iter().any(|e| e["action"] == "LOGIN"));
}

#[tokio::test]
async fn audit_trail_is_admin_only() {
    let server = test_server().await;
    let employee = login(&server, "maria", "secret1").await;

    let (name, value) = bearer(&employee);
    let forbidden = server.get("/api/audit").add_header(name, value).await;
    assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn clients_self_register_and_deduplicate_by_name() {
    let server = test_server().await;

    let first = server
        .post("/api/clients")
        .json(&json!({ "name": "Constructora del Este" }))
        .await;
    assert_eq!(first.status_code(), StatusCode::OK);
    let first_id = first.json::<Value>()["id"].as_i64().expect("id");

    // Same name in a different casing returns the existing row.
    let second = server
        .post("/api/clients")
        .json(&json!({ "name": "CONSTRUCTORA DEL ESTE" }))
        .await;
    assert_eq!(second.json::<Value>()["id"].as_i64().expect("id"), first_id);
}

#[tokio::test]
async fn duplicate_company_rnc_conflicts() {
    let server = test_server().await;
    let admin = login(&server, "admin", "admin123").await;

    let body = json!({ "name": "Agregados del Sur", "rnc": "1-31-55555-7" });
    let (name, value) = bearer(&admin);
    let created = server
        .post("/api/companies")
        .add_header(name, value)
        .json(&body)
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);

    let (name, value) = bearer(&admin);
    let duplicate = server
        .post("/api/companies")
        .add_header(name, value)
        .json(&json!({ "name": "Otra Empresa", "rnc": "1-31-55555-7" }))
        .await;
    assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn user_management_round_trip() {
    let server = test_server().await;
    let admin = login(&server, "admin", "admin123").await;

    let (name, value) = bearer(&admin);
    let created = server
        .post("/api/users")
        .add_header(name, value)
        .json(&json!({ "username": "pedro", "password": "secret9", "role": "employee" }))
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    let id = created.json::<Value>()["id"].as_i64().expect("id");

    // The new user can log in and create tickets.
    let token = login(&server, "pedro", "secret9").await;
    let created_ticket = create_ticket(&server, &token, "obra sur").await;
    assert_eq!(created_ticket["dispatch_no"], "0000001");

    // Promote to admin, then delete.
    let (name, value) = bearer(&admin);
    let updated = server
        .put(&format!("/api/users/{id}"))
        .add_header(name, value)
        .json(&json!({ "username": "pedro", "role": "admin" }))
        .await;
    assert_eq!(updated.status_code(), StatusCode::OK);
    assert_eq!(updated.json::<Value>()["role"], "admin");

    let (name, value) = bearer(&admin);
    let deleted = server
        .delete(&format!("/api/users/{id}"))
        .add_header(name, value)
        .await;
    assert_eq!(deleted.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn admin_cannot_delete_own_account() {
    let server = test_server().await;
    let admin = login(&server, "admin", "admin123").await;

    let (name, value) = bearer(&admin);
    let me = server
        .get("/api/auth/me")
        .add_header(name, value)
        .await
        .json::<Value>();
    let my_id = me["id"].as_i64().expect("id");

    let (name, value) = bearer(&admin);
    let refused = server
        .delete(&format!("/api/users/{my_id}"))
        .add_header(name, value)
        .await;
    assert_eq!(refused.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn special_prices_round_trip() {
    let server = test_server().await;
    let admin = login(&server, "admin", "admin123").await;

    let (name, value) = bearer(&admin);
    let product = server
        .post("/api/products")
        .add_header(name, value)
        .json(&json!({ "name": "Arena lavada", "price": 950.0, "itbis_rate": 0.18 }))
        .await
        .json::<Value>();
    let product_id = product["id"].as_i64().expect("id");

    let (name, value) = bearer(&admin);
    let price = server
        .put(&format!(
            "/api/products/{product_id}/client-prices/constructora%20del%20este"
        ))
        .add_header(name, value)
        .json(&json!({ "special_price": 800.0 }))
        .await;
    assert_eq!(price.status_code(), StatusCode::OK);
    // Stored uppercased so lookups match however the ticket was typed.
    assert_eq!(price.json::<Value>()["client_name"], "CONSTRUCTORA DEL ESTE");

    let (name, value) = bearer(&admin);
    let listing = server
        .get(&format!("/api/products/{product_id}/client-prices"))
        .add_header(name, value)
        .await
        .json::<Value>();
    assert_eq!(listing["data"].as_array().expect("prices").len(), 1);
}
