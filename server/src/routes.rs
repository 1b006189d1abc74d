//! Router configuration.
//!
//! Builds the complete Axum router: health checks, the session endpoints,
//! and the `/api` surface, wrapped in the CORS and correlation-ID layers.
//! Role gates live on the handlers (via the `RequireAdmin` extractor), not
//! on the routes, so a route listing stays an honest map of the API.

use crate::api::{
    audit, clients, companies, dispatches, fleet, health, products, session, settings, users,
};
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use despacho_web::middleware::{correlation_id_layer, cors_layer};

/// Build the complete router.
///
/// # Arguments
///
/// - `state`: application state shared with handlers
/// - `allowed_origins`: CORS allow-list (exact origins or `*.suffix`)
#[must_use]
pub fn build_router(state: AppState, allowed_origins: Vec<String>) -> Router {
    let api = Router::new()
        // Dispatch tickets
        .route(
            "/dispatches",
            get(dispatches::list_dispatches).post(dispatches::create_dispatch),
        )
        .route(
            "/dispatches/:id",
            put(dispatches::update_dispatch).delete(dispatches::delete_dispatch),
        )
        .route("/dispatches/:id/number", put(dispatches::override_number))
        // Settings (numbering floor)
        .route("/settings", get(settings::list_settings))
        .route(
            "/settings/:key",
            get(settings::get_setting).put(settings::put_setting),
        )
        // Clients (public create for ticket-entry self-registration)
        .route(
            "/clients",
            get(clients::list_clients).post(clients::create_client),
        )
        .route(
            "/clients/:id",
            put(clients::update_client).delete(clients::delete_client),
        )
        // Companies
        .route(
            "/companies",
            get(companies::list_companies).post(companies::create_company),
        )
        .route(
            "/companies/:id",
            put(companies::update_company).delete(companies::delete_company),
        )
        // Products and special prices
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/products/:id",
            put(products::update_product).delete(products::delete_product),
        )
        .route(
            "/products/:id/client-prices",
            get(products::list_client_prices),
        )
        .route(
            "/products/:id/client-prices/:client",
            put(products::set_client_price).delete(products::delete_client_price),
        )
        // Fleet
        .route("/trucks", get(fleet::list_trucks))
        .route(
            "/equipment",
            get(fleet::list_equipment).post(fleet::create_equipment),
        )
        .route(
            "/equipment/:id",
            put(fleet::rename_equipment).delete(fleet::delete_equipment),
        )
        .route(
            "/operators",
            get(fleet::list_operators).post(fleet::create_operator),
        )
        .route(
            "/operators/:id",
            put(fleet::rename_operator).delete(fleet::delete_operator),
        )
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:id",
            put(users::update_user).delete(users::delete_user),
        )
        // Audit trail
        .route("/audit", get(audit::recent))
        .route("/audit/user/:id", get(audit::by_user))
        .route("/audit/entity/:type/:id", get(audit::by_entity))
        // Sessions
        .route("/auth/login", post(session::login))
        .route("/auth/logout", post(session::logout))
        .route("/auth/me", get(session::me));

    Router::new()
        // Health checks (no authentication)
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .nest("/api", api)
        .layer(cors_layer(allowed_origins))
        .layer(correlation_id_layer())
        .with_state(state)
}
