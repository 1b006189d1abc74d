//! Product endpoints, including per-client special prices.
//!
//! ITBIS rates ride on products as fractions (0.18 for processed
//! aggregates, 0 for natural ones). Special prices override the list price
//! for a (product, client) pair; client names are matched uppercased.

use crate::api::DataResponse;
use crate::auth::{CurrentUser, RequireAdmin};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use despacho_core::audit::{AuditAction, AuditEvent};
use despacho_core::catalog::{ClientPrice, Product, ProductDraft};
use despacho_core::types::ProductId;
use despacho_web::error::AppError;
use despacho_web::extractors::RequestClient;
use serde::Deserialize;
use serde_json::json;

/// List all products.
pub async fn list_products(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<DataResponse<Vec<Product>>>, AppError> {
    Ok(Json(DataResponse::new(state.products.list().await?)))
}

/// Create a product (admin only).
pub async fn create_product(
    State(state): State<AppState>,
    admin: RequireAdmin,
    origin: RequestClient,
    Json(draft): Json<ProductDraft>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let new = draft.validate()?;
    let product = state.products.create(new).await?;

    state
        .record_audit(
            AuditEvent::new(
                admin.0.user.id,
                admin.0.user.username.clone(),
                AuditAction::Create,
                "product",
                Some(product.id.value()),
                json!({ "name": product.name, "price": product.price }),
            )
            .with_origin(origin.into_origin()),
        )
        .await;

    Ok((StatusCode::CREATED, Json(product)))
}

/// Update a product (admin only).
pub async fn update_product(
    State(state): State<AppState>,
    admin: RequireAdmin,
    origin: RequestClient,
    Path(id): Path<i64>,
    Json(draft): Json<ProductDraft>,
) -> Result<Json<Product>, AppError> {
    let new = draft.validate()?;
    let product = state.products.update(ProductId::new(id), new).await?;

    state
        .record_audit(
            AuditEvent::new(
                admin.0.user.id,
                admin.0.user.username.clone(),
                AuditAction::Update,
                "product",
                Some(id),
                json!({ "name": product.name, "price": product.price }),
            )
            .with_origin(origin.into_origin()),
        )
        .await;

    Ok(Json(product))
}

/// Delete a product (admin only).
pub async fn delete_product(
    State(state): State<AppState>,
    admin: RequireAdmin,
    origin: RequestClient,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.products.delete(ProductId::new(id)).await?;

    state
        .record_audit(
            AuditEvent::new(
                admin.0.user.id,
                admin.0.user.username.clone(),
                AuditAction::Delete,
                "product",
                Some(id),
                json!({ "deleted_id": id }),
            )
            .with_origin(origin.into_origin()),
        )
        .await;

    Ok(Json(json!({ "message": "product deleted" })))
}

/// List the special prices for a product.
pub async fn list_client_prices(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<DataResponse<Vec<ClientPrice>>>, AppError> {
    Ok(Json(DataResponse::new(
        state.products.client_prices(ProductId::new(id)).await?,
    )))
}

/// Special-price request body.
#[derive(Debug, Deserialize)]
pub struct SetClientPriceRequest {
    /// The negotiated price.
    pub special_price: f64,
}

/// Upsert a special price for (product, client), admin only.
pub async fn set_client_price(
    State(state): State<AppState>,
    admin: RequireAdmin,
    origin: RequestClient,
    Path((id, client_name)): Path<(i64, String)>,
    Json(request): Json<SetClientPriceRequest>,
) -> Result<Json<ClientPrice>, AppError> {
    if !request.special_price.is_finite() || request.special_price < 0.0 {
        return Err(AppError::validation("special_price must be non-negative"));
    }

    let price = state
        .products
        .set_client_price(ProductId::new(id), &client_name, request.special_price)
        .await?;

    state
        .record_audit(
            AuditEvent::new(
                admin.0.user.id,
                admin.0.user.username.clone(),
                AuditAction::Update,
                "product",
                Some(id),
                json!({ "client_name": price.client_name, "special_price": price.special_price }),
            )
            .with_origin(origin.into_origin()),
        )
        .await;

    Ok(Json(price))
}

/// Remove a special price (admin only).
pub async fn delete_client_price(
    State(state): State<AppState>,
    admin: RequireAdmin,
    origin: RequestClient,
    Path((id, client_name)): Path<(i64, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    state
        .products
        .delete_client_price(ProductId::new(id), &client_name)
        .await?;

    state
        .record_audit(
            AuditEvent::new(
                admin.0.user.id,
                admin.0.user.username.clone(),
                AuditAction::Delete,
                "product",
                Some(id),
                json!({ "client_name": client_name, "field": "special_price" }),
            )
            .with_origin(origin.into_origin()),
        )
        .await;

    Ok(Json(json!({ "message": "special price removed" })))
}
