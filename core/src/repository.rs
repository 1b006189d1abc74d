//! Repository traits: the seams between the functional core and storage.
//!
//! `despacho-postgres` provides the production implementations;
//! `despacho-testing` provides in-memory fakes with the same observable
//! contract (most importantly, serialized number allocation).

use crate::audit::{AuditEvent, AuditRecord};
use crate::catalog::{
    Client, ClientPrice, Company, NamedEntity, NewClient, NewCompany, NewProduct, Product, Truck,
};
use crate::dispatch::{CreatedDispatch, Dispatch, NewDispatch};
use crate::error::StoreResult;
use crate::settings::Setting;
use crate::types::{ClientId, CompanyId, DispatchId, ProductId, UserId};
use async_trait::async_trait;

/// Fields an administrator may rewrite on an existing ticket.
///
/// The display number is part of this payload: the full-edit escape hatch may
/// rewrite it, bypassing the allocator.
#[derive(Debug, Clone)]
pub struct DispatchUpdate {
    /// Replacement display number (arbitrary string, admin-supplied).
    pub dispatch_no: String,
    /// The replacement ticket body.
    pub body: NewDispatch,
}

/// The ticket ledger.
///
/// `create` is the allocation boundary: implementations must run
/// "read floor → read tail → compute → insert" as one serialized unit so
/// that no two tickets ever share a display number (see the crate docs of
/// [`crate::numbering`]).
#[async_trait]
pub trait DispatchStore: Send + Sync {
    /// Allocate a display number and append the ticket.
    ///
    /// # Errors
    ///
    /// Fails if the ledger cannot be read or written; no ticket is created
    /// without a number.
    async fn create(&self, new: NewDispatch) -> StoreResult<CreatedDispatch>;

    /// List tickets, newest first, optionally filtered by plate substring
    /// (case-insensitive).
    ///
    /// # Errors
    ///
    /// Fails on backend errors.
    async fn list(&self, plate: Option<&str>) -> StoreResult<Vec<Dispatch>>;

    /// Fetch one ticket.
    ///
    /// # Errors
    ///
    /// `NotFound` when the id does not exist.
    async fn get(&self, id: DispatchId) -> StoreResult<Dispatch>;

    /// Full edit of an existing ticket (admin escape hatch).
    ///
    /// # Errors
    ///
    /// `NotFound` when the id does not exist.
    async fn update(&self, id: DispatchId, update: DispatchUpdate) -> StoreResult<()>;

    /// Rewrite only the display number (admin override). Does not touch the
    /// floor and affects future allocations only through the ledger tail.
    ///
    /// # Errors
    ///
    /// `NotFound` when the id does not exist.
    async fn override_number(&self, id: DispatchId, dispatch_no: &str) -> StoreResult<()>;

    /// Delete a ticket.
    ///
    /// # Errors
    ///
    /// `NotFound` when the id does not exist.
    async fn delete(&self, id: DispatchId) -> StoreResult<()>;
}

/// The settings store (the numbering floor lives here).
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// List all settings ordered by key.
    ///
    /// # Errors
    ///
    /// Fails on backend errors.
    async fn list(&self) -> StoreResult<Vec<Setting>>;

    /// Fetch one setting.
    ///
    /// # Errors
    ///
    /// `NotFound` when the key does not exist.
    async fn get(&self, key: &str) -> StoreResult<Setting>;

    /// Update an existing setting's value.
    ///
    /// # Errors
    ///
    /// `NotFound` when the key does not exist.
    async fn set(&self, key: &str, value: &str) -> StoreResult<Setting>;
}

/// Clients.
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// List all clients.
    ///
    /// # Errors
    ///
    /// Fails on backend errors.
    async fn list(&self) -> StoreResult<Vec<Client>>;

    /// Find by case-insensitive name, or create. Returns the surviving row.
    ///
    /// # Errors
    ///
    /// Fails on backend errors.
    async fn find_or_create(&self, new: NewClient) -> StoreResult<Client>;

    /// Update an existing client.
    ///
    /// # Errors
    ///
    /// `NotFound` when the id does not exist.
    async fn update(&self, id: ClientId, new: NewClient) -> StoreResult<Client>;

    /// Delete a client.
    ///
    /// # Errors
    ///
    /// `NotFound` when the id does not exist.
    async fn delete(&self, id: ClientId) -> StoreResult<()>;
}

/// Companies.
#[async_trait]
pub trait CompanyStore: Send + Sync {
    /// List all companies.
    ///
    /// # Errors
    ///
    /// Fails on backend errors.
    async fn list(&self) -> StoreResult<Vec<Company>>;

    /// Create a company.
    ///
    /// # Errors
    ///
    /// `Duplicate` when name or RNC collides.
    async fn create(&self, new: NewCompany) -> StoreResult<Company>;

    /// Update an existing company.
    ///
    /// # Errors
    ///
    /// `NotFound` when the id does not exist; `Duplicate` on collisions.
    async fn update(&self, id: CompanyId, new: NewCompany) -> StoreResult<Company>;

    /// Delete a company.
    ///
    /// # Errors
    ///
    /// `NotFound` when the id does not exist.
    async fn delete(&self, id: CompanyId) -> StoreResult<()>;
}

/// Products and their per-client special prices.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// List all products.
    ///
    /// # Errors
    ///
    /// Fails on backend errors.
    async fn list(&self) -> StoreResult<Vec<Product>>;

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Fails on backend errors.
    async fn create(&self, new: NewProduct) -> StoreResult<Product>;

    /// Update an existing product.
    ///
    /// # Errors
    ///
    /// `NotFound` when the id does not exist.
    async fn update(&self, id: ProductId, new: NewProduct) -> StoreResult<Product>;

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// `NotFound` when the id does not exist.
    async fn delete(&self, id: ProductId) -> StoreResult<()>;

    /// List special prices for a product.
    ///
    /// # Errors
    ///
    /// Fails on backend errors.
    async fn client_prices(&self, id: ProductId) -> StoreResult<Vec<ClientPrice>>;

    /// Upsert a special price for (product, client).
    ///
    /// # Errors
    ///
    /// `NotFound` when the product does not exist.
    async fn set_client_price(
        &self,
        id: ProductId,
        client_name: &str,
        special_price: f64,
    ) -> StoreResult<ClientPrice>;

    /// Remove a special price.
    ///
    /// # Errors
    ///
    /// `NotFound` when no such price exists.
    async fn delete_client_price(&self, id: ProductId, client_name: &str) -> StoreResult<()>;
}

/// Name-only catalog entities (equipment, operators).
#[async_trait]
pub trait NamedEntityStore: Send + Sync {
    /// List all entries.
    ///
    /// # Errors
    ///
    /// Fails on backend errors.
    async fn list(&self) -> StoreResult<Vec<NamedEntity>>;

    /// Create an entry.
    ///
    /// # Errors
    ///
    /// Fails on backend errors.
    async fn create(&self, name: &str) -> StoreResult<NamedEntity>;

    /// Rename an entry.
    ///
    /// # Errors
    ///
    /// `NotFound` when the id does not exist.
    async fn rename(&self, id: i64, name: &str) -> StoreResult<NamedEntity>;

    /// Delete an entry.
    ///
    /// # Errors
    ///
    /// `NotFound` when the id does not exist.
    async fn delete(&self, id: i64) -> StoreResult<()>;
}

/// The truck fleet. Rows are written through dispatch creation; this trait
/// only reads them back.
#[async_trait]
pub trait TruckStore: Send + Sync {
    /// List trucks, optionally filtered by plate substring
    /// (case-insensitive).
    ///
    /// # Errors
    ///
    /// Fails on backend errors.
    async fn list(&self, plate: Option<&str>) -> StoreResult<Vec<Truck>>;
}

/// The audit trail.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append an event.
    ///
    /// # Errors
    ///
    /// Fails on backend errors; callers log and continue.
    async fn record(&self, event: AuditEvent) -> StoreResult<()>;

    /// Most recent entries, newest first.
    ///
    /// # Errors
    ///
    /// Fails on backend errors.
    async fn recent(&self, limit: i64) -> StoreResult<Vec<AuditRecord>>;

    /// Entries for one user, newest first.
    ///
    /// # Errors
    ///
    /// Fails on backend errors.
    async fn by_user(&self, user_id: UserId, limit: i64) -> StoreResult<Vec<AuditRecord>>;

    /// Entries for one entity, newest first.
    ///
    /// # Errors
    ///
    /// Fails on backend errors.
    async fn by_entity(&self, entity_type: &str, entity_id: i64) -> StoreResult<Vec<AuditRecord>>;
}
