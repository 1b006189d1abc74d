//! In-memory repository fakes.
//!
//! Mutex-guarded maps with the same observable behavior as the `PostgreSQL`
//! stores. [`MemoryDispatchStore`] runs its whole allocate-and-insert cycle
//! under one lock, which is the fake's equivalent of the production row-lock
//! transaction: concurrent creates serialize and can never issue the same
//! number.

use async_trait::async_trait;
use chrono::Utc;
use despacho_core::audit::{AuditEvent, AuditRecord};
use despacho_core::catalog::{
    Client, ClientPrice, Company, NamedEntity, NewClient, NewCompany, NewProduct, Product, Truck,
    TruckUpsert,
};
use despacho_core::dispatch::{CreatedDispatch, Dispatch, NewDispatch};
use despacho_core::error::{StoreError, StoreResult};
use despacho_core::numbering::{next_number, numeric_value, DispatchNumber};
use despacho_core::repository::{
    AuditStore, ClientStore, CompanyStore, DispatchStore, DispatchUpdate, NamedEntityStore,
    ProductStore, SettingsStore, TruckStore,
};
use despacho_core::settings::{start_number_or_default, Setting, DISPATCH_START_NUMBER};
use despacho_core::types::{ClientId, CompanyId, DispatchId, ProductId, TruckId, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

fn lock_err() -> StoreError {
    StoreError::Backend("fake store lock poisoned".to_string())
}

// ════════════════════════════════════════════════════════════════════════
// Settings
// ════════════════════════════════════════════════════════════════════════

/// In-memory settings store, seeded with `dispatch_start_number = 1`.
pub struct MemorySettingsStore {
    inner: Mutex<HashMap<String, Setting>>,
}

impl MemorySettingsStore {
    /// Create a seeded store.
    #[must_use]
    pub fn new() -> Self {
        let now = Utc::now();
        let mut map = HashMap::new();
        map.insert(
            DISPATCH_START_NUMBER.to_string(),
            Setting {
                id: 1,
                key: DISPATCH_START_NUMBER.to_string(),
                value: "1".to_string(),
                description: Some("Starting number for the dispatch sequence".to_string()),
                created_at: now,
                updated_at: now,
            },
        );
        Self {
            inner: Mutex::new(map),
        }
    }

    /// Synchronous value read, used by the dispatch fake inside its lock.
    #[must_use]
    pub fn raw_value(&self, key: &str) -> Option<String> {
        self.inner
            .lock()
            .ok()
            .and_then(|map| map.get(key).map(|s| s.value.clone()))
    }
}

impl Default for MemorySettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn list(&self) -> StoreResult<Vec<Setting>> {
        let map = self.inner.lock().map_err(|_| lock_err())?;
        let mut settings: Vec<Setting> = map.values().cloned().collect();
        settings.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(settings)
    }

    async fn get(&self, key: &str) -> StoreResult<Setting> {
        let map = self.inner.lock().map_err(|_| lock_err())?;
        map.get(key).cloned().ok_or(StoreError::NotFound {
            entity: "setting",
            id: 0,
        })
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<Setting> {
        let mut map = self.inner.lock().map_err(|_| lock_err())?;
        let setting = map.get_mut(key).ok_or(StoreError::NotFound {
            entity: "setting",
            id: 0,
        })?;
        setting.value = value.to_string();
        setting.updated_at = Utc::now();
        Ok(setting.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════
// Trucks
// ════════════════════════════════════════════════════════════════════════

/// In-memory truck store, written through dispatch creation.
#[derive(Default)]
pub struct MemoryTruckStore {
    inner: Mutex<TruckInner>,
}

#[derive(Default)]
struct TruckInner {
    next_id: i64,
    by_plate: HashMap<String, Truck>,
}

impl MemoryTruckStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert with COALESCE semantics: blank incoming fields keep stored
    /// values. Mirrors the production `ON CONFLICT` statement.
    pub(crate) fn apply_upsert(&self, upsert: &TruckUpsert) -> StoreResult<()> {
        let mut inner = self.inner.lock().map_err(|_| lock_err())?;
        let now = Utc::now();
        if let Some(existing) = inner.by_plate.get_mut(&upsert.plate) {
            if !upsert.make.is_empty() {
                existing.make = Some(upsert.make.clone());
            }
            if upsert.color.is_some() {
                existing.color = upsert.color.clone();
            }
            if upsert.fleet_card.is_some() {
                existing.fleet_card = upsert.fleet_card.clone();
            }
            if upsert.volume_m3.is_some() {
                existing.volume_m3 = upsert.volume_m3;
            }
            existing.updated_at = now;
        } else {
            inner.next_id += 1;
            let truck = Truck {
                id: TruckId::new(inner.next_id),
                plate: upsert.plate.clone(),
                make: Some(upsert.make.clone()).filter(|m| !m.is_empty()),
                color: upsert.color.clone(),
                fleet_card: upsert.fleet_card.clone(),
                volume_m3: upsert.volume_m3,
                status: "activo".to_string(),
                created_at: now,
                updated_at: now,
            };
            inner.by_plate.insert(truck.plate.clone(), truck);
        }
        Ok(())
    }
}

#[async_trait]
impl TruckStore for MemoryTruckStore {
    async fn list(&self, plate: Option<&str>) -> StoreResult<Vec<Truck>> {
        let inner = self.inner.lock().map_err(|_| lock_err())?;
        let needle = plate.map(str::to_uppercase);
        let mut trucks: Vec<Truck> = inner
            .by_plate
            .values()
            .filter(|t| {
                needle
                    .as_ref()
                    .is_none_or(|n| t.plate.to_uppercase().contains(n))
            })
            .cloned()
            .collect();
        trucks.sort_by(|a, b| a.plate.cmp(&b.plate));
        Ok(trucks)
    }
}

// ════════════════════════════════════════════════════════════════════════
// Dispatches (the allocation boundary)
// ════════════════════════════════════════════════════════════════════════

/// In-memory ticket ledger with serialized number allocation.
pub struct MemoryDispatchStore {
    inner: Mutex<DispatchInner>,
    settings: Arc<MemorySettingsStore>,
    trucks: Arc<MemoryTruckStore>,
}

#[derive(Default)]
struct DispatchInner {
    next_id: i64,
    // Insertion order matters: the allocator reads the tail, not the max.
    rows: Vec<Dispatch>,
}

impl MemoryDispatchStore {
    /// Create a ledger wired to the given settings (floor) and truck stores.
    #[must_use]
    pub fn new(settings: Arc<MemorySettingsStore>, trucks: Arc<MemoryTruckStore>) -> Self {
        Self {
            inner: Mutex::new(DispatchInner::default()),
            settings,
            trucks,
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, DispatchInner>> {
        self.inner.lock().map_err(|_| lock_err())
    }

    fn materialize(id: i64, dispatch_no: String, new: NewDispatch) -> Dispatch {
        Dispatch {
            id: DispatchId::new(id),
            dispatch_no,
            date: new.date,
            time: new.time,
            truck_name: new.truck_name,
            plate: new.plate,
            color: new.color,
            fleet_card: new.fleet_card,
            order_no: new.order_no,
            order_ticket: new.order_ticket,
            driver: new.driver,
            volume_m3: new.volume_m3,
            materials: new.materials,
            client_name: new.client_name,
            phone: new.phone,
            total: new.total,
            user_id: new.user_id,
            equipment_id: new.equipment_id,
            operator_id: new.operator_id,
            user_name: None,
            equipment_name: None,
            operator_name: None,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
impl DispatchStore for MemoryDispatchStore {
    async fn create(&self, new: NewDispatch) -> StoreResult<CreatedDispatch> {
        self.trucks.apply_upsert(&TruckUpsert::from_dispatch(&new))?;

        // One lock around read-floor, read-tail, compute, insert: the fake's
        // version of the production transaction.
        let mut inner = self.lock()?;

        let floor_value = self.settings.raw_value(DISPATCH_START_NUMBER);
        let floor = start_number_or_default(floor_value.as_deref());
        let last_issued = inner.rows.last().map(|d| numeric_value(&d.dispatch_no));

        let number = DispatchNumber::from_value(next_number(last_issued, floor));
        let dispatch_no = number.to_string();

        inner.next_id += 1;
        let id = inner.next_id;
        let row = Self::materialize(id, dispatch_no.clone(), new);
        inner.rows.push(row);

        Ok(CreatedDispatch {
            id: DispatchId::new(id),
            dispatch_no,
        })
    }

    async fn list(&self, plate: Option<&str>) -> StoreResult<Vec<Dispatch>> {
        let inner = self.lock()?;
        let needle = plate.map(str::to_uppercase);
        let mut rows: Vec<Dispatch> = inner
            .rows
            .iter()
            .filter(|d| {
                needle
                    .as_ref()
                    .is_none_or(|n| d.plate.to_uppercase().contains(n))
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.date, b.time).cmp(&(a.date, a.time)));
        Ok(rows)
    }

    async fn get(&self, id: DispatchId) -> StoreResult<Dispatch> {
        let inner = self.lock()?;
        inner
            .rows
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "dispatch",
                id: id.value(),
            })
    }

    async fn update(&self, id: DispatchId, update: DispatchUpdate) -> StoreResult<()> {
        self.trucks
            .apply_upsert(&TruckUpsert::from_dispatch(&update.body))?;
        let mut inner = self.lock()?;
        let row = inner
            .rows
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(StoreError::NotFound {
                entity: "dispatch",
                id: id.value(),
            })?;
        let created_at = row.created_at;
        *row = Self::materialize(id.value(), update.dispatch_no, update.body);
        row.created_at = created_at;
        Ok(())
    }

    async fn override_number(&self, id: DispatchId, dispatch_no: &str) -> StoreResult<()> {
        let mut inner = self.lock()?;
        let row = inner
            .rows
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(StoreError::NotFound {
                entity: "dispatch",
                id: id.value(),
            })?;
        row.dispatch_no = dispatch_no.to_string();
        Ok(())
    }

    async fn delete(&self, id: DispatchId) -> StoreResult<()> {
        let mut inner = self.lock()?;
        let before = inner.rows.len();
        inner.rows.retain(|d| d.id != id);
        if inner.rows.len() == before {
            return Err(StoreError::NotFound {
                entity: "dispatch",
                id: id.value(),
            });
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════
// Clients / Companies / Products
// ════════════════════════════════════════════════════════════════════════

/// In-memory client store.
#[derive(Default)]
pub struct MemoryClientStore {
    inner: Mutex<ClientInner>,
}

#[derive(Default)]
struct ClientInner {
    next_id: i64,
    rows: Vec<Client>,
}

impl MemoryClientStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClientStore for MemoryClientStore {
    async fn list(&self) -> StoreResult<Vec<Client>> {
        let inner = self.inner.lock().map_err(|_| lock_err())?;
        let mut rows = inner.rows.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn find_or_create(&self, new: NewClient) -> StoreResult<Client> {
        let mut inner = self.inner.lock().map_err(|_| lock_err())?;
        if let Some(existing) = inner
            .rows
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(&new.name))
        {
            return Ok(existing.clone());
        }
        inner.next_id += 1;
        let client = Client {
            id: ClientId::new(inner.next_id),
            name: new.name,
            company_id: new.company_id,
            rnc: new.rnc,
            address: new.address,
            site: new.site,
            purchase_order_no: new.purchase_order_no,
            discount_pct: new.discount_pct,
            created_at: Utc::now(),
        };
        inner.rows.push(client.clone());
        Ok(client)
    }

    async fn update(&self, id: ClientId, new: NewClient) -> StoreResult<Client> {
        let mut inner = self.inner.lock().map_err(|_| lock_err())?;
        let client = inner
            .rows
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::NotFound {
                entity: "client",
                id: id.value(),
            })?;
        client.name = new.name;
        client.company_id = new.company_id;
        client.rnc = new.rnc;
        client.address = new.address;
        client.site = new.site;
        client.purchase_order_no = new.purchase_order_no;
        client.discount_pct = new.discount_pct;
        Ok(client.clone())
    }

    async fn delete(&self, id: ClientId) -> StoreResult<()> {
        let mut inner = self.inner.lock().map_err(|_| lock_err())?;
        let before = inner.rows.len();
        inner.rows.retain(|c| c.id != id);
        if inner.rows.len() == before {
            return Err(StoreError::NotFound {
                entity: "client",
                id: id.value(),
            });
        }
        Ok(())
    }
}

/// In-memory company store with name/RNC uniqueness.
#[derive(Default)]
pub struct MemoryCompanyStore {
    inner: Mutex<CompanyInner>,
}

#[derive(Default)]
struct CompanyInner {
    next_id: i64,
    rows: Vec<Company>,
}

impl MemoryCompanyStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn company_collision(rows: &[Company], new: &NewCompany, skip: Option<CompanyId>) -> bool {
    rows.iter()
        .filter(|c| skip.is_none_or(|id| c.id != id))
        .any(|c| c.name == new.name || c.rnc == new.rnc)
}

#[async_trait]
impl CompanyStore for MemoryCompanyStore {
    async fn list(&self) -> StoreResult<Vec<Company>> {
        let inner = self.inner.lock().map_err(|_| lock_err())?;
        let mut rows = inner.rows.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn create(&self, new: NewCompany) -> StoreResult<Company> {
        let mut inner = self.inner.lock().map_err(|_| lock_err())?;
        if company_collision(&inner.rows, &new, None) {
            return Err(StoreError::Duplicate {
                entity: "company",
                detail: "name or RNC already exists".to_string(),
            });
        }
        inner.next_id += 1;
        let company = Company {
            id: CompanyId::new(inner.next_id),
            name: new.name,
            address: new.address,
            phone: new.phone,
            email: new.email,
            rnc: new.rnc,
            fiscal_address: new.fiscal_address,
            tax_rate: new.tax_rate,
            tax_exempt: new.tax_exempt,
            contacts: new.contacts,
            created_at: Utc::now(),
        };
        inner.rows.push(company.clone());
        Ok(company)
    }

    async fn update(&self, id: CompanyId, new: NewCompany) -> StoreResult<Company> {
        let mut inner = self.inner.lock().map_err(|_| lock_err())?;
        if company_collision(&inner.rows, &new, Some(id)) {
            return Err(StoreError::Duplicate {
                entity: "company",
                detail: "name or RNC already exists".to_string(),
            });
        }
        let company = inner
            .rows
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::NotFound {
                entity: "company",
                id: id.value(),
            })?;
        company.name = new.name;
        company.address = new.address;
        company.phone = new.phone;
        company.email = new.email;
        company.rnc = new.rnc;
        company.fiscal_address = new.fiscal_address;
        company.tax_rate = new.tax_rate;
        company.tax_exempt = new.tax_exempt;
        company.contacts = new.contacts;
        Ok(company.clone())
    }

    async fn delete(&self, id: CompanyId) -> StoreResult<()> {
        let mut inner = self.inner.lock().map_err(|_| lock_err())?;
        let before = inner.rows.len();
        inner.rows.retain(|c| c.id != id);
        if inner.rows.len() == before {
            return Err(StoreError::NotFound {
                entity: "company",
                id: id.value(),
            });
        }
        Ok(())
    }
}

/// In-memory product store with per-client special prices.
#[derive(Default)]
pub struct MemoryProductStore {
    inner: Mutex<ProductInner>,
}

#[derive(Default)]
struct ProductInner {
    next_id: i64,
    next_price_id: i64,
    rows: Vec<Product>,
    prices: Vec<ClientPrice>,
}

impl MemoryProductStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn list(&self) -> StoreResult<Vec<Product>> {
        let inner = self.inner.lock().map_err(|_| lock_err())?;
        let mut rows = inner.rows.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn create(&self, new: NewProduct) -> StoreResult<Product> {
        let mut inner = self.inner.lock().map_err(|_| lock_err())?;
        inner.next_id += 1;
        let product = Product {
            id: ProductId::new(inner.next_id),
            name: new.name,
            price: new.price,
            itbis_rate: new.itbis_rate,
            created_at: Utc::now(),
        };
        inner.rows.push(product.clone());
        Ok(product)
    }

    async fn update(&self, id: ProductId, new: NewProduct) -> StoreResult<Product> {
        let mut inner = self.inner.lock().map_err(|_| lock_err())?;
        let product = inner
            .rows
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound {
                entity: "product",
                id: id.value(),
            })?;
        product.name = new.name;
        product.price = new.price;
        product.itbis_rate = new.itbis_rate;
        Ok(product.clone())
    }

    async fn delete(&self, id: ProductId) -> StoreResult<()> {
        let mut inner = self.inner.lock().map_err(|_| lock_err())?;
        let before = inner.rows.len();
        inner.rows.retain(|p| p.id != id);
        if inner.rows.len() == before {
            return Err(StoreError::NotFound {
                entity: "product",
                id: id.value(),
            });
        }
        inner.prices.retain(|cp| cp.product_id != id);
        Ok(())
    }

    async fn client_prices(&self, id: ProductId) -> StoreResult<Vec<ClientPrice>> {
        let inner = self.inner.lock().map_err(|_| lock_err())?;
        let mut prices: Vec<ClientPrice> = inner
            .prices
            .iter()
            .filter(|cp| cp.product_id == id)
            .cloned()
            .collect();
        prices.sort_by(|a, b| a.client_name.cmp(&b.client_name));
        Ok(prices)
    }

    async fn set_client_price(
        &self,
        id: ProductId,
        client_name: &str,
        special_price: f64,
    ) -> StoreResult<ClientPrice> {
        let mut inner = self.inner.lock().map_err(|_| lock_err())?;
        if !inner.rows.iter().any(|p| p.id == id) {
            return Err(StoreError::NotFound {
                entity: "product",
                id: id.value(),
            });
        }
        let client_name = client_name.to_uppercase();
        if let Some(existing) = inner
            .prices
            .iter_mut()
            .find(|cp| cp.product_id == id && cp.client_name == client_name)
        {
            existing.special_price = special_price;
            return Ok(existing.clone());
        }
        inner.next_price_id += 1;
        let price = ClientPrice {
            id: inner.next_price_id,
            product_id: id,
            client_name,
            special_price,
            created_at: Utc::now(),
        };
        inner.prices.push(price.clone());
        Ok(price)
    }

    async fn delete_client_price(&self, id: ProductId, client_name: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock().map_err(|_| lock_err())?;
        let client_name = client_name.to_uppercase();
        let before = inner.prices.len();
        inner
            .prices
            .retain(|cp| !(cp.product_id == id && cp.client_name == client_name));
        if inner.prices.len() == before {
            return Err(StoreError::NotFound {
                entity: "client price",
                id: id.value(),
            });
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════
// Named entities / audit
// ════════════════════════════════════════════════════════════════════════

/// In-memory store for the name-only entities.
#[derive(Default)]
pub struct MemoryNamedEntityStore {
    entity: &'static str,
    inner: Mutex<NamedInner>,
}

#[derive(Default)]
struct NamedInner {
    next_id: i64,
    rows: Vec<NamedEntity>,
}

impl MemoryNamedEntityStore {
    /// Create an empty store for the given entity kind.
    #[must_use]
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            inner: Mutex::new(NamedInner::default()),
        }
    }
}

#[async_trait]
impl NamedEntityStore for MemoryNamedEntityStore {
    async fn list(&self) -> StoreResult<Vec<NamedEntity>> {
        let inner = self.inner.lock().map_err(|_| lock_err())?;
        let mut rows = inner.rows.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn create(&self, name: &str) -> StoreResult<NamedEntity> {
        let mut inner = self.inner.lock().map_err(|_| lock_err())?;
        inner.next_id += 1;
        let entity = NamedEntity {
            id: inner.next_id,
            name: name.to_string(),
            created_at: Utc::now(),
        };
        inner.rows.push(entity.clone());
        Ok(entity)
    }

    async fn rename(&self, id: i64, name: &str) -> StoreResult<NamedEntity> {
        let mut inner = self.inner.lock().map_err(|_| lock_err())?;
        let entity = inner
            .rows
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(StoreError::NotFound {
                entity: self.entity,
                id,
            })?;
        entity.name = name.to_string();
        Ok(entity.clone())
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let mut inner = self.inner.lock().map_err(|_| lock_err())?;
        let before = inner.rows.len();
        inner.rows.retain(|e| e.id != id);
        if inner.rows.len() == before {
            return Err(StoreError::NotFound {
                entity: self.entity,
                id,
            });
        }
        Ok(())
    }
}

/// In-memory audit trail.
#[derive(Default)]
pub struct MemoryAuditStore {
    inner: Mutex<AuditInner>,
}

#[derive(Default)]
struct AuditInner {
    next_id: i64,
    rows: Vec<AuditRecord>,
}

impl MemoryAuditStore {
    /// Create an empty trail.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn record(&self, event: AuditEvent) -> StoreResult<()> {
        let mut inner = self.inner.lock().map_err(|_| lock_err())?;
        inner.next_id += 1;
        let record = AuditRecord {
            id: inner.next_id,
            user_id: event.user_id,
            username: event.username,
            action: event.action.as_str().to_string(),
            entity_type: event.entity_type,
            entity_id: event.entity_id,
            changes: event.changes,
            ip_address: event.origin.ip_address,
            user_agent: event.origin.user_agent,
            created_at: Utc::now(),
        };
        inner.rows.push(record);
        Ok(())
    }

    async fn recent(&self, limit: i64) -> StoreResult<Vec<AuditRecord>> {
        let inner = self.inner.lock().map_err(|_| lock_err())?;
        Ok(inner
            .rows
            .iter()
            .rev()
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn by_user(&self, user_id: UserId, limit: i64) -> StoreResult<Vec<AuditRecord>> {
        let inner = self.inner.lock().map_err(|_| lock_err())?;
        Ok(inner
            .rows
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn by_entity(&self, entity_type: &str, entity_id: i64) -> StoreResult<Vec<AuditRecord>> {
        let inner = self.inner.lock().map_err(|_| lock_err())?;
        Ok(inner
            .rows
            .iter()
            .rev()
            .filter(|r| r.entity_type == entity_type && r.entity_id == Some(entity_id))
            .cloned()
            .collect())
    }
}

// ════════════════════════════════════════════════════════════════════════
// Bundle
// ════════════════════════════════════════════════════════════════════════

/// All fakes, wired together the way the server wires the real stores.
pub struct MemoryStores {
    /// Settings (floor) store.
    pub settings: Arc<MemorySettingsStore>,
    /// Truck fleet store.
    pub trucks: Arc<MemoryTruckStore>,
    /// Ticket ledger with serialized allocation.
    pub dispatches: Arc<MemoryDispatchStore>,
    /// Client store.
    pub clients: Arc<MemoryClientStore>,
    /// Company store.
    pub companies: Arc<MemoryCompanyStore>,
    /// Product store.
    pub products: Arc<MemoryProductStore>,
    /// Equipment store.
    pub equipment: Arc<MemoryNamedEntityStore>,
    /// Operator store.
    pub operators: Arc<MemoryNamedEntityStore>,
    /// Audit trail.
    pub audit: Arc<MemoryAuditStore>,
}

impl MemoryStores {
    /// Create a fully wired set of fakes.
    #[must_use]
    pub fn new() -> Self {
        let settings = Arc::new(MemorySettingsStore::new());
        let trucks = Arc::new(MemoryTruckStore::new());
        let dispatches = Arc::new(MemoryDispatchStore::new(settings.clone(), trucks.clone()));
        Self {
            settings,
            trucks,
            dispatches,
            clients: Arc::new(MemoryClientStore::new()),
            companies: Arc::new(MemoryCompanyStore::new()),
            products: Arc::new(MemoryProductStore::new()),
            equipment: Arc::new(MemoryNamedEntityStore::new("equipment")),
            operators: Arc::new(MemoryNamedEntityStore::new("operator")),
            audit: Arc::new(MemoryAuditStore::new()),
        }
    }
}

impl Default for MemoryStores {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn ticket(client: &str) -> NewDispatch {
        NewDispatch {
            date: NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date"),
            time: NaiveTime::from_hms_opt(9, 30, 0).expect("valid time"),
            truck_name: "MACK GRANITE".to_string(),
            plate: "A-123456".to_string(),
            color: String::new(),
            fleet_card: String::new(),
            order_no: String::new(),
            order_ticket: String::new(),
            driver: String::new(),
            volume_m3: None,
            materials: vec![],
            client_name: client.to_uppercase(),
            phone: None,
            total: 1000.0,
            user_id: UserId::new(1),
            equipment_id: None,
            operator_id: None,
        }
    }

    #[tokio::test]
    async fn empty_ledger_starts_at_floor_one() {
        let stores = MemoryStores::new();
        let created = stores
            .dispatches
            .create(ticket("a"))
            .await
            .expect("create works");
        assert_eq!(created.dispatch_no, "0000001");
    }

    #[tokio::test]
    async fn empty_ledger_honors_configured_floor() {
        let stores = MemoryStores::new();
        stores
            .settings
            .set(DISPATCH_START_NUMBER, "5000")
            .await
            .expect("floor update works");
        let created = stores
            .dispatches
            .create(ticket("a"))
            .await
            .expect("create works");
        assert_eq!(created.dispatch_no, "0005000");
    }

    #[tokio::test]
    async fn floor_is_a_lower_bound_only() {
        let stores = MemoryStores::new();
        stores
            .settings
            .set(DISPATCH_START_NUMBER, "5000")
            .await
            .expect("floor update works");
        stores
            .dispatches
            .create(ticket("a"))
            .await
            .expect("create works");

        // Lower the floor back down: the running sequence wins.
        stores
            .settings
            .set(DISPATCH_START_NUMBER, "1")
            .await
            .expect("floor update works");
        let next = stores
            .dispatches
            .create(ticket("b"))
            .await
            .expect("create works");
        assert_eq!(next.dispatch_no, "0005001");
    }

    #[tokio::test]
    async fn raised_floor_takes_precedence() {
        let stores = MemoryStores::new();
        for i in 0..10 {
            stores
                .dispatches
                .create(ticket(&format!("c{i}")))
                .await
                .expect("create works");
        }
        stores
            .settings
            .set(DISPATCH_START_NUMBER, "100")
            .await
            .expect("floor update works");
        let next = stores
            .dispatches
            .create(ticket("x"))
            .await
            .expect("create works");
        assert_eq!(next.dispatch_no, "0000100");
    }

    #[tokio::test]
    async fn override_of_newest_row_feeds_next_allocation() {
        let stores = MemoryStores::new();
        stores
            .dispatches
            .create(ticket("a"))
            .await
            .expect("create works");
        let newest = stores
            .dispatches
            .create(ticket("b"))
            .await
            .expect("create works");

        stores
            .dispatches
            .override_number(newest.id, "9999999")
            .await
            .expect("override works");

        let next = stores
            .dispatches
            .create(ticket("c"))
            .await
            .expect("create works");
        // Width grows past seven digits, padding is skipped, not truncated.
        assert_eq!(next.dispatch_no, "10000000");
    }

    #[tokio::test]
    async fn override_of_older_row_does_not_feed_the_sequence() {
        let stores = MemoryStores::new();
        let first = stores
            .dispatches
            .create(ticket("a"))
            .await
            .expect("create works");
        stores
            .dispatches
            .create(ticket("b"))
            .await
            .expect("create works");

        // Renumber the OLD row far ahead; allocation reads the tail by
        // insertion order, so the sequence continues from the newest row.
        stores
            .dispatches
            .override_number(first.id, "9000000")
            .await
            .expect("override works");

        let next = stores
            .dispatches
            .create(ticket("c"))
            .await
            .expect("create works");
        assert_eq!(next.dispatch_no, "0000003");
    }

    #[tokio::test]
    async fn concurrent_creates_never_share_a_number() {
        let stores = Arc::new(MemoryStores::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let stores = stores.clone();
            handles.push(tokio::spawn(async move {
                stores.dispatches.create(ticket(&format!("c{i}"))).await
            }));
        }

        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(
                handle
                    .await
                    .expect("task completes")
                    .expect("create works")
                    .dispatch_no,
            );
        }
        numbers.sort();
        let before = numbers.len();
        numbers.dedup();
        assert_eq!(numbers.len(), before, "duplicate dispatch numbers issued");
    }

    #[tokio::test]
    async fn truck_upsert_keeps_existing_fields() {
        let stores = MemoryStores::new();
        let mut first = ticket("a");
        first.color = "ROJO".to_string();
        first.volume_m3 = Some(12.0);
        stores.dispatches.create(first).await.expect("create works");

        // Second ticket for the same plate leaves color blank.
        stores
            .dispatches
            .create(ticket("b"))
            .await
            .expect("create works");

        let trucks = stores.trucks.list(None).await.expect("list works");
        assert_eq!(trucks.len(), 1);
        assert_eq!(trucks[0].color.as_deref(), Some("ROJO"));
        assert_eq!(trucks[0].volume_m3, Some(12.0));
    }
}
