//! Catalog stores: clients, companies, products and per-client prices.
//!
//! Plain parameterized CRUD; uniqueness lives in the schema and surfaces as
//! [`StoreError::Duplicate`].

use crate::is_unique_violation;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use despacho_core::catalog::{
    Client, ClientPrice, Company, NewClient, NewCompany, NewProduct, Product,
};
use despacho_core::error::{StoreError, StoreResult};
use despacho_core::repository::{ClientStore, CompanyStore, ProductStore};
use despacho_core::types::{ClientId, CompanyId, ProductId};
use sqlx::postgres::PgPool;
use sqlx::FromRow;

// ════════════════════════════════════════════════════════════════════════
// Clients
// ════════════════════════════════════════════════════════════════════════

/// Client store backed by `PostgreSQL`.
#[derive(Clone)]
pub struct PostgresClientStore {
    pool: PgPool,
}

impl PostgresClientStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ClientRow {
    id: i64,
    name: String,
    company_id: Option<i64>,
    rnc: Option<String>,
    address: Option<String>,
    site: Option<String>,
    purchase_order_no: Option<String>,
    discount_pct: f64,
    created_at: DateTime<Utc>,
}

impl ClientRow {
    fn into_domain(self) -> Client {
        Client {
            id: ClientId::new(self.id),
            name: self.name,
            company_id: self.company_id.map(CompanyId::new),
            rnc: self.rnc,
            address: self.address,
            site: self.site,
            purchase_order_no: self.purchase_order_no,
            discount_pct: self.discount_pct,
            created_at: self.created_at,
        }
    }
}

const CLIENT_COLUMNS: &str =
    "id, name, company_id, rnc, address, site, purchase_order_no, discount_pct, created_at";

#[async_trait]
impl ClientStore for PostgresClientStore {
    async fn list(&self) -> StoreResult<Vec<Client>> {
        let rows: Vec<ClientRow> =
            sqlx::query_as(&format!("SELECT {CLIENT_COLUMNS} FROM clients ORDER BY name"))
                .fetch_all(&self.pool)
                .await
                .map_err(StoreError::backend)?;
        Ok(rows.into_iter().map(ClientRow::into_domain).collect())
    }

    async fn find_or_create(&self, new: NewClient) -> StoreResult<Client> {
        // Self-registration path: an existing name (case-insensitive) wins
        // over the incoming payload, matching how ticket entry reuses
        // clients typed in any casing.
        let existing: Option<ClientRow> = sqlx::query_as(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE LOWER(name) = LOWER($1)"
        ))
        .bind(&new.name)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        if let Some(row) = existing {
            return Ok(row.into_domain());
        }

        let row: ClientRow = sqlx::query_as(&format!(
            "INSERT INTO clients
               (name, company_id, rnc, address, site, purchase_order_no, discount_pct)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {CLIENT_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(new.company_id.map(CompanyId::value))
        .bind(new.rnc.as_deref())
        .bind(new.address.as_deref())
        .bind(new.site.as_deref())
        .bind(new.purchase_order_no.as_deref())
        .bind(new.discount_pct)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(row.into_domain())
    }

    async fn update(&self, id: ClientId, new: NewClient) -> StoreResult<Client> {
        let row: Option<ClientRow> = sqlx::query_as(&format!(
            "UPDATE clients
             SET name = $1, company_id = $2, rnc = $3, address = $4, site = $5,
                 purchase_order_no = $6, discount_pct = $7, updated_at = now()
             WHERE id = $8
             RETURNING {CLIENT_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(new.company_id.map(CompanyId::value))
        .bind(new.rnc.as_deref())
        .bind(new.address.as_deref())
        .bind(new.site.as_deref())
        .bind(new.purchase_order_no.as_deref())
        .bind(new.discount_pct)
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        row.map(ClientRow::into_domain).ok_or(StoreError::NotFound {
            entity: "client",
            id: id.value(),
        })
    }

    async fn delete(&self, id: ClientId) -> StoreResult<()> {
        delete_by_id(&self.pool, "clients", "client", id.value()).await
    }
}

// ════════════════════════════════════════════════════════════════════════
// Companies
// ════════════════════════════════════════════════════════════════════════

/// Company store backed by `PostgreSQL`.
#[derive(Clone)]
pub struct PostgresCompanyStore {
    pool: PgPool,
}

impl PostgresCompanyStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct CompanyRow {
    id: i64,
    name: String,
    address: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    rnc: String,
    fiscal_address: Option<String>,
    tax_rate: f64,
    tax_exempt: bool,
    contacts: Option<String>,
    created_at: DateTime<Utc>,
}

impl CompanyRow {
    fn into_domain(self) -> Company {
        Company {
            id: CompanyId::new(self.id),
            name: self.name,
            address: self.address,
            phone: self.phone,
            email: self.email,
            rnc: self.rnc,
            fiscal_address: self.fiscal_address,
            tax_rate: self.tax_rate,
            tax_exempt: self.tax_exempt,
            contacts: self.contacts,
            created_at: self.created_at,
        }
    }
}

const COMPANY_COLUMNS: &str = "id, name, address, phone, email, rnc, fiscal_address, \
                               tax_rate, tax_exempt, contacts, created_at";

fn map_company_error(err: sqlx::Error) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::Duplicate {
            entity: "company",
            detail: "name or RNC already exists".to_string(),
        }
    } else {
        StoreError::backend(err)
    }
}

#[async_trait]
impl CompanyStore for PostgresCompanyStore {
    async fn list(&self) -> StoreResult<Vec<Company>> {
        let rows: Vec<CompanyRow> =
            sqlx::query_as(&format!("SELECT {COMPANY_COLUMNS} FROM companies ORDER BY name"))
                .fetch_all(&self.pool)
                .await
                .map_err(StoreError::backend)?;
        Ok(rows.into_iter().map(CompanyRow::into_domain).collect())
    }

    async fn create(&self, new: NewCompany) -> StoreResult<Company> {
        let row: CompanyRow = sqlx::query_as(&format!(
            "INSERT INTO companies
               (name, address, phone, email, rnc, fiscal_address, tax_rate, tax_exempt, contacts)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COMPANY_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(new.address.as_deref())
        .bind(new.phone.as_deref())
        .bind(new.email.as_deref())
        .bind(&new.rnc)
        .bind(new.fiscal_address.as_deref())
        .bind(new.tax_rate)
        .bind(new.tax_exempt)
        .bind(new.contacts.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(map_company_error)?;

        Ok(row.into_domain())
    }

    async fn update(&self, id: CompanyId, new: NewCompany) -> StoreResult<Company> {
        let row: Option<CompanyRow> = sqlx::query_as(&format!(
            "UPDATE companies
             SET name = $1, address = $2, phone = $3, email = $4, rnc = $5,
                 fiscal_address = $6, tax_rate = $7, tax_exempt = $8, contacts = $9
             WHERE id = $10
             RETURNING {COMPANY_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(new.address.as_deref())
        .bind(new.phone.as_deref())
        .bind(new.email.as_deref())
        .bind(&new.rnc)
        .bind(new.fiscal_address.as_deref())
        .bind(new.tax_rate)
        .bind(new.tax_exempt)
        .bind(new.contacts.as_deref())
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_company_error)?;

        row.map(CompanyRow::into_domain)
            .ok_or(StoreError::NotFound {
                entity: "company",
                id: id.value(),
            })
    }

    async fn delete(&self, id: CompanyId) -> StoreResult<()> {
        delete_by_id(&self.pool, "companies", "company", id.value()).await
    }
}

// ════════════════════════════════════════════════════════════════════════
// Products and client prices
// ════════════════════════════════════════════════════════════════════════

/// Product store backed by `PostgreSQL`.
#[derive(Clone)]
pub struct PostgresProductStore {
    pool: PgPool,
}

impl PostgresProductStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    price: f64,
    itbis_rate: f64,
    created_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_domain(self) -> Product {
        Product {
            id: ProductId::new(self.id),
            name: self.name,
            price: self.price,
            itbis_rate: self.itbis_rate,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct ClientPriceRow {
    id: i64,
    product_id: i64,
    client_name: String,
    special_price: f64,
    created_at: DateTime<Utc>,
}

impl ClientPriceRow {
    fn into_domain(self) -> ClientPrice {
        ClientPrice {
            id: self.id,
            product_id: ProductId::new(self.product_id),
            client_name: self.client_name,
            special_price: self.special_price,
            created_at: self.created_at,
        }
    }
}

#[async_trait]
impl ProductStore for PostgresProductStore {
    async fn list(&self) -> StoreResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(
            "SELECT id, name, price, itbis_rate, created_at FROM products ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(rows.into_iter().map(ProductRow::into_domain).collect())
    }

    async fn create(&self, new: NewProduct) -> StoreResult<Product> {
        let row: ProductRow = sqlx::query_as(
            "INSERT INTO products (name, price, itbis_rate)
             VALUES ($1, $2, $3)
             RETURNING id, name, price, itbis_rate, created_at",
        )
        .bind(&new.name)
        .bind(new.price)
        .bind(new.itbis_rate)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(row.into_domain())
    }

    async fn update(&self, id: ProductId, new: NewProduct) -> StoreResult<Product> {
        let row: Option<ProductRow> = sqlx::query_as(
            "UPDATE products SET name = $1, price = $2, itbis_rate = $3
             WHERE id = $4
             RETURNING id, name, price, itbis_rate, created_at",
        )
        .bind(&new.name)
        .bind(new.price)
        .bind(new.itbis_rate)
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        row.map(ProductRow::into_domain)
            .ok_or(StoreError::NotFound {
                entity: "product",
                id: id.value(),
            })
    }

    async fn delete(&self, id: ProductId) -> StoreResult<()> {
        delete_by_id(&self.pool, "products", "product", id.value()).await
    }

    async fn client_prices(&self, id: ProductId) -> StoreResult<Vec<ClientPrice>> {
        let rows: Vec<ClientPriceRow> = sqlx::query_as(
            "SELECT id, product_id, client_name, special_price, created_at
             FROM client_prices WHERE product_id = $1 ORDER BY client_name",
        )
        .bind(id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(rows.into_iter().map(ClientPriceRow::into_domain).collect())
    }

    async fn set_client_price(
        &self,
        id: ProductId,
        client_name: &str,
        special_price: f64,
    ) -> StoreResult<ClientPrice> {
        // Client names are stored uppercased so lookups match however the
        // ticket was typed.
        let row: ClientPriceRow = sqlx::query_as(
            "INSERT INTO client_prices (product_id, client_name, special_price)
             VALUES ($1, UPPER($2), $3)
             ON CONFLICT (product_id, client_name) DO UPDATE
             SET special_price = EXCLUDED.special_price, updated_at = now()
             RETURNING id, product_id, client_name, special_price, created_at",
        )
        .bind(id.value())
        .bind(client_name)
        .bind(special_price)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // A missing product surfaces as a foreign-key violation.
            if matches!(&e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23503")) {
                StoreError::NotFound {
                    entity: "product",
                    id: id.value(),
                }
            } else {
                StoreError::backend(e)
            }
        })?;
        Ok(row.into_domain())
    }

    async fn delete_client_price(&self, id: ProductId, client_name: &str) -> StoreResult<()> {
        let result = sqlx::query(
            "DELETE FROM client_prices WHERE product_id = $1 AND client_name = UPPER($2)",
        )
        .bind(id.value())
        .bind(client_name)
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "client price",
                id: id.value(),
            });
        }
        Ok(())
    }
}

/// Shared `DELETE … WHERE id` with not-found detection.
async fn delete_by_id(
    pool: &PgPool,
    table: &str,
    entity: &'static str,
    id: i64,
) -> StoreResult<()> {
    let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
        .bind(id)
        .execute(pool)
        .await
        .map_err(StoreError::backend)?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound { entity, id });
    }
    Ok(())
}
