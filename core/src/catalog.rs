//! Catalog entities: the per-request CRUD targets around the ledger.
//!
//! None of these carry cross-request invariants beyond uniqueness
//! constraints enforced by storage; they are plain data-access collaborators
//! of the dispatch flow.

use crate::error::DomainError;
use crate::types::{ClientId, CompanyId, ProductId, TruckId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A client (the party a dispatch is billed to).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    /// Storage id.
    pub id: ClientId,
    /// Client name.
    pub name: String,
    /// Owning company, if linked.
    pub company_id: Option<CompanyId>,
    /// RNC tax id.
    pub rnc: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// Construction site ("obra") the client is buying for.
    pub site: Option<String>,
    /// Standing purchase order number.
    pub purchase_order_no: Option<String>,
    /// Discount percentage (0–100).
    pub discount_pct: f64,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Draft for creating or updating a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientDraft {
    /// Client name (required, trimmed).
    pub name: Option<String>,
    /// Owning company.
    pub company_id: Option<i64>,
    /// RNC tax id.
    pub rnc: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// Construction site.
    pub site: Option<String>,
    /// Standing purchase order number.
    pub purchase_order_no: Option<String>,
    /// Discount percentage.
    pub discount_pct: Option<f64>,
}

impl ClientDraft {
    /// Validate the draft: the name must be non-blank, the discount within
    /// 0–100.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::MissingField`] or [`DomainError::InvalidNumber`].
    pub fn validate(self) -> Result<NewClient, DomainError> {
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or(DomainError::MissingField { field: "name" })?
            .to_string();
        let discount_pct = self.discount_pct.unwrap_or(0.0);
        if !(0.0..=100.0).contains(&discount_pct) {
            return Err(DomainError::InvalidNumber {
                field: "discount_pct",
                reason: format!("must be between 0 and 100, got {discount_pct}"),
            });
        }
        Ok(NewClient {
            name,
            company_id: self.company_id.filter(|id| *id > 0).map(CompanyId::new),
            rnc: non_blank(self.rnc),
            address: non_blank(self.address),
            site: non_blank(self.site),
            purchase_order_no: non_blank(self.purchase_order_no),
            discount_pct,
        })
    }
}

/// A validated client payload.
#[derive(Debug, Clone, PartialEq)]
pub struct NewClient {
    /// Client name, trimmed.
    pub name: String,
    /// Owning company.
    pub company_id: Option<CompanyId>,
    /// RNC tax id.
    pub rnc: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// Construction site.
    pub site: Option<String>,
    /// Standing purchase order number.
    pub purchase_order_no: Option<String>,
    /// Discount percentage (0–100).
    pub discount_pct: f64,
}

/// A company (fiscal entity behind one or more clients).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    /// Storage id.
    pub id: CompanyId,
    /// Company name.
    pub name: String,
    /// Street address.
    pub address: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// RNC tax id.
    pub rnc: String,
    /// Fiscal address ("domicilio").
    pub fiscal_address: Option<String>,
    /// Tax rate percentage applied to invoices.
    pub tax_rate: f64,
    /// Whether the company is tax exempt.
    pub tax_exempt: bool,
    /// Free-form contact notes.
    pub contacts: Option<String>,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Draft for creating or updating a company.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyDraft {
    /// Company name (required).
    pub name: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// RNC tax id (required).
    pub rnc: Option<String>,
    /// Fiscal address.
    pub fiscal_address: Option<String>,
    /// Tax rate percentage.
    pub tax_rate: Option<f64>,
    /// Whether the company is tax exempt.
    pub tax_exempt: Option<bool>,
    /// Free-form contact notes.
    pub contacts: Option<String>,
}

impl CompanyDraft {
    /// Validate the draft: name and RNC are both required.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::MissingField`] when either is blank.
    pub fn validate(self) -> Result<NewCompany, DomainError> {
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or(DomainError::MissingField { field: "name" })?
            .to_string();
        let rnc = self
            .rnc
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or(DomainError::MissingField { field: "rnc" })?
            .to_string();
        Ok(NewCompany {
            name,
            address: non_blank(self.address),
            phone: non_blank(self.phone),
            email: non_blank(self.email),
            rnc,
            fiscal_address: non_blank(self.fiscal_address),
            tax_rate: self.tax_rate.unwrap_or(0.0),
            tax_exempt: self.tax_exempt.unwrap_or(false),
            contacts: non_blank(self.contacts),
        })
    }
}

/// A validated company payload.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCompany {
    /// Company name, trimmed.
    pub name: String,
    /// Street address.
    pub address: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// RNC tax id, trimmed.
    pub rnc: String,
    /// Fiscal address.
    pub fiscal_address: Option<String>,
    /// Tax rate percentage.
    pub tax_rate: f64,
    /// Whether the company is tax exempt.
    pub tax_exempt: bool,
    /// Free-form contact notes.
    pub contacts: Option<String>,
}

/// A product sold on dispatch tickets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Storage id.
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// List price per unit.
    pub price: f64,
    /// ITBIS tax rate as a fraction (0.00 for natural aggregates, 0.18 for
    /// processed ones).
    pub itbis_rate: f64,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Draft for creating or updating a product.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductDraft {
    /// Product name (required).
    pub name: Option<String>,
    /// List price per unit (required, ≥ 0).
    pub price: Option<f64>,
    /// ITBIS rate as a fraction.
    pub itbis_rate: Option<f64>,
}

impl ProductDraft {
    /// Validate the draft.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::MissingField`] for a blank name and
    /// [`DomainError::InvalidNumber`] for a negative price or a rate
    /// outside 0–1.
    pub fn validate(self) -> Result<NewProduct, DomainError> {
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or(DomainError::MissingField { field: "name" })?
            .to_string();
        let price = self.price.ok_or(DomainError::InvalidNumber {
            field: "price",
            reason: "missing".to_string(),
        })?;
        if !price.is_finite() || price < 0.0 {
            return Err(DomainError::InvalidNumber {
                field: "price",
                reason: format!("must be non-negative, got {price}"),
            });
        }
        let itbis_rate = self.itbis_rate.unwrap_or(0.0);
        if !(0.0..=1.0).contains(&itbis_rate) {
            return Err(DomainError::InvalidNumber {
                field: "itbis_rate",
                reason: format!("must be a fraction between 0 and 1, got {itbis_rate}"),
            });
        }
        Ok(NewProduct {
            name,
            price,
            itbis_rate,
        })
    }
}

/// A validated product payload.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    /// Product name, trimmed.
    pub name: String,
    /// List price per unit.
    pub price: f64,
    /// ITBIS rate as a fraction.
    pub itbis_rate: f64,
}

/// A per-client special price for a product. Client names are stored
/// uppercased so lookups match however the ticket was typed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientPrice {
    /// Storage id.
    pub id: i64,
    /// Product this price applies to.
    pub product_id: ProductId,
    /// Client name, uppercased.
    pub client_name: String,
    /// The negotiated price.
    pub special_price: f64,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A name-only catalog entity (equipment and operators share the shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedEntity {
    /// Storage id.
    pub id: i64,
    /// Entity name.
    pub name: String,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A truck in the fleet, upserted from dispatch creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Truck {
    /// Storage id.
    pub id: TruckId,
    /// License plate (unique).
    pub plate: String,
    /// Truck make.
    pub make: Option<String>,
    /// Truck color.
    pub color: Option<String>,
    /// Fleet card number.
    pub fleet_card: Option<String>,
    /// Capacity in cubic meters.
    pub volume_m3: Option<f64>,
    /// Fleet status (`activo` by default).
    pub status: String,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Truck fields captured on a ticket, used to upsert the fleet record.
///
/// Blank fields must not clobber stored values; the storage layer applies
/// COALESCE semantics on conflict.
#[derive(Debug, Clone, PartialEq)]
pub struct TruckUpsert {
    /// License plate, uppercased (conflict key).
    pub plate: String,
    /// Truck make; `SIN ESPECIFICAR` when the ticket left it blank.
    pub make: String,
    /// Truck color, if given.
    pub color: Option<String>,
    /// Fleet card, if given.
    pub fleet_card: Option<String>,
    /// Measured capacity, if given.
    pub volume_m3: Option<f64>,
}

impl TruckUpsert {
    /// Build the upsert payload from a validated ticket.
    #[must_use]
    pub fn from_dispatch(new: &crate::dispatch::NewDispatch) -> Self {
        Self {
            plate: new.plate.clone(),
            make: if new.truck_name.is_empty() {
                "SIN ESPECIFICAR".to_string()
            } else {
                new.truck_name.clone()
            },
            color: Some(new.color.clone()).filter(|c| !c.is_empty()),
            fleet_card: Some(new.fleet_card.clone()).filter(|f| !f.is_empty()),
            volume_m3: new.volume_m3,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn client_draft_requires_name() {
        let err = ClientDraft::default().validate();
        assert_eq!(err, Err(DomainError::MissingField { field: "name" }));
    }

    #[test]
    fn client_draft_trims_and_defaults_discount() {
        let new = ClientDraft {
            name: Some("  Ferretería Central  ".to_string()),
            ..ClientDraft::default()
        }
        .validate()
        .expect("valid draft");
        assert_eq!(new.name, "Ferretería Central");
        assert!((new.discount_pct - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn client_draft_rejects_out_of_range_discount() {
        let draft = ClientDraft {
            name: Some("X".to_string()),
            discount_pct: Some(150.0),
            ..ClientDraft::default()
        };
        assert!(draft.validate().is_err());
    }

    #[test]
    fn company_draft_requires_rnc() {
        let draft = CompanyDraft {
            name: Some("Agregados del Sur".to_string()),
            ..CompanyDraft::default()
        };
        assert_eq!(
            draft.validate(),
            Err(DomainError::MissingField { field: "rnc" })
        );
    }

    #[test]
    fn product_draft_validates_rate_and_price() {
        let new = ProductDraft {
            name: Some("Arena lavada".to_string()),
            price: Some(950.0),
            itbis_rate: Some(0.18),
        }
        .validate()
        .expect("valid draft");
        assert_eq!(new.name, "Arena lavada");

        let bad_rate = ProductDraft {
            name: Some("Base".to_string()),
            price: Some(100.0),
            itbis_rate: Some(18.0),
        };
        assert!(bad_rate.validate().is_err());
    }

    #[test]
    fn truck_upsert_fills_placeholder_make() {
        use crate::dispatch::{DispatchDraft, MaterialLine};
        use crate::types::UserId;
        use chrono::{NaiveDate, NaiveTime};

        let new = DispatchDraft {
            truck_name: Some("volteo".to_string()),
            plate: Some("l-999".to_string()),
            client_name: Some("obra norte".to_string()),
            total: Some(100.0),
            materials: Some(vec![MaterialLine {
                product: "Arena".to_string(),
                quantity: 6.0,
                unit_price: 100.0,
                amount: 600.0,
            }]),
            ..DispatchDraft::default()
        }
        .validate(
            NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date"),
            NaiveTime::from_hms_opt(8, 0, 0).expect("valid time"),
            UserId::new(1),
        )
        .expect("valid draft");

        let upsert = TruckUpsert::from_dispatch(&new);
        assert_eq!(upsert.plate, "L-999");
        assert_eq!(upsert.make, "VOLTEO");
        assert_eq!(upsert.color, None);
    }
}
