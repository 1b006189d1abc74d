//! Dispatch tickets: the ledger entries behind every delivery.
//!
//! A [`DispatchDraft`] is the unvalidated request payload. Validation
//! normalizes it into a [`NewDispatch`] (uppercased identity fields,
//! resolved date/time, checked totals) before any storage side effect runs.
//! A rejected draft never consumes a display number.

use crate::error::DomainError;
use crate::types::{normalize_upper, DispatchId, EquipmentId, OperatorId, UserId};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// One material line on a ticket.
///
/// Stored as JSON alongside the ticket; quantities and prices follow the
/// original float semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialLine {
    /// Product name as entered on the ticket.
    pub product: String,
    /// Quantity in the product's unit (usually m³).
    pub quantity: f64,
    /// Unit price charged.
    pub unit_price: f64,
    /// Line amount (quantity × unit price, as computed by the caller).
    pub amount: f64,
}

/// A persisted dispatch ticket, as read back from the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispatch {
    /// Internal storage id.
    pub id: DispatchId,
    /// Human-facing display number. Normally allocator-assigned and
    /// zero-padded; arbitrary strings can appear via the admin override.
    pub dispatch_no: String,
    /// Ticket date (business timezone).
    pub date: NaiveDate,
    /// Ticket time (business timezone).
    pub time: NaiveTime,
    /// Truck make/name.
    pub truck_name: String,
    /// License plate.
    pub plate: String,
    /// Truck color.
    pub color: String,
    /// Internal fleet card number.
    pub fleet_card: String,
    /// Purchase order number, if the client supplied one.
    pub order_no: String,
    /// Order ticket reference, if any.
    pub order_ticket: String,
    /// Driver name.
    pub driver: String,
    /// Load volume in cubic meters.
    pub volume_m3: Option<f64>,
    /// Material line items.
    pub materials: Vec<MaterialLine>,
    /// Client name.
    pub client_name: String,
    /// Client phone.
    pub phone: Option<String>,
    /// Ticket total.
    pub total: f64,
    /// User who created the ticket.
    pub user_id: UserId,
    /// Equipment used, if recorded.
    pub equipment_id: Option<EquipmentId>,
    /// Operator on duty, if recorded.
    pub operator_id: Option<OperatorId>,
    /// Creator's username (joined at read time).
    pub user_name: Option<String>,
    /// Equipment name (joined at read time).
    pub equipment_name: Option<String>,
    /// Operator name (joined at read time).
    pub operator_name: Option<String>,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Unvalidated create/update payload, exactly as the caller sent it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DispatchDraft {
    /// Ticket date; defaults to the server clock when absent.
    pub date: Option<NaiveDate>,
    /// Ticket time; defaults to the server clock when absent.
    pub time: Option<NaiveTime>,
    /// Truck make/name (required).
    pub truck_name: Option<String>,
    /// License plate (required).
    pub plate: Option<String>,
    /// Truck color.
    pub color: Option<String>,
    /// Internal fleet card number.
    pub fleet_card: Option<String>,
    /// Purchase order number.
    pub order_no: Option<String>,
    /// Order ticket reference.
    pub order_ticket: Option<String>,
    /// Driver name.
    pub driver: Option<String>,
    /// Load volume in cubic meters.
    pub volume_m3: Option<f64>,
    /// Material line items.
    pub materials: Option<Vec<MaterialLine>>,
    /// Client name (required).
    pub client_name: Option<String>,
    /// Client phone.
    pub phone: Option<String>,
    /// Ticket total (required, ≥ 0).
    pub total: Option<f64>,
    /// Creating user; resolved from the session when absent.
    pub user_id: Option<i64>,
    /// Equipment used.
    pub equipment_id: Option<i64>,
    /// Operator on duty.
    pub operator_id: Option<i64>,
}

/// A validated, normalized ticket ready for allocation and insert.
///
/// Free-text identity fields are uppercased, the date/time is resolved, the
/// total checked. The display number is intentionally absent: it is assigned
/// by the storage boundary at insert time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDispatch {
    /// Ticket date.
    pub date: NaiveDate,
    /// Ticket time.
    pub time: NaiveTime,
    /// Truck make/name, uppercased.
    pub truck_name: String,
    /// License plate, uppercased.
    pub plate: String,
    /// Truck color, uppercased.
    pub color: String,
    /// Fleet card, uppercased.
    pub fleet_card: String,
    /// Purchase order number, uppercased.
    pub order_no: String,
    /// Order ticket reference, uppercased.
    pub order_ticket: String,
    /// Driver name, uppercased.
    pub driver: String,
    /// Load volume; non-positive values are dropped.
    pub volume_m3: Option<f64>,
    /// Material line items.
    pub materials: Vec<MaterialLine>,
    /// Client name, uppercased.
    pub client_name: String,
    /// Client phone, as given.
    pub phone: Option<String>,
    /// Ticket total.
    pub total: f64,
    /// Creating user.
    pub user_id: UserId,
    /// Equipment used.
    pub equipment_id: Option<EquipmentId>,
    /// Operator on duty.
    pub operator_id: Option<OperatorId>,
}

impl DispatchDraft {
    /// Validate and normalize the draft.
    ///
    /// `fallback_date`/`fallback_time` come from the server clock in the
    /// business timezone and are used when the caller omitted them.
    /// `session_user` is the authenticated creator, used when the payload
    /// carries no usable `user_id`.
    ///
    /// # Errors
    ///
    /// - [`DomainError::MissingField`] when truck name, plate or client name
    ///   is blank
    /// - [`DomainError::InvalidNumber`] when the total is absent, negative
    ///   or not finite
    pub fn validate(
        self,
        fallback_date: NaiveDate,
        fallback_time: NaiveTime,
        session_user: UserId,
    ) -> Result<NewDispatch, DomainError> {
        let truck_name = normalize_upper(self.truck_name.as_deref().unwrap_or(""))
            .ok_or(DomainError::MissingField { field: "truck_name" })?;
        let plate = normalize_upper(self.plate.as_deref().unwrap_or(""))
            .ok_or(DomainError::MissingField { field: "plate" })?;
        let client_name = normalize_upper(self.client_name.as_deref().unwrap_or(""))
            .ok_or(DomainError::MissingField { field: "client_name" })?;

        let total = self.total.ok_or(DomainError::InvalidNumber {
            field: "total",
            reason: "missing".to_string(),
        })?;
        if !total.is_finite() || total < 0.0 {
            return Err(DomainError::InvalidNumber {
                field: "total",
                reason: format!("must be a non-negative amount, got {total}"),
            });
        }

        // Non-positive volumes are treated as "not recorded", matching how
        // tickets without a measured load are entered.
        let volume_m3 = self.volume_m3.filter(|v| v.is_finite() && *v > 0.0);

        let upper_or_empty =
            |value: Option<String>| normalize_upper(value.as_deref().unwrap_or("")).unwrap_or_default();

        let positive_id = |value: Option<i64>| value.filter(|id| *id > 0);

        Ok(NewDispatch {
            date: self.date.unwrap_or(fallback_date),
            time: self.time.unwrap_or(fallback_time),
            truck_name,
            plate,
            color: upper_or_empty(self.color),
            fleet_card: upper_or_empty(self.fleet_card),
            order_no: upper_or_empty(self.order_no),
            order_ticket: upper_or_empty(self.order_ticket),
            driver: upper_or_empty(self.driver),
            volume_m3,
            materials: self.materials.unwrap_or_default(),
            client_name,
            phone: self.phone.filter(|p| !p.trim().is_empty()),
            total,
            user_id: positive_id(self.user_id).map_or(session_user, UserId::new),
            equipment_id: positive_id(self.equipment_id).map(EquipmentId::new),
            operator_id: positive_id(self.operator_id).map(OperatorId::new),
        })
    }
}

/// Outcome of a successful create: the internal id plus the number the
/// allocator assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedDispatch {
    /// Internal storage id of the new ticket.
    pub id: DispatchId,
    /// The display number that was assigned.
    pub dispatch_no: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    fn draft() -> DispatchDraft {
        DispatchDraft {
            truck_name: Some("mack granite".to_string()),
            plate: Some("a-123456".to_string()),
            client_name: Some("constructora del este".to_string()),
            total: Some(4500.0),
            ..DispatchDraft::default()
        }
    }

    fn fallback() -> (NaiveDate, NaiveTime) {
        (
            NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date"),
            NaiveTime::from_hms_opt(9, 30, 0).expect("valid time"),
        )
    }

    #[test]
    fn validate_uppercases_identity_fields() {
        let (date, time) = fallback();
        let new = draft()
            .validate(date, time, UserId::new(1))
            .expect("draft should validate");
        assert_eq!(new.truck_name, "MACK GRANITE");
        assert_eq!(new.plate, "A-123456");
        assert_eq!(new.client_name, "CONSTRUCTORA DEL ESTE");
        assert_eq!(new.date, date);
        assert_eq!(new.time, time);
        assert_eq!(new.user_id, UserId::new(1));
    }

    #[test]
    fn validate_rejects_blank_required_fields() {
        let (date, time) = fallback();
        let mut d = draft();
        d.plate = Some("   ".to_string());
        let err = d.validate(date, time, UserId::new(1));
        assert_eq!(err, Err(DomainError::MissingField { field: "plate" }));
    }

    #[test]
    fn validate_rejects_negative_total() {
        let (date, time) = fallback();
        let mut d = draft();
        d.total = Some(-1.0);
        assert!(d.validate(date, time, UserId::new(1)).is_err());
    }

    #[test]
    fn validate_rejects_missing_total() {
        let (date, time) = fallback();
        let mut d = draft();
        d.total = None;
        assert!(d.validate(date, time, UserId::new(1)).is_err());
    }

    #[test]
    fn validate_drops_non_positive_volume_and_ids() {
        let (date, time) = fallback();
        let mut d = draft();
        d.volume_m3 = Some(0.0);
        d.equipment_id = Some(0);
        d.operator_id = Some(-3);
        d.user_id = Some(0);
        let new = d
            .validate(date, time, UserId::new(9))
            .expect("draft should validate");
        assert_eq!(new.volume_m3, None);
        assert_eq!(new.equipment_id, None);
        assert_eq!(new.operator_id, None);
        // Falls back to the session user when the payload id is unusable.
        assert_eq!(new.user_id, UserId::new(9));
    }

    #[test]
    fn validate_keeps_explicit_date_time() {
        let (date, time) = fallback();
        let mut d = draft();
        let explicit_date = NaiveDate::from_ymd_opt(2024, 12, 1).expect("valid date");
        let explicit_time = NaiveTime::from_hms_opt(16, 45, 0).expect("valid time");
        d.date = Some(explicit_date);
        d.time = Some(explicit_time);
        let new = d
            .validate(date, time, UserId::new(1))
            .expect("draft should validate");
        assert_eq!(new.date, explicit_date);
        assert_eq!(new.time, explicit_time);
    }
}
