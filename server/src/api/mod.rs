//! HTTP API handlers, organized by domain.

pub mod audit;
pub mod clients;
pub mod companies;
pub mod dispatches;
pub mod fleet;
pub mod health;
pub mod products;
pub mod session;
pub mod settings;
pub mod users;

use serde::Serialize;

/// Standard list envelope: `{ "data": [...] }`, the shape the frontend
/// consumes.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    /// The payload.
    pub data: T,
}

impl<T> DataResponse<T> {
    /// Wrap a payload.
    pub const fn new(data: T) -> Self {
        Self { data }
    }
}
