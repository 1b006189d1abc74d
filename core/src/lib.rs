//! # Despacho Core
//!
//! Domain types and pure business logic for the dispatch administration
//! backend, following the "Functional Core, Imperative Shell" pattern.
//!
//! The functional core owns:
//!
//! - **Identifiers and value objects**: entity ids, roles, the zero-padded
//!   [`numbering::DispatchNumber`]
//! - **The Number Allocator**: [`numbering::next_number`], a pure function
//!   over two snapshot inputs (ledger tail, configured floor)
//! - **Validation**: drafts are validated and normalized *before* any storage
//!   side effect runs, so a rejected request never consumes a number
//! - **Repository traits**: the seams the imperative shell (`despacho-postgres`,
//!   the in-memory fakes in `despacho-testing`) plugs into
//!
//! No I/O happens in this crate. Everything here is testable at memory speed.
//!
//! ## Example
//!
//! ```
//! use despacho_core::numbering::{next_number, DispatchNumber};
//!
//! // Empty ledger: the configured floor is issued as-is.
//! assert_eq!(next_number(None, 5000), 5000);
//!
//! // Running sequence: the floor is a lower bound only.
//! assert_eq!(next_number(Some(5000), 1), 5001);
//!
//! assert_eq!(DispatchNumber::from_value(42).to_string(), "0000042");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
pub mod catalog;
pub mod dispatch;
pub mod environment;
pub mod error;
pub mod numbering;
pub mod repository;
pub mod settings;
pub mod types;

pub use error::{DomainError, Result};
pub use numbering::DispatchNumber;

// Re-export commonly used time types
pub use chrono::{DateTime, Utc};
