//! # Despacho Testing
//!
//! In-memory fakes and helpers for testing the dispatch backend without a
//! database.
//!
//! The fakes implement the repository traits from `despacho-core` with the
//! same observable contract as the `PostgreSQL` stores. Most importantly,
//! [`stores::MemoryDispatchStore`] serializes its allocate-and-insert cycle
//! under one lock, so the "no two tickets share a number" guarantee holds in
//! handler tests exactly as it does in production.
//!
//! ## Example
//!
//! ```ignore
//! use despacho_testing::clock::test_clock;
//! use despacho_testing::stores::MemoryStores;
//!
//! let stores = MemoryStores::new();
//! let created = stores.dispatches.create(new_dispatch).await?;
//! assert_eq!(created.dispatch_no, "0000001");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod stores;

pub use clock::{test_clock, FixedClock};
pub use stores::MemoryStores;
