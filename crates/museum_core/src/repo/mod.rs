//! Reservation storage backends.
//!
//! # Responsibility
//! - Define the backend contract the gateway routes to.
//! - Implement it over a local slot store and over a hosted remote table.
//!
//! # Invariants
//! - Backends never validate input; the gateway does that before delegating.
//! - Backends report read failures as errors; degrading them is the
//!   gateway's decision.

pub mod local_store;
pub mod remote_store;
pub mod remote_table;
pub mod reservation_store;
pub mod slot_store;
