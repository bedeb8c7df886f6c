//! Reservation domain model.
//!
//! # Responsibility
//! - Define the canonical `Reservation` record and its write inputs.
//! - Own field-level validation and phone normalization.
//!
//! # Invariants
//! - `id` and `submit_time` are assigned by storage and never patched.
//! - Stored phone numbers are digits-only.
//! - Records missing `identity`/`visitTime`/`remarks` decode with defaults.

pub mod reservation;
