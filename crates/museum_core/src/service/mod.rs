//! Use-case services over the reservation gateway.
//!
//! # Responsibility
//! - Hold the rules that belong to one caller (public form, admin table)
//!   rather than to storage.
//! - Keep views and the CLI decoupled from backend selection.

pub mod admin_service;
pub mod booking_service;
