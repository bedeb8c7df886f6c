//! Core domain logic for the museum reservation portal.
//! Views and the CLI reach storage only through [`Gateway`].

pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{BackendMode, ConfigError, LocalDbLocation, PortalConfig, RemoteConfig};
pub use gateway::{Gateway, StoreWriteError};
pub use logging::{
    default_log_level, init_logging, init_stderr_logging, logging_status, LogTarget,
};
pub use model::reservation::{
    is_valid_phone, normalize_phone, Reservation, ReservationDraft, ReservationId,
    ReservationPatch, ReservationStatus, ReservationValidationError, VisitTime,
};
pub use repo::local_store::{LocalLatency, LocalReservationStore, RESERVATIONS_SLOT};
pub use repo::remote_store::RemoteReservationStore;
pub use repo::remote_table::{
    NewRemoteRow, RemoteError, RemotePatch, RemoteResult, RemoteRow, RemoteTable, RestTable,
};
pub use repo::reservation_store::{ReservationStore, StoreError, StoreResult};
pub use repo::slot_store::{SlotStore, SqliteSlotStore};
pub use service::admin_service::{AdminConsole, AdminError, AdminGate, ReservationFilter};
pub use service::booking_service::{BookingError, BookingService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
