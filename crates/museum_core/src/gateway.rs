//! Persistence gateway for reservations.
//!
//! # Responsibility
//! - Expose list/get/add/update/delete over whichever backend was selected
//!   at construction.
//! - Normalize and validate write input before it reaches storage.
//! - Degrade read failures to empty results while keeping them observable.
//!
//! # Invariants
//! - The backend is chosen once; there is no runtime fallback between
//!   remote and local.
//! - `list`/`get_by_id` never fail. A failed read returns empty/`None`,
//!   logs `status=degraded` and increments `degraded_reads`.
//! - Write failures always reach the caller as `StoreWriteError`.
//! - Log events carry ids and timings only, never visitor details.

use crate::config::{BackendMode, LocalDbLocation, PortalConfig};
use crate::model::reservation::{
    Reservation, ReservationDraft, ReservationPatch, ReservationValidationError,
};
use crate::repo::local_store::LocalReservationStore;
use crate::repo::remote_store::RemoteReservationStore;
use crate::repo::remote_table::RestTable;
use crate::repo::reservation_store::{ReservationStore, StoreError, StoreResult};
use crate::repo::slot_store::SqliteSlotStore;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Failure of a gateway write operation.
#[derive(Debug)]
pub enum StoreWriteError {
    /// Input was rejected before reaching storage.
    Validation(ReservationValidationError),
    /// The backend failed to apply the write.
    Store(StoreError),
}

impl Display for StoreWriteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreWriteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<ReservationValidationError> for StoreWriteError {
    fn from(value: ReservationValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for StoreWriteError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Reservation persistence entry point shared by every caller.
pub struct Gateway {
    store: Box<dyn ReservationStore>,
    degraded_reads: AtomicU64,
}

impl Gateway {
    /// Wraps an explicitly constructed backend.
    pub fn new(store: Box<dyn ReservationStore>) -> Self {
        info!(
            "event=gateway_init module=gateway status=ok mode={}",
            store.mode()
        );
        Self {
            store,
            degraded_reads: AtomicU64::new(0),
        }
    }

    /// Builds the backend selected by `config`.
    ///
    /// Remote mode needs no I/O up front; local mode opens (and migrates)
    /// the slot database, which is the only way this can fail.
    pub fn from_config(config: &PortalConfig) -> StoreResult<Self> {
        if config.remote_rejected {
            warn!(
                "event=gateway_init module=gateway status=degraded mode=local reason=remote_config_incomplete"
            );
        }

        let store: Box<dyn ReservationStore> = match &config.remote {
            Some(remote) => {
                let table = RestTable::new(remote.endpoint(), remote.api_key())?;
                Box::new(RemoteReservationStore::new(table))
            }
            None => {
                let slots = match &config.local_db {
                    LocalDbLocation::File(path) => SqliteSlotStore::open(path)?,
                    LocalDbLocation::Memory => SqliteSlotStore::open_in_memory()?,
                };
                Box::new(LocalReservationStore::new(slots, config.local_latency()))
            }
        };

        Ok(Self::new(store))
    }

    pub fn mode(&self) -> BackendMode {
        self.store.mode()
    }

    /// Number of reads degraded to empty since construction.
    pub fn degraded_reads(&self) -> u64 {
        self.degraded_reads.load(Ordering::Relaxed)
    }

    /// All reservations, newest-submitted first. Empty when the backend
    /// cannot be read.
    pub fn list(&self) -> Vec<Reservation> {
        let started_at = Instant::now();
        match self.store.list() {
            Ok(reservations) => {
                info!(
                    "event=reservation_list module=gateway status=ok mode={} count={} duration_ms={}",
                    self.mode(),
                    reservations.len(),
                    started_at.elapsed().as_millis()
                );
                reservations
            }
            Err(err) => {
                self.record_degraded_read("reservation_list", started_at, &err);
                Vec::new()
            }
        }
    }

    /// One reservation by id. `None` covers both "absent" and "backend
    /// unreadable".
    pub fn get_by_id(&self, id: &str) -> Option<Reservation> {
        let started_at = Instant::now();
        match self.store.get_by_id(id) {
            Ok(found) => {
                info!(
                    "event=reservation_get module=gateway status=ok mode={} id={} found={} duration_ms={}",
                    self.mode(),
                    id,
                    found.is_some(),
                    started_at.elapsed().as_millis()
                );
                found
            }
            Err(err) => {
                self.record_degraded_read("reservation_get", started_at, &err);
                None
            }
        }
    }

    /// Creates a confirmed reservation from form input.
    ///
    /// The phone is reduced to digits before validation. Storage assigns
    /// `id` and `submit_time`.
    pub fn add(&self, draft: ReservationDraft) -> Result<Reservation, StoreWriteError> {
        let started_at = Instant::now();
        let draft = draft.normalized();
        self.check("reservation_add", draft.validate())?;

        let created = self.observe_write("reservation_add", started_at, self.store.add(draft))?;
        info!(
            "event=reservation_add module=gateway status=ok mode={} id={} duration_ms={}",
            self.mode(),
            created.id,
            started_at.elapsed().as_millis()
        );
        Ok(created)
    }

    /// Applies the fields carried by `patch` to reservation `id`.
    ///
    /// Returns `Ok(None)` when no reservation has that id.
    pub fn update(
        &self,
        id: &str,
        patch: ReservationPatch,
    ) -> Result<Option<Reservation>, StoreWriteError> {
        let started_at = Instant::now();
        let patch = patch.normalized();
        self.check("reservation_update", patch.validate())?;

        let updated =
            self.observe_write("reservation_update", started_at, self.store.update(id, &patch))?;
        info!(
            "event=reservation_update module=gateway status=ok mode={} id={} found={} duration_ms={}",
            self.mode(),
            id,
            updated.is_some(),
            started_at.elapsed().as_millis()
        );
        Ok(updated)
    }

    /// Removes reservation `id`. Unknown ids are a no-op.
    pub fn delete(&self, id: &str) -> Result<(), StoreWriteError> {
        let started_at = Instant::now();
        self.observe_write("reservation_delete", started_at, self.store.delete(id))?;
        info!(
            "event=reservation_delete module=gateway status=ok mode={} id={} duration_ms={}",
            self.mode(),
            id,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    fn check(
        &self,
        event: &str,
        validation: Result<(), ReservationValidationError>,
    ) -> Result<(), StoreWriteError> {
        if let Err(err) = validation {
            warn!(
                "event={event} module=gateway status=rejected mode={} error={}",
                self.mode(),
                err
            );
            return Err(err.into());
        }
        Ok(())
    }

    fn observe_write<T>(
        &self,
        event: &str,
        started_at: Instant,
        result: StoreResult<T>,
    ) -> Result<T, StoreWriteError> {
        result.map_err(|err| {
            error!(
                "event={event} module=gateway status=error mode={} duration_ms={} error={}",
                self.mode(),
                started_at.elapsed().as_millis(),
                err
            );
            StoreWriteError::Store(err)
        })
    }

    fn record_degraded_read(&self, event: &str, started_at: Instant, err: &StoreError) {
        self.degraded_reads.fetch_add(1, Ordering::Relaxed);
        warn!(
            "event={event} module=gateway status=degraded mode={} duration_ms={} error={}",
            self.mode(),
            started_at.elapsed().as_millis(),
            err
        );
    }
}
