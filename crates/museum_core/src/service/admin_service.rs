//! Admin table use-cases behind a shared-secret gate.
//!
//! # Responsibility
//! - Gate admin access on a single configured passcode.
//! - List bookings with the admin table's search and date filters.
//! - Add, edit, re-status and delete bookings.
//!
//! # Invariants
//! - An unconfigured passcode keeps the gate locked.
//! - Admin writes skip the public visit-date rule.

use crate::gateway::{Gateway, StoreWriteError};
use crate::model::reservation::{
    Reservation, ReservationDraft, ReservationId, ReservationPatch, ReservationStatus,
};
use chrono::NaiveDate;
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum AdminError {
    /// Passcode missing, wrong, or not configured.
    Locked,
    NotFound(ReservationId),
    Write(StoreWriteError),
}

impl Display for AdminError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Locked => write!(f, "admin passcode rejected"),
            Self::NotFound(id) => write!(f, "reservation not found: {id}"),
            Self::Write(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AdminError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Write(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreWriteError> for AdminError {
    fn from(value: StoreWriteError) -> Self {
        Self::Write(value)
    }
}

/// Static shared-secret check in front of the admin table.
///
/// This is a convenience gate, not an authentication system.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AdminGate {
    passcode: Option<String>,
}

impl AdminGate {
    pub fn new(passcode: Option<String>) -> Self {
        Self {
            passcode: passcode.filter(|value| !value.is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.passcode.is_some()
    }

    pub fn verify(&self, attempt: &str) -> bool {
        self.passcode
            .as_deref()
            .is_some_and(|passcode| passcode == attempt)
    }
}

impl std::fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGate")
            .field("configured", &self.is_configured())
            .finish()
    }
}

/// Admin table filters. Empty filters match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationFilter {
    /// Substring matched against name, phone, identity and id.
    pub term: Option<String>,
    /// Exact visit date.
    pub visit_date: Option<NaiveDate>,
}

impl ReservationFilter {
    pub fn matches(&self, reservation: &Reservation) -> bool {
        let term_matches = match self.term.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                reservation.name.contains(term)
                    || reservation.phone.contains(term)
                    || reservation.identity.contains(term)
                    || reservation.id.contains(term)
            }
            _ => true,
        };
        let date_matches = match self.visit_date {
            Some(date) => reservation.visit_date == date,
            None => true,
        };

        term_matches && date_matches
    }
}

/// Unlocked admin session over the gateway.
pub struct AdminConsole<'g> {
    gateway: &'g Gateway,
}

impl<'g> AdminConsole<'g> {
    /// Opens the console when `attempt` matches the configured passcode.
    pub fn unlock(
        gateway: &'g Gateway,
        gate: &AdminGate,
        attempt: &str,
    ) -> Result<Self, AdminError> {
        if !gate.verify(attempt) {
            warn!(
                "event=admin_unlock module=service status=rejected configured={}",
                gate.is_configured()
            );
            return Err(AdminError::Locked);
        }
        Ok(Self { gateway })
    }

    /// Bookings matching `filter`, newest-submitted first.
    pub fn list(&self, filter: &ReservationFilter) -> Vec<Reservation> {
        self.gateway
            .list()
            .into_iter()
            .filter(|reservation| filter.matches(reservation))
            .collect()
    }

    pub fn create(&self, draft: ReservationDraft) -> Result<Reservation, AdminError> {
        Ok(self.gateway.add(draft)?)
    }

    /// Applies an edit; a vanished reservation is reported as `NotFound`.
    pub fn edit(&self, id: &str, patch: ReservationPatch) -> Result<Reservation, AdminError> {
        self.gateway
            .update(id, patch)?
            .ok_or_else(|| AdminError::NotFound(id.to_string()))
    }

    pub fn set_status(
        &self,
        id: &str,
        status: ReservationStatus,
    ) -> Result<Reservation, AdminError> {
        self.edit(
            id,
            ReservationPatch {
                status: Some(status),
                ..ReservationPatch::default()
            },
        )
    }

    pub fn remove(&self, id: &str) -> Result<(), AdminError> {
        Ok(self.gateway.delete(id)?)
    }
}
