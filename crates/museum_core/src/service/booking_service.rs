//! Public booking use-cases.
//!
//! # Responsibility
//! - Accept visitor submissions from the public form.
//! - Look up a booking for its confirmation ticket.
//!
//! # Invariants
//! - Public submissions cannot book a visit date earlier than `today`.
//! - All other field rules are enforced by the gateway.

use crate::gateway::{Gateway, StoreWriteError};
use crate::model::reservation::{Reservation, ReservationDraft, VisitTime};
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum BookingError {
    VisitDateInPast {
        visit_date: NaiveDate,
        today: NaiveDate,
    },
    Write(StoreWriteError),
}

impl Display for BookingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VisitDateInPast { visit_date, today } => write!(
                f,
                "visit date {visit_date} is before today ({today})"
            ),
            Self::Write(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BookingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Write(err) => Some(err),
            Self::VisitDateInPast { .. } => None,
        }
    }
}

impl From<StoreWriteError> for BookingError {
    fn from(value: StoreWriteError) -> Self {
        Self::Write(value)
    }
}

/// Visitor-facing booking flow.
pub struct BookingService<'g> {
    gateway: &'g Gateway,
}

impl<'g> BookingService<'g> {
    pub fn new(gateway: &'g Gateway) -> Self {
        Self { gateway }
    }

    /// Submits the public booking form.
    ///
    /// `today` is the submitter's calendar date; passing it in keeps the
    /// date rule independent of the host clock.
    pub fn submit(
        &self,
        draft: ReservationDraft,
        today: NaiveDate,
    ) -> Result<Reservation, BookingError> {
        if draft.visit_date < today {
            return Err(BookingError::VisitDateInPast {
                visit_date: draft.visit_date,
                today,
            });
        }
        Ok(self.gateway.add(draft)?)
    }

    /// Fetches the booking shown on a confirmation ticket.
    pub fn confirmation(&self, id: &str) -> Option<Reservation> {
        self.gateway.get_by_id(id)
    }

    /// Slots offered by the visit-time picker.
    pub fn time_slots(&self) -> Vec<VisitTime> {
        VisitTime::all().collect()
    }
}
