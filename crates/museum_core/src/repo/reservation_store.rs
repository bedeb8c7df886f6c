//! Backend contract shared by the local and remote reservation stores.
//!
//! # Responsibility
//! - Define the five storage operations the gateway routes to.
//! - Carry backend failures as one error type, reads included.
//!
//! # Invariants
//! - Implementations assign `id` and `submit_time` in `add` and fix
//!   `status = confirmed`.
//! - `list` is ordered newest-submitted first.
//! - `update` and `get_by_id` report a missing id as `Ok(None)`.
//! - `delete` of a missing id is `Ok(())`.

use crate::config::BackendMode;
use crate::db::DbError;
use crate::model::reservation::{Reservation, ReservationDraft, ReservationPatch};
use crate::repo::remote_table::RemoteError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Backend failure for any reservation store operation.
#[derive(Debug)]
pub enum StoreError {
    /// Local slot database failure.
    Db(DbError),
    /// Remote store transport or status failure.
    Remote(RemoteError),
    /// Local slot contents could not be encoded or decoded.
    Encode(serde_json::Error),
    /// A persisted record could not be mapped into a `Reservation`.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Remote(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "reservation slot encoding failed: {err}"),
            Self::InvalidData(message) => write!(f, "invalid stored reservation: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Remote(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RemoteError> for StoreError {
    fn from(value: RemoteError) -> Self {
        Self::Remote(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Storage backend behind the gateway.
///
/// Inputs reaching these methods are already normalized and validated.
pub trait ReservationStore: Send {
    fn mode(&self) -> BackendMode;
    fn list(&self) -> StoreResult<Vec<Reservation>>;
    fn get_by_id(&self, id: &str) -> StoreResult<Option<Reservation>>;
    fn add(&self, draft: ReservationDraft) -> StoreResult<Reservation>;
    fn update(&self, id: &str, patch: &ReservationPatch) -> StoreResult<Option<Reservation>>;
    fn delete(&self, id: &str) -> StoreResult<()>;
}
