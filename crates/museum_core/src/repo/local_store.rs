//! Local fallback reservation store.
//!
//! # Responsibility
//! - Keep the full reservation sequence as one JSON array in a named slot.
//! - Emulate remote latency so callers see comparable timing in both modes.
//!
//! # Invariants
//! - The stored sequence is newest-first; `add` prepends.
//! - Every write replaces the whole slot. Concurrent writers race and the
//!   last one wins; there is no version check.
//! - An absent or blank slot is an empty sequence. A slot that is not a
//!   JSON array is an error, which the gateway degrades to empty on reads.
//! - Array elements that do not decode as a `Reservation` are skipped on
//!   reads and written back untouched on writes.

use crate::config::BackendMode;
use crate::model::reservation::{
    submission_now, Reservation, ReservationDraft, ReservationPatch,
};
use crate::repo::reservation_store::{ReservationStore, StoreResult};
use crate::repo::slot_store::SlotStore;
use log::warn;
use serde::Deserialize;
use serde_json::Value;
use std::thread;
use std::time::Duration;
use uuid::Uuid;

/// Slot key holding the serialized reservation sequence.
pub const RESERVATIONS_SLOT: &str = "life_science_museum_reservations";

/// Artificial delays applied before local operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalLatency {
    /// Applied before list, get, update and delete.
    pub read: Duration,
    /// Applied before add.
    pub write: Duration,
}

impl LocalLatency {
    pub const fn none() -> Self {
        Self {
            read: Duration::ZERO,
            write: Duration::ZERO,
        }
    }
}

impl Default for LocalLatency {
    fn default() -> Self {
        Self {
            read: Duration::from_millis(300),
            write: Duration::from_millis(500),
        }
    }
}

/// Reservation store over a local slot.
pub struct LocalReservationStore<S: SlotStore> {
    slots: S,
    latency: LocalLatency,
}

impl<S: SlotStore> LocalReservationStore<S> {
    pub fn new(slots: S, latency: LocalLatency) -> Self {
        Self { slots, latency }
    }

    /// Underlying slot store, for inspection and seeding.
    pub fn slots(&self) -> &S {
        &self.slots
    }

    /// Raw slot elements, decodable or not.
    fn load_entries(&self) -> StoreResult<Vec<Value>> {
        match self.slots.read_slot(RESERVATIONS_SLOT)? {
            Some(text) if !text.trim().is_empty() => Ok(serde_json::from_str(&text)?),
            _ => Ok(Vec::new()),
        }
    }

    fn load(&self) -> StoreResult<Vec<Reservation>> {
        Ok(self
            .load_entries()?
            .iter()
            .filter_map(decode_entry)
            .collect())
    }

    fn save(&self, entries: &[Value]) -> StoreResult<()> {
        let text = serde_json::to_string(entries)?;
        self.slots.write_slot(RESERVATIONS_SLOT, &text)?;
        Ok(())
    }
}

impl<S: SlotStore> ReservationStore for LocalReservationStore<S> {
    fn mode(&self) -> BackendMode {
        BackendMode::Local
    }

    fn list(&self) -> StoreResult<Vec<Reservation>> {
        pause(self.latency.read);
        self.load()
    }

    fn get_by_id(&self, id: &str) -> StoreResult<Option<Reservation>> {
        pause(self.latency.read);
        Ok(self.load()?.into_iter().find(|reservation| reservation.id == id))
    }

    fn add(&self, draft: ReservationDraft) -> StoreResult<Reservation> {
        pause(self.latency.write);
        let mut entries = self.load_entries()?;
        let created = Reservation::confirmed(Uuid::new_v4().to_string(), draft, submission_now());
        entries.insert(0, serde_json::to_value(&created)?);
        self.save(&entries)?;
        Ok(created)
    }

    fn update(&self, id: &str, patch: &ReservationPatch) -> StoreResult<Option<Reservation>> {
        pause(self.latency.read);
        let mut entries = self.load_entries()?;
        let found = entries.iter().enumerate().find_map(|(index, entry)| {
            decode_entry(entry)
                .filter(|reservation| reservation.id == id)
                .map(|reservation| (index, reservation))
        });
        let Some((index, mut target)) = found else {
            return Ok(None);
        };

        patch.apply_to(&mut target);
        entries[index] = serde_json::to_value(&target)?;
        self.save(&entries)?;
        Ok(Some(target))
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        pause(self.latency.read);
        let mut entries = self.load_entries()?;
        let before = entries.len();
        entries.retain(|entry| entry_id(entry).as_deref() != Some(id));
        if entries.len() != before {
            self.save(&entries)?;
        }
        Ok(())
    }
}

/// Decodes one slot element, logging and skipping it when malformed.
fn decode_entry(entry: &Value) -> Option<Reservation> {
    match Reservation::deserialize(entry) {
        Ok(reservation) => Some(reservation),
        Err(err) => {
            warn!(
                "event=reservation_row_skipped module=repo status=degraded mode=local id={} error={}",
                entry_id(entry).unwrap_or_else(|| "unknown".to_string()),
                err
            );
            None
        }
    }
}

/// Id of a slot element, even when the rest of it is malformed.
fn entry_id(entry: &Value) -> Option<String> {
    match entry.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}
