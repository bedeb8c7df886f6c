//! Remote reservation store with field-name translation.
//!
//! # Responsibility
//! - Map `Reservation` fields to the hosted store's snake_case columns and
//!   back (`visitDate` <-> `visit_date`, `visitTime` <-> `visit_time`,
//!   `submitTime` <-> `submit_time`).
//! - Backfill `identity`, `visit_time` and `remarks` on rows that lack them.
//!
//! # Invariants
//! - The store assigns `id`; this side supplies `submit_time` and
//!   `status = confirmed` on insert.
//! - A malformed row in a listing is skipped, not fatal to the listing.
//! - Once an insert is accepted, `add` succeeds; an echoed row that does
//!   not map is replaced by the sent fields under the assigned id.
//! - `submit_time` without an offset is read as UTC.

use crate::config::BackendMode;
use crate::model::reservation::{
    submission_now, Reservation, ReservationDraft, ReservationPatch, ReservationStatus,
    VisitTime,
};
use crate::repo::remote_table::{NewRemoteRow, RemotePatch, RemoteRow, RemoteTable};
use crate::repo::reservation_store::{ReservationStore, StoreError, StoreResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use log::warn;

const DATE_FORMAT: &str = "%Y-%m-%d";
const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Reservation store backed by a hosted table.
pub struct RemoteReservationStore<T: RemoteTable> {
    table: T,
}

impl<T: RemoteTable> RemoteReservationStore<T> {
    pub fn new(table: T) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &T {
        &self.table
    }
}

impl<T: RemoteTable> ReservationStore for RemoteReservationStore<T> {
    fn mode(&self) -> BackendMode {
        BackendMode::Remote
    }

    fn list(&self) -> StoreResult<Vec<Reservation>> {
        let rows = self.table.select_newest_first()?;
        let mut reservations = Vec::with_capacity(rows.len());
        for row in rows {
            match row_to_reservation(row) {
                Ok(reservation) => reservations.push(reservation),
                Err(err) => warn!(
                    "event=reservation_row_skipped module=repo status=degraded mode=remote error={}",
                    err
                ),
            }
        }
        Ok(reservations)
    }

    fn get_by_id(&self, id: &str) -> StoreResult<Option<Reservation>> {
        self.table
            .select_by_id(id)?
            .into_iter()
            .next()
            .map(row_to_reservation)
            .transpose()
    }

    fn add(&self, draft: ReservationDraft) -> StoreResult<Reservation> {
        let submit_time = submission_now();
        let inserted = self
            .table
            .insert(&draft_to_row(draft.clone(), submit_time))?;
        let id = inserted.id.clone();
        match row_to_reservation(inserted) {
            Ok(reservation) => Ok(reservation),
            Err(err) => {
                warn!(
                    "event=reservation_insert_echo module=repo status=degraded mode=remote id={} error={}",
                    id, err
                );
                Ok(Reservation::confirmed(id, draft, submit_time))
            }
        }
    }

    fn update(&self, id: &str, patch: &ReservationPatch) -> StoreResult<Option<Reservation>> {
        if patch.is_empty() {
            return self.get_by_id(id);
        }

        self.table
            .update_by_id(id, &patch_to_remote(patch))?
            .into_iter()
            .next()
            .map(row_to_reservation)
            .transpose()
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        self.table.delete_by_id(id)?;
        Ok(())
    }
}

/// Translates a stored row into the external record shape.
pub fn row_to_reservation(row: RemoteRow) -> StoreResult<Reservation> {
    let visit_date = NaiveDate::parse_from_str(&row.visit_date, DATE_FORMAT).map_err(|_| {
        StoreError::InvalidData(format!(
            "invalid visit_date `{}` on row {}",
            row.visit_date, row.id
        ))
    })?;

    let submit_time = parse_submit_time(&row.submit_time).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "invalid submit_time `{}` on row {}",
            row.submit_time, row.id
        ))
    })?;

    let visit_time = match row.visit_time.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => value.parse::<VisitTime>().map_err(|err| {
            StoreError::InvalidData(format!("{err} on row {}", row.id))
        })?,
        _ => VisitTime::default(),
    };

    let status = row
        .status
        .parse::<ReservationStatus>()
        .map_err(|err| StoreError::InvalidData(format!("{err} on row {}", row.id)))?;

    Ok(Reservation {
        id: row.id,
        name: row.name,
        identity: row.identity.unwrap_or_default(),
        phone: row.phone,
        visit_date,
        visit_time,
        remarks: row.remarks.unwrap_or_default(),
        submit_time,
        status,
    })
}

/// Parses a stored instant: RFC 3339, or an offset-less timestamp taken as
/// UTC (what a `timestamp without time zone` column returns).
pub fn parse_submit_time(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

/// Builds the insert payload for a new confirmed reservation.
pub fn draft_to_row(draft: ReservationDraft, submit_time: DateTime<Utc>) -> NewRemoteRow {
    NewRemoteRow {
        name: draft.name,
        identity: draft.identity,
        phone: draft.phone,
        visit_date: draft.visit_date.format(DATE_FORMAT).to_string(),
        visit_time: draft.visit_time.to_string(),
        remarks: draft.remarks,
        submit_time: submit_time.to_rfc3339_opts(SecondsFormat::Millis, true),
        status: ReservationStatus::Confirmed.as_str().to_string(),
    }
}

/// Translates the fields a patch carries into store column names.
pub fn patch_to_remote(patch: &ReservationPatch) -> RemotePatch {
    RemotePatch {
        name: patch.name.clone(),
        identity: patch.identity.clone(),
        phone: patch.phone.clone(),
        visit_date: patch
            .visit_date
            .map(|date| date.format(DATE_FORMAT).to_string()),
        visit_time: patch.visit_time.map(|time| time.to_string()),
        remarks: patch.remarks.clone(),
        status: patch.status.map(|status| status.as_str().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::{draft_to_row, parse_submit_time, patch_to_remote, row_to_reservation};
    use crate::model::reservation::{
        ReservationDraft, ReservationPatch, ReservationStatus, VisitTime,
    };
    use crate::repo::remote_table::RemoteRow;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn legacy_row() -> RemoteRow {
        RemoteRow {
            id: "7".to_string(),
            name: "Zhou".to_string(),
            identity: None,
            phone: "13900139000".to_string(),
            visit_date: "2026-12-01".to_string(),
            visit_time: Some(String::new()),
            remarks: None,
            submit_time: "2026-10-15T09:30:00.250+00:00".to_string(),
            status: "visited".to_string(),
        }
    }

    #[test]
    fn legacy_row_is_backfilled() {
        let reservation = row_to_reservation(legacy_row()).unwrap();

        assert_eq!(reservation.identity, "");
        assert_eq!(reservation.visit_time, VisitTime::default());
        assert_eq!(reservation.remarks, "");
        assert_eq!(reservation.status, ReservationStatus::Visited);
        assert_eq!(
            reservation.visit_date,
            NaiveDate::from_ymd_opt(2026, 12, 1).unwrap()
        );
    }

    #[test]
    fn unknown_status_is_invalid_data() {
        let mut row = legacy_row();
        row.status = "pending".to_string();

        let err = row_to_reservation(row).unwrap_err();
        assert!(err.to_string().contains("pending"));
    }

    #[test]
    fn draft_row_uses_store_column_formats() {
        let draft = ReservationDraft {
            name: "Qian".to_string(),
            identity: "teacher".to_string(),
            phone: "13700137000".to_string(),
            visit_date: NaiveDate::from_ymd_opt(2026, 11, 20).unwrap(),
            visit_time: VisitTime::from_hour(14).unwrap(),
            remarks: "group of 3".to_string(),
        };
        let submitted = Utc.with_ymd_and_hms(2026, 10, 15, 8, 0, 0).unwrap();

        let row = draft_to_row(draft, submitted);
        let json = serde_json::to_value(&row).unwrap();

        assert_eq!(json["visit_date"], "2026-11-20");
        assert_eq!(json["visit_time"], "14:00");
        assert_eq!(json["submit_time"], "2026-10-15T08:00:00.000Z");
        assert_eq!(json["status"], "confirmed");
        assert!(json.get("visitDate").is_none());
    }

    #[test]
    fn patch_translation_keeps_absent_fields_absent() {
        let patch = ReservationPatch {
            visit_time: Some(VisitTime::from_hour(10).unwrap()),
            status: Some(ReservationStatus::Cancelled),
            ..ReservationPatch::default()
        };

        let remote = patch_to_remote(&patch);
        assert_eq!(remote.visit_time.as_deref(), Some("10:00"));
        assert_eq!(remote.status.as_deref(), Some("cancelled"));
        assert_eq!(remote.name, None);
        assert_eq!(remote.visit_date, None);
    }

    #[test]
    fn submit_time_without_offset_is_utc() {
        let expected = Utc.with_ymd_and_hms(2026, 10, 15, 2, 20, 39).unwrap()
            + chrono::Duration::milliseconds(128);

        assert_eq!(parse_submit_time("2026-10-15T02:20:39.128"), Some(expected));
        assert_eq!(parse_submit_time("2026-10-15 02:20:39.128"), Some(expected));
        assert_eq!(parse_submit_time("2026-10-15T02:20:39.128Z"), Some(expected));
        assert_eq!(
            parse_submit_time("2026-10-15T10:20:39.128+08:00"),
            Some(expected)
        );
        assert_eq!(parse_submit_time("yesterday"), None);
    }
}
