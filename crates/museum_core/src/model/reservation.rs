//! Reservation record, write inputs and validation rules.
//!
//! # Responsibility
//! - Define the record shared by the booking form, ticket and admin table.
//! - Backfill fields that older records were written without.
//! - Validate and normalize caller-supplied fields before persistence.
//!
//! # Invariants
//! - `phone` must match `^1\d{10}$` after normalization.
//! - `visit_time` is always one of the hourly slots `09:00..=16:00`.
//! - `submit_time` carries millisecond precision.

use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^1\d{10}$").expect("valid phone regex"));

/// Opaque storage-assigned identifier.
///
/// Local mode uses UUID v4 strings; remote mode uses whatever the hosted
/// store assigns, rendered as text.
pub type ReservationId = String;

/// Lifecycle state of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// Booked and expected to attend.
    #[default]
    Confirmed,
    /// Withdrawn by the visitor or an admin.
    Cancelled,
    /// Visitor checked in.
    Visited,
}

impl ReservationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Visited => "visited",
        }
    }
}

impl Display for ReservationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = ReservationValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            "visited" => Ok(Self::Visited),
            other => Err(ReservationValidationError::InvalidStatus(other.to_string())),
        }
    }
}

/// Hourly visit slot rendered as `HH:00`.
///
/// The museum admits visitors on the hour from 09:00 to 16:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VisitTime(u8);

impl VisitTime {
    pub const FIRST_HOUR: u8 = 9;
    pub const LAST_HOUR: u8 = 16;

    pub fn from_hour(hour: u8) -> Result<Self, ReservationValidationError> {
        if (Self::FIRST_HOUR..=Self::LAST_HOUR).contains(&hour) {
            Ok(Self(hour))
        } else {
            Err(ReservationValidationError::InvalidVisitTime(format!(
                "{hour:02}:00"
            )))
        }
    }

    pub fn hour(self) -> u8 {
        self.0
    }

    /// All bookable slots in chronological order.
    pub fn all() -> impl Iterator<Item = VisitTime> {
        (Self::FIRST_HOUR..=Self::LAST_HOUR).map(VisitTime)
    }
}

impl Default for VisitTime {
    fn default() -> Self {
        Self(Self::FIRST_HOUR)
    }
}

impl Display for VisitTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:00", self.0)
    }
}

impl FromStr for VisitTime {
    type Err = ReservationValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ReservationValidationError::InvalidVisitTime(value.to_string());
        let hour = value.strip_suffix(":00").ok_or_else(invalid)?;
        if hour.len() != 2 || !hour.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let hour = hour.parse::<u8>().map_err(|_| invalid())?;
        Self::from_hour(hour).map_err(|_| invalid())
    }
}

impl TryFrom<String> for VisitTime {
    type Error = ReservationValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VisitTime> for String {
    fn from(value: VisitTime) -> Self {
        value.to_string()
    }
}

/// Canonical booking record.
///
/// Serialized with camelCase names, which is also the shape kept in the
/// local fallback slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: ReservationId,
    pub name: String,
    /// Visitor category, e.g. student or teacher. Backfilled to `""`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub identity: String,
    pub phone: String,
    pub visit_date: NaiveDate,
    /// Backfilled to `09:00` when absent, null or blank.
    #[serde(default, deserialize_with = "backfill_visit_time")]
    pub visit_time: VisitTime,
    #[serde(default, deserialize_with = "null_as_default")]
    pub remarks: String,
    pub submit_time: DateTime<Utc>,
    #[serde(default)]
    pub status: ReservationStatus,
}

impl Reservation {
    /// Builds a freshly created record from form input.
    ///
    /// Status always starts as `Confirmed`.
    pub fn confirmed(
        id: ReservationId,
        draft: ReservationDraft,
        submit_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: draft.name,
            identity: draft.identity,
            phone: draft.phone,
            visit_date: draft.visit_date,
            visit_time: draft.visit_time,
            remarks: draft.remarks,
            submit_time,
            status: ReservationStatus::Confirmed,
        }
    }
}

/// Form fields supplied by a booking caller.
///
/// Identity, submission time and status are never caller-controlled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDraft {
    pub name: String,
    pub identity: String,
    pub phone: String,
    pub visit_date: NaiveDate,
    #[serde(default)]
    pub visit_time: VisitTime,
    #[serde(default)]
    pub remarks: String,
}

impl ReservationDraft {
    /// Returns the draft with its phone reduced to digits.
    pub fn normalized(mut self) -> Self {
        self.phone = normalize_phone(&self.phone);
        self
    }

    /// Checks required fields and phone shape.
    ///
    /// Callers should validate a `normalized()` draft.
    pub fn validate(&self) -> Result<(), ReservationValidationError> {
        validate_name(&self.name)?;
        validate_identity(&self.identity)?;
        validate_phone(&self.phone)
    }
}

/// Partial update of a stored reservation.
///
/// Every `Some` field is applied, including `Some(String::new())` for
/// `remarks`; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_time: Option<VisitTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ReservationStatus>,
}

impl ReservationPatch {
    /// Full patch that rewrites every form field from `draft`.
    ///
    /// Used by the admin edit dialog, which submits the whole form.
    pub fn from_draft(draft: ReservationDraft) -> Self {
        Self {
            name: Some(draft.name),
            identity: Some(draft.identity),
            phone: Some(draft.phone),
            visit_date: Some(draft.visit_date),
            visit_time: Some(draft.visit_time),
            remarks: Some(draft.remarks),
            status: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn normalized(mut self) -> Self {
        self.phone = self.phone.map(|phone| normalize_phone(&phone));
        self
    }

    /// Validates only the fields the patch carries.
    pub fn validate(&self) -> Result<(), ReservationValidationError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(identity) = &self.identity {
            validate_identity(identity)?;
        }
        if let Some(phone) = &self.phone {
            validate_phone(phone)?;
        }
        Ok(())
    }

    /// Merges the carried fields over `target`.
    pub fn apply_to(&self, target: &mut Reservation) {
        if let Some(name) = &self.name {
            target.name = name.clone();
        }
        if let Some(identity) = &self.identity {
            target.identity = identity.clone();
        }
        if let Some(phone) = &self.phone {
            target.phone = phone.clone();
        }
        if let Some(visit_date) = self.visit_date {
            target.visit_date = visit_date;
        }
        if let Some(visit_time) = self.visit_time {
            target.visit_time = visit_time;
        }
        if let Some(remarks) = &self.remarks {
            target.remarks = remarks.clone();
        }
        if let Some(status) = self.status {
            target.status = status;
        }
    }
}

/// Field-level validation failure for reservation input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationValidationError {
    EmptyName,
    EmptyIdentity,
    /// Holds the normalized phone that failed `^1\d{10}$`.
    InvalidPhone(String),
    InvalidVisitTime(String),
    InvalidStatus(String),
}

impl Display for ReservationValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "visitor name is required"),
            Self::EmptyIdentity => write!(f, "visitor identity is required"),
            Self::InvalidPhone(_) => {
                write!(f, "phone must be 11 digits starting with 1")
            }
            Self::InvalidVisitTime(value) => write!(
                f,
                "visit time `{value}` is not an hourly slot between 09:00 and 16:00"
            ),
            Self::InvalidStatus(value) => write!(f, "unknown reservation status `{value}`"),
        }
    }
}

impl Error for ReservationValidationError {}

/// Drops every non-digit character from raw phone input.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Returns whether `phone` is an 11-digit mobile number starting with `1`.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Current instant at the precision records are stored with.
pub fn submission_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

fn validate_name(name: &str) -> Result<(), ReservationValidationError> {
    if name.trim().is_empty() {
        return Err(ReservationValidationError::EmptyName);
    }
    Ok(())
}

fn validate_identity(identity: &str) -> Result<(), ReservationValidationError> {
    if identity.trim().is_empty() {
        return Err(ReservationValidationError::EmptyIdentity);
    }
    Ok(())
}

fn validate_phone(phone: &str) -> Result<(), ReservationValidationError> {
    if !is_valid_phone(phone) {
        return Err(ReservationValidationError::InvalidPhone(phone.to_string()));
    }
    Ok(())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn backfill_visit_time<'de, D>(deserializer: D) -> Result<VisitTime, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(value) if !value.trim().is_empty() => {
            value.parse().map_err(serde::de::Error::custom)
        }
        _ => Ok(VisitTime::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::{is_valid_phone, normalize_phone, VisitTime};

    #[test]
    fn normalize_phone_keeps_digits_only() {
        assert_eq!(normalize_phone("1a2b3c4d5e6f7g8"), "12345678");
        assert_eq!(normalize_phone("138-0013 8000"), "13800138000");
    }

    #[test]
    fn phone_rule_requires_leading_one_and_eleven_digits() {
        assert!(is_valid_phone("13800138000"));
        assert!(!is_valid_phone("23800138000"));
        assert!(!is_valid_phone("1380013800"));
        assert!(!is_valid_phone("138001380001"));
        assert!(!is_valid_phone("12345678"));
    }

    #[test]
    fn visit_time_slots_cover_opening_hours() {
        let slots = VisitTime::all().map(String::from).collect::<Vec<_>>();
        assert_eq!(slots.len(), 8);
        assert_eq!(slots.first().map(String::as_str), Some("09:00"));
        assert_eq!(slots.last().map(String::as_str), Some("16:00"));
    }

    #[test]
    fn visit_time_parse_rejects_off_grid_values() {
        assert!("08:00".parse::<VisitTime>().is_err());
        assert!("17:00".parse::<VisitTime>().is_err());
        assert!("9:00".parse::<VisitTime>().is_err());
        assert!("10:30".parse::<VisitTime>().is_err());
        assert_eq!("13:00".parse::<VisitTime>().unwrap().hour(), 13);
    }
}
