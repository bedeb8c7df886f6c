//! Remote structured-store contract and its HTTP client.
//!
//! # Responsibility
//! - Describe the hosted store's `reservations` collection in its own
//!   snake_case row shape.
//! - Talk to a PostgREST-style endpoint over blocking HTTP.
//!
//! # Invariants
//! - Rows are keyed by `id`; ids are normalized to text whatever their wire
//!   type.
//! - Non-2xx responses surface as `RemoteError::Status` with the body kept
//!   for diagnostics.
//! - Response rows decode one at a time; a row that does not fit
//!   `RemoteRow` is logged and dropped without failing its siblings.

use log::warn;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Method;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Collection name on the hosted store.
pub const RESERVATIONS_TABLE: &str = "reservations";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ERROR_BODY_CHARS: usize = 200;

pub type RemoteResult<T> = Result<T, RemoteError>;

#[derive(Debug)]
pub enum RemoteError {
    Http(reqwest::Error),
    Status { status: u16, body: String },
    /// Insert succeeded but the store echoed no row back.
    MissingRepresentation,
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(err) => write!(f, "remote store request failed: {err}"),
            Self::Status { status, body } => {
                write!(f, "remote store returned status {status}: {body}")
            }
            Self::MissingRepresentation => {
                write!(f, "remote store returned no row for the inserted reservation")
            }
        }
    }
}

impl Error for RemoteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

/// One row as the hosted store returns it.
///
/// `identity`, `visit_time` and `remarks` are optional because rows written
/// before those columns existed come back null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRow {
    #[serde(deserialize_with = "id_as_text")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub identity: Option<String>,
    pub phone: String,
    pub visit_date: String,
    #[serde(default)]
    pub visit_time: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
    pub submit_time: String,
    pub status: String,
}

/// Insert payload; the store assigns `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRemoteRow {
    pub name: String,
    pub identity: String,
    pub phone: String,
    pub visit_date: String,
    pub visit_time: String,
    pub remarks: String,
    pub submit_time: String,
    pub status: String,
}

/// Partial update payload; absent fields are left out of the request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Request/response operations of the hosted reservations collection.
pub trait RemoteTable: Send {
    fn select_newest_first(&self) -> RemoteResult<Vec<RemoteRow>>;
    fn select_by_id(&self, id: &str) -> RemoteResult<Vec<RemoteRow>>;
    fn insert(&self, row: &NewRemoteRow) -> RemoteResult<RemoteRow>;
    fn update_by_id(&self, id: &str, patch: &RemotePatch) -> RemoteResult<Vec<RemoteRow>>;
    fn delete_by_id(&self, id: &str) -> RemoteResult<()>;
}

/// PostgREST client for `{endpoint}/rest/v1/reservations`.
#[derive(Debug, Clone)]
pub struct RestTable {
    client: Client,
    table_url: String,
    api_key: String,
}

impl RestTable {
    pub fn new(endpoint: &str, api_key: &str) -> RemoteResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            table_url: format!(
                "{}/rest/v1/{RESERVATIONS_TABLE}",
                endpoint.trim_end_matches('/')
            ),
            api_key: api_key.to_string(),
        })
    }

    pub fn table_url(&self) -> &str {
        &self.table_url
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, &self.table_url)
            .header("apikey", self.api_key.as_str())
            .bearer_auth(&self.api_key)
    }

    fn fetch_rows(&self, builder: RequestBuilder) -> RemoteResult<Vec<RemoteRow>> {
        Ok(decode_rows(self.fetch_values(builder)?))
    }

    fn fetch_values(&self, builder: RequestBuilder) -> RemoteResult<Vec<Value>> {
        let response = check_status(builder.send()?)?;
        Ok(response.json()?)
    }
}

impl RemoteTable for RestTable {
    fn select_newest_first(&self) -> RemoteResult<Vec<RemoteRow>> {
        self.fetch_rows(
            self.request(Method::GET)
                .query(&[("select", "*"), ("order", "submit_time.desc")]),
        )
    }

    fn select_by_id(&self, id: &str) -> RemoteResult<Vec<RemoteRow>> {
        self.fetch_rows(
            self.request(Method::GET)
                .query(&[("select", "*".to_string()), ("id", eq_filter(id))]),
        )
    }

    fn insert(&self, row: &NewRemoteRow) -> RemoteResult<RemoteRow> {
        let echoed = self.fetch_values(
            self.request(Method::POST)
                .header("Prefer", "return=representation")
                .json(&[row]),
        )?;
        echoed
            .into_iter()
            .next()
            .ok_or(RemoteError::MissingRepresentation)
            .and_then(|value| echoed_row(value, row))
    }

    fn update_by_id(&self, id: &str, patch: &RemotePatch) -> RemoteResult<Vec<RemoteRow>> {
        self.fetch_rows(
            self.request(Method::PATCH)
                .query(&[("id", eq_filter(id))])
                .header("Prefer", "return=representation")
                .json(patch),
        )
    }

    fn delete_by_id(&self, id: &str) -> RemoteResult<()> {
        check_status(
            self.request(Method::DELETE)
                .query(&[("id", eq_filter(id))])
                .send()?,
        )?;
        Ok(())
    }
}

/// Decodes response rows independently, dropping the ones that do not fit.
pub fn decode_rows(values: Vec<Value>) -> Vec<RemoteRow> {
    values
        .into_iter()
        .filter_map(|value| match RemoteRow::deserialize(&value) {
            Ok(row) => Some(row),
            Err(err) => {
                warn!(
                    "event=reservation_row_skipped module=repo status=degraded mode=remote id={} error={}",
                    value_id(&value).unwrap_or_else(|| "unknown".to_string()),
                    err
                );
                None
            }
        })
        .collect()
}

/// Row the store echoed after an insert.
///
/// The insert has already been applied at this point, so an echo that does
/// not decode falls back to the sent payload under the store-assigned id.
/// Only an echo without an id is an error.
pub fn echoed_row(value: Value, sent: &NewRemoteRow) -> RemoteResult<RemoteRow> {
    if let Ok(row) = RemoteRow::deserialize(&value) {
        return Ok(row);
    }
    let id = value_id(&value).ok_or(RemoteError::MissingRepresentation)?;
    warn!(
        "event=reservation_insert_echo module=repo status=degraded mode=remote id={id} reason=undecodable_echo"
    );
    Ok(RemoteRow {
        id,
        name: sent.name.clone(),
        identity: Some(sent.identity.clone()),
        phone: sent.phone.clone(),
        visit_date: sent.visit_date.clone(),
        visit_time: Some(sent.visit_time.clone()),
        remarks: Some(sent.remarks.clone()),
        submit_time: sent.submit_time.clone(),
        status: sent.status.clone(),
    })
}

fn value_id(value: &Value) -> Option<String> {
    match value.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn eq_filter(id: &str) -> String {
    format!("eq.{id}")
}

fn check_status(
    response: reqwest::blocking::Response,
) -> RemoteResult<reqwest::blocking::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    Err(RemoteError::Status {
        status: status.as_u16(),
        body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    })
}

fn id_as_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "unsupported reservation id `{other}`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        decode_rows, echoed_row, NewRemoteRow, RemoteError, RemotePatch, RemoteRow, RestTable,
    };
    use serde_json::json;

    fn sent_row() -> NewRemoteRow {
        NewRemoteRow {
            name: "Lin".to_string(),
            identity: "student".to_string(),
            phone: "13800138000".to_string(),
            visit_date: "2026-11-01".to_string(),
            visit_time: "10:00".to_string(),
            remarks: String::new(),
            submit_time: "2026-10-15T08:00:00.000Z".to_string(),
            status: "confirmed".to_string(),
        }
    }

    #[test]
    fn row_accepts_numeric_ids_and_null_optionals() {
        let row: RemoteRow = serde_json::from_value(serde_json::json!({
            "id": 42,
            "name": "Lin",
            "identity": null,
            "phone": "13800138000",
            "visit_date": "2026-11-01",
            "visit_time": null,
            "remarks": null,
            "submit_time": "2026-10-15T08:00:00.000+00:00",
            "status": "confirmed"
        }))
        .unwrap();

        assert_eq!(row.id, "42");
        assert_eq!(row.identity, None);
        assert_eq!(row.visit_time, None);
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let patch = RemotePatch {
            visit_date: Some("2026-11-02".to_string()),
            remarks: Some(String::new()),
            ..RemotePatch::default()
        };

        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "visit_date": "2026-11-02", "remarks": "" })
        );
    }

    #[test]
    fn table_url_strips_trailing_slash() {
        let table = RestTable::new("https://db.example.org/", "anon").unwrap();
        assert_eq!(
            table.table_url(),
            "https://db.example.org/rest/v1/reservations"
        );
    }

    #[test]
    fn rows_with_null_required_columns_are_dropped_individually() {
        let rows = decode_rows(vec![
            json!({
                "id": 1,
                "name": "Lin",
                "phone": "13800138000",
                "visit_date": "2026-11-01",
                "submit_time": "2026-10-15T08:00:00.000+00:00",
                "status": "confirmed"
            }),
            json!({
                "id": 2,
                "name": null,
                "phone": "13800138000",
                "visit_date": "2026-11-01",
                "submit_time": "2026-10-15T08:00:00.000+00:00",
                "status": "confirmed"
            }),
        ]);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "1");
    }

    #[test]
    fn undecodable_insert_echo_falls_back_to_sent_payload() {
        let row = echoed_row(json!({ "id": 9, "name": null }), &sent_row()).unwrap();

        assert_eq!(row.id, "9");
        assert_eq!(row.name, "Lin");
        assert_eq!(row.submit_time, "2026-10-15T08:00:00.000Z");
    }

    #[test]
    fn insert_echo_without_id_is_missing_representation() {
        let err = echoed_row(json!({ "name": "Lin" }), &sent_row()).unwrap_err();
        assert!(matches!(err, RemoteError::MissingRepresentation));
    }
}
