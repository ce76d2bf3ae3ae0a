//! Data sources: where payloads come from.
//!
//! A payload carries the field definitions, the rows and the initial
//! presentation settings of one dataset. Sources may wrap it in an
//! `{ ok, data, message }` envelope; `ok == false` is reported as
//! [`SourceError::NotOk`], never as an empty payload.

pub mod csv_file;
pub mod http;
pub mod json_file;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::TransportConfig;
use crate::data::datatable::{DataRow, DataValue};
use crate::data::field::Field;

pub use csv_file::CsvFileSource;
pub use http::HttpSource;
pub use json_file::JsonFileSource;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("data source reported failure: {0}")]
    NotOk(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("could not decode payload: {0}")]
    Decode(String),

    #[error("server answered {status}: {body}")]
    Http { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid source configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Decode(err.to_string())
    }
}

/// Parameters of one fetch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceRequest {
    /// Overrides the configured command name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Free-form parameters forwarded to the server
    pub data: JsonValue,
}

impl SourceRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
            data: JsonValue::Null,
        }
    }
}

/// Anything that can produce a payload
pub trait DataSource {
    fn fetch(&self, request: &SourceRequest) -> Result<Payload, SourceError>;

    /// Short human-readable description for logs and status lines
    fn describe(&self) -> String;
}

/// One dataset as delivered by a source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    pub fields: Vec<Field>,
    pub rows: Vec<DataRow>,
    /// Signed 1-based order keys; validated when loaded into a grid
    pub order_keys: Vec<i32>,
    pub fixed_column_count: usize,
    pub container_id: String,
    pub table_css: String,
    pub table_class: Vec<String>,
}

impl Payload {
    pub fn new(fields: Vec<Field>, rows: Vec<DataRow>) -> Self {
        Self {
            fields,
            rows,
            ..Default::default()
        }
    }

    pub fn with_order_keys(mut self, order_keys: Vec<i32>) -> Self {
        self.order_keys = order_keys;
        self
    }

    pub fn with_fixed_columns(mut self, fixed_column_count: usize) -> Self {
        self.fixed_column_count = fixed_column_count;
        self
    }

    /// Decode an envelope or a bare payload
    pub fn from_json_str(text: &str) -> Result<Self, SourceError> {
        let value: JsonValue = serde_json::from_str(text)?;
        Self::from_json_value(value)
    }

    pub fn from_json_value(value: JsonValue) -> Result<Self, SourceError> {
        let is_envelope = value.as_object().is_some_and(|o| o.contains_key("ok"));
        if !is_envelope {
            let wire: WirePayload = serde_json::from_value(value)?;
            return wire.into_payload();
        }

        let envelope: Envelope = serde_json::from_value(value)?;
        if !envelope.ok {
            let message = envelope
                .message
                .unwrap_or_else(|| "no message".to_string());
            warn!(target: "source", "Source returned not-ok: {}", message);
            return Err(SourceError::NotOk(message));
        }

        match envelope.data {
            Some(data) if !data.is_null() => {
                let wire: WirePayload = serde_json::from_value(data)?;
                wire.into_payload()
            }
            _ => Ok(Payload::default()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    data: Option<JsonValue>,
    #[serde(default, alias = "msg", alias = "error")]
    message: Option<String>,
}

/// Payload as it appears on the wire. Accepts both the long names and the
/// short ones older servers send. Unknown keys (such as `events`) are
/// ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct WirePayload {
    #[serde(alias = "fld")]
    fields: Vec<Field>,
    #[serde(alias = "data")]
    rows: JsonValue,
    #[serde(alias = "orderBy")]
    order_keys: Vec<i32>,
    #[serde(alias = "fixedCols")]
    fixed_column_count: usize,
    #[serde(alias = "mainContainerId")]
    container_id: String,
    #[serde(alias = "tableCSS")]
    table_css: String,
    #[serde(deserialize_with = "string_or_list")]
    table_class: Vec<String>,
}

impl WirePayload {
    fn into_payload(self) -> Result<Payload, SourceError> {
        let rows = decode_rows(self.rows, &self.fields)?;
        debug!(target: "source", "Decoded payload: {} fields, {} rows", self.fields.len(), rows.len());
        Ok(Payload {
            fields: self.fields,
            rows,
            order_keys: self.order_keys,
            fixed_column_count: self.fixed_column_count,
            container_id: self.container_id,
            table_css: self.table_css,
            table_class: self.table_class,
        })
    }
}

/// Rows may arrive as an array, as JSON text holding an array, or not at all.
/// Each row is an array of cells or an object keyed by field name.
fn decode_rows(rows: JsonValue, fields: &[Field]) -> Result<Vec<DataRow>, SourceError> {
    let rows = match rows {
        JsonValue::Null => return Ok(Vec::new()),
        JsonValue::String(text) if text.trim().is_empty() => return Ok(Vec::new()),
        JsonValue::String(text) => serde_json::from_str(&text)?,
        other => other,
    };

    let JsonValue::Array(items) = rows else {
        return Err(SourceError::Decode("rows must be an array".to_string()));
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            JsonValue::Array(cells) => Ok(cells.iter().map(DataValue::from_json).collect::<DataRow>()),
            JsonValue::Object(map) => Ok(fields
                .iter()
                .map(|f| map.get(&f.name).map(DataValue::from_json).unwrap_or(DataValue::Null))
                .collect::<DataRow>()),
            _ => Err(SourceError::Decode(format!(
                "row {} is neither an array nor an object",
                i
            ))),
        })
        .collect()
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        One(String),
        Many(Vec<String>),
        Nothing(()),
    }

    Ok(match StringOrList::deserialize(deserializer)? {
        StringOrList::One(s) => s.split_whitespace().map(str::to_string).collect(),
        StringOrList::Many(list) => list,
        StringOrList::Nothing(()) => Vec::new(),
    })
}

/// Pick a source for a location: `http(s)://` URLs, `.csv` files, anything
/// else is read as JSON
pub fn open(location: &str, transport: &TransportConfig) -> Result<Box<dyn DataSource>, SourceError> {
    if location.starts_with("http://") || location.starts_with("https://") {
        let mut transport = transport.clone();
        transport.base_url = location.to_string();
        return Ok(Box::new(HttpSource::new(transport)?));
    }

    let path = Path::new(location);
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    if is_csv {
        Ok(Box::new(CsvFileSource::new(path)))
    } else {
        Ok(Box::new(JsonFileSource::new(path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::field::ColumnOp;
    use serde_json::json;

    #[test]
    fn test_envelope_with_string_rows() {
        let payload = Payload::from_json_value(json!({
            "ok": true,
            "data": {
                "data": "[[\"Juan\", 10], [\"Ana\", 20]]",
                "fld": [
                    {"name": "name", "label": "Nombre", "pic": "", "align": "L", "css": ""},
                    {"name": "saldo", "label": "Saldo", "colops": "s"}
                ],
                "tableCSS": ".x{}",
                "tableClass": ["striped", "compact"],
                "orderBy": [1],
                "events": {"click": "alert(1)"},
                "fixedCols": 1,
                "mainContainerId": "grid"
            }
        }))
        .unwrap();

        assert_eq!(payload.fields.len(), 2);
        assert_eq!(payload.fields[1].col_op, ColumnOp::Sum);
        assert_eq!(payload.rows.len(), 2);
        assert_eq!(payload.rows[1].get(1), Some(&DataValue::Integer(20)));
        assert_eq!(payload.order_keys, vec![1]);
        assert_eq!(payload.fixed_column_count, 1);
        assert_eq!(payload.container_id, "grid");
        assert_eq!(payload.table_class, vec!["striped", "compact"]);
    }

    #[test]
    fn test_not_ok_is_an_error() {
        let err = Payload::from_json_value(json!({"ok": false, "message": "denied"})).unwrap_err();
        assert!(matches!(err, SourceError::NotOk(ref m) if m == "denied"));

        let empty = Payload::from_json_value(json!({"ok": true})).unwrap();
        assert!(empty.rows.is_empty());
    }

    #[test]
    fn test_bare_payload_defaults() {
        let payload = Payload::from_json_value(json!({
            "fields": [{"name": "id"}, {"name": "city"}],
            "rows": [{"city": "Lugo", "id": 1}, {"id": 2}],
            "tableClass": "a b"
        }))
        .unwrap();

        assert_eq!(payload.rows[0].to_strings(), vec!["1", "Lugo"]);
        assert_eq!(payload.rows[1].get(1), Some(&DataValue::Null));
        assert!(payload.order_keys.is_empty());
        assert_eq!(payload.fixed_column_count, 0);
        assert_eq!(payload.table_class, vec!["a", "b"]);
    }

    #[test]
    fn test_bad_rows_rejected() {
        let err = Payload::from_json_value(json!({"fields": [], "rows": [1, 2]})).unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));
    }
}
