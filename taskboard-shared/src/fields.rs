/// Field bag decoding
///
/// Callers hand the gateway a plain JSON object of input fields. Each field
/// may be spelled with its friendly key (`projectId`) or its storage key
/// (`project_id_c`). This module is the only place that tolerance lives:
/// the per-entity decode functions in `models` call into `FieldBag` and get
/// back canonical, typed values.
///
/// # Key Resolution
///
/// For every field the storage key is consulted first, then the friendly
/// key. A key whose value is `null` or an empty string counts as absent.
///
/// # Id Coercion
///
/// Id-like fields accept integers, integral floats, numeric strings (trimmed)
/// and lookup objects (`{ "Id": 3 }`). Anything else fails with
/// `GatewayError::InvalidArgument`.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use taskboard_shared::fields::FieldBag;
///
/// let bag = FieldBag::from_value(json!({ "title": "Draft", "title_c": "Final", "projectId": "3" })).unwrap();
/// assert_eq!(bag.text("title", "title_c").unwrap().as_deref(), Some("Final"));
/// assert_eq!(bag.id("projectId", "project_id_c").unwrap(), Some(3));
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{GatewayError, GatewayResult};
use crate::upstream::{Record, ID_FIELD};

/// Input field bag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldBag(Map<String, JsonValue>);

impl FieldBag {
    /// Converts any JSON value; only objects are accepted
    pub fn from_value(value: JsonValue) -> GatewayResult<Self> {
        match value {
            JsonValue::Object(fields) => Ok(FieldBag(fields)),
            other => Err(GatewayError::InvalidArgument(format!(
                "expected an object of fields, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Sets a field (builder style)
    pub fn with(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Returns true if either key is present at all, even when empty
    pub fn mentions(&self, friendly: &str, storage: &str) -> bool {
        self.0.contains_key(storage) || self.0.contains_key(friendly)
    }

    /// Resolves a field: storage key first, then friendly key
    pub fn pick(&self, friendly: &str, storage: &str) -> Option<&JsonValue> {
        [storage, friendly]
            .into_iter()
            .filter_map(|key| self.0.get(key))
            .find(|value| is_present(value))
    }

    /// Resolves a text field
    ///
    /// Numbers and booleans are rendered as text; arrays and objects are
    /// rejected.
    pub fn text(&self, friendly: &str, storage: &str) -> GatewayResult<Option<String>> {
        self.pick(friendly, storage)
            .map(|value| match value {
                JsonValue::String(s) => Ok(s.clone()),
                JsonValue::Number(n) => Ok(n.to_string()),
                JsonValue::Bool(b) => Ok(b.to_string()),
                other => Err(GatewayError::InvalidArgument(format!(
                    "{} must be text, got {}",
                    friendly,
                    json_kind(other)
                ))),
            })
            .transpose()
    }

    /// Resolves an id field, coercing it to an integer
    pub fn id(&self, friendly: &str, storage: &str) -> GatewayResult<Option<i64>> {
        self.pick(friendly, storage)
            .map(|value| coerce_id(value, friendly))
            .transpose()
    }

    /// Resolves a calendar date (`YYYY-MM-DD` or RFC 3339)
    pub fn date(&self, friendly: &str, storage: &str) -> GatewayResult<Option<NaiveDate>> {
        match self.text(friendly, storage)? {
            Some(text) => parse_date(&text).map(Some).ok_or_else(|| {
                GatewayError::InvalidArgument(format!(
                    "{} must be a date (YYYY-MM-DD), got '{}'",
                    friendly, text
                ))
            }),
            None => Ok(None),
        }
    }

    /// Resolves an id list
    ///
    /// The storage spelling is a comma-delimited string; the friendly
    /// spelling is an array of ids. Either form may be used under either key.
    /// An empty string or empty array yields an empty list.
    pub fn id_list(&self, friendly: &str, storage: &str) -> GatewayResult<Option<Vec<i64>>> {
        let value = match self.pick(friendly, storage) {
            Some(value) => value,
            None if self.mentions(friendly, storage) => return Ok(Some(Vec::new())),
            None => return Ok(None),
        };

        let ids = match value {
            JsonValue::Array(items) => items
                .iter()
                .map(|item| coerce_id(item, friendly))
                .collect::<GatewayResult<Vec<i64>>>()?,
            JsonValue::String(joined) => joined
                .split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(|token| coerce_id(&JsonValue::from(token), friendly))
                .collect::<GatewayResult<Vec<i64>>>()?,
            other => vec![coerce_id(other, friendly)?],
        };

        Ok(Some(ids))
    }
}

impl From<Map<String, JsonValue>> for FieldBag {
    fn from(fields: Map<String, JsonValue>) -> Self {
        FieldBag(fields)
    }
}

fn is_present(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/// Coerces an id-like value to an integer
///
/// # Errors
///
/// Returns `InvalidArgument` naming `field` for non-numeric input.
pub fn coerce_id(value: &JsonValue, field: &str) -> GatewayResult<i64> {
    let invalid = || GatewayError::InvalidArgument(format!("{} must be an integer id, got {}", field, value));

    match value {
        JsonValue::Number(n) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(f))
                    .map(|f| f as i64)
            })
            .ok_or_else(invalid),
        JsonValue::String(s) => s.trim().parse::<i64>().map_err(|_| invalid()),
        JsonValue::Object(lookup) => lookup
            .get(ID_FIELD)
            .ok_or_else(invalid)
            .and_then(|id| coerce_id(id, field)),
        _ => Err(invalid()),
    }
}

/// Parses `YYYY-MM-DD` or an RFC 3339 timestamp into a calendar date
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

/// Formats a calendar date the way the record service stores it
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Lenient accessors for records coming back from upstream
///
/// Reads never fail: a field with an unexpected shape decodes as `None`.
pub trait RecordFields {
    /// Integer field (number, numeric string, or lookup object)
    fn int_field(&self, key: &str) -> Option<i64>;

    /// Non-empty text field
    fn text_field(&self, key: &str) -> Option<String>;

    /// Calendar date field
    fn date_field(&self, key: &str) -> Option<NaiveDate>;

    /// RFC 3339 timestamp field
    fn timestamp_field(&self, key: &str) -> Option<DateTime<Utc>>;
}

impl RecordFields for Record {
    fn int_field(&self, key: &str) -> Option<i64> {
        self.get(key)
            .filter(|value| is_present(value))
            .and_then(|value| coerce_id(value, key).ok())
    }

    fn text_field(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn date_field(&self, key: &str) -> Option<NaiveDate> {
        self.text_field(key).and_then(|text| parse_date(&text))
    }

    fn timestamp_field(&self, key: &str) -> Option<DateTime<Utc>> {
        self.text_field(key)
            .and_then(|text| DateTime::parse_from_rfc3339(text.trim()).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}
