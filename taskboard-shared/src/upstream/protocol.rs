/// Wire shapes of the external record service
///
/// These types serialize to exactly the parameter and response shapes the
/// hosted record service expects, including its mixed key casing
/// (`FieldName` vs `fieldName`, `RecordIds`, `sorttype`).
///
/// ```text
/// fetch   { fields, where?, orderBy?, pagingInfo? } -> { success, message?, data: [Record] }
/// get     { fields }                                -> { success, message?, data: Record }
/// create  { records }                               -> { success, message?, results: [{ success, message?, data }] }
/// update  { records }                               -> { success, message?, results: [...] }
/// delete  { RecordIds }                             -> { success, message? }
/// ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// A raw upstream record: a JSON object keyed by storage field names
pub type Record = Map<String, JsonValue>;

/// Name of the primary key every record carries
pub const ID_FIELD: &str = "Id";

/// Name of the display field every record carries
pub const NAME_FIELD: &str = "Name";

/// Field selector: `{ "field": { "Name": "title_c" } }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub field: FieldName,
}

/// Inner field name wrapper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldName {
    #[serde(rename = "Name")]
    pub name: String,
}

impl FieldSpec {
    /// Creates a selector for one storage field
    pub fn named(name: &str) -> Self {
        FieldSpec {
            field: FieldName {
                name: name.to_string(),
            },
        }
    }

    /// Builds selectors for a list of storage fields
    pub fn list(names: &[&str]) -> Vec<FieldSpec> {
        names.iter().map(|name| FieldSpec::named(name)).collect()
    }
}

/// Comparison operator of a where clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    EqualTo,
}

/// Where clause: `{ FieldName, Operator: "EqualTo", Values: [v] }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereClause {
    #[serde(rename = "FieldName")]
    pub field_name: String,

    #[serde(rename = "Operator")]
    pub operator: Operator,

    #[serde(rename = "Values")]
    pub values: Vec<JsonValue>,
}

impl WhereClause {
    /// Equality filter on a single value
    pub fn equal_to(field_name: &str, value: impl Into<JsonValue>) -> Self {
        WhereClause {
            field_name: field_name.to_string(),
            operator: Operator::EqualTo,
            values: vec![value.into()],
        }
    }

    /// Checks whether a record satisfies this clause
    ///
    /// Lookup objects (`{ "Id": 3, "Name": ... }`) compare by their `Id`, and
    /// numbers compare against numeric strings, mirroring how the hosted
    /// service treats lookup columns.
    pub fn matches(&self, record: &Record) -> bool {
        let Some(stored) = record.get(&self.field_name) else {
            return false;
        };

        match self.operator {
            Operator::EqualTo => self.values.iter().any(|wanted| loosely_equal(stored, wanted)),
        }
    }
}

fn loosely_equal(stored: &JsonValue, wanted: &JsonValue) -> bool {
    match (stored, wanted) {
        (JsonValue::Object(lookup), _) => lookup
            .get(ID_FIELD)
            .map(|id| loosely_equal(id, wanted))
            .unwrap_or(false),
        (JsonValue::Number(a), JsonValue::Number(b)) => a.as_f64() == b.as_f64(),
        (JsonValue::String(s), JsonValue::Number(n)) | (JsonValue::Number(n), JsonValue::String(s)) => {
            s.trim().parse::<f64>().ok() == n.as_f64()
        }
        _ => stored == wanted,
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortType {
    #[serde(rename = "ASC")]
    Asc,

    #[serde(rename = "DESC")]
    Desc,
}

/// Ordering: `{ fieldName, sorttype }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    #[serde(rename = "fieldName")]
    pub field_name: String,

    pub sorttype: SortType,
}

impl OrderBy {
    pub fn descending(field_name: &str) -> Self {
        OrderBy {
            field_name: field_name.to_string(),
            sorttype: SortType::Desc,
        }
    }
}

/// Paging: `{ limit, offset }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingInfo {
    pub limit: u32,
    pub offset: u32,
}

/// Parameters of `fetchRecords`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FetchParams {
    pub fields: Vec<FieldSpec>,

    #[serde(rename = "where", default, skip_serializing_if = "Vec::is_empty")]
    pub where_clauses: Vec<WhereClause>,

    #[serde(rename = "orderBy", default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBy>,

    #[serde(rename = "pagingInfo", default, skip_serializing_if = "Option::is_none")]
    pub paging_info: Option<PagingInfo>,
}

impl FetchParams {
    /// Selects the given fields with no filter
    pub fn select(fields: &[&str]) -> Self {
        FetchParams {
            fields: FieldSpec::list(fields),
            ..Default::default()
        }
    }

    /// Adds an equality filter
    pub fn filter_eq(mut self, field_name: &str, value: impl Into<JsonValue>) -> Self {
        self.where_clauses.push(WhereClause::equal_to(field_name, value));
        self
    }

    /// Adds an ordering
    pub fn order(mut self, order_by: OrderBy) -> Self {
        self.order_by.push(order_by);
        self
    }

    /// Limits the result page
    pub fn page(mut self, limit: u32, offset: u32) -> Self {
        self.paging_info = Some(PagingInfo { limit, offset });
        self
    }
}

/// Parameters of `getRecordById`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GetParams {
    pub fields: Vec<FieldSpec>,
}

/// Parameters of `createRecord` / `updateRecord`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordsParams {
    pub records: Vec<Record>,
}

impl RecordsParams {
    /// Wraps a single record
    pub fn single(record: Record) -> Self {
        RecordsParams {
            records: vec![record],
        }
    }
}

/// Parameters of `deleteRecord`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteParams {
    #[serde(rename = "RecordIds")]
    pub record_ids: Vec<i64>,
}

impl DeleteParams {
    pub fn single(id: i64) -> Self {
        DeleteParams {
            record_ids: vec![id],
        }
    }
}

/// Response of `fetchRecords`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FetchResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Absent or null `data` is treated as an empty page
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<Record>,
}

/// Response of `getRecordById`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GetResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default)]
    pub data: Option<Record>,
}

/// Per-record entry of a mutation response
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MutationResult {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default)]
    pub data: Option<Record>,
}

/// Response of `createRecord` / `updateRecord`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MutationResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<MutationResult>,
}

/// Response of `deleteRecord`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
