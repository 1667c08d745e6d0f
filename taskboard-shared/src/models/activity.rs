/// Activity log model
///
/// Activity entries record who did what to which entity (`activity_c`).
/// The log is append-only: entries are created and read, never edited or
/// deleted.
///
/// # Storage
///
/// ```text
/// activity_c: Id, Name, user_id_c, action_c, entity_type_c, entity_id_c, timestamp_c
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::{outgoing, record_id, required, Entity};
use crate::error::GatewayResult;
use crate::fields::{FieldBag, RecordFields};
use crate::upstream::{Record, CREATED_ON_FIELD, NAME_FIELD};

/// Fallback display name when an entry has no action
pub const ACTIVITY_NAME: &str = "Activity";

/// Storage field activity is ordered by
pub const TIMESTAMP_FIELD: &str = "timestamp_c";

/// Activity entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: i64,
    pub user_id: Option<i64>,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Entity for ActivityEntry {
    const COLLECTION: &'static str = "activity_c";
    const LABEL: &'static str = "Activity";
    const FIELDS: &'static [&'static str] = &[
        NAME_FIELD,
        "user_id_c",
        "action_c",
        "entity_type_c",
        "entity_id_c",
        TIMESTAMP_FIELD,
    ];

    fn from_record(record: &Record) -> GatewayResult<Self> {
        Ok(ActivityEntry {
            id: record_id(record, Self::LABEL)?,
            user_id: record.int_field("user_id_c"),
            action: record
                .text_field("action_c")
                .or_else(|| record.text_field(NAME_FIELD))
                .unwrap_or_default(),
            entity_type: record.text_field("entity_type_c"),
            entity_id: record.int_field("entity_id_c"),
            timestamp: record
                .timestamp_field(TIMESTAMP_FIELD)
                .or_else(|| record.timestamp_field(CREATED_ON_FIELD)),
        })
    }
}

/// Input for appending an activity entry
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub user_id: i64,
    pub action: String,
    pub entity_type: String,
    pub entity_id: i64,
}

impl NewActivity {
    pub fn new(user_id: i64, action: impl Into<String>, entity_type: impl Into<String>, entity_id: i64) -> Self {
        NewActivity {
            user_id,
            action: action.into(),
            entity_type: entity_type.into(),
            entity_id,
        }
    }

    /// Decodes a create field bag; all four fields are required
    pub fn from_bag(bag: &FieldBag) -> GatewayResult<Self> {
        Ok(NewActivity {
            user_id: required(bag.id("userId", "user_id_c")?, "userId")?,
            action: required(bag.text("action", "action_c")?, "action")?,
            entity_type: required(bag.text("entityType", "entity_type_c")?, "entityType")?,
            entity_id: required(bag.id("entityId", "entity_id_c")?, "entityId")?,
        })
    }

    /// Storage record for `createRecord`, stamped with `at`
    pub fn into_record(self, at: DateTime<Utc>) -> Record {
        let name = if self.action.is_empty() {
            ACTIVITY_NAME.to_string()
        } else {
            self.action.clone()
        };

        outgoing(vec![
            (NAME_FIELD, JsonValue::from(name)),
            ("user_id_c", JsonValue::from(self.user_id)),
            ("action_c", JsonValue::from(self.action)),
            ("entity_type_c", JsonValue::from(self.entity_type)),
            ("entity_id_c", JsonValue::from(self.entity_id)),
            (TIMESTAMP_FIELD, JsonValue::from(at.to_rfc3339())),
        ])
    }
}
