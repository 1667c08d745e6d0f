/// Canonical record models
///
/// One module per upstream collection. Each model has:
///
/// - a typed record struct decoded leniently from an upstream `Record`
/// - a `New*` input type built from a `FieldBag` (create)
/// - a `*Patch` input type built from a `FieldBag` (update), where that
///   entity supports updates
///
/// The `from_bag` functions are the only place where friendly and storage
/// key spellings are reconciled. Everything downstream sees typed values.
///
/// # Models
///
/// - `user`: team members and their role
/// - `project`: projects with a manager and a member set
/// - `task`: tasks within a project
/// - `comment`: task comments
/// - `activity`: append-only activity log
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use taskboard_shared::fields::FieldBag;
/// use taskboard_shared::models::task::{NewTask, TaskPriority, TaskStatus};
///
/// let bag = FieldBag::from_value(json!({ "title": "Fix bug", "projectId": "3" })).unwrap();
/// let task = NewTask::from_bag(&bag).unwrap();
/// assert_eq!(task.project_id, 3);
/// assert_eq!(task.status, TaskStatus::Todo);
/// assert_eq!(task.priority, TaskPriority::Medium);
/// ```

pub mod activity;
pub mod comment;
pub mod project;
pub mod task;
pub mod user;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use crate::error::{GatewayError, GatewayResult};
use crate::fields::RecordFields;
use crate::upstream::{Record, CREATED_ON_FIELD, ID_FIELD};

pub use activity::{ActivityEntry, NewActivity};
pub use comment::{Comment, CommentPatch, NewComment};
pub use project::{MemberSet, NewProject, Project, ProjectPatch, ProjectStatus};
pub use task::{NewTask, Task, TaskPatch, TaskPriority, TaskStatus};
pub use user::{NewUser, User, UserPatch, UserRole};

/// A typed view of one upstream collection
pub trait Entity: Sized {
    /// Upstream collection name
    const COLLECTION: &'static str;

    /// Display name used in error messages ("Project not found")
    const LABEL: &'static str;

    /// Storage fields requested on every read
    const FIELDS: &'static [&'static str];

    /// Decodes a raw record
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Upstream` if the record has no usable `Id`.
    fn from_record(record: &Record) -> GatewayResult<Self>;
}

/// Extracts the primary key of an upstream record
pub(crate) fn record_id(record: &Record, label: &str) -> GatewayResult<i64> {
    record
        .int_field(ID_FIELD)
        .ok_or_else(|| GatewayError::Upstream(format!("{} record has no usable Id", label)))
}

/// `created_at_c`, falling back to the platform's `CreatedOn` stamp
pub(crate) fn created_at(record: &Record) -> Option<DateTime<Utc>> {
    record
        .timestamp_field("created_at_c")
        .or_else(|| record.timestamp_field(CREATED_ON_FIELD))
}

/// Builds an outgoing record from `(storage key, value)` pairs
pub(crate) fn outgoing(pairs: Vec<(&str, JsonValue)>) -> Record {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// Reports a missing required create field
pub(crate) fn required<T>(value: Option<T>, field: &str) -> GatewayResult<T> {
    value.ok_or_else(|| GatewayError::InvalidArgument(format!("{} is required", field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_created_at_prefers_explicit_field() {
        let record: Record = json!({
            "created_at_c": "2024-03-01T10:00:00Z",
            "CreatedOn": "2024-01-01T10:00:00Z"
        })
        .as_object()
        .cloned()
        .unwrap();
        assert_eq!(created_at(&record).unwrap().to_rfc3339(), "2024-03-01T10:00:00+00:00");

        let record: Record = json!({ "CreatedOn": "2024-01-01T10:00:00Z" })
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(created_at(&record).unwrap().to_rfc3339(), "2024-01-01T10:00:00+00:00");
    }

    #[test]
    fn test_record_id_missing() {
        let err = record_id(&Record::new(), "Task").unwrap_err();
        assert!(matches!(err, GatewayError::Upstream(_)));
    }

    #[test]
    fn test_required() {
        assert_eq!(required(Some(1), "title").unwrap(), 1);
        assert!(matches!(
            required::<i64>(None, "title"),
            Err(GatewayError::InvalidArgument(msg)) if msg == "title is required"
        ));
    }
}
