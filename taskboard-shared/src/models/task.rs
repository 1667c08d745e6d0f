/// Task model
///
/// Tasks belong to a project and may be assigned to a user. They live in
/// the `task_c` collection.
///
/// # Storage
///
/// ```text
/// task_c: Id, Name, title_c, description_c, project_id_c, assignee_id_c,
///         priority_c, status_c, due_date_c, created_by_c, created_at_c
/// ```
///
/// # Status
///
/// - **todo**: not started (default)
/// - **in_progress**: being worked on
/// - **done**: finished
///
/// Any other stored status is kept verbatim.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::{created_at, outgoing, record_id, required, Entity};
use crate::error::{GatewayError, GatewayResult};
use crate::fields::{format_date, FieldBag, RecordFields};
use crate::upstream::{Record, ID_FIELD, NAME_FIELD};

/// Task status (open set)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
    Other(String),
}

impl TaskStatus {
    /// Converts status to its stored string
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
            TaskStatus::Other(other) => other,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }
}

impl From<String> for TaskStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "todo" => TaskStatus::Todo,
            "in_progress" => TaskStatus::InProgress,
            "done" => TaskStatus::Done,
            _ => TaskStatus::Other(value),
        }
    }
}

impl From<&str> for TaskStatus {
    fn from(value: &str) -> Self {
        TaskStatus::from(value.to_string())
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            other => Err(GatewayError::InvalidArgument(format!(
                "priority must be one of low, medium, high; got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub project_id: Option<i64>,
    pub assignee_id: Option<i64>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
    pub created_by: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Task {
    /// True if the task is past its due date and not done
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.status.is_done() && self.due_date.map(|due| due < today).unwrap_or(false)
    }
}

impl Entity for Task {
    const COLLECTION: &'static str = "task_c";
    const LABEL: &'static str = "Task";
    const FIELDS: &'static [&'static str] = &[
        NAME_FIELD,
        "title_c",
        "description_c",
        "project_id_c",
        "assignee_id_c",
        "priority_c",
        "status_c",
        "due_date_c",
        "created_by_c",
        "created_at_c",
    ];

    fn from_record(record: &Record) -> GatewayResult<Self> {
        let id = record_id(record, Self::LABEL)?;
        let priority = match record.text_field("priority_c") {
            Some(stored) => stored.parse().unwrap_or_else(|_| {
                tracing::debug!(task_id = id, priority = %stored, "Unknown stored priority, using medium");
                TaskPriority::Medium
            }),
            None => TaskPriority::default(),
        };

        Ok(Task {
            id,
            title: record
                .text_field("title_c")
                .or_else(|| record.text_field(NAME_FIELD))
                .unwrap_or_default(),
            description: record.text_field("description_c"),
            project_id: record.int_field("project_id_c"),
            assignee_id: record.int_field("assignee_id_c"),
            priority,
            status: record
                .text_field("status_c")
                .map(TaskStatus::from)
                .unwrap_or_default(),
            due_date: record.date_field("due_date_c"),
            created_by: record.int_field("created_by_c"),
            created_at: created_at(record),
        })
    }
}

fn decode_priority(bag: &FieldBag) -> GatewayResult<Option<TaskPriority>> {
    bag.text("priority", "priority_c")?.map(|s| s.parse()).transpose()
}

/// Input for creating a task
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub project_id: i64,
    pub assignee_id: Option<i64>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
    pub created_by: Option<i64>,
}

impl NewTask {
    /// Decodes a create field bag
    ///
    /// `title` and `projectId` are required. Status defaults to `todo` and
    /// priority to `medium`.
    pub fn from_bag(bag: &FieldBag) -> GatewayResult<Self> {
        Ok(NewTask {
            title: required(bag.text("title", "title_c")?, "title")?,
            description: bag.text("description", "description_c")?,
            project_id: required(bag.id("projectId", "project_id_c")?, "projectId")?,
            assignee_id: bag.id("assigneeId", "assignee_id_c")?,
            priority: decode_priority(bag)?.unwrap_or_default(),
            status: bag
                .text("status", "status_c")?
                .map(TaskStatus::from)
                .unwrap_or_default(),
            due_date: bag.date("dueDate", "due_date_c")?,
            created_by: bag.id("createdBy", "created_by_c")?,
        })
    }

    /// Storage record for `createRecord`
    pub fn into_record(self) -> Record {
        let mut record = outgoing(vec![
            (NAME_FIELD, JsonValue::from(self.title.clone())),
            ("title_c", JsonValue::from(self.title)),
            ("project_id_c", JsonValue::from(self.project_id)),
            ("priority_c", JsonValue::from(self.priority.as_str())),
            ("status_c", JsonValue::from(String::from(self.status))),
        ]);
        if let Some(description) = self.description {
            record.insert("description_c".to_string(), JsonValue::from(description));
        }
        if let Some(assignee_id) = self.assignee_id {
            record.insert("assignee_id_c".to_string(), JsonValue::from(assignee_id));
        }
        if let Some(due) = self.due_date {
            record.insert("due_date_c".to_string(), JsonValue::from(format_date(due)));
        }
        if let Some(created_by) = self.created_by {
            record.insert("created_by_c".to_string(), JsonValue::from(created_by));
        }
        record
    }
}

/// Partial task update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub project_id: Option<i64>,
    pub assignee_id: Option<i64>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<NaiveDate>,
}

impl TaskPatch {
    /// Decodes an update field bag; absent fields are left untouched
    pub fn from_bag(bag: &FieldBag) -> GatewayResult<Self> {
        Ok(TaskPatch {
            title: bag.text("title", "title_c")?,
            description: bag.text("description", "description_c")?,
            project_id: bag.id("projectId", "project_id_c")?,
            assignee_id: bag.id("assigneeId", "assignee_id_c")?,
            priority: decode_priority(bag)?,
            status: bag.text("status", "status_c")?.map(TaskStatus::from),
            due_date: bag.date("dueDate", "due_date_c")?,
        })
    }

    /// Patch that only changes the status
    pub fn status(status: TaskStatus) -> Self {
        TaskPatch {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Patch that only changes the assignee
    pub fn assignee(assignee_id: i64) -> Self {
        TaskPatch {
            assignee_id: Some(assignee_id),
            ..Default::default()
        }
    }

    /// Storage record for `updateRecord`
    pub fn into_record(self, id: i64) -> Record {
        let mut record = outgoing(vec![(ID_FIELD, JsonValue::from(id))]);
        if let Some(title) = self.title {
            record.insert(NAME_FIELD.to_string(), JsonValue::from(title.clone()));
            record.insert("title_c".to_string(), JsonValue::from(title));
        }
        if let Some(description) = self.description {
            record.insert("description_c".to_string(), JsonValue::from(description));
        }
        if let Some(project_id) = self.project_id {
            record.insert("project_id_c".to_string(), JsonValue::from(project_id));
        }
        if let Some(assignee_id) = self.assignee_id {
            record.insert("assignee_id_c".to_string(), JsonValue::from(assignee_id));
        }
        if let Some(priority) = self.priority {
            record.insert("priority_c".to_string(), JsonValue::from(priority.as_str()));
        }
        if let Some(status) = self.status {
            record.insert("status_c".to_string(), JsonValue::from(String::from(status)));
        }
        if let Some(due) = self.due_date {
            record.insert("due_date_c".to_string(), JsonValue::from(format_date(due)));
        }
        record
    }
}
