/// Project model
///
/// Projects group tasks and carry a manager plus a team. They live in the
/// `project_c` collection.
///
/// # Storage
///
/// ```text
/// project_c: Id, Name, title_c, description_c, manager_id_c, status_c,
///            start_date_c, end_date_c, team_members_c, created_at_c
/// ```
///
/// The team is stored as a comma-delimited id string (`"1,4,9"`) and
/// decoded into a `MemberSet`.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::{created_at, outgoing, record_id, required, Entity};
use crate::error::GatewayResult;
use crate::fields::{format_date, FieldBag, RecordFields};
use crate::upstream::{Record, ID_FIELD, NAME_FIELD};

/// Storage field holding the delimited member ids
pub const TEAM_MEMBERS_FIELD: &str = "team_members_c";

/// Project status
///
/// Open set: statuses the record service returns that are not listed here
/// are preserved verbatim in `Other`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProjectStatus {
    #[default]
    Planning,
    Active,
    Completed,
    OnHold,
    Other(String),
}

impl ProjectStatus {
    /// Converts status to its stored string
    pub fn as_str(&self) -> &str {
        match self {
            ProjectStatus::Planning => "planning",
            ProjectStatus::Active => "active",
            ProjectStatus::Completed => "completed",
            ProjectStatus::OnHold => "on_hold",
            ProjectStatus::Other(other) => other,
        }
    }
}

impl From<String> for ProjectStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "planning" => ProjectStatus::Planning,
            "active" => ProjectStatus::Active,
            "completed" => ProjectStatus::Completed,
            "on_hold" => ProjectStatus::OnHold,
            _ => ProjectStatus::Other(value),
        }
    }
}

impl From<&str> for ProjectStatus {
    fn from(value: &str) -> Self {
        ProjectStatus::from(value.to_string())
    }
}

impl From<ProjectStatus> for String {
    fn from(status: ProjectStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, duplicate-free set of member ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberSet(Vec<i64>);

impl MemberSet {
    /// Decodes the stored delimited form
    ///
    /// Whitespace around tokens is ignored, empty tokens are skipped and
    /// tokens that are not integers are dropped with a warning. Duplicates
    /// keep their first position.
    pub fn decode(stored: &str) -> Self {
        let mut members = MemberSet::default();
        for token in stored.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token.parse::<i64>() {
                Ok(id) => {
                    members.insert(id);
                }
                Err(_) => tracing::warn!(token = %token, "Dropping non-numeric team member id"),
            }
        }
        members
    }

    /// Encodes to the stored delimited form
    pub fn encode(&self) -> String {
        self.0
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Adds a member; returns false if already present
    pub fn insert(&mut self, id: i64) -> bool {
        if self.contains(id) {
            return false;
        }
        self.0.push(id);
        true
    }

    /// Removes a member; returns false if not present
    pub fn remove(&mut self, id: i64) -> bool {
        let before = self.0.len();
        self.0.retain(|member| *member != id);
        self.0.len() != before
    }

    pub fn contains(&self, id: i64) -> bool {
        self.0.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn ids(&self) -> &[i64] {
        &self.0
    }
}

impl FromIterator<i64> for MemberSet {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        let mut members = MemberSet::default();
        for id in iter {
            members.insert(id);
        }
        members
    }
}

/// Project record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub manager_id: Option<i64>,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub team_members: MemberSet,
    pub created_at: Option<DateTime<Utc>>,
}

impl Entity for Project {
    const COLLECTION: &'static str = "project_c";
    const LABEL: &'static str = "Project";
    const FIELDS: &'static [&'static str] = &[
        NAME_FIELD,
        "title_c",
        "description_c",
        "manager_id_c",
        "status_c",
        "start_date_c",
        "end_date_c",
        TEAM_MEMBERS_FIELD,
        "created_at_c",
    ];

    fn from_record(record: &Record) -> GatewayResult<Self> {
        Ok(Project {
            id: record_id(record, Self::LABEL)?,
            title: record
                .text_field("title_c")
                .or_else(|| record.text_field(NAME_FIELD))
                .unwrap_or_default(),
            description: record.text_field("description_c"),
            manager_id: record.int_field("manager_id_c"),
            status: record
                .text_field("status_c")
                .map(ProjectStatus::from)
                .unwrap_or_default(),
            start_date: record.date_field("start_date_c"),
            end_date: record.date_field("end_date_c"),
            team_members: stored_members(record),
            created_at: created_at(record),
        })
    }
}

/// Raw stored member string of a record (empty when absent)
pub fn stored_member_string(record: &Record) -> String {
    record.text_field(TEAM_MEMBERS_FIELD).unwrap_or_default()
}

fn stored_members(record: &Record) -> MemberSet {
    MemberSet::decode(&stored_member_string(record))
}

fn decode_members(bag: &FieldBag) -> GatewayResult<Option<MemberSet>> {
    Ok(bag
        .id_list("teamMembers", TEAM_MEMBERS_FIELD)?
        .map(|ids| ids.into_iter().collect()))
}

/// Input for creating a project
#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub title: String,
    pub description: Option<String>,
    pub manager_id: Option<i64>,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub team_members: MemberSet,
}

impl NewProject {
    /// Decodes a create field bag
    ///
    /// `title` is required; the status defaults to `planning` and the team
    /// to empty.
    pub fn from_bag(bag: &FieldBag) -> GatewayResult<Self> {
        Ok(NewProject {
            title: required(bag.text("title", "title_c")?, "title")?,
            description: bag.text("description", "description_c")?,
            manager_id: bag.id("managerId", "manager_id_c")?,
            status: bag
                .text("status", "status_c")?
                .map(ProjectStatus::from)
                .unwrap_or_default(),
            start_date: bag.date("startDate", "start_date_c")?,
            end_date: bag.date("endDate", "end_date_c")?,
            team_members: decode_members(bag)?.unwrap_or_default(),
        })
    }

    /// Storage record for `createRecord`
    pub fn into_record(self) -> Record {
        let mut record = outgoing(vec![
            (NAME_FIELD, JsonValue::from(self.title.clone())),
            ("title_c", JsonValue::from(self.title)),
            ("status_c", JsonValue::from(String::from(self.status))),
            (TEAM_MEMBERS_FIELD, JsonValue::from(self.team_members.encode())),
        ]);
        if let Some(description) = self.description {
            record.insert("description_c".to_string(), JsonValue::from(description));
        }
        if let Some(manager_id) = self.manager_id {
            record.insert("manager_id_c".to_string(), JsonValue::from(manager_id));
        }
        if let Some(start) = self.start_date {
            record.insert("start_date_c".to_string(), JsonValue::from(format_date(start)));
        }
        if let Some(end) = self.end_date {
            record.insert("end_date_c".to_string(), JsonValue::from(format_date(end)));
        }
        record
    }
}

/// Partial project update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub manager_id: Option<i64>,
    pub status: Option<ProjectStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    /// Sent whenever the bag mentions the team, even as empty
    pub team_members: Option<MemberSet>,
}

impl ProjectPatch {
    /// Decodes an update field bag; absent fields are left untouched
    pub fn from_bag(bag: &FieldBag) -> GatewayResult<Self> {
        Ok(ProjectPatch {
            title: bag.text("title", "title_c")?,
            description: bag.text("description", "description_c")?,
            manager_id: bag.id("managerId", "manager_id_c")?,
            status: bag.text("status", "status_c")?.map(ProjectStatus::from),
            start_date: bag.date("startDate", "start_date_c")?,
            end_date: bag.date("endDate", "end_date_c")?,
            team_members: decode_members(bag)?,
        })
    }

    /// Patch that only replaces the team
    pub fn team(members: MemberSet) -> Self {
        ProjectPatch {
            team_members: Some(members),
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
        if let Some(manager_id) = self.manager_id {
            record.insert("manager_id_c".to_string(), JsonValue::from(manager_id));
        }
        if let Some(status) = self.status {
            record.insert("status_c".to_string(), JsonValue::from(String::from(status)));
        }
        if let Some(start) = self.start_date {
            record.insert("start_date_c".to_string(), JsonValue::from(format_date(start)));
        }
        if let Some(end) = self.end_date {
            record.insert("end_date_c".to_string(), JsonValue::from(format_date(end)));
        }
        if let Some(members) = self.team_members {
            record.insert(TEAM_MEMBERS_FIELD.to_string(), JsonValue::from(members.encode()));
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: JsonValue) -> FieldBag {
        FieldBag::from_value(value).unwrap()
    }

    #[test]
    fn test_member_set_decode() {
        let members = MemberSet::decode(" 3, 1,,3, x ,2");
        assert_eq!(members.ids(), &[3, 1, 2]);
        assert_eq!(members.encode(), "3,1,2");
        assert!(MemberSet::decode("").is_empty());
    }

    #[test]
    fn test_member_set_insert_remove() {
        let mut members = MemberSet::decode("1,2");
        assert!(!members.insert(2));
        assert!(members.insert(5));
        assert_eq!(members.encode(), "1,2,5");
        assert!(members.remove(1));
        assert!(!members.remove(9));
        assert_eq!(members.encode(), "2,5");
    }

    #[test]
    fn test_status_open_set() {
        assert_eq!(ProjectStatus::from("on_hold"), ProjectStatus::OnHold);
        assert_eq!(
            ProjectStatus::from("archived"),
            ProjectStatus::Other("archived".to_string())
        );
        assert_eq!(ProjectStatus::from("archived").as_str(), "archived");
        assert_eq!(serde_json::to_value(ProjectStatus::Active).unwrap(), json!("active"));
    }

    #[test]
    fn test_from_record() {
        let record: Record = json!({
            "Id": 2,
            "Name": "Apollo",
            "title_c": "Apollo",
            "manager_id_c": { "Id": 7, "Name": "Grace" },
            "status_c": "active",
            "start_date_c": "2024-01-15",
            "team_members_c": "7,8"
        })
        .as_object()
        .cloned()
        .unwrap();

        let project = Project::from_record(&record).unwrap();
        assert_eq!(project.manager_id, Some(7));
        assert_eq!(project.status, ProjectStatus::Active);
        assert_eq!(project.start_date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(project.team_members.ids(), &[7, 8]);
        assert!(project.team_members.contains(8));
    }

    #[test]
    fn test_new_project_defaults() {
        let project = NewProject::from_bag(&bag(json!({ "title": "Apollo", "teamMembers": [1, "2"] }))).unwrap();
        assert_eq!(project.status, ProjectStatus::Planning);

        let record = project.into_record();
        assert_eq!(record["status_c"], json!("planning"));
        assert_eq!(record["team_members_c"], json!("1,2"));
        assert!(!record.contains_key("manager_id_c"));
    }

    #[test]
    fn test_new_project_requires_title() {
        assert!(NewProject::from_bag(&bag(json!({ "description": "no title" }))).is_err());
    }

    #[test]
    fn test_patch_sends_empty_team_when_mentioned() {
        let patch = ProjectPatch::from_bag(&bag(json!({ "teamMembers": [] }))).unwrap();
        let record = patch.into_record(2);
        assert_eq!(record["team_members_c"], json!(""));

        let patch = ProjectPatch::from_bag(&bag(json!({ "status": "completed" }))).unwrap();
        let record = patch.into_record(2);
        assert!(!record.contains_key("team_members_c"));
        assert_eq!(record["status_c"], json!("completed"));
    }
}
