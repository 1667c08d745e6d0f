/// Comment model
///
/// Comments are attached to tasks (`comment_c`). Their `Name` is always the
/// literal `"Comment"`; only the content can be edited after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::{created_at, outgoing, record_id, required, Entity};
use crate::error::GatewayResult;
use crate::fields::{FieldBag, RecordFields};
use crate::upstream::{Record, ID_FIELD, NAME_FIELD};

/// Display name every comment record carries
pub const COMMENT_NAME: &str = "Comment";

/// Comment record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub task_id: Option<i64>,
    pub user_id: Option<i64>,
    pub content: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl Entity for Comment {
    const COLLECTION: &'static str = "comment_c";
    const LABEL: &'static str = "Comment";
    const FIELDS: &'static [&'static str] = &[NAME_FIELD, "task_id_c", "user_id_c", "content_c", "created_at_c"];

    fn from_record(record: &Record) -> GatewayResult<Self> {
        Ok(Comment {
            id: record_id(record, Self::LABEL)?,
            task_id: record.int_field("task_id_c"),
            user_id: record.int_field("user_id_c"),
            content: record.text_field("content_c").unwrap_or_default(),
            created_at: created_at(record),
        })
    }
}

/// Input for creating a comment
#[derive(Debug, Clone, PartialEq)]
pub struct NewComment {
    pub task_id: i64,
    pub user_id: i64,
    pub content: String,
}

impl NewComment {
    /// Decodes a create field bag; all three fields are required
    pub fn from_bag(bag: &FieldBag) -> GatewayResult<Self> {
        Ok(NewComment {
            task_id: required(bag.id("taskId", "task_id_c")?, "taskId")?,
            user_id: required(bag.id("userId", "user_id_c")?, "userId")?,
            content: required(bag.text("content", "content_c")?, "content")?,
        })
    }

    pub fn into_record(self) -> Record {
        outgoing(vec![
            (NAME_FIELD, JsonValue::from(COMMENT_NAME)),
            ("task_id_c", JsonValue::from(self.task_id)),
            ("user_id_c", JsonValue::from(self.user_id)),
            ("content_c", JsonValue::from(self.content)),
        ])
    }
}

/// Comment edit: content only
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentPatch {
    pub content: Option<String>,
}

impl CommentPatch {
    pub fn from_bag(bag: &FieldBag) -> GatewayResult<Self> {
        Ok(CommentPatch {
            content: bag.text("content", "content_c")?,
        })
    }

    pub fn into_record(self, id: i64) -> Record {
        let mut record = outgoing(vec![(ID_FIELD, JsonValue::from(id))]);
        if let Some(content) = self.content {
            record.insert("content_c".to_string(), JsonValue::from(content));
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use serde_json::json;

    fn bag(value: JsonValue) -> FieldBag {
        FieldBag::from_value(value).unwrap()
    }

    #[test]
    fn test_new_comment_record() {
        let comment = NewComment::from_bag(&bag(json!({ "taskId": "4", "user_id_c": 2, "content": "Looks good" }))).unwrap();
        let record = comment.into_record();
        assert_eq!(record["Name"], json!("Comment"));
        assert_eq!(record["task_id_c"], json!(4));
        assert_eq!(record["user_id_c"], json!(2));
    }

    #[test]
    fn test_new_comment_requires_content() {
        let err = NewComment::from_bag(&bag(json!({ "taskId": 4, "userId": 2, "content": "" }))).unwrap_err();
        assert_eq!(err, GatewayError::InvalidArgument("content is required".to_string()));
    }

    #[test]
    fn test_patch_ignores_other_fields() {
        let patch = CommentPatch::from_bag(&bag(json!({ "content": "Edited", "taskId": 9 }))).unwrap();
        let record = patch.into_record(3);
        assert_eq!(record.len(), 2);
        assert_eq!(record["content_c"], json!("Edited"));
    }
}
