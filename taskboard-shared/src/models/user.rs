/// User model
///
/// Users are the people who manage projects and work on tasks. They live in
/// the `user_c` collection.
///
/// # Storage
///
/// ```text
/// user_c: Id, Name, name_c, email_c, role_c, avatar_c, created_at_c
/// ```
///
/// # Roles
///
/// - **admin**: manages users and everything else
/// - **project_manager**: manages projects
/// - **member**: works on tasks (default)
///
/// A stored role outside these three decodes as `member`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use validator::ValidateEmail;

use super::{created_at, outgoing, record_id, required, Entity};
use crate::error::{GatewayError, GatewayResult};
use crate::fields::{FieldBag, RecordFields};
use crate::upstream::{Record, ID_FIELD, NAME_FIELD};

/// Avatar service used when a new user has no avatar
pub const DEFAULT_AVATAR_BASE: &str = "https://api.dicebear.com/7.x/avataaars/svg?seed=";

/// User roles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Full access, including user management
    Admin,

    /// Manages projects and their teams
    ProjectManager,

    /// Regular team member
    #[default]
    Member,
}

impl UserRole {
    /// Converts role to its stored string
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::ProjectManager => "project_manager",
            UserRole::Member => "member",
        }
    }

    /// Lenient decode: unknown or missing roles become `Member`
    pub fn from_stored(value: Option<&str>) -> Self {
        value.and_then(|s| s.parse().ok()).unwrap_or_default()
    }

    /// Can create, edit, re-role and delete users
    pub fn can_manage_users(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl FromStr for UserRole {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "admin" => Ok(UserRole::Admin),
            "project_manager" => Ok(UserRole::ProjectManager),
            "member" => Ok(UserRole::Member),
            other => Err(GatewayError::InvalidArgument(format!(
                "role must be one of admin, project_manager, member; got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub avatar: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Entity for User {
    const COLLECTION: &'static str = "user_c";
    const LABEL: &'static str = "User";
    const FIELDS: &'static [&'static str] = &[
        NAME_FIELD,
        "name_c",
        "email_c",
        "role_c",
        "avatar_c",
        "created_at_c",
    ];

    fn from_record(record: &Record) -> GatewayResult<Self> {
        Ok(User {
            id: record_id(record, Self::LABEL)?,
            name: record
                .text_field("name_c")
                .or_else(|| record.text_field(NAME_FIELD))
                .unwrap_or_default(),
            email: record.text_field("email_c").unwrap_or_default(),
            role: UserRole::from_stored(record.text_field("role_c").as_deref()),
            avatar: record.text_field("avatar_c"),
            created_at: created_at(record),
        })
    }
}

fn decode_email(bag: &FieldBag) -> GatewayResult<Option<String>> {
    match bag.text("email", "email_c")? {
        Some(email) if email.validate_email() => Ok(Some(email)),
        Some(email) => Err(GatewayError::InvalidArgument(format!(
            "email must be a valid address, got '{}'",
            email
        ))),
        None => Ok(None),
    }
}

fn decode_role(bag: &FieldBag) -> GatewayResult<Option<UserRole>> {
    bag.text("role", "role_c")?.map(|s| s.parse()).transpose()
}

/// Input for creating a user
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub avatar: String,
}

impl NewUser {
    /// Decodes a create field bag
    ///
    /// `name` and a valid `email` are required. The role defaults to
    /// `member` and the avatar to a generated one seeded by the name.
    pub fn from_bag(bag: &FieldBag) -> GatewayResult<Self> {
        let name = required(bag.text("name", "name_c")?, "name")?;
        let email = required(decode_email(bag)?, "email")?;
        let role = decode_role(bag)?.unwrap_or_default();
        let avatar = bag
            .text("avatar", "avatar_c")?
            .unwrap_or_else(|| format!("{}{}", DEFAULT_AVATAR_BASE, name));

        Ok(NewUser {
            name,
            email,
            role,
            avatar,
        })
    }

    /// Storage record for `createRecord`
    pub fn into_record(self) -> Record {
        outgoing(vec![
            (NAME_FIELD, JsonValue::from(self.name.clone())),
            ("name_c", JsonValue::from(self.name)),
            ("email_c", JsonValue::from(self.email)),
            ("role_c", JsonValue::from(self.role.as_str())),
            ("avatar_c", JsonValue::from(self.avatar)),
        ])
    }
}

/// Partial user update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub avatar: Option<String>,
}

impl UserPatch {
    /// Decodes an update field bag; absent fields are left untouched
    pub fn from_bag(bag: &FieldBag) -> GatewayResult<Self> {
        Ok(UserPatch {
            name: bag.text("name", "name_c")?,
            email: decode_email(bag)?,
            role: decode_role(bag)?,
            avatar: bag.text("avatar", "avatar_c")?,
        })
    }

    /// Patch that only changes the role
    pub fn role(role: UserRole) -> Self {
        UserPatch {
            role: Some(role),
            ..Default::default()
        }
    }

    /// Storage record for `updateRecord`
    pub fn into_record(self, id: i64) -> Record {
        let mut record = outgoing(vec![(ID_FIELD, JsonValue::from(id))]);
        if let Some(name) = self.name {
            record.insert(NAME_FIELD.to_string(), JsonValue::from(name.clone()));
            record.insert("name_c".to_string(), JsonValue::from(name));
        }
        if let Some(email) = self.email {
            record.insert("email_c".to_string(), JsonValue::from(email));
        }
        if let Some(role) = self.role {
            record.insert("role_c".to_string(), JsonValue::from(role.as_str()));
        }
        if let Some(avatar) = self.avatar {
            record.insert("avatar_c".to_string(), JsonValue::from(avatar));
        }
        record
    }
}
