/// Session store
///
/// Holds the identity of one client context. The external authentication
/// widget hands over a loosely shaped user payload; `set_user` normalizes it
/// into a `SessionUser` and marks the session authenticated.
///
/// # Normalization
///
/// | Field | Sources, first present wins | Fallback |
/// |-------|-----------------------------|----------|
/// | role  | `role`, `accounts[0].role`, `accounts[0].UserRole`, `UserRole` | `"user"` |
/// | name  | `name`, `firstName` | `"User"` |
/// | email | `email`, `emailAddress` | `""` |
/// | id    | `Id`, `id`, `userId` (numeric only) | none |
///
/// All other payload keys are kept in `SessionUser::extra`. Every id key is
/// dropped from it, including ones that did not resolve.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use taskboard_shared::auth::session::SessionStore;
///
/// let store = SessionStore::new();
/// let session = store.set_user(&json!({ "firstName": "Ada", "accounts": [{ "role": "admin" }] }));
/// assert!(session.is_authenticated());
/// assert_eq!(session.user().map(|u| u.role.as_str()), Some("admin"));
///
/// store.clear_user();
/// assert!(!store.snapshot().is_authenticated());
/// ```

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};

use crate::fields::coerce_id;

/// Role given to payloads that carry none
pub const FALLBACK_ROLE: &str = "user";

/// Name given to payloads that carry none
pub const FALLBACK_NAME: &str = "User";

/// Payload keys that may carry the user id, in lookup order
const ID_KEYS: [&str; 3] = ["Id", "id", "userId"];

/// Normalized authenticated user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    pub name: String,
    pub email: String,
    pub role: String,

    /// Remaining payload keys, owned
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl SessionUser {
    /// Normalizes a widget payload; `None` for null or non-object payloads
    pub fn from_payload(payload: &JsonValue) -> Option<Self> {
        let JsonValue::Object(fields) = payload else {
            return None;
        };
        let mut extra = fields.clone();

        let role = resolve_role(fields).unwrap_or_else(|| {
            tracing::debug!(
                keys = ?fields.keys().collect::<Vec<_>>(),
                "No role in user payload, using fallback"
            );
            FALLBACK_ROLE.to_string()
        });
        extra.remove("role");

        let name = first_text(fields, &["name", "firstName"]).unwrap_or_else(|| FALLBACK_NAME.to_string());
        extra.remove("name");

        let email = first_text(fields, &["email", "emailAddress"]).unwrap_or_default();
        extra.remove("email");

        let id = ID_KEYS
            .into_iter()
            .find_map(|key| fields.get(key).and_then(|value| coerce_id(value, key).ok()));
        for key in ID_KEYS {
            extra.remove(key);
        }

        Some(SessionUser {
            id,
            name,
            email,
            role,
            extra,
        })
    }
}

fn non_empty_text(value: Option<&JsonValue>) -> Option<String> {
    match value? {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn first_text(fields: &Map<String, JsonValue>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| non_empty_text(fields.get(*key)))
}

fn resolve_role(fields: &Map<String, JsonValue>) -> Option<String> {
    let first_account = fields
        .get("accounts")
        .and_then(JsonValue::as_array)
        .and_then(|accounts| accounts.first());

    non_empty_text(fields.get("role"))
        .or_else(|| non_empty_text(first_account.and_then(|a| a.get("role"))))
        .or_else(|| non_empty_text(first_account.and_then(|a| a.get("UserRole"))))
        .or_else(|| non_empty_text(fields.get("UserRole")))
}

/// Session state of one client context
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated(SessionUser),
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }

    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated(user) => Some(user),
        }
    }
}

/// Serializes as `{ "user": SessionUser | null, "authenticated": bool }`
impl Serialize for Session {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Session", 2)?;
        state.serialize_field("user", &self.user())?;
        state.serialize_field("authenticated", &self.is_authenticated())?;
        state.end()
    }
}

/// Single-writer, many-reader session slot
#[derive(Debug, Default)]
pub struct SessionStore {
    session: RwLock<Session>,
}

impl SessionStore {
    /// Creates an anonymous session
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Normalizes `payload` and stores it; a null payload clears the session
    ///
    /// Returns a snapshot of the resulting session.
    pub fn set_user(&self, payload: &JsonValue) -> Session {
        let session = match SessionUser::from_payload(payload) {
            Some(user) => {
                tracing::info!(user_id = ?user.id, role = %user.role, "Session authenticated");
                Session::Authenticated(user)
            }
            None => Session::Anonymous,
        };

        *self.write() = session.clone();
        session
    }

    /// Resets to anonymous
    pub fn clear_user(&self) {
        *self.write() = Session::Anonymous;
        tracing::debug!("Session cleared");
    }

    /// Cloned view of the current session
    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_from_first_account() {
        let store = SessionStore::new();
        let session = store.set_user(&json!({ "accounts": [{ "role": "admin" }] }));
        assert_eq!(session.user().unwrap().role, "admin");
    }

    #[test]
    fn test_role_lookup_order() {
        let user = SessionUser::from_payload(&json!({
            "UserRole": "member",
            "accounts": [{ "UserRole": "project_manager" }]
        }))
        .unwrap();
        assert_eq!(user.role, "project_manager");

        let user = SessionUser::from_payload(&json!({ "UserRole": "member", "accounts": [] })).unwrap();
        assert_eq!(user.role, "member");

        let user = SessionUser::from_payload(&json!({ "role": "admin", "accounts": [{ "role": "member" }] })).unwrap();
        assert_eq!(user.role, "admin");
    }

    #[test]
    fn test_empty_payload_defaults() {
        let store = SessionStore::new();
        let session = store.set_user(&json!({}));
        let user = session.user().unwrap();
        assert_eq!(user.role, "user");
        assert_eq!(user.name, "User");
        assert_eq!(user.email, "");
        assert!(user.id.is_none());
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_null_payload_clears() {
        let store = SessionStore::new();
        store.set_user(&json!({ "name": "Ada" }));
        let session = store.set_user(&JsonValue::Null);

        assert_eq!(
            serde_json::to_value(&session).unwrap(),
            json!({ "user": null, "authenticated": false })
        );
        assert_eq!(store.snapshot(), Session::Anonymous);
    }

    #[test]
    fn test_name_email_fallbacks_and_extra() {
        let user = SessionUser::from_payload(&json!({
            "firstName": "Ada",
            "emailAddress": "ada@example.com",
            "userId": "12",
            "company": "Analytical Engines"
        }))
        .unwrap();

        assert_eq!(user.name, "Ada");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.id, Some(12));
        assert_eq!(user.extra["company"], json!("Analytical Engines"));
        assert!(!user.extra.contains_key("userId"));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let store = SessionStore::new();
        let payload = json!({ "name": "Ada", "prefs": { "theme": "dark" } });
        let mut snapshot = store.set_user(&payload);

        if let Session::Authenticated(user) = &mut snapshot {
            user.name = "Changed".to_string();
        }
        assert_eq!(store.snapshot().user().unwrap().name, "Ada");
    }

    #[test]
    fn test_serialized_shape() {
        let store = SessionStore::new();
        store.set_user(&json!({ "Id": 3, "name": "Ada", "email": "ada@example.com", "role": "admin" }));

        assert_eq!(
            serde_json::to_value(store.snapshot()).unwrap(),
            json!({
                "user": { "id": 3, "name": "Ada", "email": "ada@example.com", "role": "admin" },
                "authenticated": true
            })
        );
    }

    #[test]
    fn test_every_id_key_leaves_extra() {
        let user = SessionUser::from_payload(&json!({ "Id": 3, "id": "auth0|abc", "userId": 9, "name": "Ada" })).unwrap();
        assert_eq!(user.id, Some(3));
        assert!(user.extra.is_empty());

        assert_eq!(
            serde_json::to_value(Session::Authenticated(user)).unwrap(),
            json!({
                "user": { "id": 3, "name": "Ada", "email": "", "role": "user" },
                "authenticated": true
            })
        );

        let user = SessionUser::from_payload(&json!({ "Id": "auth0|abc", "id": 5 })).unwrap();
        assert_eq!(user.id, Some(5));
        assert!(!user.extra.contains_key("Id"));
    }
}
