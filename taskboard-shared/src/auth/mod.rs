/// Session and access utilities
///
/// Authentication itself is performed by an external widget. This module
/// only consumes what the widget reports.
///
/// # Modules
///
/// - [`session`]: payload normalization and the per-client `SessionStore`
/// - [`redirect`]: where to navigate once the widget has answered
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use taskboard_shared::auth::{post_auth_destination, SessionStore};
///
/// let store = SessionStore::new();
/// let session = store.set_user(&json!({ "name": "Ada", "role": "admin" }));
/// let next = post_auth_destination("/login", None, session.is_authenticated());
/// assert_eq!(next, "/");
/// ```

pub mod redirect;
pub mod session;

pub use redirect::{is_auth_page, post_auth_destination};
pub use session::{Session, SessionStore, SessionUser};
