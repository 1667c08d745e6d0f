/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `session`: Authentication widget callbacks and session lifecycle
/// - `dashboard`: Summary for the signed-in user
/// - `projects`: Project CRUD and team membership
/// - `tasks`: Task CRUD, status and assignment
/// - `comments`: Task comments
/// - `users`: User administration (admin only)
/// - `activity`: Activity log

pub mod activity;
pub mod comments;
pub mod dashboard;
pub mod health;
pub mod projects;
pub mod session;
pub mod tasks;
pub mod users;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::sessions::CurrentSession;
use serde_json::Value as JsonValue;
use taskboard_shared::error::GatewayError;
use taskboard_shared::fields::FieldBag;
use taskboard_shared::models::NewActivity;

/// Converts a JSON request body into a field bag
pub(crate) fn field_bag(body: JsonValue) -> ApiResult<FieldBag> {
    Ok(FieldBag::from_value(body)?)
}

/// Appends an activity entry for the caller, best-effort
///
/// Failures are logged and never reach the client.
pub(crate) async fn record_activity(
    state: &AppState,
    session: &CurrentSession,
    action: &str,
    entity_type: &str,
    entity_id: i64,
) {
    let Some(user_id) = session.user.id else {
        tracing::debug!(action = action, "Session user has no id, skipping activity entry");
        return;
    };

    let entry = NewActivity::new(user_id, action, entity_type, entity_id);
    if let Err(e) = state.gateway.activity.record(entry).await {
        tracing::warn!(
            action = action,
            entity_type = entity_type,
            entity_id = entity_id,
            error = %e,
            "Failed to record activity"
        );
    }
}

/// Rejects callers who may not manage users
///
/// The role claimed in the session payload is not trusted: the caller's
/// stored `user_c` record decides. A session without an id, or whose id has
/// no stored user, is rejected.
pub(crate) async fn require_admin(state: &AppState, session: &CurrentSession) -> ApiResult<()> {
    let forbidden = || ApiError::Forbidden("Admin role required".to_string());

    let Some(user_id) = session.user.id else {
        return Err(forbidden());
    };

    let stored = match state.gateway.users.get_by_id(user_id).await {
        Ok(user) => user,
        Err(GatewayError::NotFound(_)) => {
            tracing::warn!(user_id = user_id, "Session user has no stored record");
            return Err(forbidden());
        }
        Err(e) => return Err(e.into()),
    };

    if stored.role.can_manage_users() {
        Ok(())
    } else {
        if session.user.role != stored.role.as_str() {
            tracing::warn!(
                user_id = user_id,
                claimed = %session.user.role,
                stored = %stored.role,
                "Session role differs from stored role"
            );
        }
        Err(forbidden())
    }
}
