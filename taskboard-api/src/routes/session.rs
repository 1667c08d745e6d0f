/// Session endpoints
///
/// The authentication widget runs in the browser and reports back through
/// these callbacks. A successful callback carrying a user opens a session
/// and returns a bearer token for the rest of the API.
///
/// # Endpoints
///
/// - `POST /v1/session` - Widget success callback (public)
/// - `POST /v1/session/error` - Widget error callback (public)
/// - `GET /v1/session` - Current session
/// - `DELETE /v1/session` - Logout

use crate::{
    app::{bearer_token, AppState},
    error::ApiResult,
    sessions::CurrentSession,
};
use axum::{extract::State, http::HeaderMap, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use taskboard_shared::auth::{post_auth_destination, Session};

/// Widget success callback body
#[derive(Debug, Default, Deserialize)]
pub struct SessionRequest {
    /// User payload as reported by the widget; null or absent means anonymous
    #[serde(default)]
    pub user: JsonValue,

    /// Path the client was on when the widget reported back
    #[serde(default)]
    pub current_path: Option<String>,

    /// `redirect` query value, if the client had one
    #[serde(default)]
    pub redirect: Option<String>,
}

/// Widget callback response
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// Bearer token, present only for authenticated sessions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Resulting session
    pub session: Session,

    /// Where the client should navigate next
    pub redirect_to: String,
}

/// Widget success callback
///
/// # Endpoint
///
/// ```text
/// POST /v1/session
/// Content-Type: application/json
///
/// {
///   "user": { "Id": 7, "firstName": "Ada", "accounts": [{ "role": "admin" }] },
///   "current_path": "/login",
///   "redirect": "/tasks"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "token": "uuid",
///   "session": { "user": { "id": 7, "name": "Ada", "email": "", "role": "admin" }, "authenticated": true },
///   "redirect_to": "/tasks"
/// }
/// ```
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let (token, session) = state.sessions.open(&req.user);

    let redirect_to = post_auth_destination(
        req.current_path.as_deref().unwrap_or_default(),
        req.redirect.as_deref(),
        session.is_authenticated(),
    );

    let status = if token.is_some() {
        tracing::info!(user = ?session.user().and_then(|u| u.id), "User signed in");
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(SessionResponse {
            token: token.map(|t| t.to_string()),
            session,
            redirect_to,
        }),
    ))
}

/// Widget error callback
///
/// Logs the failure and clears the caller's session if a token was sent.
pub async fn session_error(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<JsonValue>>,
) -> ApiResult<Json<Session>> {
    let detail = body.map(|Json(value)| value).unwrap_or(JsonValue::Null);
    tracing::warn!(detail = %detail, "Authentication widget reported an error");

    if let Some(token) = bearer_token(&headers)? {
        state.sessions.close(&token);
    }

    Ok(Json(Session::Anonymous))
}

/// Current session
pub async fn get_session(Extension(current): Extension<CurrentSession>) -> Json<Session> {
    Json(Session::Authenticated(current.user))
}

/// Logout
///
/// Clears the session and forgets its token.
pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> StatusCode {
    state.sessions.close(&current.token);
    tracing::info!(user = ?current.user.id, "User signed out");
    StatusCode::NO_CONTENT
}
