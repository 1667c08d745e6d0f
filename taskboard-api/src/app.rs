/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskboard_api::{app::AppState, config::Config};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::from_config(config)?;
/// let app = taskboard_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::{Config, UpstreamBackend},
    error::ApiError,
    sessions::SessionRegistry,
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use taskboard_shared::gateway::Gateway;
use taskboard_shared::upstream::{HttpRecordService, InMemoryRecordService, RecordService};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use uuid::Uuid;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Record gateway
    pub gateway: Gateway,

    /// Live sessions by token
    pub sessions: Arc<SessionRegistry>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state over an existing gateway
    pub fn new(gateway: Gateway, config: Config) -> Self {
        Self {
            gateway,
            sessions: Arc::new(SessionRegistry::new(config.session_idle())),
            config: Arc::new(config),
        }
    }

    /// Creates application state, building the record service from config
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let service: Arc<dyn RecordService> = match &config.upstream {
            UpstreamBackend::Http(upstream) => Arc::new(HttpRecordService::new(upstream.clone())?),
            UpstreamBackend::Memory { .. } => {
                tracing::warn!("Using in-memory record service; data is not persisted");
                Arc::new(InMemoryRecordService::new())
            }
        };

        let gateway = Gateway::new(service, config.upstream.call_timeout());
        Ok(Self::new(gateway, config))
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// ├── /v1/
/// │   ├── POST /session                # Widget success callback (public)
/// │   ├── POST /session/error          # Widget error callback (public)
/// │   ├── GET|DELETE /session          # Current session, logout
/// │   ├── GET /dashboard
/// │   ├── /projects                    # CRUD, members, tasks
/// │   ├── /tasks                       # CRUD, status, assignee, comments
/// │   ├── /comments/:id                # Edit, delete
/// │   ├── /users                       # Admin only
/// │   └── /activity                    # Activity log
/// ```
///
/// Everything under `/v1` except the two widget callbacks requires
/// `Authorization: Bearer <session token>`.
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Session authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let session_auth = axum::middleware::from_fn_with_state(state.clone(), session_auth_layer);

    // Widget callbacks are public; reading and closing a session are not
    let session_routes = Router::new()
        .route(
            "/session",
            post(routes::session::create_session).merge(
                get(routes::session::get_session)
                    .delete(routes::session::logout)
                    .route_layer(session_auth.clone()),
            ),
        )
        .route("/session/error", post(routes::session::session_error));

    // Session-gated routes
    let protected_routes = Router::new()
        .route("/dashboard", get(routes::dashboard::dashboard))
        .route(
            "/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/projects/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/projects/:id/members/:user_id",
            post(routes::projects::add_member).delete(routes::projects::remove_member),
        )
        .route("/projects/:id/tasks", get(routes::projects::project_tasks))
        .route(
            "/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/tasks/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/tasks/:id/status", put(routes::tasks::update_task_status))
        .route("/tasks/:id/assignee", put(routes::tasks::reassign_task))
        .route(
            "/tasks/:id/comments",
            get(routes::comments::list_task_comments).post(routes::comments::create_comment),
        )
        .route(
            "/comments/:id",
            put(routes::comments::update_comment).delete(routes::comments::delete_comment),
        )
        .route(
            "/users",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route(
            "/users/:id",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        .route("/users/:id/role", put(routes::users::change_user_role))
        .route("/activity", get(routes::activity::list_activity))
        .route("/activity/:id", get(routes::activity::get_activity))
        .route_layer(session_auth);

    let v1_routes = Router::new().merge(session_routes).merge(protected_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|origin| origin == "*") {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Parses `Authorization: Bearer <uuid>`
///
/// `Ok(None)` when the header is absent.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<Option<Uuid>, ApiError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::BadRequest("Expected Bearer token".to_string()))?;

    Uuid::parse_str(token.trim())
        .map(Some)
        .map_err(|_| ApiError::Unauthorized("Invalid session token".to_string()))
}

/// Session authentication middleware layer
///
/// Resolves the bearer token to an authenticated session and injects
/// `CurrentSession` into request extensions.
async fn session_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())?
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let current = state
        .sessions
        .resolve(&token)
        .ok_or_else(|| ApiError::Unauthorized("Session expired or unknown".to_string()))?;

    req.extensions_mut().insert(current);

    Ok(next.run(req).await)
}
