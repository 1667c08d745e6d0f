/// Record gateway
///
/// Per-entity adapters over a single `RecordService`. Adapters translate
/// domain calls (`list_by_status`, `add_team_member`, ...) into record
/// service queries and decode the answers into the typed models.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use serde_json::json;
/// use taskboard_shared::fields::FieldBag;
/// use taskboard_shared::gateway::Gateway;
/// use taskboard_shared::timeout::CallTimeout;
/// use taskboard_shared::upstream::InMemoryRecordService;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let gateway = Gateway::new(Arc::new(InMemoryRecordService::new()), CallTimeout::default());
///
/// let project = gateway
///     .projects
///     .create(&FieldBag::from_value(json!({ "title": "Apollo" }))?)
///     .await?;
/// let project = gateway.projects.add_team_member(project.id, 7).await?;
/// assert!(project.team_members.contains(7));
/// # Ok(())
/// # }
/// ```

pub mod activity;
pub mod client;
pub mod comments;
pub mod projects;
pub mod tasks;
pub mod users;

use std::sync::Arc;

pub use activity::{ActivityGateway, DEFAULT_RECENT_LIMIT};
pub use client::{RecordClient, NO_RESULT};
pub use comments::CommentGateway;
pub use projects::ProjectGateway;
pub use tasks::TaskGateway;
pub use users::UserGateway;

use crate::error::GatewayResult;
use crate::models::User;
use crate::timeout::CallTimeout;
use crate::upstream::{FetchParams, RecordService, NAME_FIELD};

/// All adapters over one record service
#[derive(Clone)]
pub struct Gateway {
    client: RecordClient,
    pub users: UserGateway,
    pub projects: ProjectGateway,
    pub tasks: TaskGateway,
    pub comments: CommentGateway,
    pub activity: ActivityGateway,
}

impl Gateway {
    pub fn new(service: Arc<dyn RecordService>, timeout: CallTimeout) -> Self {
        let client = RecordClient::new(service, timeout);
        Gateway {
            users: UserGateway::new(client.clone()),
            projects: ProjectGateway::new(client.clone()),
            tasks: TaskGateway::new(client.clone()),
            comments: CommentGateway::new(client.clone()),
            activity: ActivityGateway::new(client.clone()),
            client,
        }
    }

    /// Name of the underlying record service
    pub fn service_name(&self) -> &str {
        self.client.service_name()
    }

    /// Cheap reachability check: fetches at most one user
    pub async fn ping(&self) -> GatewayResult<()> {
        let params = FetchParams::select(&[NAME_FIELD]).page(1, 0);
        self.client.try_list::<User>(&params).await.map(|_| ())
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("service", &self.service_name())
            .finish_non_exhaustive()
    }
}
