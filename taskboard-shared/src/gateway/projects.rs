/// Project adapter (`project_c`)
///
/// Besides plain CRUD this adapter edits a project's team. The team is a
/// single delimited string upstream, so membership edits are
/// read-modify-write:
///
/// 1. read the project and snapshot its stored `team_members_c`
/// 2. apply the edit to the decoded `MemberSet`; stop if nothing changed
/// 3. re-read the project and compare `team_members_c` with the snapshot
/// 4. write the re-encoded set back
///
/// A mismatch in step 3 fails with `GatewayError::Conflict`. The window
/// between steps 3 and 4 remains open; two edits racing inside it can still
/// lose one update.

use super::client::RecordClient;
use crate::error::{GatewayError, GatewayResult};
use crate::fields::FieldBag;
use crate::models::project::stored_member_string;
use crate::models::{Entity, MemberSet, NewProject, Project, ProjectPatch, ProjectStatus};
use crate::upstream::FetchParams;

#[derive(Clone)]
pub struct ProjectGateway {
    client: RecordClient,
}

impl ProjectGateway {
    pub fn new(client: RecordClient) -> Self {
        ProjectGateway { client }
    }

    fn query() -> FetchParams {
        FetchParams::select(Project::FIELDS)
    }

    pub async fn list_all(&self) -> Vec<Project> {
        self.client.list("list_all", Self::query()).await
    }

    pub async fn get_by_id(&self, id: i64) -> GatewayResult<Project> {
        self.client.get(id).await
    }

    pub async fn list_by_manager(&self, manager_id: i64) -> Vec<Project> {
        self.client
            .list("list_by_manager", Self::query().filter_eq("manager_id_c", manager_id))
            .await
    }

    /// Projects whose team contains `user_id`
    ///
    /// The service cannot filter inside the delimited team string, so this
    /// fetches every project and filters locally.
    pub async fn list_by_member(&self, user_id: i64) -> Vec<Project> {
        self.client
            .list::<Project>("list_by_member", Self::query())
            .await
            .into_iter()
            .filter(|project| project.team_members.contains(user_id))
            .collect()
    }

    pub async fn list_by_status(&self, status: &ProjectStatus) -> Vec<Project> {
        self.client
            .list("list_by_status", Self::query().filter_eq("status_c", status.as_str()))
            .await
    }

    pub async fn create(&self, fields: &FieldBag) -> GatewayResult<Project> {
        let project = NewProject::from_bag(fields)?;
        self.client.create(project.into_record()).await
    }

    pub async fn update(&self, id: i64, fields: &FieldBag) -> GatewayResult<Project> {
        let patch = ProjectPatch::from_bag(fields)?;
        self.client.update(patch.into_record(id)).await
    }

    pub async fn delete(&self, id: i64) -> GatewayResult<()> {
        self.client.delete::<Project>(id).await
    }

    /// Adds `user_id` to the team; a no-op if already a member
    pub async fn add_team_member(&self, project_id: i64, user_id: i64) -> GatewayResult<Project> {
        self.edit_members(project_id, "add_team_member", |members| members.insert(user_id))
            .await
    }

    /// Removes `user_id` from the team; a no-op if not a member
    pub async fn remove_team_member(&self, project_id: i64, user_id: i64) -> GatewayResult<Project> {
        self.edit_members(project_id, "remove_team_member", |members| members.remove(user_id))
            .await
    }

    async fn edit_members<F>(&self, project_id: i64, operation: &str, edit: F) -> GatewayResult<Project>
    where
        F: FnOnce(&mut MemberSet) -> bool,
    {
        let snapshot = self.client.get_record::<Project>(project_id).await?;
        let project = Project::from_record(&snapshot)?;
        let stored = stored_member_string(&snapshot);

        let mut members = project.team_members.clone();
        if !edit(&mut members) {
            tracing::debug!(
                project_id = project_id,
                operation = operation,
                "Team unchanged, skipping write"
            );
            return Ok(project);
        }

        let current = self.client.get_record::<Project>(project_id).await?;
        if stored_member_string(&current) != stored {
            tracing::warn!(
                project_id = project_id,
                operation = operation,
                "Team changed since snapshot"
            );
            return Err(GatewayError::Conflict(format!(
                "Team of project {} changed during {}",
                project_id, operation
            )));
        }

        tracing::info!(
            project_id = project_id,
            operation = operation,
            members = %members.encode(),
            "Writing project team"
        );
        self.client
            .update(ProjectPatch::team(members).into_record(project_id))
            .await
    }
}
