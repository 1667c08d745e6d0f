/// Task adapter (`task_c`)

use super::client::RecordClient;
use crate::error::GatewayResult;
use crate::fields::FieldBag;
use crate::models::{Entity, NewTask, Task, TaskPatch, TaskPriority, TaskStatus};
use crate::upstream::FetchParams;

#[derive(Clone)]
pub struct TaskGateway {
    client: RecordClient,
}

impl TaskGateway {
    pub fn new(client: RecordClient) -> Self {
        TaskGateway { client }
    }

    fn query() -> FetchParams {
        FetchParams::select(Task::FIELDS)
    }

    pub async fn list_all(&self) -> Vec<Task> {
        self.client.list("list_all", Self::query()).await
    }

    pub async fn get_by_id(&self, id: i64) -> GatewayResult<Task> {
        self.client.get(id).await
    }

    pub async fn list_by_project(&self, project_id: i64) -> Vec<Task> {
        self.client
            .list("list_by_project", Self::query().filter_eq("project_id_c", project_id))
            .await
    }

    pub async fn list_by_assignee(&self, assignee_id: i64) -> Vec<Task> {
        self.client
            .list("list_by_assignee", Self::query().filter_eq("assignee_id_c", assignee_id))
            .await
    }

    pub async fn list_by_status(&self, status: &TaskStatus) -> Vec<Task> {
        self.client
            .list("list_by_status", Self::query().filter_eq("status_c", status.as_str()))
            .await
    }

    pub async fn list_by_priority(&self, priority: TaskPriority) -> Vec<Task> {
        self.client
            .list("list_by_priority", Self::query().filter_eq("priority_c", priority.as_str()))
            .await
    }

    /// Creates a task
    ///
    /// Requires `title` and `projectId`. Id fields are sent as integers.
    pub async fn create(&self, fields: &FieldBag) -> GatewayResult<Task> {
        let task = NewTask::from_bag(fields)?;
        self.client.create(task.into_record()).await
    }

    pub async fn update(&self, id: i64, fields: &FieldBag) -> GatewayResult<Task> {
        let patch = TaskPatch::from_bag(fields)?;
        self.client.update(patch.into_record(id)).await
    }

    pub async fn delete(&self, id: i64) -> GatewayResult<()> {
        self.client.delete::<Task>(id).await
    }

    /// Writes only `status_c`
    pub async fn update_status(&self, id: i64, status: TaskStatus) -> GatewayResult<Task> {
        self.client.update(TaskPatch::status(status).into_record(id)).await
    }

    /// Writes only `assignee_id_c`
    pub async fn reassign(&self, id: i64, assignee_id: i64) -> GatewayResult<Task> {
        self.client.update(TaskPatch::assignee(assignee_id).into_record(id)).await
    }
}
