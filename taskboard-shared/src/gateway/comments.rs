/// Comment adapter (`comment_c`)

use super::client::RecordClient;
use crate::error::GatewayResult;
use crate::fields::FieldBag;
use crate::models::{Comment, CommentPatch, Entity, NewComment};
use crate::upstream::FetchParams;

#[derive(Clone)]
pub struct CommentGateway {
    client: RecordClient,
}

impl CommentGateway {
    pub fn new(client: RecordClient) -> Self {
        CommentGateway { client }
    }

    fn query() -> FetchParams {
        FetchParams::select(Comment::FIELDS)
    }

    pub async fn list_all(&self) -> Vec<Comment> {
        self.client.list("list_all", Self::query()).await
    }

    pub async fn get_by_id(&self, id: i64) -> GatewayResult<Comment> {
        self.client.get(id).await
    }

    pub async fn list_by_task(&self, task_id: i64) -> Vec<Comment> {
        self.client
            .list("list_by_task", Self::query().filter_eq("task_id_c", task_id))
            .await
    }

    pub async fn create(&self, fields: &FieldBag) -> GatewayResult<Comment> {
        let comment = NewComment::from_bag(fields)?;
        self.client.create(comment.into_record()).await
    }

    /// Edits the content; other keys in `fields` are ignored
    pub async fn update(&self, id: i64, fields: &FieldBag) -> GatewayResult<Comment> {
        let patch = CommentPatch::from_bag(fields)?;
        self.client.update(patch.into_record(id)).await
    }

    pub async fn delete(&self, id: i64) -> GatewayResult<()> {
        self.client.delete::<Comment>(id).await
    }
}
