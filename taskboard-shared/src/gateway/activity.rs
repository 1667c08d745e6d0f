/// Activity log adapter (`activity_c`)
///
/// Append-only: there is no update or delete. Every query is ordered by
/// `timestamp_c` descending, newest first.

use chrono::Utc;

use super::client::RecordClient;
use crate::error::GatewayResult;
use crate::fields::FieldBag;
use crate::models::activity::TIMESTAMP_FIELD;
use crate::models::{ActivityEntry, Entity, NewActivity};
use crate::upstream::{FetchParams, OrderBy};

/// Page size of `list_recent` when the caller has no preference
pub const DEFAULT_RECENT_LIMIT: u32 = 10;

#[derive(Clone)]
pub struct ActivityGateway {
    client: RecordClient,
}

impl ActivityGateway {
    pub fn new(client: RecordClient) -> Self {
        ActivityGateway { client }
    }

    fn query() -> FetchParams {
        FetchParams::select(ActivityEntry::FIELDS).order(OrderBy::descending(TIMESTAMP_FIELD))
    }

    pub async fn list_all(&self) -> Vec<ActivityEntry> {
        self.client.list("list_all", Self::query()).await
    }

    /// Newest `limit` entries
    pub async fn list_recent(&self, limit: u32) -> Vec<ActivityEntry> {
        self.client
            .list("list_recent", Self::query().page(limit, 0))
            .await
    }

    pub async fn get_by_id(&self, id: i64) -> GatewayResult<ActivityEntry> {
        self.client.get(id).await
    }

    pub async fn list_by_user(&self, user_id: i64) -> Vec<ActivityEntry> {
        self.client
            .list("list_by_user", Self::query().filter_eq("user_id_c", user_id))
            .await
    }

    pub async fn list_by_entity(&self, entity_type: &str, entity_id: i64) -> Vec<ActivityEntry> {
        let params = Self::query()
            .filter_eq("entity_type_c", entity_type)
            .filter_eq("entity_id_c", entity_id);
        self.client.list("list_by_entity", params).await
    }

    /// Appends an entry from a field bag
    pub async fn create(&self, fields: &FieldBag) -> GatewayResult<ActivityEntry> {
        let entry = NewActivity::from_bag(fields)?;
        self.record(entry).await
    }

    /// Appends an entry, stamping it with the current time
    pub async fn record(&self, entry: NewActivity) -> GatewayResult<ActivityEntry> {
        self.client.create(entry.into_record(Utc::now())).await
    }
}
