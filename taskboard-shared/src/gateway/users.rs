/// User adapter (`user_c`)

use super::client::RecordClient;
use crate::error::GatewayResult;
use crate::fields::FieldBag;
use crate::models::{Entity, NewUser, User, UserPatch, UserRole};
use crate::upstream::FetchParams;

#[derive(Clone)]
pub struct UserGateway {
    client: RecordClient,
}

impl UserGateway {
    pub fn new(client: RecordClient) -> Self {
        UserGateway { client }
    }

    fn query() -> FetchParams {
        FetchParams::select(User::FIELDS)
    }

    pub async fn list_all(&self) -> Vec<User> {
        self.client.list("list_all", Self::query()).await
    }

    pub async fn get_by_id(&self, id: i64) -> GatewayResult<User> {
        self.client.get(id).await
    }

    pub async fn list_by_role(&self, role: UserRole) -> Vec<User> {
        self.client
            .list("list_by_role", Self::query().filter_eq("role_c", role.as_str()))
            .await
    }

    /// Creates a user
    ///
    /// Requires `name` and a valid `email`; see `NewUser::from_bag` for the
    /// defaults applied.
    pub async fn create(&self, fields: &FieldBag) -> GatewayResult<User> {
        let user = NewUser::from_bag(fields)?;
        self.client.create(user.into_record()).await
    }

    pub async fn update(&self, id: i64, fields: &FieldBag) -> GatewayResult<User> {
        let patch = UserPatch::from_bag(fields)?;
        self.client.update(patch.into_record(id)).await
    }

    pub async fn delete(&self, id: i64) -> GatewayResult<()> {
        self.client.delete::<User>(id).await
    }

    /// Writes only `role_c`
    pub async fn change_role(&self, id: i64, role: UserRole) -> GatewayResult<User> {
        tracing::info!(user_id = id, role = %role, "Changing user role");
        self.client.update(UserPatch::role(role).into_record(id)).await
    }
}
