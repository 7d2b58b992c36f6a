//! Groups of users.

use super::{allocate, mutate, procedure, ResourceKind, Service, UnfilteredPool};
use super::User;
use crate::error::Result;
use crate::resource::envelope;
use crate::rpc::Value;
use crate::template::Blueprint;

envelope!(
    /// A group snapshot.
    Group,
    "GROUP"
);

impl Group {
    pub fn user_ids(&self) -> Result<Vec<i32>> {
        self.ids("USERS/ID")
    }

    pub fn admin_ids(&self) -> Result<Vec<i32>> {
        self.ids("ADMINS/ID")
    }
}

impl ResourceKind for Group {
    const PREFIX: &'static str = "one.group";
    const POOL_INFO: &'static str = "one.grouppool.info";
    const ELEMENT: &'static str = "GROUP";
}

impl UnfilteredPool for Group {}

impl Service<'_, Group> {
    pub async fn allocate(&self, name: &str) -> Result<Group> {
        allocate(self.client, vec![Value::from(name)]).await
    }

    pub async fn add_admin(&self, group: &Group, user: &User) -> Result<()> {
        let user_id = user.id()?;
        mutate(
            self.client,
            &procedure::<Group>("addadmin"),
            group,
            vec![Value::Int(user_id)],
        )
        .await?;
        Ok(())
    }

    pub async fn del_admin(&self, group: &Group, user: &User) -> Result<()> {
        let user_id = user.id()?;
        mutate(
            self.client,
            &procedure::<Group>("deladmin"),
            group,
            vec![Value::Int(user_id)],
        )
        .await?;
        Ok(())
    }

    /// Set the group's quota limits.
    pub async fn quota<B: Blueprint + ?Sized>(&self, group: &Group, quota: &B) -> Result<()> {
        let text = quota.render()?;
        mutate(
            self.client,
            &procedure::<Group>("quota"),
            group,
            vec![Value::String(text)],
        )
        .await?;
        Ok(())
    }
}
