//! Virtual network templates.

use super::{
    allocate, create, procedure, FilteredPool, Lockable, Ownable, Renamable, ResourceKind, Service,
};
use super::Vnet;
use crate::error::Result;
use crate::resource::envelope;
use crate::rpc::Value;
use crate::template::Blueprint;

envelope!(
    /// A virtual network template snapshot.
    VnTemplate,
    "VNTEMPLATE"
);

impl ResourceKind for VnTemplate {
    const PREFIX: &'static str = "one.vntemplate";
    const POOL_INFO: &'static str = "one.vntemplatepool.info";
    const ELEMENT: &'static str = "VNTEMPLATE";
}

impl Ownable for VnTemplate {}
impl Renamable for VnTemplate {}
impl Lockable for VnTemplate {}
impl FilteredPool for VnTemplate {}

impl Service<'_, VnTemplate> {
    pub async fn allocate<B: Blueprint + ?Sized>(&self, blueprint: &B) -> Result<VnTemplate> {
        let template = blueprint.render()?;
        allocate(self.client, vec![Value::String(template)]).await
    }

    pub async fn clone_as(&self, template: &VnTemplate, name: &str) -> Result<VnTemplate> {
        let id = template.id()?;
        create(
            self.client,
            &procedure::<VnTemplate>("clone"),
            vec![Value::Int(id), Value::from(name)],
        )
        .await
    }

    /// Create a virtual network from the template, `extra` merged over it.
    pub async fn instantiate<B: Blueprint + ?Sized>(
        &self,
        template: &VnTemplate,
        name: &str,
        extra: &B,
    ) -> Result<Vnet> {
        let id = template.id()?;
        let extra = extra.render()?;
        create(
            self.client,
            &procedure::<VnTemplate>("instantiate"),
            vec![Value::Int(id), Value::from(name), Value::String(extra)],
        )
        .await
    }
}
