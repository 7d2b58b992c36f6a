//! Virtual routers: highly available routing VMs between networks.

use super::{
    allocate, mutate, mutate_and_refetch, procedure, FilteredPool, Lockable, Ownable, Renamable,
    ResourceKind, Service,
};
use super::VmTemplate;
use crate::error::Result;
use crate::resource::envelope;
use crate::rpc::Value;
use crate::template::Blueprint;

envelope!(
    /// A virtual router snapshot.
    VirtualRouter,
    "VROUTER"
);

impl VirtualRouter {
    /// VMs implementing the router.
    pub fn vm_ids(&self) -> Result<Vec<i32>> {
        self.ids("VMS/ID")
    }
}

impl ResourceKind for VirtualRouter {
    const PREFIX: &'static str = "one.vrouter";
    const POOL_INFO: &'static str = "one.vrouterpool.info";
    const ELEMENT: &'static str = "VROUTER";
}

impl Ownable for VirtualRouter {}
impl Renamable for VirtualRouter {}
impl Lockable for VirtualRouter {}
impl FilteredPool for VirtualRouter {}

impl Service<'_, VirtualRouter> {
    pub async fn allocate<B: Blueprint + ?Sized>(&self, blueprint: &B) -> Result<VirtualRouter> {
        let template = blueprint.render()?;
        allocate(self.client, vec![Value::String(template)]).await
    }

    /// Start `count` router VMs from `template`.
    ///
    /// `name` may contain `%i` for the VM index; an empty name lets the
    /// server choose. Returns the router with its new VMs.
    pub async fn instantiate<B: Blueprint + ?Sized>(
        &self,
        router: &VirtualRouter,
        count: i32,
        template: &VmTemplate,
        name: &str,
        hold: bool,
        extra: &B,
    ) -> Result<VirtualRouter> {
        let template_id = template.id()?;
        let extra = extra.render()?;
        mutate_and_refetch(
            self.client,
            "instantiate",
            router,
            vec![
                Value::Int(count),
                Value::Int(template_id),
                Value::from(name),
                Value::Bool(hold),
                Value::String(extra),
            ],
        )
        .await
    }

    /// Add a NIC described by a `NIC = [ ... ]` template to every router VM.
    pub async fn attach_nic<B: Blueprint + ?Sized>(&self, router: &VirtualRouter, nic: &B) -> Result<()> {
        let template = nic.render()?;
        mutate(
            self.client,
            &procedure::<VirtualRouter>("attachnic"),
            router,
            vec![Value::String(template)],
        )
        .await?;
        Ok(())
    }

    pub async fn detach_nic(&self, router: &VirtualRouter, nic_id: i32) -> Result<()> {
        mutate(
            self.client,
            &procedure::<VirtualRouter>("detachnic"),
            router,
            vec![Value::Int(nic_id)],
        )
        .await?;
        Ok(())
    }
}
