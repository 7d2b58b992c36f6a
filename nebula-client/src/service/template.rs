//! VM templates.

use super::{
    allocate, create, mutate, procedure, FilteredPool, Lockable, Ownable, Renamable,
    ResourceKind, Service,
};
use super::Vm;
use crate::error::Result;
use crate::permissions::PermissionMatrix;
use crate::resource::envelope;
use crate::rpc::Value;
use crate::template::Blueprint;

envelope!(
    /// A VM template snapshot.
    VmTemplate,
    "VMTEMPLATE"
);

impl ResourceKind for VmTemplate {
    const PREFIX: &'static str = "one.template";
    const POOL_INFO: &'static str = "one.templatepool.info";
    const ELEMENT: &'static str = "VMTEMPLATE";

    /// `(id, extended, decrypt)`
    fn info_args(id: i32) -> Vec<Value> {
        vec![Value::Int(id), Value::Bool(false), Value::Bool(false)]
    }
}

impl Ownable for VmTemplate {}
impl Renamable for VmTemplate {}
impl Lockable for VmTemplate {}
impl FilteredPool for VmTemplate {}

impl Service<'_, VmTemplate> {
    pub async fn allocate<B: Blueprint + ?Sized>(&self, blueprint: &B) -> Result<VmTemplate> {
        let template = blueprint.render()?;
        allocate(self.client, vec![Value::String(template)]).await
    }

    /// Copy the template; `recursive` also clones the images it uses.
    pub async fn clone_as(
        &self,
        template: &VmTemplate,
        name: &str,
        recursive: bool,
    ) -> Result<VmTemplate> {
        let id = template.id()?;
        create(
            self.client,
            &procedure::<VmTemplate>("clone"),
            vec![Value::Int(id), Value::from(name), Value::Bool(recursive)],
        )
        .await
    }

    /// Delete the template together with its images.
    pub async fn delete_recursive(&self, template: &VmTemplate) -> Result<()> {
        mutate(
            self.client,
            &procedure::<VmTemplate>("delete"),
            template,
            vec![Value::Bool(true)],
        )
        .await?;
        Ok(())
    }

    /// Create a VM from the template.
    ///
    /// `extra` is merged over the template; `hold` leaves the VM on hold;
    /// `persistent` gives the VM private copies of the template's images.
    pub async fn instantiate<B: Blueprint + ?Sized>(
        &self,
        template: &VmTemplate,
        name: &str,
        hold: bool,
        extra: &B,
        persistent: bool,
    ) -> Result<Vm> {
        let id = template.id()?;
        let extra = extra.render()?;
        create(
            self.client,
            &procedure::<VmTemplate>("instantiate"),
            vec![
                Value::Int(id),
                Value::from(name),
                Value::Bool(hold),
                Value::String(extra),
                Value::Bool(persistent),
            ],
        )
        .await
    }

    /// `chmod` applied to the template and the images it uses.
    pub async fn chmod_recursive(
        &self,
        template: &VmTemplate,
        matrix: &PermissionMatrix,
    ) -> Result<()> {
        let mut args = matrix.to_args();
        args.push(Value::Bool(true));
        mutate(self.client, &procedure::<VmTemplate>("chmod"), template, args).await?;
        Ok(())
    }
}
