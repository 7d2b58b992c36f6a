//! Security groups: firewall rule sets applied to NICs.

use super::{
    allocate, create, mutate, procedure, FilteredPool, Ownable, Renamable, ResourceKind, Service,
};
use crate::error::Result;
use crate::resource::{envelope, Resource};
use crate::rpc::Value;
use crate::template::Blueprint;

envelope!(
    /// A security group snapshot.
    SecurityGroup,
    "SECURITY_GROUP"
);

impl SecurityGroup {
    /// `TEMPLATE/RULE` entries in document order.
    pub fn rules(&self) -> Vec<Resource> {
        self.children("TEMPLATE/RULE")
    }

    /// VMs already running the current rules.
    pub fn updated_vm_ids(&self) -> Result<Vec<i32>> {
        self.ids("UPDATED_VMS/ID")
    }

    /// VMs still waiting for the current rules.
    pub fn outdated_vm_ids(&self) -> Result<Vec<i32>> {
        self.ids("OUTDATED_VMS/ID")
    }

    pub fn error_vm_ids(&self) -> Result<Vec<i32>> {
        self.ids("ERROR_VMS/ID")
    }
}

impl ResourceKind for SecurityGroup {
    const PREFIX: &'static str = "one.secgroup";
    const POOL_INFO: &'static str = "one.secgrouppool.info";
    const ELEMENT: &'static str = "SECURITY_GROUP";
}

impl Ownable for SecurityGroup {}
impl Renamable for SecurityGroup {}
impl FilteredPool for SecurityGroup {}

impl Service<'_, SecurityGroup> {
    pub async fn allocate<B: Blueprint + ?Sized>(&self, blueprint: &B) -> Result<SecurityGroup> {
        let template = blueprint.render()?;
        allocate(self.client, vec![Value::String(template)]).await
    }

    pub async fn clone_as(&self, group: &SecurityGroup, name: &str) -> Result<SecurityGroup> {
        let id = group.id()?;
        create(
            self.client,
            &procedure::<SecurityGroup>("clone"),
            vec![Value::Int(id), Value::from(name)],
        )
        .await
    }

    /// Push the rules to every VM using the group.
    ///
    /// With `recovery` only outdated and failed VMs are updated.
    pub async fn commit(&self, group: &SecurityGroup, recovery: bool) -> Result<()> {
        mutate(
            self.client,
            &procedure::<SecurityGroup>("commit"),
            group,
            vec![Value::Bool(recovery)],
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{args, client, methods};
    use super::*;

    #[tokio::test]
    async fn test_clone_and_commit() {
        let (client, mock) = client();
        mock.succeed("one.secgroup.clone", 101)
            .succeed(
                "one.secgroup.info",
                "<SECURITY_GROUP><ID>101</ID><NAME>web-copy</NAME></SECURITY_GROUP>",
            )
            .succeed("one.secgroup.commit", 101);

        let groups = client.security_groups();
        let copy = groups
            .clone_as(&SecurityGroup::with_id(100), "web-copy")
            .await
            .unwrap();
        groups.commit(&copy, true).await.unwrap();

        assert_eq!(
            methods(&mock),
            vec!["one.secgroup.clone", "one.secgroup.info", "one.secgroup.commit"]
        );
        assert_eq!(args(&mock, 0), vec![Value::Int(100), Value::from("web-copy")]);
        assert_eq!(args(&mock, 2), vec![Value::Int(101), Value::Bool(true)]);
    }

    #[test]
    fn test_rules_and_vm_sets() {
        let group = SecurityGroup::from(
            Resource::parse(
                "<SECURITY_GROUP><ID>100</ID>\
                 <UPDATED_VMS><ID>4</ID></UPDATED_VMS><OUTDATED_VMS><ID>9</ID><ID>3</ID></OUTDATED_VMS>\
                 <ERROR_VMS/>\
                 <TEMPLATE><RULE><PROTOCOL>TCP</PROTOCOL><RANGE>80</RANGE></RULE>\
                 <RULE><PROTOCOL>ICMP</PROTOCOL></RULE></TEMPLATE></SECURITY_GROUP>",
            )
            .unwrap(),
        );

        let rules = group.rules();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].attribute("RANGE"), "80");
        assert_eq!(rules[1].attribute("PROTOCOL"), "ICMP");
        assert_eq!(group.updated_vm_ids().unwrap(), vec![4]);
        assert_eq!(group.outdated_vm_ids().unwrap(), vec![9, 3]);
        assert!(group.error_vm_ids().unwrap().is_empty());
    }
}
