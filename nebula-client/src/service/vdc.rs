//! Virtual data centers: groups mapped onto slices of zone resources.

use super::{allocate, mutate, procedure, Renamable, ResourceKind, Service, UnfilteredPool};
use super::{Cluster, Datastore, Group, Host, Vnet, Zone};
use crate::error::Result;
use crate::resource::envelope;
use crate::rpc::Value;
use crate::template::Blueprint;

envelope!(
    /// A VDC snapshot.
    Vdc,
    "VDC"
);

impl Vdc {
    pub fn group_ids(&self) -> Result<Vec<i32>> {
        self.ids("GROUPS/ID")
    }

    /// Cluster IDs of every zone, in document order.
    pub fn cluster_ids(&self) -> Result<Vec<i32>> {
        self.ids("CLUSTERS/CLUSTER/CLUSTER_ID")
    }

    pub fn host_ids(&self) -> Result<Vec<i32>> {
        self.ids("HOSTS/HOST/HOST_ID")
    }

    pub fn datastore_ids(&self) -> Result<Vec<i32>> {
        self.ids("DATASTORES/DATASTORE/DATASTORE_ID")
    }

    pub fn vnet_ids(&self) -> Result<Vec<i32>> {
        self.ids("VNETS/VNET/VNET_ID")
    }
}

impl ResourceKind for Vdc {
    const PREFIX: &'static str = "one.vdc";
    const POOL_INFO: &'static str = "one.vdcpool.info";
    const ELEMENT: &'static str = "VDC";
}

impl Renamable for Vdc {}
impl UnfilteredPool for Vdc {}

impl Service<'_, Vdc> {
    pub async fn allocate<B: Blueprint + ?Sized>(&self, blueprint: &B) -> Result<Vdc> {
        let template = blueprint.render()?;
        allocate(self.client, vec![Value::String(template)]).await
    }

    pub async fn add_group(&self, vdc: &Vdc, group: &Group) -> Result<()> {
        self.apply("addgroup", vdc, vec![Value::Int(group.id()?)]).await
    }

    pub async fn del_group(&self, vdc: &Vdc, group: &Group) -> Result<()> {
        self.apply("delgroup", vdc, vec![Value::Int(group.id()?)]).await
    }

    pub async fn add_cluster(&self, vdc: &Vdc, zone: &Zone, cluster: &Cluster) -> Result<()> {
        self.zoned("addcluster", vdc, zone, cluster.id()?).await
    }

    pub async fn del_cluster(&self, vdc: &Vdc, zone: &Zone, cluster: &Cluster) -> Result<()> {
        self.zoned("delcluster", vdc, zone, cluster.id()?).await
    }

    pub async fn add_host(&self, vdc: &Vdc, zone: &Zone, host: &Host) -> Result<()> {
        self.zoned("addhost", vdc, zone, host.id()?).await
    }

    pub async fn del_host(&self, vdc: &Vdc, zone: &Zone, host: &Host) -> Result<()> {
        self.zoned("delhost", vdc, zone, host.id()?).await
    }

    pub async fn add_datastore(&self, vdc: &Vdc, zone: &Zone, datastore: &Datastore) -> Result<()> {
        self.zoned("adddatastore", vdc, zone, datastore.id()?).await
    }

    pub async fn del_datastore(&self, vdc: &Vdc, zone: &Zone, datastore: &Datastore) -> Result<()> {
        self.zoned("deldatastore", vdc, zone, datastore.id()?).await
    }

    pub async fn add_vnet(&self, vdc: &Vdc, zone: &Zone, vnet: &Vnet) -> Result<()> {
        self.zoned("addvnet", vdc, zone, vnet.id()?).await
    }

    pub async fn del_vnet(&self, vdc: &Vdc, zone: &Zone, vnet: &Vnet) -> Result<()> {
        self.zoned("delvnet", vdc, zone, vnet.id()?).await
    }

    async fn zoned(&self, verb: &str, vdc: &Vdc, zone: &Zone, member: i32) -> Result<()> {
        let zone_id = zone.id()?;
        self.apply(verb, vdc, vec![Value::Int(zone_id), Value::Int(member)])
            .await
    }

    async fn apply(&self, verb: &str, vdc: &Vdc, extra: Vec<Value>) -> Result<()> {
        mutate(self.client, &procedure::<Vdc>(verb), vdc, extra).await?;
        Ok(())
    }
}
