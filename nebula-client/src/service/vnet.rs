//! Virtual networks and their address ranges.

use super::{
    allocate, create, mutate, procedure, FilteredPool, Lockable, Ownable, Renamable,
    ResourceKind, Service,
};
use super::Cluster;
use crate::error::Result;
use crate::resource::{envelope, Resource};
use crate::rpc::Value;
use crate::template::Blueprint;

envelope!(
    /// A virtual network snapshot.
    Vnet,
    "VNET"
);

/// One address range (`AR_POOL/AR`) of a virtual network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRange(Resource);

impl AddressRange {
    pub fn ar_id(&self) -> Result<i32> {
        self.0.parse_attribute("AR_ID")
    }

    /// `IP4`, `IP6`, `IP4_6` or `ETHER`.
    pub fn ar_type(&self) -> String {
        self.0.attribute("TYPE")
    }

    pub fn size(&self) -> Result<u32> {
        self.0.parse_attribute("SIZE")
    }

    /// First IPv4 address, empty for ranges without one.
    pub fn ip(&self) -> String {
        self.0.attribute("IP")
    }

    pub fn mac(&self) -> String {
        self.0.attribute("MAC")
    }

    pub fn used_leases(&self) -> Result<u32> {
        self.0.parse_attribute("USED_LEASES")
    }
}

impl std::ops::Deref for AddressRange {
    type Target = Resource;

    fn deref(&self) -> &Resource {
        &self.0
    }
}

impl Vnet {
    /// Address ranges, in document order.
    pub fn address_ranges(&self) -> Vec<AddressRange> {
        self.children("AR_POOL/AR")
            .into_iter()
            .map(AddressRange)
            .collect()
    }

    pub fn bridge(&self) -> String {
        self.attribute("BRIDGE")
    }

    pub fn vn_mad(&self) -> String {
        self.attribute("VN_MAD")
    }

    /// Network this one was reserved from, if any.
    pub fn parent_network_id(&self) -> Result<Option<i32>> {
        if self.attribute("PARENT_NETWORK_ID").trim().is_empty() {
            return Ok(None);
        }
        self.parse_attribute("PARENT_NETWORK_ID").map(Some)
    }

    pub fn cluster_ids(&self) -> Result<Vec<i32>> {
        self.ids("CLUSTERS/ID")
    }
}

impl ResourceKind for Vnet {
    const PREFIX: &'static str = "one.vn";
    const POOL_INFO: &'static str = "one.vnpool.info";
    const ELEMENT: &'static str = "VNET";
}

impl Ownable for Vnet {}
impl Renamable for Vnet {}
impl Lockable for Vnet {}
impl FilteredPool for Vnet {}

impl Service<'_, Vnet> {
    /// Create a network. `Cluster::none()` uses the default cluster.
    pub async fn allocate<B: Blueprint + ?Sized>(&self, blueprint: &B, cluster: &Cluster) -> Result<Vnet> {
        let template = blueprint.render()?;
        let cluster_id = cluster.reference_id()?;
        allocate(self.client, vec![Value::String(template), Value::Int(cluster_id)]).await
    }

    /// Add an address range described by an `AR = [ ... ]` template.
    pub async fn add_ar<B: Blueprint + ?Sized>(&self, vnet: &Vnet, range: &B) -> Result<()> {
        self.with_template("add_ar", vnet, range).await
    }

    pub async fn rm_ar(&self, vnet: &Vnet, ar_id: i32) -> Result<()> {
        self.with_ar("rm_ar", vnet, ar_id).await
    }

    pub async fn update_ar<B: Blueprint + ?Sized>(&self, vnet: &Vnet, range: &B) -> Result<()> {
        self.with_template("update_ar", vnet, range).await
    }

    /// Release every lease of a reservation's address range.
    pub async fn free_ar(&self, vnet: &Vnet, ar_id: i32) -> Result<()> {
        self.with_ar("free_ar", vnet, ar_id).await
    }

    /// Reserve addresses into a new network and return it.
    pub async fn reserve<B: Blueprint + ?Sized>(&self, vnet: &Vnet, reservation: &B) -> Result<Vnet> {
        let id = vnet.id()?;
        let text = reservation.render()?;
        create(
            self.client,
            &procedure::<Vnet>("reserve"),
            vec![Value::Int(id), Value::String(text)],
        )
        .await
    }

    /// Put leases on hold, e.g. `LEASES = [ IP = "10.0.0.5" ]`.
    pub async fn hold<B: Blueprint + ?Sized>(&self, vnet: &Vnet, leases: &B) -> Result<()> {
        self.with_template("hold", vnet, leases).await
    }

    pub async fn release<B: Blueprint + ?Sized>(&self, vnet: &Vnet, leases: &B) -> Result<()> {
        self.with_template("release", vnet, leases).await
    }

    async fn with_template<B: Blueprint + ?Sized>(&self, verb: &str, vnet: &Vnet, template: &B) -> Result<()> {
        let text = template.render()?;
        mutate(self.client, &procedure::<Vnet>(verb), vnet, vec![Value::String(text)]).await?;
        Ok(())
    }

    async fn with_ar(&self, verb: &str, vnet: &Vnet, ar_id: i32) -> Result<()> {
        mutate(self.client, &procedure::<Vnet>(verb), vnet, vec![Value::Int(ar_id)]).await?;
        Ok(())
    }
}
