//! Clusters: groupings of hosts, datastores and virtual networks.

use super::{allocate, mutate, procedure, Renamable, ResourceKind, Service, UnfilteredPool};
use super::{Datastore, Host, Vnet};
use crate::error::Result;
use crate::resource::envelope;
use crate::rpc::Value;

envelope!(
    /// A cluster snapshot.
    Cluster,
    "CLUSTER"
);

impl Cluster {
    /// Member host IDs, in document order.
    pub fn host_ids(&self) -> Result<Vec<i32>> {
        self.ids("HOSTS/ID")
    }

    pub fn datastore_ids(&self) -> Result<Vec<i32>> {
        self.ids("DATASTORES/ID")
    }

    pub fn vnet_ids(&self) -> Result<Vec<i32>> {
        self.ids("VNETS/ID")
    }
}

impl ResourceKind for Cluster {
    const PREFIX: &'static str = "one.cluster";
    const POOL_INFO: &'static str = "one.clusterpool.info";
    const ELEMENT: &'static str = "CLUSTER";
}

impl Renamable for Cluster {}
impl UnfilteredPool for Cluster {}

impl Service<'_, Cluster> {
    /// Create an empty cluster.
    pub async fn allocate(&self, name: &str) -> Result<Cluster> {
        allocate(self.client, vec![Value::from(name)]).await
    }

    pub async fn add_host(&self, cluster: &Cluster, host: &Host) -> Result<()> {
        self.member("addhost", cluster, host.id()?).await
    }

    pub async fn del_host(&self, cluster: &Cluster, host: &Host) -> Result<()> {
        self.member("delhost", cluster, host.id()?).await
    }

    pub async fn add_datastore(&self, cluster: &Cluster, datastore: &Datastore) -> Result<()> {
        self.member("adddatastore", cluster, datastore.id()?).await
    }

    pub async fn del_datastore(&self, cluster: &Cluster, datastore: &Datastore) -> Result<()> {
        self.member("deldatastore", cluster, datastore.id()?).await
    }

    pub async fn add_vnet(&self, cluster: &Cluster, vnet: &Vnet) -> Result<()> {
        self.member("addvnet", cluster, vnet.id()?).await
    }

    pub async fn del_vnet(&self, cluster: &Cluster, vnet: &Vnet) -> Result<()> {
        self.member("delvnet", cluster, vnet.id()?).await
    }

    async fn member(&self, verb: &str, cluster: &Cluster, member: i32) -> Result<()> {
        mutate(
            self.client,
            &procedure::<Cluster>(verb),
            cluster,
            vec![Value::Int(member)],
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{args, client, methods};
    use super::*;
    use crate::error::ClientError;

    #[tokio::test]
    async fn test_allocate_returns_fetched_cluster() {
        let (client, mock) = client();
        mock.succeed("one.cluster.allocate", 101).succeed(
            "one.cluster.info",
            "<CLUSTER><ID>101</ID><NAME>my_cluster</NAME><HOSTS/><DATASTORES/><VNETS/></CLUSTER>",
        );

        let cluster = client.clusters().allocate("my_cluster").await.unwrap();

        assert_eq!(cluster.name(), "my_cluster");
        assert_eq!(cluster.id().unwrap(), 101);
        assert!(cluster.host_ids().unwrap().is_empty());
        assert_eq!(methods(&mock), vec!["one.cluster.allocate", "one.cluster.info"]);
        assert_eq!(args(&mock, 0), vec![Value::from("my_cluster")]);
        assert_eq!(args(&mock, 1), vec![Value::Int(101), Value::Bool(false)]);
    }

    #[tokio::test]
    async fn test_failed_allocate_skips_info() {
        let (client, mock) = client();
        mock.fail("one.cluster.allocate", "[one.cluster.allocate] NAME is already taken", 0x2000);

        let err = client.clusters().allocate("default").await.unwrap_err();
        assert!(err.remote().is_some());
        assert_eq!(methods(&mock), vec!["one.cluster.allocate"]);
    }

    #[tokio::test]
    async fn test_info_of_missing_cluster() {
        let (client, mock) = client();
        mock.fail_on_object("one.cluster.info", "[one.cluster.info] Error getting cluster [999].", 0x0400, 999);

        let err = client.clusters().info(999).await.unwrap_err();
        let remote = err.remote().unwrap();
        assert!(remote.is_not_found());
        assert_eq!(remote.object_id, Some(999));
    }

    #[tokio::test]
    async fn test_membership_calls() {
        let (client, mock) = client();
        mock.succeed("one.cluster.addhost", 100)
            .succeed("one.cluster.delvnet", 100);

        let cluster = Cluster::with_id(100);
        client.clusters().add_host(&cluster, &Host::with_id(4)).await.unwrap();
        client.clusters().del_vnet(&cluster, &Vnet::with_id(9)).await.unwrap();

        assert_eq!(args(&mock, 0), vec![Value::Int(100), Value::Int(4)]);
        assert_eq!(args(&mock, 1), vec![Value::Int(100), Value::Int(9)]);
    }

    #[tokio::test]
    async fn test_membership_needs_member_id() {
        let (client, mock) = client();

        let err = client
            .clusters()
            .add_datastore(&Cluster::with_id(100), &Datastore::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Precondition(_)));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_member_ids_keep_document_order() {
        let cluster = Cluster::from(
            crate::resource::Resource::parse(
                "<CLUSTER><ID>0</ID><HOSTS><ID>7</ID><ID>2</ID></HOSTS>\
                 <DATASTORES><ID>1</ID><ID>0</ID><ID>2</ID></DATASTORES>\
                 <VNETS><ID>12</ID></VNETS></CLUSTER>",
            )
            .unwrap(),
        );
        assert_eq!(cluster.host_ids().unwrap(), vec![7, 2]);
        assert_eq!(cluster.datastore_ids().unwrap(), vec![1, 0, 2]);
        assert_eq!(cluster.vnet_ids().unwrap(), vec![12]);
    }
}
