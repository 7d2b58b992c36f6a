//! Datastores: image, system and file storage backends.

use super::{allocate, mutate, procedure, Ownable, Renamable, ResourceKind, Service, UnfilteredPool};
use super::Cluster;
use crate::error::Result;
use crate::resource::{envelope, lookup_state};
use crate::rpc::Value;
use crate::template::Blueprint;

envelope!(
    /// A datastore snapshot.
    Datastore,
    "DATASTORE"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatastoreState {
    Ready,
    Disabled,
}

impl DatastoreState {
    fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(DatastoreState::Ready),
            1 => Some(DatastoreState::Disabled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatastoreType {
    Image,
    System,
    File,
}

impl DatastoreType {
    fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(DatastoreType::Image),
            1 => Some(DatastoreType::System),
            2 => Some(DatastoreType::File),
            _ => None,
        }
    }
}

impl Datastore {
    pub fn state(&self) -> Result<DatastoreState> {
        lookup_state(self, "STATE", "datastore state", DatastoreState::from_code)
    }

    pub fn datastore_type(&self) -> Result<DatastoreType> {
        lookup_state(self, "TYPE", "datastore type", DatastoreType::from_code)
    }

    pub fn total_mb(&self) -> Result<u64> {
        self.parse_attribute("TOTAL_MB")
    }

    pub fn free_mb(&self) -> Result<u64> {
        self.parse_attribute("FREE_MB")
    }

    pub fn used_mb(&self) -> Result<u64> {
        self.parse_attribute("USED_MB")
    }

    pub fn image_ids(&self) -> Result<Vec<i32>> {
        self.ids("IMAGES/ID")
    }

    pub fn cluster_ids(&self) -> Result<Vec<i32>> {
        self.ids("CLUSTERS/ID")
    }
}

impl ResourceKind for Datastore {
    const PREFIX: &'static str = "one.datastore";
    const POOL_INFO: &'static str = "one.datastorepool.info";
    const ELEMENT: &'static str = "DATASTORE";
}

impl Ownable for Datastore {}
impl Renamable for Datastore {}
impl UnfilteredPool for Datastore {}

impl Service<'_, Datastore> {
    /// Create a datastore. `Cluster::none()` uses the default cluster.
    pub async fn allocate<B: Blueprint + ?Sized>(
        &self,
        blueprint: &B,
        cluster: &Cluster,
    ) -> Result<Datastore> {
        let template = blueprint.render()?;
        let cluster_id = cluster.reference_id()?;
        allocate(self.client, vec![Value::String(template), Value::Int(cluster_id)]).await
    }

    pub async fn enable(&self, datastore: &Datastore, enabled: bool) -> Result<()> {
        mutate(
            self.client,
            &procedure::<Datastore>("enable"),
            datastore,
            vec![Value::Bool(enabled)],
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
    use crate::resource::Resource;
    use crate::template::Template;

    const DATASTORE: &str = "<DATASTORE><ID>100</ID><NAME>ceph-images</NAME>\
                             <STATE>0</STATE><TYPE>0</TYPE>\
                             <TOTAL_MB>1024000</TOTAL_MB><FREE_MB>512000</FREE_MB><USED_MB>512000</USED_MB>\
                             <CLUSTERS><ID>0</ID><ID>100</ID></CLUSTERS><IMAGES><ID>3</ID></IMAGES></DATASTORE>";

    #[tokio::test]
    async fn test_allocate_renders_template() {
        let (client, mock) = client();
        mock.succeed("one.datastore.allocate", 100)
            .succeed("one.datastore.info", DATASTORE);

        let template = Template::new()
            .set("NAME", "ceph-images")
            .set("DS_MAD", "ceph")
            .set("TM_MAD", "ceph");
        let datastore = client
            .datastores()
            .allocate(&template, &Cluster::with_id(100))
            .await
            .unwrap();

        assert_eq!(datastore.name(), "ceph-images");
        assert_eq!(
            args(&mock, 0),
            vec![
                Value::from("NAME = \"ceph-images\"\nDS_MAD = \"ceph\"\nTM_MAD = \"ceph\""),
                Value::Int(100)
            ]
        );
    }

    #[tokio::test]
    async fn test_render_failure_sends_nothing() {
        let (client, mock) = client();

        let err = client
            .datastores()
            .allocate(&Template::new().set("DS MAD", "ceph"), &Cluster::none())
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Render(_)));
        assert!(methods(&mock).is_empty());
    }

    #[tokio::test]
    async fn test_enable() {
        let (client, mock) = client();
        mock.succeed("one.datastore.enable", 100);

        client
            .datastores()
            .enable(&Datastore::with_id(100), false)
            .await
            .unwrap();
        assert_eq!(args(&mock, 0), vec![Value::Int(100), Value::Bool(false)]);
    }

    #[test]
    fn test_accessors() {
        let datastore = Datastore::from(Resource::parse(DATASTORE).unwrap());
        assert_eq!(datastore.state().unwrap(), DatastoreState::Ready);
        assert_eq!(datastore.datastore_type().unwrap(), DatastoreType::Image);
        assert_eq!(datastore.free_mb().unwrap(), 512_000);
        assert_eq!(datastore.cluster_ids().unwrap(), vec![0, 100]);
        assert_eq!(datastore.image_ids().unwrap(), vec![3]);
    }

    #[test]
    fn test_unknown_type_fails_closed() {
        let datastore =
            Datastore::from(Resource::parse("<DATASTORE><ID>1</ID><TYPE>7</TYPE></DATASTORE>").unwrap());
        assert!(matches!(
            datastore.datastore_type(),
            Err(ClientError::UnknownValue { kind: "datastore type", .. })
        ));
    }
}
