//! Hosts: hypervisor nodes registered with the control plane.

use super::{allocate, mutate, procedure, Renamable, ResourceKind, Service, UnfilteredPool};
use super::Cluster;
use crate::error::Result;
use crate::resource::{envelope, lookup_state, Resource};
use crate::rpc::Value;

envelope!(
    /// A host snapshot.
    Host,
    "HOST"
);

/// Host lifecycle state (`STATE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostState {
    Init,
    MonitoringMonitored,
    Monitored,
    Error,
    Disabled,
    MonitoringError,
    MonitoringInit,
    MonitoringDisabled,
    Offline,
}

impl HostState {
    fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(HostState::Init),
            1 => Some(HostState::MonitoringMonitored),
            2 => Some(HostState::Monitored),
            3 => Some(HostState::Error),
            4 => Some(HostState::Disabled),
            5 => Some(HostState::MonitoringError),
            6 => Some(HostState::MonitoringInit),
            7 => Some(HostState::MonitoringDisabled),
            8 => Some(HostState::Offline),
            _ => None,
        }
    }

    /// Whether the scheduler may place VMs on the host.
    pub fn is_schedulable(self) -> bool {
        matches!(self, HostState::Monitored | HostState::MonitoringMonitored)
    }
}

/// Administrative status set through `one.host.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostStatus {
    Enabled,
    Disabled,
    Offline,
}

impl HostStatus {
    pub fn wire(self) -> i32 {
        match self {
            HostStatus::Enabled => 0,
            HostStatus::Disabled => 1,
            HostStatus::Offline => 2,
        }
    }
}

impl Host {
    pub fn state(&self) -> Result<HostState> {
        lookup_state(self, "STATE", "host state", HostState::from_code)
    }

    /// IDs of the VMs running on the host.
    pub fn vm_ids(&self) -> Result<Vec<i32>> {
        self.ids("VMS/ID")
    }

    pub fn cluster_id(&self) -> Result<i32> {
        self.parse_attribute("CLUSTER_ID")
    }

    /// Information driver.
    pub fn im_mad(&self) -> String {
        self.attribute("IM_MAD")
    }

    /// Virtualization driver.
    pub fn vm_mad(&self) -> String {
        self.attribute("VM_MAD")
    }
}

impl ResourceKind for Host {
    const PREFIX: &'static str = "one.host";
    const POOL_INFO: &'static str = "one.hostpool.info";
    const ELEMENT: &'static str = "HOST";
}

impl Renamable for Host {}
impl UnfilteredPool for Host {}

impl Service<'_, Host> {
    /// Register a host. `Cluster::none()` places it in the default cluster.
    pub async fn allocate(
        &self,
        name: &str,
        im_mad: &str,
        vm_mad: &str,
        cluster: &Cluster,
    ) -> Result<Host> {
        let cluster_id = cluster.reference_id()?;
        allocate(
            self.client,
            vec![
                Value::from(name),
                Value::from(im_mad),
                Value::from(vm_mad),
                Value::Int(cluster_id),
            ],
        )
        .await
    }

    pub async fn set_status(&self, host: &Host, status: HostStatus) -> Result<()> {
        mutate(
            self.client,
            &procedure::<Host>("status"),
            host,
            vec![Value::Int(status.wire())],
        )
        .await?;
        Ok(())
    }

    /// Monitoring records of the host.
    pub async fn monitoring(&self, host: &Host) -> Result<Resource> {
        let result = mutate(self.client, &procedure::<Host>("monitoring"), host, Vec::new()).await?;
        Resource::parse(result.body()?)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{args, client};
    use super::*;
    use crate::error::ClientError;

    const HOST: &str = "<HOST><ID>4</ID><NAME>kvm-04</NAME><STATE>2</STATE>\
                        <IM_MAD>kvm</IM_MAD><VM_MAD>kvm</VM_MAD><CLUSTER_ID>0</CLUSTER_ID>\
                        <VMS><ID>31</ID><ID>12</ID></VMS></HOST>";

    #[tokio::test]
    async fn test_allocate_in_default_cluster() {
        let (client, mock) = client();
        mock.succeed("one.host.allocate", 4).succeed("one.host.info", HOST);

        let host = client
            .hosts()
            .allocate("kvm-04", "kvm", "kvm", &Cluster::none())
            .await
            .unwrap();

        assert_eq!(host.name(), "kvm-04");
        assert_eq!(
            args(&mock, 0),
            vec![
                Value::from("kvm-04"),
                Value::from("kvm"),
                Value::from("kvm"),
                Value::Int(-1)
            ]
        );
    }

    #[tokio::test]
    async fn test_set_status() {
        let (client, mock) = client();
        mock.succeed("one.host.status", 4);

        client
            .hosts()
            .set_status(&Host::with_id(4), HostStatus::Offline)
            .await
            .unwrap();
        assert_eq!(args(&mock, 0), vec![Value::Int(4), Value::Int(2)]);
    }

    #[tokio::test]
    async fn test_monitoring() {
        let (client, mock) = client();
        mock.succeed(
            "one.host.monitoring",
            "<MONITORING_DATA><MONITORING><TIMESTAMP>1700000000</TIMESTAMP></MONITORING></MONITORING_DATA>",
        );

        let data = client.hosts().monitoring(&Host::with_id(4)).await.unwrap();
        assert_eq!(data.attribute("MONITORING/TIMESTAMP"), "1700000000");
        assert_eq!(args(&mock, 0), vec![Value::Int(4)]);
    }

    #[test]
    fn test_accessors() {
        let host = Host::from(Resource::parse(HOST).unwrap());
        assert_eq!(host.state().unwrap(), HostState::Monitored);
        assert!(host.state().unwrap().is_schedulable());
        assert_eq!(host.vm_ids().unwrap(), vec![31, 12]);
        assert_eq!(host.cluster_id().unwrap(), 0);
        assert_eq!(host.vm_mad(), "kvm");
    }

    #[test]
    fn test_unknown_state_fails_closed() {
        let host = Host::from(Resource::parse("<HOST><ID>1</ID><STATE>42</STATE></HOST>").unwrap());
        assert!(matches!(host.state(), Err(ClientError::UnknownValue { .. })));

        let host = Host::with_id(1);
        assert!(host.state().is_err());
    }
}
