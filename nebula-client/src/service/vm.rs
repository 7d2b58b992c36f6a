//! Virtual machines.
//!
//! Besides the common operations, VMs carry two state machines: the
//! coarse [`VmState`] and, while active, the fine-grained [`LcmState`].
//! Both are read from the snapshot on every call and fail closed on codes
//! outside the known tables.

use tracing::info;

use super::{
    allocate, create, fetch, list, mutate, procedure, FilteredPool, Lockable, Ownable,
    Renamable, ResourceKind, Service,
};
use super::{Datastore, Host, Image, ImageType};
use crate::error::Result;
use crate::filter::{pool_args, OwnershipFilter, Page, PoolFilter, VmStateFilter};
use crate::request::ResizeRequest;
use crate::resource::{envelope, lookup_state, Resource};
use crate::rpc::Value;
use crate::template::Blueprint;

envelope!(
    /// A virtual machine snapshot.
    Vm,
    "VM"
);

// =============================================================================
// States
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VmState {
    Init,
    Pending,
    Hold,
    Active,
    Stopped,
    Suspended,
    Done,
    Poweroff,
    Undeployed,
    Cloning,
    CloningFailure,
}

impl VmState {
    fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(VmState::Init),
            1 => Some(VmState::Pending),
            2 => Some(VmState::Hold),
            3 => Some(VmState::Active),
            4 => Some(VmState::Stopped),
            5 => Some(VmState::Suspended),
            6 => Some(VmState::Done),
            8 => Some(VmState::Poweroff),
            9 => Some(VmState::Undeployed),
            10 => Some(VmState::Cloning),
            11 => Some(VmState::CloningFailure),
            _ => None,
        }
    }

    /// Pool filter selecting VMs in this state.
    pub fn filter(self) -> VmStateFilter {
        match self {
            VmState::Init => VmStateFilter::Init,
            VmState::Pending => VmStateFilter::Pending,
            VmState::Hold => VmStateFilter::Hold,
            VmState::Active => VmStateFilter::Active,
            VmState::Stopped => VmStateFilter::Stopped,
            VmState::Suspended => VmStateFilter::Suspended,
            VmState::Done => VmStateFilter::Done,
            VmState::Poweroff => VmStateFilter::Poweroff,
            VmState::Undeployed => VmStateFilter::Undeployed,
            VmState::Cloning => VmStateFilter::Cloning,
            VmState::CloningFailure => VmStateFilter::CloningFailure,
        }
    }
}

/// Life-cycle manager sub-state, meaningful while the VM is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LcmState {
    LcmInit,
    Prolog,
    Boot,
    Running,
    Migrate,
    SaveStop,
    SaveSuspend,
    SaveMigrate,
    PrologMigrate,
    PrologResume,
    EpilogStop,
    Epilog,
    Shutdown,
    CleanupResubmit,
    Unknown,
    Hotplug,
    ShutdownPoweroff,
    BootUnknown,
    BootPoweroff,
    BootSuspended,
    BootStopped,
    CleanupDelete,
    HotplugSnapshot,
    HotplugNic,
    HotplugSaveas,
    HotplugSaveasPoweroff,
    HotplugSaveasSuspended,
    ShutdownUndeploy,
    EpilogUndeploy,
    PrologUndeploy,
    BootUndeploy,
}

impl LcmState {
    fn from_code(code: i32) -> Option<Self> {
        use LcmState::*;
        let state = match code {
            0 => LcmInit,
            1 => Prolog,
            2 => Boot,
            3 => Running,
            4 => Migrate,
            5 => SaveStop,
            6 => SaveSuspend,
            7 => SaveMigrate,
            8 => PrologMigrate,
            9 => PrologResume,
            10 => EpilogStop,
            11 => Epilog,
            12 => Shutdown,
            15 => CleanupResubmit,
            16 => Unknown,
            17 => Hotplug,
            18 => ShutdownPoweroff,
            19 => BootUnknown,
            20 => BootPoweroff,
            21 => BootSuspended,
            22 => BootStopped,
            23 => CleanupDelete,
            24 => HotplugSnapshot,
            25 => HotplugNic,
            26 => HotplugSaveas,
            27 => HotplugSaveasPoweroff,
            28 => HotplugSaveasSuspended,
            29 => ShutdownUndeploy,
            30 => EpilogUndeploy,
            31 => PrologUndeploy,
            32 => BootUndeploy,
            _ => return None,
        };
        Some(state)
    }
}

// =============================================================================
// Operations
// =============================================================================

/// Operations accepted by `one.vm.action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VmAction {
    Terminate,
    TerminateHard,
    Undeploy,
    UndeployHard,
    Poweroff,
    PoweroffHard,
    Reboot,
    RebootHard,
    Hold,
    Release,
    Stop,
    Suspend,
    Resume,
    Resched,
    Unresched,
}

impl VmAction {
    pub fn wire(self) -> &'static str {
        match self {
            VmAction::Terminate => "terminate",
            VmAction::TerminateHard => "terminate-hard",
            VmAction::Undeploy => "undeploy",
            VmAction::UndeployHard => "undeploy-hard",
            VmAction::Poweroff => "poweroff",
            VmAction::PoweroffHard => "poweroff-hard",
            VmAction::Reboot => "reboot",
            VmAction::RebootHard => "reboot-hard",
            VmAction::Hold => "hold",
            VmAction::Release => "release",
            VmAction::Stop => "stop",
            VmAction::Suspend => "suspend",
            VmAction::Resume => "resume",
            VmAction::Resched => "resched",
            VmAction::Unresched => "unresched",
        }
    }
}

impl std::str::FromStr for VmAction {
    type Err = crate::error::ClientError;

    fn from_str(s: &str) -> Result<Self> {
        const ALL: [VmAction; 15] = [
            VmAction::Terminate,
            VmAction::TerminateHard,
            VmAction::Undeploy,
            VmAction::UndeployHard,
            VmAction::Poweroff,
            VmAction::PoweroffHard,
            VmAction::Reboot,
            VmAction::RebootHard,
            VmAction::Hold,
            VmAction::Release,
            VmAction::Stop,
            VmAction::Suspend,
            VmAction::Resume,
            VmAction::Resched,
            VmAction::Unresched,
        ];
        ALL.into_iter()
            .find(|action| action.wire() == s)
            .ok_or_else(|| crate::error::ClientError::unknown("vm action", s))
    }
}

/// How a cold migration moves the VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MigrationType {
    #[default]
    Save,
    Poweroff,
    PoweroffHard,
}

impl MigrationType {
    pub fn wire(self) -> i32 {
        match self {
            MigrationType::Save => 0,
            MigrationType::Poweroff => 1,
            MigrationType::PoweroffHard => 2,
        }
    }
}

/// Ways to resolve a VM stuck in a transient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecoverOperation {
    Failure,
    Success,
    Retry,
    Delete,
    DeleteRecreate,
    DeleteDb,
}

impl RecoverOperation {
    pub fn wire(self) -> i32 {
        match self {
            RecoverOperation::Failure => 0,
            RecoverOperation::Success => 1,
            RecoverOperation::Retry => 2,
            RecoverOperation::Delete => 3,
            RecoverOperation::DeleteRecreate => 4,
            RecoverOperation::DeleteDb => 5,
        }
    }
}

// =============================================================================
// Sub-resources
// =============================================================================

/// A disk attached to a VM (`TEMPLATE/DISK`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disk(Resource);

impl Disk {
    pub fn disk_id(&self) -> Result<i32> {
        self.0.parse_attribute("DISK_ID")
    }

    /// Source image, empty for volatile disks.
    pub fn image(&self) -> String {
        self.0.attribute("IMAGE")
    }

    pub fn image_id(&self) -> Result<Option<i32>> {
        if self.0.attribute("IMAGE_ID").trim().is_empty() {
            return Ok(None);
        }
        self.0.parse_attribute("IMAGE_ID").map(Some)
    }

    pub fn target(&self) -> String {
        self.0.attribute("TARGET")
    }

    pub fn size_mb(&self) -> Result<u64> {
        self.0.parse_attribute("SIZE")
    }
}

impl std::ops::Deref for Disk {
    type Target = Resource;

    fn deref(&self) -> &Resource {
        &self.0
    }
}

/// A network interface of a VM (`TEMPLATE/NIC`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nic(Resource);

impl Nic {
    pub fn nic_id(&self) -> Result<i32> {
        self.0.parse_attribute("NIC_ID")
    }

    pub fn network(&self) -> String {
        self.0.attribute("NETWORK")
    }

    pub fn network_id(&self) -> Result<i32> {
        self.0.parse_attribute("NETWORK_ID")
    }

    pub fn ip(&self) -> String {
        self.0.attribute("IP")
    }

    pub fn mac(&self) -> String {
        self.0.attribute("MAC")
    }
}

impl std::ops::Deref for Nic {
    type Target = Resource;

    fn deref(&self) -> &Resource {
        &self.0
    }
}

impl Vm {
    pub fn state(&self) -> Result<VmState> {
        lookup_state(self, "STATE", "vm state", VmState::from_code)
    }

    pub fn lcm_state(&self) -> Result<LcmState> {
        lookup_state(self, "LCM_STATE", "vm lcm state", LcmState::from_code)
    }

    /// Disks in document order.
    pub fn disks(&self) -> Vec<Disk> {
        self.children("TEMPLATE/DISK").into_iter().map(Disk).collect()
    }

    /// NICs in document order.
    pub fn nics(&self) -> Vec<Nic> {
        self.children("TEMPLATE/NIC").into_iter().map(Nic).collect()
    }

    /// Host of the latest placement, empty if the VM was never deployed.
    pub fn host_name(&self) -> String {
        self.attributes("HISTORY_RECORDS/HISTORY/HOSTNAME")
            .pop()
            .unwrap_or_default()
    }

    pub fn vcpu(&self) -> Result<u32> {
        self.parse_attribute("TEMPLATE/VCPU")
    }

    pub fn memory_mb(&self) -> Result<u64> {
        self.parse_attribute("TEMPLATE/MEMORY")
    }

    pub fn snapshot_ids(&self) -> Result<Vec<i32>> {
        self.ids("TEMPLATE/SNAPSHOT/SNAPSHOT_ID")
    }
}

impl ResourceKind for Vm {
    const PREFIX: &'static str = "one.vm";
    const POOL_INFO: &'static str = "one.vmpool.info";
    const ELEMENT: &'static str = "VM";
}

impl Ownable for Vm {}
impl Renamable for Vm {}
impl Lockable for Vm {}

impl FilteredPool for Vm {
    fn extra_pool_args() -> Vec<Value> {
        vec![Value::Int(VmStateFilter::AnyState.wire())]
    }
}

impl Service<'_, Vm> {
    /// Create a VM from a full template; `hold` keeps it out of scheduling.
    pub async fn allocate<B: Blueprint + ?Sized>(&self, blueprint: &B, hold: bool) -> Result<Vm> {
        let template = blueprint.render()?;
        allocate(self.client, vec![Value::String(template), Value::Bool(hold)]).await
    }

    /// Run a life-cycle action.
    pub async fn action(&self, vm: &Vm, action: VmAction) -> Result<()> {
        let id = vm.id()?;
        self.client
            .call(
                &procedure::<Vm>("action"),
                vec![Value::from(action.wire()), Value::Int(id)],
            )
            .await?;
        info!(vm_id = id, action = action.wire(), "VM action requested");
        Ok(())
    }

    /// Place a pending VM on `host`. `Datastore::none()` lets the server pick.
    pub async fn deploy(&self, vm: &Vm, host: &Host, enforce: bool, datastore: &Datastore) -> Result<()> {
        let host_id = host.id()?;
        let datastore_id = datastore.reference_id()?;
        self.apply(
            "deploy",
            vm,
            vec![Value::Int(host_id), Value::Bool(enforce), Value::Int(datastore_id)],
        )
        .await
    }

    pub async fn migrate(
        &self,
        vm: &Vm,
        host: &Host,
        live: bool,
        enforce: bool,
        datastore: &Datastore,
        migration: MigrationType,
    ) -> Result<()> {
        let host_id = host.id()?;
        let datastore_id = datastore.reference_id()?;
        self.apply(
            "migrate",
            vm,
            vec![
                Value::Int(host_id),
                Value::Bool(live),
                Value::Bool(enforce),
                Value::Int(datastore_id),
                Value::Int(migration.wire()),
            ],
        )
        .await
    }

    /// Change capacity. Unset fields keep their current value.
    pub async fn resize(&self, vm: &Vm, request: &ResizeRequest) -> Result<()> {
        let template = request.render()?;
        self.apply(
            "resize",
            vm,
            vec![Value::String(template), Value::Bool(request.enforce)],
        )
        .await
    }

    /// Update configuration sections such as `OS`, `FEATURES` or `CONTEXT`.
    pub async fn update_conf<B: Blueprint + ?Sized>(&self, vm: &Vm, blueprint: &B) -> Result<()> {
        let template = blueprint.render()?;
        self.apply("updateconf", vm, vec![Value::String(template)]).await
    }

    pub async fn recover(&self, vm: &Vm, operation: RecoverOperation) -> Result<()> {
        self.apply("recover", vm, vec![Value::Int(operation.wire())]).await
    }

    /// Save a disk as a new image and return it.
    pub async fn disk_save_as(
        &self,
        vm: &Vm,
        disk_id: i32,
        name: &str,
        image_type: Option<ImageType>,
        snapshot_id: Option<i32>,
    ) -> Result<Image> {
        let id = vm.id()?;
        create(
            self.client,
            &procedure::<Vm>("disksaveas"),
            vec![
                Value::Int(id),
                Value::Int(disk_id),
                Value::from(name),
                Value::from(image_type.map(ImageType::wire).unwrap_or_default()),
                Value::Int(snapshot_id.unwrap_or(crate::resource::NO_OBJECT)),
            ],
        )
        .await
    }

    /// Hot-plug a disk described by a `DISK = [ ... ]` template.
    pub async fn attach_disk<B: Blueprint + ?Sized>(&self, vm: &Vm, disk: &B) -> Result<()> {
        let template = disk.render()?;
        self.apply("attach", vm, vec![Value::String(template)]).await
    }

    pub async fn detach_disk(&self, vm: &Vm, disk_id: i32) -> Result<()> {
        self.apply("detach", vm, vec![Value::Int(disk_id)]).await
    }

    /// Hot-plug a NIC described by a `NIC = [ ... ]` template.
    pub async fn attach_nic<B: Blueprint + ?Sized>(&self, vm: &Vm, nic: &B) -> Result<()> {
        let template = nic.render()?;
        self.apply("attachnic", vm, vec![Value::String(template)]).await
    }

    pub async fn detach_nic(&self, vm: &Vm, nic_id: i32) -> Result<()> {
        self.apply("detachnic", vm, vec![Value::Int(nic_id)]).await
    }

    /// Take a system snapshot and return its ID.
    pub async fn snapshot_create(&self, vm: &Vm, name: &str) -> Result<i32> {
        let result = mutate(
            self.client,
            &procedure::<Vm>("snapshotcreate"),
            vm,
            vec![Value::from(name)],
        )
        .await?;
        result.id()
    }

    pub async fn snapshot_revert(&self, vm: &Vm, snapshot_id: i32) -> Result<()> {
        self.apply("snapshotrevert", vm, vec![Value::Int(snapshot_id)]).await
    }

    pub async fn snapshot_delete(&self, vm: &Vm, snapshot_id: i32) -> Result<()> {
        self.apply("snapshotdelete", vm, vec![Value::Int(snapshot_id)]).await
    }

    /// Monitoring records of the VM.
    pub async fn monitoring(&self, vm: &Vm) -> Result<Resource> {
        let result = mutate(self.client, &procedure::<Vm>("monitoring"), vm, Vec::new()).await?;
        Resource::parse(result.body()?)
    }

    /// One page of VMs in `state`.
    pub async fn list_by_state(
        &self,
        filter: impl Into<PoolFilter>,
        page: Page,
        state: VmStateFilter,
    ) -> Result<Vec<Vm>> {
        let mut args = pool_args(filter.into(), page);
        args.push(Value::Int(state.wire()));
        list(self.client, Vm::POOL_INFO, Vm::ELEMENT, args).await
    }

    /// One page of the VMs of user `uid` in `state`.
    pub async fn list_for_user_by_state(
        &self,
        uid: i32,
        page: Page,
        state: VmStateFilter,
    ) -> Result<Vec<Vm>> {
        self.list_by_state(PoolFilter::owner(uid)?, page, state).await
    }

    /// Every VM of `scope` in `state`, unpaginated.
    pub async fn list_unpaged_by_state(
        &self,
        scope: OwnershipFilter,
        state: VmStateFilter,
    ) -> Result<Vec<Vm>> {
        self.list_by_state(scope, Page::All, state).await
    }

    /// Current state, read from a fresh snapshot.
    pub async fn state_of(&self, vm: &Vm) -> Result<VmState> {
        let id = vm.id()?;
        fetch::<Vm>(self.client, id).await?.state()
    }

    async fn apply(&self, verb: &str, vm: &Vm, extra: Vec<Value>) -> Result<()> {
        mutate(self.client, &procedure::<Vm>(verb), vm, extra).await?;
        Ok(())
    }
}
