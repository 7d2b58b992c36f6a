//! Subcommand dispatch.
//!
//! Each handler performs its calls through the typed services and returns
//! an [`Output`]; printing happens once in [`run`].

use std::fmt::Debug;

use anyhow::{bail, Result};
use nebula_client::{
    Client, Cluster, Host, HostStatus, Image, OwnershipFilter, OwnershipRequest, Page, PermissionMatrix,
    Resource, ResizeRequest, Vm, VmAction, VmStateFilter,
};
use tracing::info;

use crate::cli::{ClusterCommand, Command, HostCommand, ImageCommand, PoolArgs, VmCommand};
use crate::output::{Output, Table};

/// Execute `command` and print its result.
pub async fn run(client: &Client, command: Command, json: bool) -> Result<()> {
    let output = execute(client, command).await?;
    println!("{}", output.render(json));
    Ok(())
}

pub async fn execute(client: &Client, command: Command) -> Result<Output> {
    match command {
        Command::Version => {
            let version = client.system().version().await?;
            Ok(Output::Message(version))
        }
        Command::Cluster(cmd) => cluster(client, cmd).await,
        Command::Host(cmd) => host(client, cmd).await,
        Command::Vm(cmd) => vm(client, cmd).await,
        Command::Image(cmd) => image(client, cmd).await,
    }
}

async fn cluster(client: &Client, cmd: ClusterCommand) -> Result<Output> {
    let clusters = client.clusters();
    match cmd {
        ClusterCommand::List => {
            let mut table = Table::new(&["ID", "NAME", "HOSTS", "DATASTORES", "VNETS"]);
            for cluster in clusters.list_all().await? {
                table.push(vec![
                    id_cell(&cluster),
                    cluster.name(),
                    count(cluster.host_ids()),
                    count(cluster.datastore_ids()),
                    count(cluster.vnet_ids()),
                ]);
            }
            Ok(Output::Table(table))
        }
        ClusterCommand::Show { id } => {
            let cluster = clusters.info(id).await?;
            Ok(Output::Details(vec![
                ("ID", id_cell(&cluster)),
                ("NAME", cluster.name()),
                ("HOSTS", join(cluster.host_ids())),
                ("DATASTORES", join(cluster.datastore_ids())),
                ("VNETS", join(cluster.vnet_ids())),
            ]))
        }
        ClusterCommand::Create { name } => {
            let cluster = clusters.allocate(&name).await?;
            info!(id = %id_cell(&cluster), name = %name, "Cluster created");
            Ok(Output::Message(format!("ID: {}", id_cell(&cluster))))
        }
        ClusterCommand::Delete { id } => {
            clusters.delete(&Cluster::with_id(id)).await?;
            Ok(Output::Message(format!("Cluster {} deleted", id)))
        }
    }
}

async fn host(client: &Client, cmd: HostCommand) -> Result<Output> {
    let hosts = client.hosts();
    let (id, status) = match cmd {
        HostCommand::List => {
            let mut table = Table::new(&["ID", "NAME", "CLUSTER", "STATE", "VMS"]);
            for host in hosts.list_all().await? {
                table.push(host_row(&host));
            }
            return Ok(Output::Table(table));
        }
        HostCommand::Show { id } => {
            let host = hosts.info(id).await?;
            return Ok(Output::Details(vec![
                ("ID", id_cell(&host)),
                ("NAME", host.name()),
                ("CLUSTER", host.cluster_id().map(|c| c.to_string()).unwrap_or_default()),
                ("STATE", debug_cell(host.state())),
                ("IM_MAD", host.im_mad()),
                ("VM_MAD", host.vm_mad()),
                ("VMS", join(host.vm_ids())),
            ]));
        }
        HostCommand::Enable { id } => (id, HostStatus::Enabled),
        HostCommand::Disable { id } => (id, HostStatus::Disabled),
        HostCommand::Offline { id } => (id, HostStatus::Offline),
    };

    hosts.set_status(&Host::with_id(id), status).await?;
    Ok(Output::Message(format!("Host {} set to {:?}", id, status)))
}

fn host_row(host: &Host) -> Vec<String> {
    vec![
        id_cell(host),
        host.name(),
        host.cluster_id().map(|c| c.to_string()).unwrap_or_default(),
        debug_cell(host.state()),
        count(host.vm_ids()),
    ]
}

async fn vm(client: &Client, cmd: VmCommand) -> Result<Output> {
    let vms = client.vms();
    match cmd {
        VmCommand::List { pool, state } => {
            let state = match state {
                Some(state) => parse_state(&state)?,
                None => VmStateFilter::AnyState,
            };
            let page = page(&pool);
            let found = match pool.user {
                Some(uid) => vms.list_for_user_by_state(uid, page, state).await?,
                None => vms.list_by_state(parse_scope(&pool.scope)?, page, state).await?,
            };

            let mut table = Table::new(&["ID", "NAME", "OWNER", "GROUP", "STATE", "LCM", "HOST"]);
            for vm in &found {
                table.push(vm_row(vm));
            }
            Ok(Output::Table(table))
        }
        VmCommand::Show { id } => {
            let vm = vms.info(id).await?;
            Ok(Output::Details(vec![
                ("ID", id_cell(&vm)),
                ("NAME", vm.name()),
                ("OWNER", vm.uname()),
                ("GROUP", vm.gname()),
                ("STATE", debug_cell(vm.state())),
                ("LCM_STATE", debug_cell(vm.lcm_state())),
                ("HOST", vm.host_name()),
                ("VCPU", vm.vcpu().map(|v| v.to_string()).unwrap_or_default()),
                ("MEMORY_MB", vm.memory_mb().map(|m| m.to_string()).unwrap_or_default()),
                ("PERMISSIONS", permissions_cell(&vm)),
                ("DISKS", vm.disks().len().to_string()),
                ("NICS", vm.nics().iter().map(|n| n.ip()).collect::<Vec<_>>().join(",")),
            ]))
        }
        VmCommand::Action { id, action } => {
            let action: VmAction = action.parse()?;
            vms.action(&Vm::with_id(id), action).await?;
            Ok(Output::Message(format!("VM {}: {} requested", id, action.wire())))
        }
        VmCommand::Chmod { id, octal } => {
            let matrix = PermissionMatrix::from_octal(&octal)?;
            vms.chmod(&Vm::with_id(id), &matrix).await?;
            Ok(Output::Message(format!("VM {} permissions set to {}", id, octal)))
        }
        VmCommand::Chown { id, user, group } => {
            if user.is_none() && group.is_none() {
                bail!("chown needs --user, --group or both");
            }
            let mut request = OwnershipRequest::new();
            if let Some(uid) = user {
                request = request.user_id(uid);
            }
            if let Some(gid) = group {
                request = request.group_id(gid);
            }
            vms.chown(&Vm::with_id(id), &request).await?;
            Ok(Output::Message(format!("VM {} ownership changed", id)))
        }
        VmCommand::Resize {
            id,
            cpu,
            vcpu,
            memory_mb,
            enforce,
        } => {
            let mut request = ResizeRequest::new().enforce(enforce);
            if let Some(cpu) = cpu {
                request = request.cpu(cpu);
            }
            if let Some(vcpu) = vcpu {
                request = request.vcpu(vcpu);
            }
            if let Some(memory_mb) = memory_mb {
                request = request.memory_mb(memory_mb);
            }
            if request.is_empty() {
                bail!("resize needs at least one of --cpu, --vcpu, --memory-mb");
            }
            vms.resize(&Vm::with_id(id), &request).await?;
            Ok(Output::Message(format!("VM {} resized", id)))
        }
    }
}

fn vm_row(vm: &Vm) -> Vec<String> {
    vec![
        id_cell(vm),
        vm.name(),
        vm.uname(),
        vm.gname(),
        debug_cell(vm.state()),
        debug_cell(vm.lcm_state()),
        vm.host_name(),
    ]
}

async fn image(client: &Client, cmd: ImageCommand) -> Result<Output> {
    let images = client.images();
    match cmd {
        ImageCommand::List { pool } => {
            let page = page(&pool);
            let found = match pool.user {
                Some(uid) => images.list_for_user(uid, page).await?,
                None => images.list(parse_scope(&pool.scope)?, page).await?,
            };

            let mut table = Table::new(&["ID", "NAME", "OWNER", "DATASTORE", "SIZE_MB", "STATE"]);
            for image in &found {
                table.push(image_row(image));
            }
            Ok(Output::Table(table))
        }
        ImageCommand::Show { id } => {
            let image = images.info(id).await?;
            Ok(Output::Details(vec![
                ("ID", id_cell(&image)),
                ("NAME", image.name()),
                ("OWNER", image.uname()),
                ("STATE", debug_cell(image.state())),
                ("TYPE", debug_cell(image.image_type())),
                ("PERSISTENT", image.is_persistent().map(|p| p.to_string()).unwrap_or_default()),
                ("SIZE_MB", image.size_mb().map(|s| s.to_string()).unwrap_or_default()),
                ("PERMISSIONS", permissions_cell(&image)),
                ("VMS", join(image.vm_ids())),
            ]))
        }
    }
}

fn image_row(image: &Image) -> Vec<String> {
    vec![
        id_cell(image),
        image.name(),
        image.uname(),
        image.attribute("DATASTORE"),
        image.size_mb().map(|s| s.to_string()).unwrap_or_default(),
        debug_cell(image.state()),
    ]
}

// =============================================================================
// Argument parsing
// =============================================================================

fn parse_scope(scope: &str) -> Result<OwnershipFilter> {
    match scope {
        "all" => Ok(OwnershipFilter::All),
        "mine" => Ok(OwnershipFilter::User),
        "mine-and-group" => Ok(OwnershipFilter::UserAndGroups),
        "group" => Ok(OwnershipFilter::PrimaryGroup),
        other => bail!("unknown scope '{}' (all, mine, mine-and-group, group)", other),
    }
}

fn parse_state(state: &str) -> Result<VmStateFilter> {
    let filter = match state {
        "any" => VmStateFilter::AnyState,
        "any-including-done" => VmStateFilter::AnyStateIncludingDone,
        "init" => VmStateFilter::Init,
        "pending" => VmStateFilter::Pending,
        "hold" => VmStateFilter::Hold,
        "active" => VmStateFilter::Active,
        "stopped" => VmStateFilter::Stopped,
        "suspended" => VmStateFilter::Suspended,
        "done" => VmStateFilter::Done,
        "poweroff" => VmStateFilter::Poweroff,
        "undeployed" => VmStateFilter::Undeployed,
        "cloning" => VmStateFilter::Cloning,
        "cloning-failure" => VmStateFilter::CloningFailure,
        other => bail!("unknown VM state '{}'", other),
    };
    Ok(filter)
}

fn page(pool: &PoolArgs) -> Page {
    match (pool.page, pool.page_size) {
        (Some(offset), Some(size)) => Page::new(offset, size),
        _ => Page::All,
    }
}

// =============================================================================
// Cells
// =============================================================================

fn id_cell(resource: &Resource) -> String {
    resource.id().map(|id| id.to_string()).unwrap_or_else(|_| "-".to_string())
}

fn debug_cell<T: Debug>(value: nebula_client::Result<T>) -> String {
    value.map(|v| format!("{:?}", v)).unwrap_or_else(|_| "-".to_string())
}

fn permissions_cell(resource: &Resource) -> String {
    resource
        .permissions()
        .map(|p| p.to_string())
        .unwrap_or_else(|_| "-".to_string())
}

fn count(ids: nebula_client::Result<Vec<i32>>) -> String {
    ids.map(|ids| ids.len().to_string()).unwrap_or_else(|_| "-".to_string())
}

fn join(ids: nebula_client::Result<Vec<i32>>) -> String {
    ids.map(|ids| ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(","))
        .unwrap_or_else(|_| "-".to_string())
}
