//! Resource façades.
//!
//! A façade is a [`Service`] borrowed from a [`Client`] and typed by the
//! envelope it returns. Every operation is built from one of four shapes:
//!
//! 1. mutate by ID: resolve the target ID, call, return nothing;
//! 2. mutate and refetch: as (1), then `info` the target again;
//! 3. allocate: render, call, read the new ID, `info` it;
//! 4. list: encode the pool query, call, one envelope per pool element.
//!
//! A missing ID, a failed render or a remote failure stops the operation
//! before anything else is sent. Nothing is retried.
//!
//! Capabilities shared by only some kinds (ownership, rename, locks, pool
//! filtering) are opted into with the marker traits below.

use std::marker::PhantomData;

use tracing::{debug, info};

use crate::client::{CallResult, Client};
use crate::error::Result;
use crate::filter::{pool_args, OwnershipFilter, Page, PoolFilter};
use crate::permissions::PermissionMatrix;
use crate::request::{OwnershipRequest, UpdateKind};
use crate::resource::{LockLevel, Resource};
use crate::rpc::Value;
use crate::template::Blueprint;

mod acl;
mod cluster;
mod datastore;
mod document;
mod group;
mod host;
mod image;
mod market;
mod secgroup;
mod system;
mod template;
mod user;
mod vdc;
mod vm;
mod vnet;
mod vntemplate;
mod vrouter;
mod zone;

pub use acl::{AclRule, AclService};
pub use cluster::Cluster;
pub use datastore::{Datastore, DatastoreState, DatastoreType};
pub use document::Document;
pub use group::Group;
pub use host::{Host, HostState, HostStatus};
pub use image::{Image, ImageState, ImageType};
pub use market::{Marketplace, MarketplaceApp};
pub use secgroup::SecurityGroup;
pub use system::SystemService;
pub use template::VmTemplate;
pub use user::User;
pub use vdc::Vdc;
pub use vm::{Disk, LcmState, MigrationType, Nic, RecoverOperation, Vm, VmAction, VmState};
pub use vnet::{AddressRange, Vnet};
pub use vntemplate::VnTemplate;
pub use vrouter::VirtualRouter;
pub use zone::Zone;

/// A remote object kind addressed through `one.<resource>.<verb>`.
pub trait ResourceKind: From<Resource> + AsRef<Resource> + Send + Sync {
    /// Procedure prefix, e.g. `one.cluster`.
    const PREFIX: &'static str;
    /// Pool info procedure, e.g. `one.clusterpool.info`.
    const POOL_INFO: &'static str;
    /// Element name of one object, e.g. `CLUSTER`.
    const ELEMENT: &'static str;

    /// Arguments of `<prefix>.info` after the token.
    fn info_args(id: i32) -> Vec<Value> {
        vec![Value::Int(id), Value::Bool(false)]
    }
}

/// Kinds supporting `chmod` and `chown`.
pub trait Ownable: ResourceKind {}

/// Kinds supporting `rename`.
pub trait Renamable: ResourceKind {}

/// Kinds supporting `lock` and `unlock`.
pub trait Lockable: ResourceKind {}

/// Kinds whose pool query takes `(filter, start, end, ...)`.
pub trait FilteredPool: ResourceKind {
    /// Arguments appended after the pagination window.
    fn extra_pool_args() -> Vec<Value> {
        Vec::new()
    }
}

/// Kinds whose pool query takes no arguments.
pub trait UnfilteredPool: ResourceKind {}

/// Operations on one resource kind, bound to a client.
pub struct Service<'a, K> {
    client: &'a Client,
    kind: PhantomData<fn() -> K>,
}

impl<K> Clone for Service<'_, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Service<'_, K> {}

impl<K> std::fmt::Debug for Service<'_, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("kind", &std::any::type_name::<K>())
            .finish_non_exhaustive()
    }
}

impl<'a, K: ResourceKind> Service<'a, K> {
    pub fn new(client: &'a Client) -> Self {
        Self {
            client,
            kind: PhantomData,
        }
    }

    pub fn client(&self) -> &'a Client {
        self.client
    }

    /// Fetch one object by ID.
    pub async fn info(&self, id: i32) -> Result<K> {
        fetch::<K>(self.client, id).await
    }

    /// Fetch a fresh snapshot of `target`.
    pub async fn refresh(&self, target: &K) -> Result<K> {
        let id = target.as_ref().id()?;
        fetch::<K>(self.client, id).await
    }

    pub async fn delete(&self, target: &K) -> Result<()> {
        mutate(self.client, &procedure::<K>("delete"), target.as_ref(), Vec::new()).await?;
        Ok(())
    }

    /// Replace or merge the user template and return the updated object.
    pub async fn update<B: Blueprint + ?Sized>(
        &self,
        target: &K,
        blueprint: &B,
        kind: UpdateKind,
    ) -> Result<K> {
        let text = blueprint.render()?;
        mutate_and_refetch(
            self.client,
            "update",
            target,
            vec![Value::String(text), Value::Int(kind.wire())],
        )
        .await
    }
}

impl<K: Ownable> Service<'_, K> {
    /// Change permission bits; cells left at no-change are untouched.
    pub async fn chmod(&self, target: &K, matrix: &PermissionMatrix) -> Result<()> {
        mutate(self.client, &procedure::<K>("chmod"), target.as_ref(), matrix.to_args()).await?;
        Ok(())
    }

    /// Change owner and/or group.
    pub async fn chown(&self, target: &K, request: &OwnershipRequest) -> Result<()> {
        let args = request.to_args()?;
        mutate(self.client, &procedure::<K>("chown"), target.as_ref(), args).await?;
        Ok(())
    }
}

impl<K: Renamable> Service<'_, K> {
    pub async fn rename(&self, target: &K, name: &str) -> Result<K> {
        mutate_and_refetch(self.client, "rename", target, vec![Value::from(name)]).await
    }
}

impl<K: Lockable> Service<'_, K> {
    pub async fn lock(&self, target: &K, level: LockLevel) -> Result<()> {
        mutate(
            self.client,
            &procedure::<K>("lock"),
            target.as_ref(),
            vec![Value::Int(level.wire()), Value::Bool(false)],
        )
        .await?;
        Ok(())
    }

    pub async fn unlock(&self, target: &K) -> Result<()> {
        mutate(self.client, &procedure::<K>("unlock"), target.as_ref(), Vec::new()).await?;
        Ok(())
    }
}

impl<K: FilteredPool> Service<'_, K> {
    /// One page of the pool, restricted by ownership scope or owner.
    pub async fn list(&self, filter: impl Into<PoolFilter>, page: Page) -> Result<Vec<K>> {
        let mut args = pool_args(filter.into(), page);
        args.extend(K::extra_pool_args());
        list(self.client, K::POOL_INFO, K::ELEMENT, args).await
    }

    /// One page of the objects owned by user `uid`.
    pub async fn list_for_user(&self, uid: i32, page: Page) -> Result<Vec<K>> {
        self.list(PoolFilter::owner(uid)?, page).await
    }

    /// Every object in `scope`, unpaginated.
    pub async fn list_unpaged(&self, scope: OwnershipFilter) -> Result<Vec<K>> {
        self.list(scope, Page::All).await
    }
}

impl<K: UnfilteredPool> Service<'_, K> {
    /// The whole pool.
    pub async fn list_all(&self) -> Result<Vec<K>> {
        list(self.client, K::POOL_INFO, K::ELEMENT, Vec::new()).await
    }
}

// =============================================================================
// Shapes
// =============================================================================

pub(crate) fn procedure<K: ResourceKind>(verb: &str) -> String {
    format!("{}.{}", K::PREFIX, verb)
}

/// Shape 1: resolve the ID of `target`, then call `method` with it first.
pub(crate) async fn mutate(
    client: &Client,
    method: &str,
    target: &Resource,
    extra: Vec<Value>,
) -> Result<CallResult> {
    let id = target.id()?;
    let mut args = Vec::with_capacity(extra.len() + 1);
    args.push(Value::Int(id));
    args.extend(extra);

    let result = client.call(method, args).await?;
    debug!(method = %method, id, "Mutated resource");
    Ok(result)
}

/// Shape 2: mutate `target` with `<prefix>.<verb>`, then fetch it again.
pub(crate) async fn mutate_and_refetch<K: ResourceKind>(
    client: &Client,
    verb: &str,
    target: &K,
    extra: Vec<Value>,
) -> Result<K> {
    let id = target.as_ref().id()?;
    mutate(client, &procedure::<K>(verb), target.as_ref(), extra).await?;
    fetch::<K>(client, id).await
}

/// Fetch one object of kind `K`.
pub(crate) async fn fetch<K: ResourceKind>(client: &Client, id: i32) -> Result<K> {
    let result = client.call(&procedure::<K>("info"), K::info_args(id)).await?;
    let resource = Resource::parse(result.body()?)?;
    Ok(K::from(resource))
}

/// Call `method`, read the ID of the object it created, fetch it as `K`.
pub(crate) async fn create<K: ResourceKind>(
    client: &Client,
    method: &str,
    args: Vec<Value>,
) -> Result<K> {
    let result = client.call(method, args).await?;
    let id = result.id()?;
    info!(method = %method, element = K::ELEMENT, id, "Created resource");
    fetch::<K>(client, id).await
}

/// Shape 3: `<prefix>.allocate` then fetch.
pub(crate) async fn allocate<K: ResourceKind>(client: &Client, args: Vec<Value>) -> Result<K> {
    create::<K>(client, &procedure::<K>("allocate"), args).await
}

/// Shape 4: call a pool procedure and wrap every `<element>` under its root.
pub(crate) async fn list<K: From<Resource>>(
    client: &Client,
    method: &str,
    element: &str,
    args: Vec<Value>,
) -> Result<Vec<K>> {
    let result = client.call(method, args).await?;
    let pool = Resource::parse(result.body()?)?;
    let items: Vec<K> = pool.children(element).into_iter().map(K::from).collect();
    debug!(method = %method, count = items.len(), "Listed pool");
    Ok(items)
}

// =============================================================================
// Client accessors
// =============================================================================

impl Client {
    pub fn clusters(&self) -> Service<'_, Cluster> {
        Service::new(self)
    }

    pub fn hosts(&self) -> Service<'_, Host> {
        Service::new(self)
    }

    pub fn datastores(&self) -> Service<'_, Datastore> {
        Service::new(self)
    }

    pub fn images(&self) -> Service<'_, Image> {
        Service::new(self)
    }

    pub fn templates(&self) -> Service<'_, VmTemplate> {
        Service::new(self)
    }

    pub fn users(&self) -> Service<'_, User> {
        Service::new(self)
    }

    pub fn groups(&self) -> Service<'_, Group> {
        Service::new(self)
    }

    pub fn vnets(&self) -> Service<'_, Vnet> {
        Service::new(self)
    }

    pub fn vms(&self) -> Service<'_, Vm> {
        Service::new(self)
    }

    pub fn security_groups(&self) -> Service<'_, SecurityGroup> {
        Service::new(self)
    }

    pub fn virtual_routers(&self) -> Service<'_, VirtualRouter> {
        Service::new(self)
    }

    pub fn zones(&self) -> Service<'_, Zone> {
        Service::new(self)
    }

    pub fn vdcs(&self) -> Service<'_, Vdc> {
        Service::new(self)
    }

    pub fn documents(&self) -> Service<'_, Document> {
        Service::new(self)
    }

    pub fn marketplaces(&self) -> Service<'_, Marketplace> {
        Service::new(self)
    }

    pub fn marketplace_apps(&self) -> Service<'_, MarketplaceApp> {
        Service::new(self)
    }

    pub fn vn_templates(&self) -> Service<'_, VnTemplate> {
        Service::new(self)
    }

    pub fn acl(&self) -> AclService<'_> {
        AclService::new(self)
    }

    pub fn system(&self) -> SystemService<'_> {
        SystemService::new(self)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{args, client, methods};
    use super::*;
    use crate::error::ClientError;
    use crate::permissions::{Capability, Subject};

    const CLUSTER: &str = "<CLUSTER><ID>100</ID><NAME>production</NAME></CLUSTER>";

    #[tokio::test]
    async fn test_delete_without_id_sends_nothing() {
        let (client, mock) = client();

        let err = client.clusters().delete(&Cluster::default()).await.unwrap_err();
        assert!(matches!(err, ClientError::Precondition(_)));

        let err = client.clusters().delete(&Cluster::none()).await.unwrap_err();
        assert!(matches!(err, ClientError::Precondition(_)));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_refetches() {
        let (client, mock) = client();
        mock.succeed("one.cluster.update", 100)
            .succeed("one.cluster.info", CLUSTER);

        let updated = client
            .clusters()
            .update(&Cluster::with_id(100), "RESERVED_CPU = \"10\"", UpdateKind::Merge)
            .await
            .unwrap();

        assert_eq!(updated.name(), "production");
        assert_eq!(methods(&mock), vec!["one.cluster.update", "one.cluster.info"]);
        assert_eq!(
            args(&mock, 0),
            vec![Value::Int(100), Value::from("RESERVED_CPU = \"10\""), Value::Int(1)]
        );
        assert_eq!(args(&mock, 1), vec![Value::Int(100), Value::Bool(false)]);
    }

    #[tokio::test]
    async fn test_failed_mutation_skips_refetch() {
        let (client, mock) = client();
        mock.fail("one.cluster.rename", "[one.cluster.rename] Name is taken", 0x0800);

        let err = client
            .clusters()
            .rename(&Cluster::with_id(100), "staging")
            .await
            .unwrap_err();

        assert_eq!(err.remote().unwrap().code, 0x0800);
        assert_eq!(methods(&mock), vec!["one.cluster.rename"]);
    }

    #[tokio::test]
    async fn test_neutral_chmod_sends_nine_no_change() {
        let (client, mock) = client();
        mock.succeed("one.image.chmod", 3);

        client
            .images()
            .chmod(&Image::with_id(3), &PermissionMatrix::new())
            .await
            .unwrap();

        let mut expected = vec![Value::Int(3)];
        expected.extend(std::iter::repeat(Value::Int(-1)).take(9));
        assert_eq!(args(&mock, 0), expected);
    }

    #[tokio::test]
    async fn test_chmod_renders_matrix() {
        let (client, mock) = client();
        mock.succeed("one.vm.chmod", 8);

        let matrix = PermissionMatrix::new()
            .with_allow(Subject::Group, Capability::Use)
            .with_deny(Subject::Other, Capability::Admin);
        client.vms().chmod(&Vm::with_id(8), &matrix).await.unwrap();

        assert_eq!(
            args(&mock, 0),
            [8, -1, -1, -1, 1, -1, -1, -1, -1, 0]
                .into_iter()
                .map(Value::Int)
                .collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_default_chown_keeps_owner() {
        let (client, mock) = client();
        mock.succeed("one.vn.chown", 4);

        client
            .vnets()
            .chown(&Vnet::with_id(4), &OwnershipRequest::default())
            .await
            .unwrap();

        assert_eq!(args(&mock, 0), vec![Value::Int(4), Value::Int(-1), Value::Int(-1)]);
    }

    #[tokio::test]
    async fn test_chown_with_empty_envelope_fails_locally() {
        let (client, mock) = client();

        let request = OwnershipRequest::new().group(Group::default());
        let err = client.vnets().chown(&Vnet::with_id(4), &request).await.unwrap_err();

        assert!(matches!(err, ClientError::Precondition(_)));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_lock_and_unlock() {
        let (client, mock) = client();
        mock.succeed("one.template.lock", 2)
            .succeed("one.template.unlock", 2);

        let template = VmTemplate::with_id(2);
        client.templates().lock(&template, LockLevel::Admin).await.unwrap();
        client.templates().unlock(&template).await.unwrap();

        assert_eq!(args(&mock, 0), vec![Value::Int(2), Value::Int(3), Value::Bool(false)]);
        assert_eq!(args(&mock, 1), vec![Value::Int(2)]);
    }

    #[tokio::test]
    async fn test_filtered_list_arguments() {
        let (client, mock) = client();
        mock.succeed("one.imagepool.info", "<IMAGE_POOL/>")
            .succeed("one.imagepool.info", "<IMAGE_POOL/>")
            .succeed("one.imagepool.info", "<IMAGE_POOL/>");

        let images = client.images();
        images.list(OwnershipFilter::User, Page::new(3, 20)).await.unwrap();
        images.list_for_user(7, Page::All).await.unwrap();
        images.list_unpaged(OwnershipFilter::All).await.unwrap();

        assert_eq!(args(&mock, 0), vec![Value::Int(-3), Value::Int(40), Value::Int(-20)]);
        assert_eq!(args(&mock, 1), vec![Value::Int(7), Value::Int(-1), Value::Int(-1)]);
        assert_eq!(args(&mock, 2), vec![Value::Int(-2), Value::Int(-1), Value::Int(-1)]);
    }

    #[tokio::test]
    async fn test_list_for_negative_user_fails_locally() {
        let (client, mock) = client();

        let err = client.images().list_for_user(-2, Page::All).await.unwrap_err();
        assert!(matches!(err, ClientError::Precondition(_)));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unfiltered_list_keeps_document_order() {
        let (client, mock) = client();
        mock.succeed(
            "one.clusterpool.info",
            "<CLUSTER_POOL>\
             <CLUSTER><ID>5</ID><NAME>b</NAME></CLUSTER>\
             <CLUSTER><ID>0</ID><NAME>default</NAME></CLUSTER>\
             <CLUSTER><ID>3</ID><NAME>a</NAME></CLUSTER>\
             </CLUSTER_POOL>",
        );

        let clusters = client.clusters().list_all().await.unwrap();
        let ids: Vec<i32> = clusters.iter().map(|c| c.id().unwrap()).collect();
        assert_eq!(ids, vec![5, 0, 3]);
        assert!(args(&mock, 0).is_empty());
    }

    #[tokio::test]
    async fn test_empty_pool_is_empty_list() {
        let (client, mock) = client();
        mock.succeed("one.clusterpool.info", "<CLUSTER_POOL></CLUSTER_POOL>");

        let clusters = client.clusters().list_all().await.unwrap();
        assert!(clusters.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payload_is_parse_error() {
        let (client, mock) = client();
        mock.succeed("one.host.info", "<HOST><ID>1</ID>");

        let err = client.hosts().info(1).await.unwrap_err();
        assert!(matches!(err, ClientError::Parse(_)));
    }
}
