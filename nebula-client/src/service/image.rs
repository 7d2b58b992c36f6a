//! Images: disk images stored in image datastores.

use super::{
    allocate, create, mutate, procedure, FilteredPool, Lockable, Ownable, Renamable,
    ResourceKind, Service,
};
use super::Datastore;
use crate::error::Result;
use crate::resource::{envelope, lookup_state};
use crate::rpc::Value;
use crate::template::Blueprint;

envelope!(
    /// An image snapshot.
    Image,
    "IMAGE"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageState {
    Init,
    Ready,
    Used,
    Disabled,
    Locked,
    Error,
    Clone,
    Delete,
    UsedPersistent,
    LockedUsed,
    LockedUsedPersistent,
}

impl ImageState {
    fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ImageState::Init),
            1 => Some(ImageState::Ready),
            2 => Some(ImageState::Used),
            3 => Some(ImageState::Disabled),
            4 => Some(ImageState::Locked),
            5 => Some(ImageState::Error),
            6 => Some(ImageState::Clone),
            7 => Some(ImageState::Delete),
            8 => Some(ImageState::UsedPersistent),
            9 => Some(ImageState::LockedUsed),
            10 => Some(ImageState::LockedUsedPersistent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageType {
    Os,
    Cdrom,
    Datablock,
    Kernel,
    Ramdisk,
    Context,
}

impl ImageType {
    fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ImageType::Os),
            1 => Some(ImageType::Cdrom),
            2 => Some(ImageType::Datablock),
            3 => Some(ImageType::Kernel),
            4 => Some(ImageType::Ramdisk),
            5 => Some(ImageType::Context),
            _ => None,
        }
    }

    /// Name accepted by `one.image.chtype`.
    pub fn wire(self) -> &'static str {
        match self {
            ImageType::Os => "OS",
            ImageType::Cdrom => "CDROM",
            ImageType::Datablock => "DATABLOCK",
            ImageType::Kernel => "KERNEL",
            ImageType::Ramdisk => "RAMDISK",
            ImageType::Context => "CONTEXT",
        }
    }
}

impl Image {
    pub fn state(&self) -> Result<ImageState> {
        lookup_state(self, "STATE", "image state", ImageState::from_code)
    }

    pub fn image_type(&self) -> Result<ImageType> {
        lookup_state(self, "TYPE", "image type", ImageType::from_code)
    }

    pub fn is_persistent(&self) -> Result<bool> {
        let flag: i32 = self.parse_attribute("PERSISTENT")?;
        Ok(flag != 0)
    }

    pub fn size_mb(&self) -> Result<u64> {
        self.parse_attribute("SIZE")
    }

    pub fn datastore_id(&self) -> Result<i32> {
        self.parse_attribute("DATASTORE_ID")
    }

    /// VMs using the image.
    pub fn vm_ids(&self) -> Result<Vec<i32>> {
        self.ids("VMS/ID")
    }

    /// Snapshot IDs, in document order.
    pub fn snapshot_ids(&self) -> Result<Vec<i32>> {
        self.ids("SNAPSHOTS/SNAPSHOT/ID")
    }
}

impl ResourceKind for Image {
    const PREFIX: &'static str = "one.image";
    const POOL_INFO: &'static str = "one.imagepool.info";
    const ELEMENT: &'static str = "IMAGE";
}

impl Ownable for Image {}
impl Renamable for Image {}
impl Lockable for Image {}
impl FilteredPool for Image {}

impl Service<'_, Image> {
    /// Register an image in `datastore`.
    ///
    /// With `check_capacity` the server refuses images that do not fit.
    pub async fn allocate<B: Blueprint + ?Sized>(
        &self,
        blueprint: &B,
        datastore: &Datastore,
        check_capacity: bool,
    ) -> Result<Image> {
        let template = blueprint.render()?;
        let datastore_id = datastore.id()?;
        allocate(
            self.client,
            vec![
                Value::String(template),
                Value::Int(datastore_id),
                Value::Bool(check_capacity),
            ],
        )
        .await
    }

    /// Copy `image` under a new name. `Datastore::none()` keeps its datastore.
    pub async fn clone_as(&self, image: &Image, name: &str, datastore: &Datastore) -> Result<Image> {
        let id = image.id()?;
        let datastore_id = datastore.reference_id()?;
        create(
            self.client,
            &procedure::<Image>("clone"),
            vec![Value::Int(id), Value::from(name), Value::Int(datastore_id)],
        )
        .await
    }

    pub async fn enable(&self, image: &Image, enabled: bool) -> Result<()> {
        self.flag("enable", image, Value::Bool(enabled)).await
    }

    pub async fn persistent(&self, image: &Image, persistent: bool) -> Result<()> {
        self.flag("persistent", image, Value::Bool(persistent)).await
    }

    pub async fn chtype(&self, image: &Image, image_type: ImageType) -> Result<()> {
        self.flag("chtype", image, Value::from(image_type.wire())).await
    }

    pub async fn snapshot_delete(&self, image: &Image, snapshot_id: i32) -> Result<()> {
        self.flag("snapshotdelete", image, Value::Int(snapshot_id)).await
    }

    pub async fn snapshot_revert(&self, image: &Image, snapshot_id: i32) -> Result<()> {
        self.flag("snapshotrevert", image, Value::Int(snapshot_id)).await
    }

    /// Collapse the image onto `snapshot_id`, dropping the others.
    pub async fn snapshot_flatten(&self, image: &Image, snapshot_id: i32) -> Result<()> {
        self.flag("snapshotflatten", image, Value::Int(snapshot_id)).await
    }

    async fn flag(&self, verb: &str, image: &Image, value: Value) -> Result<()> {
        mutate(self.client, &procedure::<Image>(verb), image, vec![value]).await?;
        Ok(())
    }
}
