//! Resource envelope: an immutable snapshot of one remote object.
//!
//! The envelope never copies fields out of the document. Every accessor
//! queries the wrapped subtree by path when it is called, so typed views
//! (states, IDs, permissions) are always consistent with the snapshot.
//!
//! Two lookup tiers are deliberately separate:
//! - [`Resource::attribute`] returns an empty string for absent paths;
//! - [`Resource::id`] fails when the identity cannot be resolved.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{ClientError, Result};
use crate::permissions::Permissions;
use crate::xml::XmlNode;

/// Sentinel ID meaning "no object" / "do not change".
pub const NO_OBJECT: i32 = -1;

/// Untyped envelope around one object document.
///
/// `Resource::default()` is the empty envelope: it wraps no document and
/// every identity lookup on it fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resource {
    root: Option<Arc<XmlNode>>,
}

impl Resource {
    /// Fabricate `<TAG><ID>id</ID></TAG>` to refer to an object without fetching it.
    pub fn synthetic(tag: &str, id: i32) -> Self {
        let mut root = XmlNode::new(tag);
        root.create_element("ID").set_text(id.to_string());
        Self::from_node(root)
    }

    /// Wrap an already parsed subtree.
    pub fn from_node(node: XmlNode) -> Self {
        Self {
            root: Some(Arc::new(node)),
        }
    }

    /// Parse an object document, e.g. the payload of `one.vm.info`.
    pub fn parse(xml: &str) -> Result<Self> {
        XmlNode::parse(xml).map(Self::from_node)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// The wrapped subtree, if any.
    pub fn node(&self) -> Option<&XmlNode> {
        self.root.as_deref()
    }

    /// Root element name, empty for the empty envelope.
    pub fn tag(&self) -> &str {
        self.node().map(XmlNode::name).unwrap_or_default()
    }

    /// Text at `path`, or an empty string if nothing matches.
    pub fn attribute(&self, path: &str) -> String {
        self.node()
            .and_then(|root| root.find_first(path))
            .map(|node| node.text().to_string())
            .unwrap_or_default()
    }

    /// Text of every match of `path`, in document order.
    pub fn attributes(&self, path: &str) -> Vec<String> {
        self.node()
            .map(|root| {
                root.find(path)
                    .into_iter()
                    .map(|node| node.text().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether at least one element matches `path`.
    pub fn has(&self, path: &str) -> bool {
        self.node()
            .map(|root| !root.find(path).is_empty())
            .unwrap_or(false)
    }

    /// One envelope per subtree matching `path`, in document order.
    pub fn children(&self, path: &str) -> Vec<Resource> {
        self.node()
            .map(|root| {
                root.find(path)
                    .into_iter()
                    .map(|node| Resource::from_node(node.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Required typed attribute; fails when absent or unparseable.
    pub fn parse_attribute<T: FromStr>(&self, path: &str) -> Result<T> {
        let raw = self.attribute(path);
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ClientError::InvalidResponse(format!(
                "<{}> has no {}",
                self.tag(),
                path
            )));
        }
        raw.parse::<T>().map_err(|_| {
            ClientError::InvalidResponse(format!(
                "<{}> {} = '{}' is not a valid {}",
                self.tag(),
                path,
                raw,
                std::any::type_name::<T>()
            ))
        })
    }

    /// Every match of `path` parsed as an ID, in document order.
    pub fn ids(&self, path: &str) -> Result<Vec<i32>> {
        self.attributes(path)
            .into_iter()
            .map(|raw| {
                raw.trim().parse::<i32>().map_err(|_| {
                    ClientError::InvalidResponse(format!(
                        "<{}> {} = '{}' is not an ID",
                        self.tag(),
                        path,
                        raw
                    ))
                })
            })
            .collect()
    }

    /// Numeric identity of the object.
    ///
    /// Fails on the empty envelope, a missing or non-numeric `ID`, and on
    /// negative IDs including the [`NO_OBJECT`] sentinel. Checked before
    /// any remote call that targets this object.
    pub fn id(&self) -> Result<i32> {
        if self.is_empty() {
            return Err(ClientError::Precondition(
                "empty resource envelope has no ID".to_string(),
            ));
        }

        let raw = self.attribute("ID");
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ClientError::Precondition(format!(
                "<{}> has no ID",
                self.tag()
            )));
        }

        let id: i32 = raw.parse().map_err(|_| {
            ClientError::Precondition(format!("<{}> ID '{}' is not numeric", self.tag(), raw))
        })?;

        if id == NO_OBJECT {
            return Err(ClientError::Precondition(format!(
                "<{}> refers to no object (ID {})",
                self.tag(),
                NO_OBJECT
            )));
        }
        if id < 0 {
            return Err(ClientError::Precondition(format!(
                "<{}> ID {} is negative",
                self.tag(),
                id
            )));
        }
        Ok(id)
    }

    /// ID of an optional reference: the sentinel renders as [`NO_OBJECT`],
    /// anything else must resolve through [`Resource::id`].
    pub(crate) fn reference_id(&self) -> Result<i32> {
        if self.is_sentinel() {
            Ok(NO_OBJECT)
        } else {
            self.id()
        }
    }

    /// Whether this envelope is the "no object" placeholder.
    pub fn is_sentinel(&self) -> bool {
        self.attribute("ID").trim().parse::<i32>() == Ok(NO_OBJECT)
    }

    pub fn name(&self) -> String {
        self.attribute("NAME")
    }

    /// Owner user ID.
    pub fn uid(&self) -> Result<i32> {
        self.parse_attribute("UID")
    }

    /// Owner group ID.
    pub fn gid(&self) -> Result<i32> {
        self.parse_attribute("GID")
    }

    pub fn uname(&self) -> String {
        self.attribute("UNAME")
    }

    pub fn gname(&self) -> String {
        self.attribute("GNAME")
    }

    /// Permission bits from the `PERMISSIONS` block.
    pub fn permissions(&self) -> Result<Permissions> {
        Permissions::from_resource(self)
    }

    /// Current lock, `None` when the object is not locked.
    pub fn lock(&self) -> Result<Option<LockLevel>> {
        if !self.has("LOCK/LOCKED") {
            return Ok(None);
        }
        let level: i32 = self.parse_attribute("LOCK/LOCKED")?;
        if level == 0 {
            return Ok(None);
        }
        LockLevel::try_from(level).map(Some)
    }

    /// Value of `TEMPLATE/<name>`.
    pub fn template_attribute(&self, name: &str) -> String {
        self.attribute(&format!("TEMPLATE/{}", name))
    }

    /// Epoch-seconds attribute as a timestamp; `None` when absent or zero.
    pub fn timestamp(&self, path: &str) -> Result<Option<DateTime<Utc>>> {
        let raw = self.attribute(path);
        let raw = raw.trim();
        if raw.is_empty() || raw == "0" {
            return Ok(None);
        }
        let secs: i64 = self.parse_attribute(path)?;
        DateTime::<Utc>::from_timestamp(secs, 0)
            .map(Some)
            .ok_or_else(|| ClientError::InvalidResponse(format!("{} = {} is out of range", path, secs)))
    }

    /// Registration time (`REGTIME`).
    pub fn registered_at(&self) -> Result<Option<DateTime<Utc>>> {
        self.timestamp("REGTIME")
    }

    /// The snapshot serialized back to XML (empty for the empty envelope).
    pub fn to_xml(&self) -> String {
        self.node().map(XmlNode::to_xml).unwrap_or_default()
    }
}

/// Lock levels, each blocking the operations of that class and above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockLevel {
    Use,
    Manage,
    Admin,
    All,
}

impl LockLevel {
    pub fn wire(self) -> i32 {
        match self {
            LockLevel::Use => 1,
            LockLevel::Manage => 2,
            LockLevel::Admin => 3,
            LockLevel::All => 4,
        }
    }
}

impl TryFrom<i32> for LockLevel {
    type Error = ClientError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            1 => Ok(LockLevel::Use),
            2 => Ok(LockLevel::Manage),
            3 => Ok(LockLevel::Admin),
            4 => Ok(LockLevel::All),
            other => Err(ClientError::unknown("lock level", other)),
        }
    }
}

/// Declare a typed envelope around [`Resource`].
macro_rules! envelope {
    ($(#[$meta:meta])* $name:ident, $tag:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name($crate::resource::Resource);

        impl $name {
            /// Refer to an existing object by ID without fetching it.
            pub fn with_id(id: i32) -> Self {
                Self($crate::resource::Resource::synthetic($tag, id))
            }

            /// The "no object" placeholder.
            pub fn none() -> Self {
                Self::with_id($crate::resource::NO_OBJECT)
            }

            pub fn into_inner(self) -> $crate::resource::Resource {
                self.0
            }
        }

        impl From<$crate::resource::Resource> for $name {
            fn from(resource: $crate::resource::Resource) -> Self {
                Self(resource)
            }
        }

        impl From<$name> for $crate::resource::Resource {
            fn from(envelope: $name) -> Self {
                envelope.0
            }
        }

        impl AsRef<$crate::resource::Resource> for $name {
            fn as_ref(&self) -> &$crate::resource::Resource {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = $crate::resource::Resource;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }
    };
}

pub(crate) use envelope;

/// Map a numeric code read from `path` through a fixed lookup table.
pub(crate) fn lookup_state<T>(
    resource: &Resource,
    path: &str,
    kind: &'static str,
    table: fn(i32) -> Option<T>,
) -> Result<T> {
    let code: i32 = resource.parse_attribute(path)?;
    table(code).ok_or_else(|| ClientError::unknown(kind, code))
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGE: &str = r#"<IMAGE>
  <ID>14</ID>
  <UID>0</UID>
  <GID>1</GID>
  <UNAME>oneadmin</UNAME>
  <GNAME>users</GNAME>
  <NAME>ubuntu-22.04</NAME>
  <LOCK><LOCKED>2</LOCKED><OWNER>0</OWNER></LOCK>
  <PERMISSIONS>
    <OWNER_U>1</OWNER_U><OWNER_M>1</OWNER_M><OWNER_A>0</OWNER_A>
    <GROUP_U>1</GROUP_U><GROUP_M>0</GROUP_M><GROUP_A>0</GROUP_A>
    <OTHER_U>0</OTHER_U><OTHER_M>0</OTHER_M><OTHER_A>0</OTHER_A>
  </PERMISSIONS>
  <REGTIME>1700000000</REGTIME>
  <TEMPLATE><DEV_PREFIX>vd</DEV_PREFIX></TEMPLATE>
  <VMS><ID>3</ID><ID>1</ID><ID>2</ID></VMS>
</IMAGE>"#;

    #[test]
    fn test_absent_attribute_is_empty() {
        let image = Resource::parse(IMAGE).unwrap();
        assert_eq!(image.attribute("NAME"), "ubuntu-22.04");
        assert_eq!(image.attribute("TEMPLATE/MISSING"), "");
        assert_eq!(Resource::default().attribute("NAME"), "");
    }

    #[test]
    fn test_common_accessors() {
        let image = Resource::parse(IMAGE).unwrap();
        assert_eq!(image.id().unwrap(), 14);
        assert_eq!(image.uid().unwrap(), 0);
        assert_eq!(image.gid().unwrap(), 1);
        assert_eq!(image.uname(), "oneadmin");
        assert_eq!(image.gname(), "users");
        assert_eq!(image.template_attribute("DEV_PREFIX"), "vd");
        assert_eq!(image.lock().unwrap(), Some(LockLevel::Manage));
        assert_eq!(image.permissions().unwrap().to_octal(), "640");
        assert_eq!(
            image.registered_at().unwrap().map(|t| t.timestamp()),
            Some(1_700_000_000)
        );
    }

    #[test]
    fn test_ids_keep_document_order() {
        let image = Resource::parse(IMAGE).unwrap();
        assert_eq!(image.ids("VMS/ID").unwrap(), vec![3, 1, 2]);
        assert!(image.ids("CLONES/ID").unwrap().is_empty());
    }

    #[test]
    fn test_synthetic_id_round_trip() {
        for id in [0, 1, 7, 4096, i32::MAX] {
            let resource = Resource::synthetic("HOST", id);
            assert_eq!(resource.id().unwrap(), id);
            assert!(!resource.is_sentinel());
        }
    }

    #[test]
    fn test_sentinel_is_rejected() {
        let sentinel = Resource::synthetic("USER", NO_OBJECT);
        assert!(sentinel.is_sentinel());
        assert!(matches!(sentinel.id(), Err(ClientError::Precondition(_))));
    }

    #[test]
    fn test_unresolvable_ids() {
        assert!(matches!(Resource::default().id(), Err(ClientError::Precondition(_))));

        let no_id = Resource::parse("<VM><NAME>x</NAME></VM>").unwrap();
        assert!(matches!(no_id.id(), Err(ClientError::Precondition(_))));

        let bad_id = Resource::parse("<VM><ID>abc</ID></VM>").unwrap();
        assert!(matches!(bad_id.id(), Err(ClientError::Precondition(_))));
    }

    #[test]
    fn test_unlocked_and_unknown_lock() {
        let unlocked = Resource::parse("<VM><ID>1</ID><LOCK><LOCKED>0</LOCKED></LOCK></VM>").unwrap();
        assert_eq!(unlocked.lock().unwrap(), None);
        assert_eq!(Resource::synthetic("VM", 1).lock().unwrap(), None);

        let odd = Resource::parse("<VM><ID>1</ID><LOCK><LOCKED>9</LOCKED></LOCK></VM>").unwrap();
        assert!(matches!(odd.lock(), Err(ClientError::UnknownValue { .. })));
    }

    #[test]
    fn test_children_are_independent_envelopes() {
        let image = Resource::parse(IMAGE).unwrap();
        let vms = image.children("VMS/ID");
        assert_eq!(vms.len(), 3);
        assert_eq!(vms[0].tag(), "ID");
        assert_eq!(vms[0].attribute(""), "3");
    }

    #[test]
    fn test_synthetic_serializes() {
        assert_eq!(Resource::synthetic("ZONE", 0).to_xml(), "<ZONE><ID>0</ID></ZONE>");
        assert_eq!(Resource::default().to_xml(), "");
    }
}
