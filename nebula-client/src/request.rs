//! Request value objects: ownership changes, VM resize and update mode.

use crate::error::Result;
use crate::resource::{Resource, NO_OBJECT};
use crate::rpc::Value;
use crate::template::{Blueprint, Template};

/// How an update combines the new attributes with the existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UpdateKind {
    #[default]
    Replace,
    Merge,
}

impl UpdateKind {
    pub fn wire(self) -> i32 {
        match self {
            UpdateKind::Replace => 0,
            UpdateKind::Merge => 1,
        }
    }
}

/// New owner and group for `chown`; unset fields are left unchanged.
///
/// Fields hold envelopes so a fetched user or group can be passed
/// directly. The default holds sentinels and renders `(-1, -1)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipRequest {
    user: Resource,
    group: Resource,
}

impl Default for OwnershipRequest {
    fn default() -> Self {
        Self {
            user: Resource::synthetic("USER", NO_OBJECT),
            group: Resource::synthetic("GROUP", NO_OBJECT),
        }
    }
}

impl OwnershipRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(mut self, user: impl Into<Resource>) -> Self {
        self.user = user.into();
        self
    }

    pub fn group(mut self, group: impl Into<Resource>) -> Self {
        self.group = group.into();
        self
    }

    pub fn user_id(self, uid: i32) -> Self {
        self.user(Resource::synthetic("USER", uid))
    }

    pub fn group_id(self, gid: i32) -> Self {
        self.group(Resource::synthetic("GROUP", gid))
    }

    /// `(user_id, group_id)` as sent on the wire.
    ///
    /// Sentinels render `-1`. Any other field must resolve an ID, so an
    /// empty envelope fails here rather than becoming "no change".
    pub fn render(&self) -> Result<(i32, i32)> {
        Ok((self.user.reference_id()?, self.group.reference_id()?))
    }

    pub(crate) fn to_args(&self) -> Result<Vec<Value>> {
        let (user, group) = self.render()?;
        Ok(vec![Value::Int(user), Value::Int(group)])
    }
}

/// Capacity change for a VM. Only the fields that are set are sent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResizeRequest {
    pub cpu: Option<f64>,
    pub vcpu: Option<u32>,
    pub memory_mb: Option<u64>,
    /// Fail if the host lacks capacity instead of overcommitting.
    pub enforce: bool,
}

impl ResizeRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cpu(mut self, cpu: f64) -> Self {
        self.cpu = Some(cpu);
        self
    }

    pub fn vcpu(mut self, vcpu: u32) -> Self {
        self.vcpu = Some(vcpu);
        self
    }

    pub fn memory_mb(mut self, memory_mb: u64) -> Self {
        self.memory_mb = Some(memory_mb);
        self
    }

    pub fn enforce(mut self, enforce: bool) -> Self {
        self.enforce = enforce;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.cpu.is_none() && self.vcpu.is_none() && self.memory_mb.is_none()
    }

    fn to_template(&self) -> Template {
        let mut template = Template::new();
        if let Some(cpu) = self.cpu {
            template = template.set("CPU", cpu);
        }
        if let Some(vcpu) = self.vcpu {
            template = template.set("VCPU", vcpu);
        }
        if let Some(memory) = self.memory_mb {
            template = template.set("MEMORY", memory);
        }
        template
    }
}

impl Blueprint for ResizeRequest {
    fn render(&self) -> Result<String> {
        self.to_template().render()
    }
}
