//! Access control rules.
//!
//! Rules are not regular objects: they have no info call, no template and
//! no owner, so they get their own small service instead of a
//! [`Service`](super::Service).

use super::list;
use crate::client::Client;
use crate::error::{ClientError, Result};
use crate::resource::Resource;
use crate::rpc::Value;

/// One ACL rule (`ACL_POOL/ACL`).
///
/// Components are hexadecimal bit-sets as sent by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclRule(Resource);

impl AclRule {
    pub fn id(&self) -> Result<i32> {
        self.0.id()
    }

    pub fn user(&self) -> String {
        self.0.attribute("USER")
    }

    pub fn resource(&self) -> String {
        self.0.attribute("RESOURCE")
    }

    pub fn rights(&self) -> String {
        self.0.attribute("RIGHTS")
    }

    pub fn zone(&self) -> String {
        self.0.attribute("ZONE")
    }

    /// Human readable form, e.g. `@100 VM+IMAGE/* USE *`.
    pub fn rule_string(&self) -> String {
        self.0.attribute("STRING")
    }
}

impl From<Resource> for AclRule {
    fn from(resource: Resource) -> Self {
        Self(resource)
    }
}

/// Operations on the ACL rule set.
#[derive(Debug, Clone, Copy)]
pub struct AclService<'a> {
    client: &'a Client,
}

impl<'a> AclService<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Add a rule and return its ID.
    ///
    /// Each component is either a hex bit-set or the textual form the
    /// server accepts (e.g. `"#5"`, `"VM+IMAGE/*"`, `"USE+MANAGE"`).
    pub async fn add_rule(&self, user: &str, resource: &str, rights: &str) -> Result<i32> {
        for (name, component) in [("user", user), ("resource", resource), ("rights", rights)] {
            if component.trim().is_empty() {
                return Err(ClientError::Precondition(format!("ACL {} component is empty", name)));
            }
        }
        let result = self
            .client
            .call(
                "one.acl.addrule",
                vec![Value::from(user), Value::from(resource), Value::from(rights)],
            )
            .await?;
        result.id()
    }

    pub async fn delete_rule(&self, rule_id: i32) -> Result<()> {
        self.client
            .call("one.acl.delrule", vec![Value::Int(rule_id)])
            .await?;
        Ok(())
    }

    /// Every rule, in server order.
    pub async fn list(&self) -> Result<Vec<AclRule>> {
        list(self.client, "one.acl.info", "ACL", Vec::new()).await
    }
}
