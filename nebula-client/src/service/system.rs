//! Front-end information.

use crate::client::Client;
use crate::error::Result;
use crate::resource::Resource;

/// Queries about the control plane itself.
#[derive(Debug, Clone, Copy)]
pub struct SystemService<'a> {
    client: &'a Client,
}

impl<'a> SystemService<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Server version, e.g. `"6.8.0"`.
    pub async fn version(&self) -> Result<String> {
        let result = self.client.call("one.system.version", Vec::new()).await?;
        Ok(result.body()?.to_string())
    }

    /// The front-end configuration document.
    pub async fn config(&self) -> Result<Resource> {
        let result = self.client.call("one.system.config", Vec::new()).await?;
        Resource::parse(result.body()?)
    }
}
