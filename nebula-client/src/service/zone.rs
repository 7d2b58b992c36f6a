//! Zones of a federation.

use super::{allocate, Renamable, ResourceKind, Service, UnfilteredPool};
use crate::error::Result;
use crate::resource::envelope;
use crate::rpc::Value;
use crate::template::Blueprint;

envelope!(
    /// A zone snapshot.
    Zone,
    "ZONE"
);

impl Zone {
    /// XML-RPC endpoint of the zone's front-end.
    pub fn endpoint(&self) -> String {
        self.template_attribute("ENDPOINT")
    }
}

impl ResourceKind for Zone {
    const PREFIX: &'static str = "one.zone";
    const POOL_INFO: &'static str = "one.zonepool.info";
    const ELEMENT: &'static str = "ZONE";
}

impl Renamable for Zone {}
impl UnfilteredPool for Zone {}

impl Service<'_, Zone> {
    pub async fn allocate<B: Blueprint + ?Sized>(&self, blueprint: &B) -> Result<Zone> {
        let template = blueprint.render()?;
        allocate(self.client, vec![Value::String(template)]).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{args, client};
    use super::*;
    use crate::template::Template;

    #[tokio::test]
    async fn test_allocate_and_list() {
        let (client, mock) = client();
        mock.succeed("one.zone.allocate", 1)
            .succeed(
                "one.zone.info",
                "<ZONE><ID>1</ID><NAME>eu-west</NAME>\
                 <TEMPLATE><ENDPOINT>http://eu-west:2633/RPC2</ENDPOINT></TEMPLATE></ZONE>",
            )
            .succeed(
                "one.zonepool.info",
                "<ZONE_POOL><ZONE><ID>0</ID><NAME>OpenNebula</NAME></ZONE>\
                 <ZONE><ID>1</ID><NAME>eu-west</NAME></ZONE></ZONE_POOL>",
            );

        let blueprint = Template::new()
            .set("NAME", "eu-west")
            .set("ENDPOINT", "http://eu-west:2633/RPC2");
        let zone = client.zones().allocate(&blueprint).await.unwrap();
        assert_eq!(zone.endpoint(), "http://eu-west:2633/RPC2");

        let zones = client.zones().list_all().await.unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[1].id().unwrap(), 1);
        assert!(args(&mock, 2).is_empty());
    }
}
