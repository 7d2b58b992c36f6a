//! Marketplaces and the appliances they publish.

use super::{
    allocate, mutate, procedure, FilteredPool, Lockable, Ownable, Renamable, ResourceKind, Service,
};
use crate::error::Result;
use crate::resource::envelope;
use crate::rpc::Value;
use crate::template::Blueprint;

envelope!(
    /// A marketplace snapshot.
    Marketplace,
    "MARKETPLACE"
);

envelope!(
    /// A marketplace appliance snapshot.
    MarketplaceApp,
    "MARKETPLACEAPP"
);

impl Marketplace {
    /// Appliances published in the marketplace.
    pub fn app_ids(&self) -> Result<Vec<i32>> {
        self.ids("MARKETPLACEAPPS/ID")
    }

    pub fn market_mad(&self) -> String {
        self.attribute("MARKET_MAD")
    }
}

impl MarketplaceApp {
    pub fn marketplace_id(&self) -> Result<i32> {
        self.parse_attribute("MARKETPLACE_ID")
    }

    /// Download source, e.g. an HTTP URL.
    pub fn source(&self) -> String {
        self.attribute("SOURCE")
    }
}

impl ResourceKind for Marketplace {
    const PREFIX: &'static str = "one.market";
    const POOL_INFO: &'static str = "one.marketpool.info";
    const ELEMENT: &'static str = "MARKETPLACE";
}

impl Ownable for Marketplace {}
impl Renamable for Marketplace {}
impl FilteredPool for Marketplace {}

impl ResourceKind for MarketplaceApp {
    const PREFIX: &'static str = "one.marketapp";
    const POOL_INFO: &'static str = "one.marketapppool.info";
    const ELEMENT: &'static str = "MARKETPLACEAPP";
}

impl Ownable for MarketplaceApp {}
impl Renamable for MarketplaceApp {}
impl Lockable for MarketplaceApp {}
impl FilteredPool for MarketplaceApp {}

impl Service<'_, Marketplace> {
    pub async fn allocate<B: Blueprint + ?Sized>(&self, blueprint: &B) -> Result<Marketplace> {
        let template = blueprint.render()?;
        allocate(self.client, vec![Value::String(template)]).await
    }
}

impl Service<'_, MarketplaceApp> {
    /// Publish an appliance in `market`.
    pub async fn allocate<B: Blueprint + ?Sized>(
        &self,
        blueprint: &B,
        market: &Marketplace,
    ) -> Result<MarketplaceApp> {
        let template = blueprint.render()?;
        let market_id = market.id()?;
        allocate(self.client, vec![Value::String(template), Value::Int(market_id)]).await
    }

    pub async fn enable(&self, app: &MarketplaceApp, enabled: bool) -> Result<()> {
        mutate(
            self.client,
            &procedure::<MarketplaceApp>("enable"),
            app,
            vec![Value::Bool(enabled)],
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{args, client, methods};
    use super::*;
    use crate::filter::{OwnershipFilter, Page};

    #[tokio::test]
    async fn test_marketplace_pool_is_filtered() {
        let (client, mock) = client();
        mock.succeed(
            "one.marketpool.info",
            "<MARKETPLACE_POOL><MARKETPLACE><ID>0</ID><NAME>OpenNebula Public</NAME>\
             <MARKET_MAD>one</MARKET_MAD><MARKETPLACEAPPS><ID>1</ID><ID>2</ID></MARKETPLACEAPPS>\
             </MARKETPLACE></MARKETPLACE_POOL>",
        );

        let markets = client
            .marketplaces()
            .list_unpaged(OwnershipFilter::All)
            .await
            .unwrap();

        assert_eq!(markets[0].market_mad(), "one");
        assert_eq!(markets[0].app_ids().unwrap(), vec![1, 2]);
        assert_eq!(args(&mock, 0), vec![Value::Int(-2), Value::Int(-1), Value::Int(-1)]);
    }

    #[tokio::test]
    async fn test_app_allocate_and_enable() {
        let (client, mock) = client();
        mock.succeed("one.marketapp.allocate", 40)
            .succeed(
                "one.marketapp.info",
                "<MARKETPLACEAPP><ID>40</ID><MARKETPLACE_ID>100</MARKETPLACE_ID>\
                 <SOURCE>http://apps/alpine.qcow2</SOURCE></MARKETPLACEAPP>",
            )
            .succeed("one.marketapp.enable", 40);

        let apps = client.marketplace_apps();
        let app = apps
            .allocate("NAME = \"alpine\"\nORIGIN_ID = 7", &Marketplace::with_id(100))
            .await
            .unwrap();
        apps.enable(&app, false).await.unwrap();

        assert_eq!(app.marketplace_id().unwrap(), 100);
        assert_eq!(app.source(), "http://apps/alpine.qcow2");
        assert_eq!(
            methods(&mock),
            vec!["one.marketapp.allocate", "one.marketapp.info", "one.marketapp.enable"]
        );
        assert_eq!(args(&mock, 2), vec![Value::Int(40), Value::Bool(false)]);
    }

    #[tokio::test]
    async fn test_app_pool_page() {
        let (client, mock) = client();
        mock.succeed("one.marketapppool.info", "<MARKETPLACEAPP_POOL/>");

        let apps = client
            .marketplace_apps()
            .list(OwnershipFilter::User, Page::new(4, 25))
            .await
            .unwrap();
        assert!(apps.is_empty());
        assert_eq!(args(&mock, 0), vec![Value::Int(-3), Value::Int(75), Value::Int(-25)]);
    }
}
