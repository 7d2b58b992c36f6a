//! Generic documents: typed blobs stored for higher-level tools.

use super::{allocate, create, list, procedure, Lockable, Ownable, Renamable, ResourceKind, Service};
use crate::error::Result;
use crate::filter::{pool_args, OwnershipFilter, Page, PoolFilter};
use crate::resource::envelope;
use crate::rpc::Value;
use crate::template::Blueprint;

envelope!(
    /// A document snapshot.
    Document,
    "DOCUMENT"
);

impl Document {
    /// Application-defined document type.
    pub fn document_type(&self) -> Result<i32> {
        self.parse_attribute("TYPE")
    }
}

impl ResourceKind for Document {
    const PREFIX: &'static str = "one.document";
    const POOL_INFO: &'static str = "one.documentpool.info";
    const ELEMENT: &'static str = "DOCUMENT";
}

impl Ownable for Document {}
impl Renamable for Document {}
impl Lockable for Document {}

impl Service<'_, Document> {
    pub async fn allocate<B: Blueprint + ?Sized>(&self, blueprint: &B, document_type: i32) -> Result<Document> {
        let template = blueprint.render()?;
        allocate(self.client, vec![Value::String(template), Value::Int(document_type)]).await
    }

    pub async fn clone_as(&self, document: &Document, name: &str) -> Result<Document> {
        let id = document.id()?;
        create(
            self.client,
            &procedure::<Document>("clone"),
            vec![Value::Int(id), Value::from(name)],
        )
        .await
    }

    /// One page of documents of `document_type`.
    pub async fn list_by_type(
        &self,
        filter: impl Into<PoolFilter>,
        page: Page,
        document_type: i32,
    ) -> Result<Vec<Document>> {
        let mut args = pool_args(filter.into(), page);
        args.push(Value::Int(document_type));
        list(self.client, Document::POOL_INFO, Document::ELEMENT, args).await
    }

    /// One page of the documents of user `uid`.
    pub async fn list_for_user_by_type(
        &self,
        uid: i32,
        page: Page,
        document_type: i32,
    ) -> Result<Vec<Document>> {
        self.list_by_type(PoolFilter::owner(uid)?, page, document_type)
            .await
    }

    /// Every document of `document_type` in `scope`, unpaginated.
    pub async fn list_unpaged_by_type(
        &self,
        scope: OwnershipFilter,
        document_type: i32,
    ) -> Result<Vec<Document>> {
        self.list_by_type(scope, Page::All, document_type).await
    }
}
