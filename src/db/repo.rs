use async_trait::async_trait;
use serde_json::{Map, Value};

use super::model::*;

/// Top-level field equality filter for `get_documents`.
pub type DocumentFilter = Map<String, Value>;

#[async_trait]
pub trait CatalogRepo: Send + Sync {
    fn name(&self) -> String;
    async fn list_collections(&self) -> DbResult<Vec<String>>;
}

#[async_trait]
pub trait DocumentRepo: Send + Sync {
    async fn create_document(&self, collection: &str, data: Value) -> DbResult<String>;
    async fn get_documents(
        &self,
        collection: &str,
        filter: &DocumentFilter,
        limit: Option<i64>,
    ) -> DbResult<Vec<StoredDocument>>;
}

#[async_trait]
pub trait Repository: CatalogRepo + DocumentRepo + Send + Sync {
    async fn close(&self);
}

/// Validate a record and write it to its collection.
pub async fn insert_record<D, R>(repo: &D, record: &R) -> DbResult<String>
where
    D: DocumentRepo + ?Sized,
    R: Record,
{
    record.validate()?;
    let data = serde_json::to_value(record)
        .map_err(|e| DbError::Malformed(R::COLLECTION.to_string(), e.to_string()))?;
    repo.create_document(R::COLLECTION, data).await
}

/// Read records of one type, paired with their document ids.
pub async fn find_records<D, R>(
    repo: &D,
    filter: &DocumentFilter,
    limit: Option<i64>,
) -> DbResult<Vec<(String, R)>>
where
    D: DocumentRepo + ?Sized,
    R: Record,
{
    let docs = repo.get_documents(R::COLLECTION, filter, limit).await?;
    docs.iter()
        .map(|doc| doc.decode::<R>().map(|r| (doc.id.clone(), r)))
        .collect()
}

pub(crate) fn check_collection(collection: &str) -> DbResult<()> {
    if COLLECTIONS.contains(&collection) {
        Ok(())
    } else {
        Err(DbError::UnknownCollection(collection.to_string()))
    }
}
