use async_trait::async_trait;
use bson::{Bson, Document, Uuid, doc};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection as MongoCollection, IndexModel,
    options::{ClientOptions, FindOptions, IndexOptions, ReturnDocument},
};

use bookshelf_core::{
    backend::{ArrayElementUpdate, StoreBackend, StoreBackendBuilder},
    error::{DocumentStoreError, DocumentStoreResult},
    query::{ElementMatch, Expr, Query},
};

use crate::{query::MongoQueryTranslator, sanitizer::FieldSanitizer};

const MONGO_ID: &str = "_id";

fn backend_error(err: mongodb::error::Error) -> DocumentStoreError {
    DocumentStoreError::Backend(err.to_string())
}

#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(&FieldSanitizer::sanitize_name(collection_name))
    }

    /// Escapes keys and stores the document ID as the MongoDB primary key.
    fn prepare_document(&self, id: &Uuid, document: &Bson) -> DocumentStoreResult<Document> {
        let mut prepared = FieldSanitizer::sanitize_keys(document)
            .as_document()
            .cloned()
            .ok_or_else(|| DocumentStoreError::InvalidDocument(format!("document {id} is not a map")))?;

        prepared.insert(MONGO_ID, *id);
        Ok(prepared)
    }

    fn restore_document(&self, mut document: Document) -> Bson {
        document.remove(MONGO_ID);
        FieldSanitizer::restore_keys(&Bson::Document(document))
    }

    fn sanitize_fields(fields: bson::Document, prefix: &str) -> Document {
        fields
            .iter()
            .map(|(k, v)| {
                (
                    format!("{prefix}{}", FieldSanitizer::sanitize_name(k)),
                    FieldSanitizer::sanitize_keys(v),
                )
            })
            .collect()
    }

    async fn update_one(
        &self,
        id: Uuid,
        update: Document,
        collection: &str,
    ) -> DocumentStoreResult<Option<Bson>> {
        Ok(self
            .get_collection(collection)
            .find_one_and_update(doc! { MONGO_ID: id }, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(backend_error)?
            .map(|doc| self.restore_document(doc)))
    }

    async fn find_by_id(&self, id: Uuid, collection: &str) -> DocumentStoreResult<Option<Bson>> {
        Ok(self
            .get_collection(collection)
            .find_one(doc! { MONGO_ID: id })
            .await
            .map_err(backend_error)?
            .map(|doc| self.restore_document(doc)))
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn insert_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()> {
        if documents.is_empty() {
            return Ok(());
        }

        self.get_collection(collection)
            .insert_many(
                documents
                    .iter()
                    .map(|(id, doc)| self.prepare_document(id, doc))
                    .collect::<DocumentStoreResult<Vec<Document>>>()?,
            )
            .await
            .map_err(backend_error)?;

        Ok(())
    }

    async fn delete_documents(
        &self,
        ids: Vec<Uuid>,
        collection: &str,
    ) -> DocumentStoreResult<usize> {
        let result = self
            .get_collection(collection)
            .delete_many(doc! { MONGO_ID: { "$in": ids } })
            .await
            .map_err(backend_error)?;

        Ok(result.deleted_count as usize)
    }

    async fn get_documents(
        &self,
        ids: Vec<Uuid>,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        Ok(self
            .get_collection(collection)
            .find(doc! { MONGO_ID: { "$in": ids } })
            .await
            .map_err(backend_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(backend_error)?
            .into_iter()
            .map(|doc| self.restore_document(doc))
            .collect())
    }

    async fn query_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        let mut options = FindOptions::default();

        options.limit = query.limit.map(|limit| limit as i64);
        options.skip = query.offset.map(|skip| skip as u64);
        options.sort = MongoQueryTranslator::sort(&query.sort);
        options.projection = query
            .projection
            .as_ref()
            .map(MongoQueryTranslator::projection);

        Ok(self
            .get_collection(collection)
            .find(MongoQueryTranslator::filter(query.filter.as_ref())?)
            .with_options(options)
            .await
            .map_err(backend_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(backend_error)?
            .into_iter()
            .map(|doc| self.restore_document(doc))
            .collect())
    }

    async fn count_documents(
        &self,
        filter: Option<Expr>,
        collection: &str,
    ) -> DocumentStoreResult<usize> {
        let count = self
            .get_collection(collection)
            .count_documents(MongoQueryTranslator::filter(filter.as_ref())?)
            .await
            .map_err(backend_error)?;

        Ok(count as usize)
    }

    async fn set_fields(
        &self,
        id: Uuid,
        fields: bson::Document,
        collection: &str,
    ) -> DocumentStoreResult<Option<Bson>> {
        if fields.is_empty() {
            return self.find_by_id(id, collection).await;
        }

        let update = doc! { "$set": Self::sanitize_fields(fields, "") };
        self.update_one(id, update, collection).await
    }

    async fn push_to_array(
        &self,
        id: Uuid,
        field: &str,
        element: Bson,
        collection: &str,
    ) -> DocumentStoreResult<Option<Bson>> {
        let path = FieldSanitizer::sanitize_path(field);
        let update = doc! { "$push": { path: FieldSanitizer::sanitize_keys(&element) } };

        self.update_one(id, update, collection).await
    }

    async fn pull_from_array(
        &self,
        id: Uuid,
        field: &str,
        matcher: ElementMatch,
        collection: &str,
    ) -> DocumentStoreResult<Option<Bson>> {
        let path = FieldSanitizer::sanitize_path(field);
        let key = FieldSanitizer::sanitize_path(&matcher.field);
        let update = doc! { "$pull": { path: { key: matcher.value } } };

        self.update_one(id, update, collection).await
    }

    async fn set_in_array(
        &self,
        id: Uuid,
        field: &str,
        matcher: ElementMatch,
        fields: bson::Document,
        collection: &str,
    ) -> DocumentStoreResult<ArrayElementUpdate> {
        let path = FieldSanitizer::sanitize_path(field);
        let element_key = format!("{path}.{}", FieldSanitizer::sanitize_path(&matcher.field));
        let filter = doc! { MONGO_ID: id, element_key: matcher.value };

        let updated = if fields.is_empty() {
            self.get_collection(collection)
                .find_one(filter)
                .await
                .map_err(backend_error)?
        } else {
            // `$` addresses the first element matched by the filter.
            let update = doc! { "$set": Self::sanitize_fields(fields, &format!("{path}.$.")) };

            self.get_collection(collection)
                .find_one_and_update(filter, update)
                .return_document(ReturnDocument::After)
                .await
                .map_err(backend_error)?
        };

        if let Some(doc) = updated {
            return Ok(ArrayElementUpdate::Updated(self.restore_document(doc)));
        }

        Ok(match self.find_by_id(id, collection).await? {
            Some(_) => ArrayElementUpdate::ElementMissing,
            None => ArrayElementUpdate::DocumentMissing,
        })
    }

    async fn add_index(
        &self,
        collection: &str,
        field: &str,
        unique: bool,
    ) -> DocumentStoreResult<()> {
        let path = FieldSanitizer::sanitize_path(field);

        self.get_collection(collection)
            .create_index(
                IndexModel::builder()
                    .keys(doc! { path: 1 })
                    .options(IndexOptions::builder().unique(unique).build())
                    .build(),
            )
            .await
            .map_err(backend_error)?;

        Ok(())
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.shutdown().await
    }
}

pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        let options = ClientOptions::parse(&self.dsn)
            .await
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;
        let client = Client::with_options(options)
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;

        Ok(MongoDbStore::new(client, self.database))
    }
}
