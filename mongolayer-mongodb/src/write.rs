//! Insert, update, upsert and delete operations.

use bson::{Bson, Document, doc};
use mongodb::{
    Collection,
    results::{DeleteResult, InsertManyResult, InsertOneResult, UpdateResult},
};
use mongolayer_core::{
    args::{to_document, to_documents, to_pairs, to_sequence},
    error::{MongoError, MongoResult},
};
use serde::Serialize;

use crate::{
    convert::{bounded, bounded_scope},
    handle::MongoHandle,
};

impl MongoHandle {
    /// Inserts one document.
    pub async fn insert_one<T>(&self, collection: &str, doc: &T) -> MongoResult<InsertOneResult>
    where
        T: Serialize + ?Sized,
    {
        let coll = self.collection(collection).await?;
        let doc = to_document(doc)?;
        tracing::debug!("insert_one into {}", collection);

        bounded(self.query_timeout().await, coll.insert_one(doc)).await
    }

    /// Inserts a sequence of documents in order, stopping at the first failure.
    ///
    /// `docs` must serialize to a sequence of documents; anything else is
    /// rejected with [`MongoError::InvalidArgument`] before the driver is called.
    pub async fn insert_many<T>(&self, collection: &str, docs: &T) -> MongoResult<InsertManyResult>
    where
        T: Serialize + ?Sized,
    {
        let coll = self.collection(collection).await?;
        let docs = to_documents(docs)?;
        tracing::debug!("insert_many of {} documents into {}", docs.len(), collection);

        bounded(self.query_timeout().await, coll.insert_many(docs)).await
    }

    /// Inserts a sequence of documents without ordering, so one failing
    /// document does not stop the rest.
    pub async fn insert_bulk<T>(&self, collection: &str, docs: &T) -> MongoResult<InsertManyResult>
    where
        T: Serialize + ?Sized,
    {
        let coll = self.collection(collection).await?;
        let docs = to_documents(docs)?;
        tracing::debug!("insert_bulk of {} documents into {}", docs.len(), collection);

        bounded(self.query_timeout().await, coll.insert_many(docs).ordered(false)).await
    }

    /// Inserts a sequence of documents and reports whether the insert was
    /// rejected for a duplicate key. Other failures are returned as errors.
    pub async fn insert_check_dup<T>(&self, collection: &str, docs: &T) -> MongoResult<bool>
    where
        T: Serialize + ?Sized,
    {
        match self.insert_many(collection, docs).await {
            Ok(_) => Ok(false),
            Err(MongoError::DuplicateKey(msg)) => {
                tracing::debug!("insert into {} hit a duplicate key: {}", collection, msg);
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    /// Sets the fields of `set` on the document with the given id.
    pub async fn update<T>(&self, collection: &str, id: impl Into<Bson>, set: &T) -> MongoResult<UpdateResult>
    where
        T: Serialize + ?Sized,
    {
        let coll = self.collection(collection).await?;
        let update = doc! { "$set": to_document(set)? };

        self.run_update_one(&coll, doc! { "_id": id.into() }, update, false)
            .await
    }

    /// Applies an update document to the document with the given id.
    pub async fn update_by_id(
        &self,
        collection: &str,
        id: impl Into<Bson>,
        update: Document,
        upsert: bool,
    ) -> MongoResult<UpdateResult> {
        self.update_one(collection, doc! { "_id": id.into() }, update, upsert)
            .await
    }

    /// Applies an update document to the first document matching `filter`.
    pub async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> MongoResult<UpdateResult> {
        let coll = self.collection(collection).await?;

        self.run_update_one(&coll, filter, update, upsert).await
    }

    async fn run_update_one(
        &self,
        coll: &Collection<Document>,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> MongoResult<UpdateResult> {
        tracing::debug!("update_one in {} (upsert: {})", coll.name(), upsert);

        bounded(
            self.query_timeout().await,
            coll.update_one(filter, update).upsert(upsert),
        )
        .await
    }

    /// Applies an update document to every document matching `filter`.
    pub async fn update_many(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> MongoResult<UpdateResult> {
        let coll = self.collection(collection).await?;
        tracing::debug!("update_many in {} (upsert: {})", collection, upsert);

        bounded(
            self.query_timeout().await,
            coll.update_many(filter, update).upsert(upsert),
        )
        .await
    }

    /// Sets the fields of `set` on the document with the given id, creating
    /// the document if it does not exist.
    pub async fn upsert<T>(&self, collection: &str, id: impl Into<Bson>, set: &T) -> MongoResult<UpdateResult>
    where
        T: Serialize + ?Sized,
    {
        let coll = self.collection(collection).await?;
        let update = doc! { "$set": to_document(set)? };

        self.run_update_one(&coll, doc! { "_id": id.into() }, update, true)
            .await
    }

    /// Applies an update document to the first match of `filter`, inserting
    /// when nothing matches.
    pub async fn upsert_with_query(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> MongoResult<UpdateResult> {
        self.update_one(collection, filter, update, true).await
    }

    /// Upserts `docs[i]` under `ids[i]` for every pair.
    ///
    /// Both arguments must be sequences of the same length. Pairs are written
    /// one by one and the first failure ends the run; earlier pairs stay
    /// written. The whole run shares one query time limit. Returns how many
    /// documents were changed or created.
    pub async fn upsert_multi<I, D>(&self, collection: &str, ids: &I, docs: &D) -> MongoResult<u64>
    where
        I: Serialize + ?Sized,
        D: Serialize + ?Sized,
    {
        let coll = self.collection(collection).await?;
        let pairs = to_pairs(ids, docs)?;
        tracing::debug!("upsert_multi of {} documents into {}", pairs.len(), collection);

        let limit = self.query_timeout().await;
        bounded_scope(limit, async {
            let mut written = 0;
            for (id, doc) in pairs {
                let result = bounded(
                    limit,
                    coll.update_one(doc! { "_id": id }, doc! { "$set": doc }).upsert(true),
                )
                .await?;
                written += result.modified_count + u64::from(result.upserted_id.is_some());
            }

            Ok(written)
        })
        .await
    }

    /// Deletes the first document matching `filter`.
    pub async fn delete_one(&self, collection: &str, filter: Document) -> MongoResult<DeleteResult> {
        let coll = self.collection(collection).await?;
        tracing::debug!("delete_one from {}", collection);

        bounded(self.query_timeout().await, coll.delete_one(filter)).await
    }

    /// Deletes the document with the given id.
    pub async fn delete_by_id(&self, collection: &str, id: impl Into<Bson>) -> MongoResult<DeleteResult> {
        self.delete_one(collection, doc! { "_id": id.into() }).await
    }

    /// Deletes every document matching `filter`.
    pub async fn delete_many(&self, collection: &str, filter: Document) -> MongoResult<DeleteResult> {
        let coll = self.collection(collection).await?;
        tracing::debug!("delete_many from {}", collection);

        bounded(self.query_timeout().await, coll.delete_many(filter)).await
    }

    /// Deletes every document of the collection.
    pub async fn remove_all(&self, collection: &str) -> MongoResult<DeleteResult> {
        self.delete_many(collection, doc! {}).await
    }

    /// Deletes the documents whose ids are listed in `ids`, which must
    /// serialize to a sequence.
    pub async fn remove_with_ids<I>(&self, collection: &str, ids: &I) -> MongoResult<DeleteResult>
    where
        I: Serialize + ?Sized,
    {
        let coll = self.collection(collection).await?;
        let ids = to_sequence(ids)?;
        tracing::debug!("remove_with_ids of {} ids from {}", ids.len(), collection);

        bounded(
            self.query_timeout().await,
            coll.delete_many(doc! { "_id": { "$in": ids } }),
        )
        .await
    }
}
