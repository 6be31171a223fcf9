//! Find, count and aggregate operations, plus collection administration.
//!
//! Reads pass the handle's query timeout to the server as `maxTimeMS` and
//! also bound the call locally, so a server that stops answering still
//! yields [`MongoError::Timeout`]. A zero timeout leaves reads unbounded.

use std::time::Duration;

use bson::{Bson, Document, doc};
use futures::TryStreamExt;
use mongodb::{
    Collection, IndexModel,
    options::{AggregateOptions, CountOptions, FindOneOptions, FindOptions},
};
use mongolayer_core::{
    error::{MongoError, MongoResult},
    page::Page,
    query::Query,
};
use serde::de::DeserializeOwned;

use crate::{
    convert::{bounded, bounded_scope, server_max_time, translate_error},
    cursor::ScopedCursor,
    handle::MongoHandle,
};

fn decode<T: DeserializeOwned>(doc: Document) -> MongoResult<T> {
    Ok(bson::deserialize_from_document(doc)?)
}

async fn decode_all<T: DeserializeOwned>(cursor: mongodb::Cursor<Document>) -> MongoResult<Vec<T>> {
    cursor
        .map_err(translate_error)
        .and_then(|doc| async move { decode::<T>(doc) })
        .try_collect()
        .await
}

impl MongoHandle {
    /// Returns the first document matching `filter`, or
    /// [`MongoError::NotFound`] when there is none.
    pub async fn find_one<T>(&self, collection: &str, filter: Document) -> MongoResult<T>
    where
        T: DeserializeOwned,
    {
        let coll = self.collection(collection).await?;
        tracing::debug!("find_one in {}", collection);

        let limit = self.query_timeout().await;
        let mut options = FindOneOptions::default();
        options.max_time = server_max_time(limit);

        bounded(limit, coll.find_one(filter).with_options(options))
            .await?
            .ok_or_else(|| MongoError::NotFound(collection.to_string()))
            .and_then(decode)
    }

    /// Returns the document with the given id.
    pub async fn find_by_id<T>(&self, collection: &str, id: impl Into<Bson>) -> MongoResult<T>
    where
        T: DeserializeOwned,
    {
        self.find_one(collection, doc! { "_id": id.into() }).await
    }

    /// Returns every document of the collection.
    pub async fn find_all<T>(&self, collection: &str) -> MongoResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        self.find_many(collection, doc! {}).await
    }

    /// Returns every document matching `filter`.
    pub async fn find_many<T>(&self, collection: &str, filter: Document) -> MongoResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        self.find_query(collection, &Query::builder().filter(filter).build())
            .await
    }

    /// Returns the documents selected by `query`, honoring its sort, limit
    /// and offset.
    pub async fn find_query<T>(&self, collection: &str, query: &Query) -> MongoResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let coll = self.collection(collection).await?;
        tracing::debug!("find in {}", collection);

        let limit = self.query_timeout().await;
        bounded_scope(limit, self.run_find(&coll, query, limit)).await
    }

    /// Returns the first document selected by `query`, or
    /// [`MongoError::NotFound`] when there is none.
    pub async fn find_first<T>(&self, collection: &str, query: &Query) -> MongoResult<T>
    where
        T: DeserializeOwned,
    {
        let coll = self.collection(collection).await?;
        tracing::debug!("find_first in {}", collection);

        let limit = self.query_timeout().await;
        let mut options = FindOneOptions::default();
        options.max_time = server_max_time(limit);
        options.sort = query.sort_document();
        options.skip = query.offset.map(|skip| skip as u64);

        bounded(limit, coll.find_one(query.filter.clone()).with_options(options))
            .await?
            .ok_or_else(|| MongoError::NotFound(collection.to_string()))
            .and_then(decode)
    }

    /// Counts the documents matching `query`'s filter and fetches the window
    /// it selects. Both round trips share twice the query timeout.
    pub async fn find_page<T>(&self, collection: &str, query: &Query) -> MongoResult<Page<T>>
    where
        T: DeserializeOwned,
    {
        let coll = self.collection(collection).await?;
        tracing::debug!("find_page in {}", collection);

        let limit = self.query_timeout().await;
        bounded_scope(self.query_timeout.doubled().await, async {
            let count = bounded(
                limit,
                coll.count_documents(query.filter.clone())
                    .with_options(count_options(limit)),
            )
            .await?;
            let items = self.run_find(&coll, query, limit).await?;

            Ok(Page::from_query(items, count, query))
        })
        .await
    }

    /// Opens a cursor over the documents matching `filter` and lends it to
    /// `callback`. The cursor is closed when the callback returns.
    ///
    /// ```ignore
    /// let mut total = 0;
    /// handle
    ///     .find_with("coll", doc! { "data": { "$gte": 3 } }, async |cursor: &mut ScopedCursor| {
    ///         while let Some(item) = cursor.next::<Data>().await? {
    ///             total += item.data;
    ///         }
    ///         Ok(())
    ///     })
    ///     .await?;
    /// ```
    pub async fn find_with<F, R>(&self, collection: &str, filter: Document, callback: F) -> MongoResult<R>
    where
        F: AsyncFnOnce(&mut ScopedCursor) -> MongoResult<R>,
    {
        let coll = self.collection(collection).await?;
        tracing::debug!("find_with in {}", collection);

        let limit = self.query_timeout().await;
        bounded_scope(limit, async {
            let mut options = FindOptions::default();
            options.max_time = server_max_time(limit);
            options.allow_disk_use = Some(true);

            let cursor = coll
                .find(filter)
                .with_options(options)
                .await
                .map_err(translate_error)?;

            lend(cursor, callback).await
        })
        .await
    }

    /// Counts the documents matching `filter`.
    pub async fn count(&self, collection: &str, filter: Document) -> MongoResult<u64> {
        let coll = self.collection(collection).await?;
        tracing::debug!("count in {}", collection);

        let limit = self.query_timeout().await;
        bounded(limit, coll.count_documents(filter).with_options(count_options(limit))).await
    }

    /// Runs `pipeline` and lends the result cursor to `callback`. The cursor
    /// is closed when the callback returns.
    pub async fn aggregate_with<F, R>(&self, collection: &str, pipeline: Vec<Document>, callback: F) -> MongoResult<R>
    where
        F: AsyncFnOnce(&mut ScopedCursor) -> MongoResult<R>,
    {
        let coll = self.collection(collection).await?;
        tracing::debug!("aggregate_with in {}", collection);

        let limit = self.query_timeout().await;
        bounded_scope(limit, async {
            let cursor = coll
                .aggregate(pipeline)
                .with_options(aggregate_options(limit))
                .await
                .map_err(translate_error)?;

            lend(cursor, callback).await
        })
        .await
    }

    /// Runs `pipeline` and returns every result.
    pub async fn aggregate_all<T>(&self, collection: &str, pipeline: Vec<Document>) -> MongoResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let limit = self.query_timeout().await;
        self.aggregate_all_with_max_time(collection, pipeline, limit)
            .await
    }

    /// Runs `pipeline` under `max_time` instead of the handle's query timeout.
    pub async fn aggregate_all_with_max_time<T>(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
        max_time: Duration,
    ) -> MongoResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let coll = self.collection(collection).await?;
        tracing::debug!("aggregate in {} (max time {:?})", collection, max_time);

        bounded_scope(max_time, async {
            let cursor = coll
                .aggregate(pipeline)
                .with_options(aggregate_options(max_time))
                .await
                .map_err(translate_error)?;

            decode_all(cursor).await
        })
        .await
    }

    /// Runs `pipeline` and returns its first result, or
    /// [`MongoError::NotFound`] when it produces nothing.
    pub async fn aggregate_one<T>(&self, collection: &str, pipeline: Vec<Document>) -> MongoResult<T>
    where
        T: DeserializeOwned,
    {
        self.aggregate_with(collection, pipeline, async |cursor: &mut ScopedCursor| {
            cursor.next::<T>().await
        })
        .await?
        .ok_or_else(|| MongoError::NotFound(collection.to_string()))
    }

    /// Creates one ascending single-field index per key.
    pub async fn create_index_keys(&self, collection: &str, keys: &[&str]) -> MongoResult<()> {
        let coll = self.collection(collection).await?;
        let limit = self.query_timeout().await;

        for &key in keys {
            tracing::debug!("create index on {}.{}", collection, key);
            bounded(
                limit,
                coll.create_index(IndexModel::builder().keys(doc! { key: 1 }).build()),
            )
            .await?;
        }

        Ok(())
    }

    /// Lists the collections of the handle's database.
    pub async fn collection_names(&self) -> MongoResult<Vec<String>> {
        let client = self.live_client().await?;

        bounded(
            self.query_timeout().await,
            client.database(self.db_name()).list_collection_names(),
        )
        .await
    }

    /// Drops a collection and all of its documents.
    pub async fn drop_collection(&self, collection: &str) -> MongoResult<()> {
        let coll = self.collection(collection).await?;
        tracing::info!("Dropping collection {}", collection);

        bounded(self.query_timeout().await, coll.drop()).await
    }

    async fn run_find<T>(&self, coll: &Collection<Document>, query: &Query, limit: Duration) -> MongoResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut options = FindOptions::default();
        options.max_time = server_max_time(limit);
        options.allow_disk_use = Some(true);
        options.sort = query.sort_document();
        options.limit = query.limit.map(find_limit);
        options.skip = query.offset.map(|skip| skip as u64);

        let cursor = coll
            .find(query.filter.clone())
            .with_options(options)
            .await
            .map_err(translate_error)?;

        decode_all(cursor).await
    }
}

// Negative limits mean "single batch" to the server, so clamp instead of wrapping.
fn find_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn count_options(limit: Duration) -> CountOptions {
    let mut options = CountOptions::default();
    options.max_time = server_max_time(limit);
    options
}

fn aggregate_options(limit: Duration) -> AggregateOptions {
    let mut options = AggregateOptions::default();
    options.max_time = server_max_time(limit);
    options.allow_disk_use = Some(true);
    options
}

async fn lend<F, R>(cursor: mongodb::Cursor<Document>, callback: F) -> MongoResult<R>
where
    F: AsyncFnOnce(&mut ScopedCursor) -> MongoResult<R>,
{
    let mut cursor = ScopedCursor::new(cursor);
    let result = callback(&mut cursor).await;
    cursor.close();

    result
}
