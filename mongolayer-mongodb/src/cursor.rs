//! Cursors lent to caller callbacks.
//!
//! The handle opens the cursor, lends it to the callback, and closes it once
//! the callback returns, whether it succeeded, failed or stopped early.
//! Callbacks never close the cursor themselves.

use bson::Document;
use futures::TryStreamExt;
use mongodb::Cursor;
use mongolayer_core::error::MongoResult;
use serde::de::DeserializeOwned;

use crate::convert::translate_error;

/// A live result cursor borrowed for the duration of a callback.
#[derive(Debug)]
pub struct ScopedCursor {
    inner: Cursor<Document>,
}

impl ScopedCursor {
    pub(crate) fn new(inner: Cursor<Document>) -> Self {
        Self { inner }
    }

    /// Advances the cursor and returns the next raw document.
    pub async fn next_document(&mut self) -> MongoResult<Option<Document>> {
        self.inner.try_next().await.map_err(translate_error)
    }

    /// Advances the cursor and decodes the next document.
    pub async fn next<T>(&mut self) -> MongoResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        match self.next_document().await? {
            Some(doc) => Ok(Some(bson::deserialize_from_document(doc)?)),
            None => Ok(None),
        }
    }

    /// Drains the remaining documents.
    pub async fn collect<T>(&mut self) -> MongoResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut items = Vec::new();
        while let Some(item) = self.next().await? {
            items.push(item);
        }

        Ok(items)
    }

    /// The driver cursor, for anything not covered above.
    pub fn raw(&mut self) -> &mut Cursor<Document> {
        &mut self.inner
    }

    // Dropping a driver cursor kills it on the server.
    pub(crate) fn close(self) {
        drop(self.inner);
    }
}
