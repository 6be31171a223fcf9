//! A thin convenience layer over the MongoDB driver.
//!
//! mongolayer wraps one database of a MongoDB deployment in a
//! [`MongoHandle`](handle::MongoHandle): connection options composed from
//! small option functions, a per-query time limit that can be changed at
//! runtime, and short pass-through methods for insert, find, update, delete
//! and aggregate. Every operation refuses to run on a handle that is not
//! connected, and the driver's outcomes are translated into one error type.
//!
//! # Quick Start
//!
//! ```ignore
//! use mongolayer::prelude::*;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
//! pub struct Data {
//!     #[serde(rename = "_id")]
//!     pub id: String,
//!     pub data: i32,
//! }
//!
//! #[tokio::main]
//! async fn main() -> MongoResult<()> {
//!     let mut handle = MongoHandle::connect(MongoOptions::combine([
//!         set_uri("mongodb://127.0.0.1:27017"),
//!         set_timeout(Duration::from_secs(20)),
//!         set_max_pool_size(20),
//!         set_preferred(ReadMode::Primary),
//!     ]))
//!     .await?;
//!
//!     let item = Data { id: "a".into(), data: 1 };
//!     handle.insert_one("coll", &item).await?;
//!
//!     let found: Data = handle.find_by_id("coll", "a").await?;
//!     assert_eq!(found, item);
//!
//!     handle.delete_by_id("coll", "a").await?;
//!     assert!(handle.find_by_id::<Data>("coll", "a").await.unwrap_err().is_not_found());
//!
//!     handle.disconnect().await;
//!     Ok(())
//! }
//! ```
//!
//! # Cursors
//!
//! `find_with` and `aggregate_with` lend a [`ScopedCursor`](cursor::ScopedCursor)
//! to an async closure. The handle closes the cursor when the closure returns,
//! on success and on error alike.
//!
//! ```ignore
//! let total = handle
//!     .find_with("coll", doc! { "data": { "$gte": 3 } }, async |cursor: &mut ScopedCursor| {
//!         let mut total = 0;
//!         while let Some(item) = cursor.next::<Data>().await? {
//!             total += item.data;
//!         }
//!         Ok(total)
//!     })
//!     .await?;
//! ```

pub mod logging;
pub mod prelude;

pub use mongolayer_core::{args, error, options, page, query, read_pref, timeout};
pub use mongolayer_mongodb::{convert, cursor, handle};

// Re-export the driver and BSON crates for convenience
pub use bson;
pub use mongodb;
