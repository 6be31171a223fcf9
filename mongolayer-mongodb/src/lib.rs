//! MongoDB handle for mongolayer.
//!
//! This crate binds the options and error types of `mongolayer-core` to the
//! official MongoDB driver. All wire-protocol work, pooling, cursor streaming
//! and server selection is the driver's; [`MongoHandle`] adds the connectivity
//! guard, per-query time limits, argument checks and error translation.
//!
//! To use it through the facade crate:
//!
//! ```toml
//! [dependencies]
//! mongolayer = { version = "x.y.z" }
//! ```
//!
//! # Operations
//!
//! - **Insert** - `insert_one`, `insert_many`, `insert_bulk`, `insert_check_dup`
//! - **Find** - `find_one`, `find_by_id`, `find_all`, `find_many`, `find_query`, `find_first`, `find_page`, `find_with`
//! - **Update** - `update`, `update_by_id`, `update_one`, `update_many`, `upsert`, `upsert_with_query`, `upsert_multi`
//! - **Delete** - `delete_one`, `delete_by_id`, `delete_many`, `remove_all`, `remove_with_ids`
//! - **Aggregate** - `aggregate_with`, `aggregate_all`, `aggregate_all_with_max_time`, `aggregate_one`
//! - **Administration** - `count`, `create_index_keys`, `collection_names`, `drop_collection`

pub mod convert;
pub mod cursor;
pub mod handle;
mod read;
mod write;


pub use cursor::ScopedCursor;
pub use handle::MongoHandle;
