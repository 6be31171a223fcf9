//! Convenient re-exports of commonly used types from mongolayer.
//!
//! ```ignore
//! use mongolayer::prelude::*;
//! ```

pub use std::time::Duration;

pub use bson::{Bson, Document, doc};
pub use mongolayer_core::{
    error::{MongoError, MongoResult},
    options::{
        BoxedOption, MongoOption, MongoOptions, set_db_name, set_max_pool_size, set_preferred, set_preferred_str,
        set_timeout, set_uri,
    },
    page::Page,
    query::{Expr, FieldOp, Filter, Query, QueryBuilder, Sort, SortDirection},
    read_pref::ReadMode,
};
pub use mongolayer_mongodb::{MongoHandle, ScopedCursor};
