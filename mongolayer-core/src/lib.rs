//! Driver-independent building blocks of mongolayer.
//!
//! This crate holds everything about a database handle that does not need a
//! live connection:
//!
//! - **Connection options** ([`options`]) - Functional options composed into an immutable configuration
//! - **Read preference** ([`read_pref`]) - Replica-set read modes
//! - **Query timeout** ([`timeout`]) - The lock-guarded per-query time limit
//! - **Argument checks** ([`args`]) - Shape validation for bulk operations
//! - **Queries and filters** ([`query`]) - Sort/limit/offset parameters and filter expressions
//! - **Pages** ([`page`]) - Results of the count-and-fetch find
//! - **Error handling** ([`error`]) - The error taxonomy shared by every operation

pub mod args;
pub mod error;
pub mod options;
pub mod page;
pub mod query;
pub mod read_pref;
pub mod timeout;
