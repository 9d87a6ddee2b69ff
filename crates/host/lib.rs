//! The query driver: per-request snapshot acquisition, guest execution,
//! fork detection, and the bounded retry loop that guarantees every
//! committed reply observed one consistent view of the chain.

pub mod driver;
pub mod error;

pub use driver::{MAX_QUERY_ATTEMPTS, QueryHost};
pub use error::QueryError;
