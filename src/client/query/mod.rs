//! Query layer: keyed, deduplicated reads and declared-effect writes.

pub mod cache;
pub mod key;

pub use cache::{Mutation, QueryCache, QueryOptions};
pub use key::QueryKey;
