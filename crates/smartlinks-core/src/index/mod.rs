//! Denormalized search index: one row per stemmed key of every linkable object.

mod redb_index;
mod traits;

pub use redb_index::{RedbIndex, CURRENT_SCHEMA_VERSION};
pub use traits::SearchIndex;
