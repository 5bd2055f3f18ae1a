//! Keyword, vector and filter retrieval over the context palace store.
//!
//! Depends on `palace-storage` for the SQL primitives and `palace-core` for
//! the shared shard/filter types; never touches `rusqlite` directly.

mod filters;
pub mod error;
pub mod keyword;
pub mod memory;
pub mod vector;

pub use error::{Result, RetrievalError};
pub use keyword::keyword_retrieve;
pub use memory::{recall_keyword, recall_vector};
pub use vector::{cosine_similarity, vector_retrieve, RankedShard};
