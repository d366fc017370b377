//! Vector tables: models, embeddings, similarity search

pub mod embed;
pub mod model;
pub mod query;
pub mod store;

pub use embed::{embed_checked, Embedder, HashEmbedder};
pub use model::{ColumnType, DistanceFunction, FieldDef, TableModel, VectorIndex};
pub use query::{VectorQuery, SCORE_COLUMN};
pub use store::VectorStore;
