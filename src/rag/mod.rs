//! Retrieval pipeline.
//!
//! - `chunker`: splits extracted text into overlapping segments
//! - `index`: embeds chunks and answers nearest-neighbor queries
//! - `store`: persists the index with atomic full-replace writes
//! - `retriever`: query embedding + top-k search
//! - `synthesizer`: bounded grounding context + answer generation
//! - `engine`: the `ingest`/`ask` facade the application calls

pub mod chunker;
pub mod engine;
pub mod index;
pub mod retriever;
pub mod store;
pub mod synthesizer;

pub use chunker::Chunk;
pub use engine::{Document, IndexBuildReport, RagEngine};
pub use index::{EmbeddingIndex, IndexEntry, IndexMetadata, ScoredPassage};
pub use retriever::Retriever;
pub use store::IndexStore;
pub use synthesizer::{Answer, Synthesizer};
