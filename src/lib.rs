//! DocuMind core: answer questions about a document corpus by retrieving
//! the most relevant passages and grounding a language model on them.
//!
//! The crate owns chunking, index construction and persistence, similarity
//! search, and context assembly. Text extraction and the embedding and
//! generation models are external collaborators injected through the
//! `llm::Embedder` and `llm::Generator` traits.

pub mod config;
pub mod errors;
pub mod llm;
pub mod logging;
pub mod rag;

pub use config::AppConfig;
pub use errors::RagError;
pub use rag::{Answer, Document, IndexBuildReport, RagEngine};
