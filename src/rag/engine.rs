//! Pipeline facade: the two operations the surrounding application calls.
//!
//! `ingest` chunks the supplied documents, embeds every chunk, and atomically
//! replaces the persisted index. `ask` loads the index, retrieves the most
//! relevant passages for the question, and synthesizes a grounded answer.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::RagError;
use crate::llm::{Embedder, Generator};

use super::chunker;
use super::index::EmbeddingIndex;
use super::retriever::Retriever;
use super::store::IndexStore;
use super::synthesizer::{Answer, Synthesizer};

/// Raw extracted text plus an identifier; exists only during ingestion.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub text: String,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
        }
    }

    pub fn with_id(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexBuildReport {
    pub chunk_count: usize,
}

pub struct RagEngine {
    config: AppConfig,
    store: IndexStore,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
}

impl RagEngine {
    pub fn new(
        config: AppConfig,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        let store = IndexStore::new(&config.index_dir);
        Self {
            config,
            store,
            embedder,
            generator,
        }
    }

    /// Rebuild the index from `documents`, replacing any prior index.
    ///
    /// Always a full rebuild; there is no incremental path. Documents that
    /// are empty after trimming contribute nothing, and an entirely empty
    /// corpus is an `InvalidInput`, not a retryable failure.
    pub async fn ingest(&self, documents: &[Document]) -> Result<IndexBuildReport, RagError> {
        let text = documents
            .iter()
            .filter(|doc| !doc.text.trim().is_empty())
            .map(|doc| doc.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let chunks = chunker::chunk(
            &text,
            self.config.chunking.target_size,
            self.config.chunking.overlap,
        )?;
        tracing::info!(
            "Created {} chunks from {} documents",
            chunks.len(),
            documents.len()
        );

        let index = EmbeddingIndex::build(&chunks, self.embedder.as_ref()).await?;
        self.store.save(&index)?;
        tracing::info!("Index build complete ({} entries)", index.len());

        Ok(IndexBuildReport {
            chunk_count: chunks.len(),
        })
    }

    /// Answer `question` from the persisted index.
    ///
    /// Fails with `IndexNotFound` when no ingest has succeeded yet, which
    /// callers must present differently from a mid-query service failure.
    pub async fn ask(&self, question: &str) -> Result<Answer, RagError> {
        if question.trim().is_empty() {
            return Err(RagError::InvalidInput("question is empty".to_string()));
        }

        let index = self.store.load()?;

        let retriever = Retriever::new(
            self.config.retrieval.top_k,
            self.config.request_timeout_secs,
        );
        let passages = retriever
            .retrieve(question, &index, self.embedder.as_ref())
            .await?;
        tracing::debug!("Retrieved {} passages for question", passages.len());

        let synthesizer = Synthesizer::new(
            self.config.retrieval.max_context_chars,
            self.config.request_timeout_secs,
        );
        synthesizer
            .synthesize(question, &passages, self.generator.as_ref())
            .await
    }

    /// Whether a persisted index already exists at the configured location.
    pub fn has_index(&self) -> bool {
        self.store.exists()
    }
}
