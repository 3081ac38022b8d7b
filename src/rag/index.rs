//! In-memory embedding index: build from chunks, nearest-neighbor search.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::RagError;
use crate::llm::Embedder;

use super::chunker::Chunk;

/// The persisted unit: an embedding vector tied to its originating chunk text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk_id: String,
    pub vector: Vec<f32>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Identity of the embedding service that produced the vectors.
    pub embedder_id: String,
    /// Fixed dimensionality shared by every stored vector.
    pub dimension: usize,
    pub created_at: DateTime<Utc>,
}

/// An ordered collection of entries plus metadata. Either fully built or
/// nonexistent; partial indexes are never observable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingIndex {
    pub metadata: IndexMetadata,
    pub entries: Vec<IndexEntry>,
}

/// One retrieved passage with its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPassage {
    pub text: String,
    pub score: f32,
}

impl EmbeddingIndex {
    /// Embed every chunk and assemble the index.
    ///
    /// One logical embedding pass, order preserved. Any embedding failure
    /// aborts the whole build; a dimensionality disagreement among the
    /// returned vectors means the service broke its fixed-dimension contract.
    pub async fn build(chunks: &[Chunk], embedder: &dyn Embedder) -> Result<Self, RagError> {
        if chunks.is_empty() {
            return Err(RagError::EmptyInput);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed(&texts).await?;

        if vectors.len() != chunks.len() {
            return Err(RagError::EmbeddingService(format!(
                "expected {} vectors, got {}",
                chunks.len(),
                vectors.len()
            )));
        }

        let dimension = vectors[0].len();
        if dimension == 0 {
            return Err(RagError::EmbeddingService(
                "embedding service returned zero-dimensional vectors".to_string(),
            ));
        }
        for (chunk, vector) in chunks.iter().zip(&vectors) {
            if vector.len() != dimension {
                return Err(RagError::EmbeddingService(format!(
                    "mixed dimensionality: chunk '{}' got {} dims, expected {}",
                    chunk.id,
                    vector.len(),
                    dimension
                )));
            }
        }

        let entries = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry {
                chunk_id: chunk.id.clone(),
                vector,
                text: chunk.text.clone(),
            })
            .collect();

        Ok(Self {
            metadata: IndexMetadata {
                embedder_id: embedder.id(),
                dimension,
                created_at: Utc::now(),
            },
            entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top-k cosine-similarity search, descending by score.
    ///
    /// Ties keep insertion order (the sort is stable), so identical inputs
    /// always produce identical rankings. `k` larger than the index is
    /// clamped; `k == 0` returns an empty result.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredPassage>, RagError> {
        if self.entries.is_empty() {
            return Err(RagError::EmptyIndex);
        }
        if query.len() != self.metadata.dimension {
            return Err(RagError::EmbeddingMismatch {
                expected: format!("{} ({} dims)", self.metadata.embedder_id, self.metadata.dimension),
                actual: format!("query vector with {} dims", query.len()),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(ordinal, entry)| (ordinal, cosine_similarity(query, &entry.vector)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k.min(self.entries.len()));

        Ok(scored
            .into_iter()
            .map(|(ordinal, score)| ScoredPassage {
                text: self.entries[ordinal].text.clone(),
                score,
            })
            .collect())
    }

    /// Structural validation used when loading a persisted index.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.metadata.embedder_id.trim().is_empty() {
            return Err(RagError::IndexCorrupt(
                "missing embedding service identifier".to_string(),
            ));
        }
        if self.metadata.dimension == 0 {
            return Err(RagError::IndexCorrupt("vector dimension is zero".to_string()));
        }
        if self.entries.is_empty() {
            return Err(RagError::IndexCorrupt(
                "index has no entries; a build never persists an empty index".to_string(),
            ));
        }
        for entry in &self.entries {
            if entry.vector.len() != self.metadata.dimension {
                return Err(RagError::IndexCorrupt(format!(
                    "entry '{}' has {} dims, metadata says {}",
                    entry.chunk_id,
                    entry.vector.len(),
                    self.metadata.dimension
                )));
            }
        }
        Ok(())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON {
        0.0
    } else {
        dot / denom
    }
}
