//! Query-time retrieval: embed the question, search the index.

use std::time::Duration;

use tokio::time::timeout;

use crate::errors::RagError;
use crate::llm::Embedder;

use super::index::{EmbeddingIndex, ScoredPassage};

pub const DEFAULT_TOP_K: usize = 3;

pub struct Retriever {
    top_k: usize,
    timeout_secs: u64,
}

impl Retriever {
    pub fn new(top_k: usize, timeout_secs: u64) -> Self {
        Self {
            top_k,
            timeout_secs,
        }
    }

    /// Embed `query` and return the top-k passages from `index`.
    ///
    /// The embedder must be the one the index was built with; cross-service
    /// vectors are not comparable. Query embeddings are never cached, each
    /// call stands alone.
    pub async fn retrieve(
        &self,
        query: &str,
        index: &EmbeddingIndex,
        embedder: &dyn Embedder,
    ) -> Result<Vec<ScoredPassage>, RagError> {
        let embedder_id = embedder.id();
        if embedder_id != index.metadata.embedder_id {
            return Err(RagError::EmbeddingMismatch {
                expected: index.metadata.embedder_id.clone(),
                actual: embedder_id,
            });
        }

        let inputs = vec![query.to_string()];
        let vectors = timeout(
            Duration::from_secs(self.timeout_secs),
            embedder.embed(&inputs),
        )
        .await
        .map_err(|_| RagError::Timeout {
            operation: "query embedding",
            seconds: self.timeout_secs,
        })??;

        let query_vector = vectors.into_iter().next().ok_or_else(|| {
            RagError::EmbeddingService("no vector returned for the query".to_string())
        })?;

        index.search(&query_vector, self.top_k)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::Utc;

    use crate::rag::index::{IndexEntry, IndexMetadata};

    use super::*;

    struct KeywordEmbedder {
        id: &'static str,
    }

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        fn id(&self) -> String {
            self.id.to_string()
        }

        async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
            Ok(inputs
                .iter()
                .map(|text| {
                    let lower = text.to_lowercase();
                    vec![
                        lower.matches("cats").count() as f32,
                        lower.matches("dogs").count() as f32,
                        1.0,
                    ]
                })
                .collect())
        }
    }

    fn index_with(embedder_id: &str, entries: Vec<(&str, Vec<f32>)>) -> EmbeddingIndex {
        let dimension = entries.first().map(|(_, v)| v.len()).unwrap_or(3);
        EmbeddingIndex {
            metadata: IndexMetadata {
                embedder_id: embedder_id.to_string(),
                dimension,
                created_at: Utc::now(),
            },
            entries: entries
                .into_iter()
                .enumerate()
                .map(|(ordinal, (text, vector))| IndexEntry {
                    chunk_id: format!("chunk-{:06}", ordinal),
                    vector,
                    text: text.to_string(),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn rejects_mismatched_embedder_identity() {
        let index = index_with("stub:other", vec![("a", vec![1.0, 0.0, 0.0])]);
        let retriever = Retriever::new(3, 5);
        let result = retriever
            .retrieve("question", &index, &KeywordEmbedder { id: "stub:kw" })
            .await;
        assert!(matches!(result, Err(RagError::EmbeddingMismatch { .. })));
    }

    #[tokio::test]
    async fn retrieves_most_relevant_passage_first() {
        let embedder = KeywordEmbedder { id: "stub:kw" };
        let index = index_with(
            "stub:kw",
            vec![
                ("Cats are mammals.", vec![1.0, 0.0, 1.0]),
                ("Dogs are mammals too.", vec![0.0, 1.0, 1.0]),
            ],
        );

        let retriever = Retriever::new(2, 5);
        let results = retriever
            .retrieve("What are cats?", &index, &embedder)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].text, "Cats are mammals.");
    }

    #[tokio::test]
    async fn slow_embedder_times_out() {
        struct SlowEmbedder;

        #[async_trait]
        impl Embedder for SlowEmbedder {
            fn id(&self) -> String {
                "stub:slow".to_string()
            }

            async fn embed(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(vec![vec![1.0]])
            }
        }

        tokio::time::pause();
        let index = index_with("stub:slow", vec![("a", vec![1.0])]);
        let retriever = Retriever::new(1, 1);
        let result = retriever.retrieve("q", &index, &SlowEmbedder).await;
        assert!(matches!(result, Err(RagError::Timeout { .. })));
    }
}
