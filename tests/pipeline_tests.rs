//! End-to-end pipeline tests against deterministic stub services.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use documind_core::llm::{Embedder, Generator};
use documind_core::{AppConfig, Document, RagEngine, RagError};

/// Deterministic embedder: one dimension per keyword plus a constant bias,
/// so relevance follows keyword overlap.
struct KeywordEmbedder;

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn id(&self) -> String {
        "stub:keyword".to_string()
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        Ok(inputs
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                vec![
                    lower.matches("cats").count() as f32,
                    lower.matches("dogs").count() as f32,
                    lower.matches("fish").count() as f32,
                    1.0,
                ]
            })
            .collect())
    }
}

struct CountingGenerator {
    calls: AtomicUsize,
}

impl CountingGenerator {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Generator for CountingGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, RagError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Echo the first context line so tests can see what grounded the answer.
        let context_line = prompt
            .lines()
            .skip_while(|line| *line != "CONTEXT:")
            .nth(1)
            .unwrap_or_default();
        Ok(format!("Based on your documents: {}", context_line))
    }
}

fn test_engine(dir: &tempfile::TempDir) -> (RagEngine, Arc<CountingGenerator>) {
    let mut config = AppConfig::default();
    config.index_dir = dir.path().join("index");
    config.chunking.target_size = 20;
    config.chunking.overlap = 5;
    config.request_timeout_secs = 5;

    let generator = Arc::new(CountingGenerator::new());
    let engine = RagEngine::new(config, Arc::new(KeywordEmbedder), generator.clone());
    (engine, generator)
}

#[tokio::test]
async fn ingest_then_ask_grounds_on_the_right_chunk() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, generator) = test_engine(&dir);

    let docs = [Document::with_id(
        "pets.txt",
        "Cats are mammals. Dogs are mammals too.",
    )];
    let report = engine.ingest(&docs).await.unwrap();
    assert!(report.chunk_count >= 2);
    assert!(engine.has_index());

    let answer = engine.ask("What are cats?").await.unwrap();
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    assert!(answer.context.contains("Cats are mammals"));
    // The top-ranked passage leads the context.
    assert!(answer.context.starts_with("Cats are mammals"));
    assert!(answer.text.starts_with("Based on your documents:"));
}

#[tokio::test]
async fn ask_before_ingest_reports_missing_index() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, generator) = test_engine(&dir);

    let result = engine.ask("What are cats?").await;
    assert!(matches!(result, Err(RagError::IndexNotFound(_))));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn ingest_of_empty_documents_is_invalid_input() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, _) = test_engine(&dir);

    let docs = [Document::with_id("empty.txt", "   \n\t ")];
    let result = engine.ingest(&docs).await;
    assert!(matches!(result, Err(RagError::InvalidInput(_))));
    assert!(!engine.has_index());
}

#[tokio::test]
async fn reingest_fully_replaces_the_index() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, _) = test_engine(&dir);

    let first = [Document::with_id("a.txt", "Cats are mammals.")];
    engine.ingest(&first).await.unwrap();

    let second = [Document::with_id("b.txt", "Fish are animals.")];
    engine.ingest(&second).await.unwrap();

    let answer = engine.ask("Tell me about fish").await.unwrap();
    assert!(answer.context.contains("Fish"));
    assert!(!answer.context.contains("Cats"));
}

#[tokio::test]
async fn failing_embedder_aborts_the_build_without_persisting() {
    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        fn id(&self) -> String {
            "stub:failing".to_string()
        }

        async fn embed(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
            Err(RagError::EmbeddingService("backend unavailable".to_string()))
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.index_dir = dir.path().join("index");

    let engine = RagEngine::new(
        config,
        Arc::new(FailingEmbedder),
        Arc::new(CountingGenerator::new()),
    );

    let docs = [Document::new("Cats are mammals.")];
    let result = engine.ingest(&docs).await;
    assert!(matches!(result, Err(RagError::EmbeddingService(_))));
    assert!(!engine.has_index());
}

#[tokio::test]
async fn generation_failure_surfaces_to_the_caller() {
    struct FailingGenerator;

    #[async_trait]
    impl Generator for FailingGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, RagError> {
            Err(RagError::GenerationService("model crashed".to_string()))
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.index_dir = dir.path().join("index");

    let engine = RagEngine::new(config, Arc::new(KeywordEmbedder), Arc::new(FailingGenerator));

    let docs = [Document::new("Cats are mammals. Dogs are mammals too.")];
    engine.ingest(&docs).await.unwrap();

    let result = engine.ask("What are cats?").await;
    assert!(matches!(result, Err(RagError::GenerationService(_))));
}
