use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::RagError;
use crate::rag::chunker::{DEFAULT_OVERLAP, DEFAULT_TARGET_SIZE};
use crate::rag::retriever::DEFAULT_TOP_K;

/// Chunking parameters for document ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters.
    pub target_size: usize,
    /// Overlap between adjacent chunks in characters.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

/// Retrieval and context-assembly parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of passages to retrieve per query.
    pub top_k: usize,
    /// Maximum total context length in characters.
    pub max_context_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            max_context_chars: 4000,
        }
    }
}

/// Endpoint settings for the embedding service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key: None,
        }
    }
}

/// Endpoint settings for the generation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            api_key: None,
            temperature: 0.3,
        }
    }
}

/// Application configuration, loaded from a YAML file.
///
/// Every field has a default, so a missing config file yields a usable
/// configuration pointing at OpenAI-compatible endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the persisted index artifact.
    pub index_dir: PathBuf,
    /// Directory for log files.
    pub log_dir: PathBuf,
    /// Timeout for individual embedding/generation calls.
    pub request_timeout_secs: u64,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from("documind_index"),
            log_dir: PathBuf::from("logs"),
            request_timeout_secs: 60,
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            embedding: EmbeddingConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Resolve the config file path: `DOCUMIND_CONFIG_PATH` wins, otherwise
    /// `documind.yml` in the working directory.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = env::var("DOCUMIND_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        PathBuf::from("documind.yml")
    }

    /// Load configuration from the resolved path, falling back to defaults
    /// when the file does not exist.
    pub fn load() -> Result<Self, RagError> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, RagError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .map_err(|e| RagError::InvalidInput(format!("cannot read {}: {}", path.display(), e)))?;
        let config: AppConfig = serde_yaml::from_str(&contents)
            .map_err(|e| RagError::InvalidInput(format!("invalid config {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RagError> {
        if self.chunking.target_size == 0 {
            return Err(RagError::InvalidInput(
                "chunking.target_size must be at least 1".to_string(),
            ));
        }
        if self.chunking.overlap >= self.chunking.target_size {
            return Err(RagError::InvalidInput(format!(
                "chunking.overlap ({}) must be smaller than chunking.target_size ({})",
                self.chunking.overlap, self.chunking.target_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(RagError::InvalidInput(
                "retrieval.top_k must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(RagError::InvalidInput(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        for (name, url) in [
            ("embedding.base_url", &self.embedding.base_url),
            ("generation.base_url", &self.generation.base_url),
        ] {
            if url.trim().is_empty() {
                return Err(RagError::InvalidInput(format!("{} cannot be empty", name)));
            }
        }
        Ok(())
    }

    /// Fill missing API keys from `OPENAI_API_KEY`, if set.
    pub fn apply_env_secrets(&mut self) {
        if let Ok(key) = env::var("OPENAI_API_KEY") {
            if self.embedding.api_key.is_none() {
                self.embedding.api_key = Some(key.clone());
            }
            if self.generation.api_key.is_none() {
                self.generation.api_key = Some(key);
            }
        }
    }
}
