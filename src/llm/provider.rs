use async_trait::async_trait;

use crate::errors::RagError;

/// Embedding capability.
///
/// An implementation must return one vector per input, in input order, all of
/// the same dimension. `id()` names the service and model; it is recorded in
/// index metadata so a query against an index built by a different embedder
/// can be rejected.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier for the service+model (e.g. "openai:text-embedding-3-small").
    fn id(&self) -> String;

    /// Embed each input text into a fixed-dimension vector.
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, RagError>;
}

/// Generation capability: produce an answer from a grounding prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, RagError>;
}
