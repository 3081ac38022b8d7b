//! External language-model services.
//!
//! The pipeline depends on two injected capabilities: an `Embedder` turning
//! text into fixed-dimension vectors and a `Generator` producing an answer
//! from a grounding prompt. `OpenAiCompatProvider` implements both against
//! any OpenAI-compatible HTTP endpoint.

mod openai;
mod provider;

pub use openai::OpenAiCompatProvider;
pub use provider::{Embedder, Generator};
