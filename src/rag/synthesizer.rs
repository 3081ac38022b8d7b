//! Answer synthesis: assemble a bounded grounding context from ranked
//! passages and delegate generation to the language-model service.

use std::time::Duration;

use tokio::time::timeout;

use crate::errors::RagError;
use crate::llm::Generator;

use super::index::ScoredPassage;

pub const PASSAGE_DELIMITER: &str = "\n\n---\n\n";

const NO_GROUNDING_ANSWER: &str =
    "I could not find anything relevant in the indexed documents, so I can't answer this from your sources.";

/// Synthesized answer plus the context it was grounded on, for traceability.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub context: String,
}

pub struct Synthesizer {
    max_context_chars: usize,
    timeout_secs: u64,
}

impl Synthesizer {
    pub fn new(max_context_chars: usize, timeout_secs: u64) -> Self {
        Self {
            max_context_chars,
            timeout_secs,
        }
    }

    /// Build a grounding prompt from `passages` and generate an answer.
    ///
    /// With no passages the generator is never invoked; a canned answer is
    /// returned instead. A failing generator, or one returning an empty
    /// string, surfaces as `GenerationService` with no silent retry.
    pub async fn synthesize(
        &self,
        question: &str,
        passages: &[ScoredPassage],
        generator: &dyn Generator,
    ) -> Result<Answer, RagError> {
        if passages.is_empty() {
            return Ok(Answer {
                text: NO_GROUNDING_ANSWER.to_string(),
                context: String::new(),
            });
        }

        let context = self.assemble_context(passages);
        let prompt = build_prompt(question, &context);

        let text = timeout(
            Duration::from_secs(self.timeout_secs),
            generator.generate(&prompt),
        )
        .await
        .map_err(|_| RagError::Timeout {
            operation: "answer generation",
            seconds: self.timeout_secs,
        })??;

        if text.trim().is_empty() {
            return Err(RagError::GenerationService(
                "generator returned an empty answer".to_string(),
            ));
        }

        Ok(Answer { text, context })
    }

    /// Concatenate passages in descending-score order until the character
    /// budget would be exceeded. The top passage is always represented: if it
    /// alone overruns the budget it is truncated rather than dropped.
    pub fn assemble_context(&self, passages: &[ScoredPassage]) -> String {
        let mut context = String::new();

        for passage in passages {
            let addition = if context.is_empty() {
                char_len(&passage.text)
            } else {
                char_len(PASSAGE_DELIMITER) + char_len(&passage.text)
            };

            if char_len(&context) + addition > self.max_context_chars {
                if context.is_empty() {
                    context = passage.text.chars().take(self.max_context_chars).collect();
                }
                break;
            }

            if !context.is_empty() {
                context.push_str(PASSAGE_DELIMITER);
            }
            context.push_str(&passage.text);
        }

        context
    }
}

/// Fixed grounding template: answer only from the context, admit unknowns.
fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "Answer the question using only the context below. \
If the answer is not in the context, say you don't know. Do not make things up.\n\n\
CONTEXT:\n{}\n\n\
QUESTION: {}\n\n\
ANSWER:",
        context, question
    )
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
