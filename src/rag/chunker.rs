//! Recursive-boundary text chunking.
//!
//! Splits extracted text on the coarsest boundary first (paragraph, then
//! line, then sentence, then whitespace, then raw characters) and reassembles
//! the pieces into chunks of at most `target_size` characters, each seeded
//! with the trailing `overlap` characters of its predecessor so a concept
//! spanning a boundary survives in at least one chunk.

use serde::{Deserialize, Serialize};

use crate::errors::RagError;

pub const DEFAULT_TARGET_SIZE: usize = 1000;
pub const DEFAULT_OVERLAP: usize = 200;

/// Coarse-to-fine boundary ladder; the empty separator means raw character
/// splitting and always succeeds.
const SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

/// A bounded, ordered slice of source text sized for embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub ordinal: usize,
}

/// Split `text` into overlapping chunks of at most `target_size` characters.
///
/// Pure function of its inputs: identical `(text, target_size, overlap)`
/// always yields identical chunk sequences and ordinals. Chunk ids are
/// derived from ordinals for the same reason.
pub fn chunk(text: &str, target_size: usize, overlap: usize) -> Result<Vec<Chunk>, RagError> {
    if target_size == 0 {
        return Err(RagError::InvalidInput(
            "target_size must be at least 1".to_string(),
        ));
    }
    if overlap >= target_size {
        return Err(RagError::InvalidInput(format!(
            "overlap ({}) must be smaller than target_size ({})",
            overlap, target_size
        )));
    }
    if text.trim().is_empty() {
        return Err(RagError::InvalidInput(
            "text is empty, nothing to chunk".to_string(),
        ));
    }

    let pieces = decompose(text, target_size, &SEPARATORS);
    let assembled = assemble(&pieces, target_size, overlap);

    Ok(assembled
        .into_iter()
        .enumerate()
        .map(|(ordinal, text)| Chunk {
            id: format!("chunk-{:06}", ordinal),
            text,
            ordinal,
        })
        .collect())
}

/// Recursively break `text` into pieces no longer than `target_size`,
/// preferring the coarsest separator that applies. Separators stay attached
/// to the preceding piece so concatenating all pieces reproduces `text`.
fn decompose(text: &str, target_size: usize, separators: &[&str]) -> Vec<String> {
    if char_len(text) <= target_size {
        return vec![text.to_string()];
    }

    match separators.split_first() {
        None | Some((&"", _)) => split_every(text, target_size),
        Some((sep, finer)) => {
            if !text.contains(sep) {
                return decompose(text, target_size, finer);
            }
            let mut pieces = Vec::new();
            for piece in text.split_inclusive(sep) {
                if char_len(piece) <= target_size {
                    pieces.push(piece.to_string());
                } else {
                    pieces.extend(decompose(piece, target_size, finer));
                }
            }
            pieces
        }
    }
}

/// Greedily merge pieces into chunks of at most `target_size` characters,
/// seeding each new chunk with the tail of the previous one.
fn assemble(pieces: &[String], target_size: usize, overlap: usize) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    // Whether `current` holds anything beyond the seeded overlap.
    let mut has_content = false;

    for piece in pieces {
        let piece_len = char_len(piece);
        if has_content && current_len + piece_len > target_size {
            chunks.push(current.clone());

            let mut seed = tail_chars(&current, overlap);
            // The seed must leave room for the piece within target_size.
            let budget = target_size.saturating_sub(piece_len);
            if char_len(&seed) > budget {
                seed = tail_chars(&seed, budget);
            }
            current = seed;
            current_len = char_len(&current);
            has_content = false;
        }
        current.push_str(piece);
        current_len += piece_len;
        has_content = true;
    }

    if has_content {
        chunks.push(current);
    }
    chunks
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn split_every(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size.max(1))
        .map(|window| window.iter().collect())
        .collect()
}

fn tail_chars(text: &str, count: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    let start = chars.len().saturating_sub(count);
    chars[start..].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_overlap_not_smaller_than_target() {
        for target_size in [1, 10, 100] {
            let result = chunk("some text", target_size, target_size);
            assert!(matches!(result, Err(RagError::InvalidInput(_))));
        }
        assert!(matches!(
            chunk("some text", 10, 25),
            Err(RagError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_empty_text() {
        assert!(matches!(
            chunk("   \n\t ", 100, 10),
            Err(RagError::InvalidInput(_))
        ));
    }

    #[test]
    fn short_text_yields_single_chunk() {
        let chunks = chunk("hello world", 100, 10).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "hello world");
        assert_eq!(chunks[0].ordinal, 0);
    }

    #[test]
    fn no_chunk_exceeds_target_size() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(50);
        let chunks = chunk(&text, 120, 30).unwrap();
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(
                c.text.chars().count() <= 120,
                "chunk {} has {} chars",
                c.ordinal,
                c.text.chars().count()
            );
        }
    }

    #[test]
    fn concatenation_minus_overlaps_reconstructs_text() {
        let text = "Paragraph one.\n\nParagraph two is a bit longer than one.\n\nShort.\n\nAnd a final paragraph to close things out properly.";
        let overlap = 10;
        let chunks = chunk(text, 40, overlap).unwrap();

        let mut reconstructed = chunks[0].text.clone();
        let mut prev = chunks[0].text.clone();
        for c in &chunks[1..] {
            // The seed is the predecessor's tail, possibly trimmed to fit.
            let new_content: String = c
                .text
                .chars()
                .skip(seed_len(&prev, &c.text, overlap))
                .collect();
            reconstructed.push_str(&new_content);
            prev = c.text.clone();
        }
        assert_eq!(reconstructed, text);
    }

    fn seed_len(prev: &str, current: &str, overlap: usize) -> usize {
        let prev_chars: Vec<char> = prev.chars().collect();
        let cur_chars: Vec<char> = current.chars().collect();
        for len in (0..=overlap.min(prev_chars.len()).min(cur_chars.len())).rev() {
            if prev_chars[prev_chars.len() - len..] == cur_chars[..len] {
                return len;
            }
        }
        0
    }

    #[test]
    fn adjacent_chunks_share_overlap() {
        let text = "word ".repeat(100);
        let chunks = chunk(&text, 50, 15).unwrap();
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let tail: String = pair[0]
                .text
                .chars()
                .skip(pair[0].text.chars().count().saturating_sub(5))
                .collect();
            assert!(
                pair[1].text.starts_with(&tail) || pair[1].text.contains(&tail),
                "expected overlap between '{}' and '{}'",
                pair[0].text,
                pair[1].text
            );
        }
    }

    #[test]
    fn chunking_is_deterministic() {
        let text = "Sentence one. Sentence two. Sentence three. Sentence four. Sentence five.";
        let first = chunk(text, 30, 8).unwrap();
        let second = chunk(text, 30, 8).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn small_target_yields_overlapping_chunks() {
        let text = "Cats are mammals. Dogs are mammals too.";
        let chunks = chunk(text, 20, 5).unwrap();
        assert!(chunks.len() >= 2);
        assert!(chunks[0].text.contains("Cats are mammals"));
        for c in &chunks {
            assert!(c.text.chars().count() <= 20);
        }
    }

    #[test]
    fn unbroken_token_split_at_character_level() {
        let text = "a".repeat(95);
        let chunks = chunk(&text, 30, 5).unwrap();
        assert!(chunks.len() >= 3);
        for c in &chunks {
            assert!(c.text.chars().count() <= 30);
        }
    }
}
