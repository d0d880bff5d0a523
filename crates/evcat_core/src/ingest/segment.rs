use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const SENTENCE_TERMINATOR: char = '.';

/// One bounded slice of cleaned text, submitted as a single prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// 0-based position in document order.
    pub ordinal: usize,
    pub text: String,
    pub char_count: usize,
    pub text_sha256: String,
}

impl Chunk {
    fn new(ordinal: usize, text: &str) -> Self {
        Self {
            ordinal,
            text: text.to_string(),
            char_count: text.chars().count(),
            text_sha256: hex::encode(Sha256::digest(text.as_bytes())),
        }
    }
}

/// Lazy, deterministic chunk sequence over borrowed text.
///
/// A clone continues from the same position, so callers that need a count up front can
/// `segments.clone().count()` before consuming.
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    rest: &'a str,
    budget: usize,
    ordinal: usize,
}

/// Split `text` into chunks of at most `budget` characters, cutting after the last `.`
/// inside the budget window, or exactly at the budget when the window has none.
pub fn segment(text: &str, budget: usize) -> Segments<'_> {
    Segments {
        rest: text.trim(),
        budget: budget.max(1),
        ordinal: 0,
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.rest.is_empty() {
            return None;
        }

        // Byte offset of the first char past the budget; None means the rest fits.
        let Some((window_end, _)) = self.rest.char_indices().nth(self.budget) else {
            let chunk = Chunk::new(self.ordinal, self.rest);
            self.rest = "";
            self.ordinal += 1;
            return Some(chunk);
        };

        let window = &self.rest[..window_end];
        let cut = match window.rfind(SENTENCE_TERMINATOR) {
            Some(pos) => pos + SENTENCE_TERMINATOR.len_utf8(),
            None => window_end,
        };

        // rest starts with a non-whitespace char and cut >= 1 char, so head is never empty.
        let head = self.rest[..cut].trim();
        let chunk = Chunk::new(self.ordinal, head);
        self.rest = self.rest[cut..].trim();
        self.ordinal += 1;
        Some(chunk)
    }
}
