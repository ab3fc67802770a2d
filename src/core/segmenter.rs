//! Sentence segmentation for streamed chat output
//!
//! The chat layer may hand over whole replies or token deltas. The segmenter
//! buffers text and yields complete, cleaned sentences so the speech queue
//! always receives one sentence per `submit`.

use super::text_normalizer::TextNormalizer;

/// Characters that may trail a terminator and still belong to the sentence
fn is_closing(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '"' | '\'' | ')' | ']' | '”' | '’' | '»')
}

#[derive(Debug, Default)]
pub struct SentenceSegmenter {
    buffer: String,
    normalizer: TextNormalizer,
}

impl SentenceSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, get back every sentence it completed
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);

        let mut sentences = Vec::new();
        while let Some(end) = next_boundary(&self.buffer) {
            let rest = self.buffer.split_off(end);
            let sentence = std::mem::replace(&mut self.buffer, rest.trim_start().to_string());
            if let Some(cleaned) = self.clean(&sentence) {
                sentences.push(cleaned);
            }
        }
        sentences
    }

    /// Flush whatever is left once the reply is complete
    pub fn finish(&mut self) -> Option<String> {
        let tail = std::mem::take(&mut self.buffer);
        self.clean(&tail)
    }

    /// Discard buffered text without emitting it
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    fn clean(&self, sentence: &str) -> Option<String> {
        let cleaned = self.normalizer.normalize(sentence);
        self.normalizer.is_speakable(&cleaned).then_some(cleaned)
    }
}

/// Byte offset just past the first complete sentence, if any.
///
/// A sentence ends at a newline, or at `.`/`!`/`?` (plus closing quotes and
/// brackets) followed by whitespace. A terminator at the very end of the
/// buffer is not a boundary yet: more text may follow, as in `32.5`.
fn next_boundary(buffer: &str) -> Option<usize> {
    let chars: Vec<(usize, char)> = buffer.char_indices().collect();

    let mut i = 0;
    while i < chars.len() {
        let (pos, c) = chars[i];
        if c == '\n' {
            return Some(pos + 1);
        }
        if matches!(c, '.' | '!' | '?') {
            let mut j = i + 1;
            while j < chars.len() && is_closing(chars[j].1) {
                j += 1;
            }
            if j < chars.len() && chars[j].1.is_whitespace() {
                return Some(chars[j].0);
            }
            i = j;
            continue;
        }
        i += 1;
    }
    None
}
