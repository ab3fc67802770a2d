//! Core text processing
//!
//! Prepares chat output for the speech queue: sentence segmentation and
//! speakable-text cleanup.

pub mod segmenter;
pub mod text_normalizer;

pub use segmenter::SentenceSegmenter;
pub use text_normalizer::TextNormalizer;
