//! Text Normalization
//!
//! Turns chat-formatted text into something a voice can read aloud: markdown
//! markers go, link targets go, whitespace is collapsed.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref LINK: Regex = Regex::new(r"\[([^\]]*)\]\([^)]*\)").unwrap();
    static ref HEADING: Regex = Regex::new(r"(?m)^\s*#{1,6}\s+").unwrap();
    static ref BULLET: Regex = Regex::new(r"(?m)^\s*(?:[-*+]|\d+[.)])\s+").unwrap();
    static ref EMPHASIS: Regex = Regex::new(r"(\*{1,3}|_{2,3}|~~|`+)").unwrap();
}

/// Cleans text for speech
#[derive(Debug, Clone, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Strip markdown and collapse whitespace
    pub fn normalize(&self, text: &str) -> String {
        let text = LINK.replace_all(text, "$1");
        let text = HEADING.replace_all(&text, "");
        let text = BULLET.replace_all(&text, "");
        let text = EMPHASIS.replace_all(&text, "");

        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Whether the text contains anything worth saying
    pub fn is_speakable(&self, text: &str) -> bool {
        text.chars().any(|c| c.is_alphanumeric())
    }
}
