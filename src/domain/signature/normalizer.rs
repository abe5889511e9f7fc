//! Linguistic normalization applied before computing identity tokens

use std::collections::HashSet;
use std::fmt::Debug;

use once_cell::sync::Lazy;
use unicode_segmentation::UnicodeSegmentation;

/// English stop words dropped during normalization
static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "an", "and", "are", "as", "at", "be", "been", "but", "by", "can", "could",
        "did", "do", "does", "for", "from", "had", "has", "have", "how", "i", "if", "in", "into",
        "is", "it", "its", "me", "my", "of", "on", "or", "please", "so", "than", "that", "the",
        "their", "them", "then", "there", "these", "they", "this", "to", "was", "we", "were",
        "what", "when", "where", "which", "who", "why", "will", "with", "would", "you", "your",
    ]
    .into_iter()
    .collect()
});

/// Turns raw text into the token sequence that defines its identity
pub trait TextNormalizer: Send + Sync + Debug {
    /// Normalize text into tokens (order as they appear in the text)
    fn normalize(&self, text: &str) -> Vec<String>;
}

/// Default normalizer: case folding, stop-word removal and light plural folding
#[derive(Debug, Clone, Default)]
pub struct DefaultNormalizer;

impl DefaultNormalizer {
    /// Create a new default normalizer
    pub fn new() -> Self {
        Self
    }

    fn is_stop_word(word: &str) -> bool {
        STOP_WORDS.contains(word)
    }

    /// Fold common English plural forms onto their singular
    fn lemmatize(word: &str) -> String {
        if word.len() <= 3 || word.chars().any(|c| c.is_numeric()) {
            return word.to_string();
        }

        if let Some(stem) = word.strip_suffix("ies") {
            return format!("{}y", stem);
        }

        if word.ends_with("sses") || word.ends_with("xes") || word.ends_with("ches") {
            return word[..word.len() - 2].to_string();
        }

        if word.ends_with('s') && !word.ends_with("ss") && !word.ends_with("us") {
            return word[..word.len() - 1].to_string();
        }

        word.to_string()
    }
}

impl TextNormalizer for DefaultNormalizer {
    fn normalize(&self, text: &str) -> Vec<String> {
        let words: Vec<String> = text.unicode_words().map(|w| w.to_lowercase()).collect();

        let content: Vec<String> = words
            .iter()
            .filter(|w| !Self::is_stop_word(w))
            .map(|w| Self::lemmatize(w))
            .collect();

        // A prompt made only of stop words keeps its words rather than collapsing to nothing
        if content.is_empty() {
            return words.iter().map(|w| Self::lemmatize(w)).collect();
        }

        content
    }
}
