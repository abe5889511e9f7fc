//! Sentence-based chunking strategy

use unicode_segmentation::UnicodeSegmentation;

use crate::domain::DomainError;
use crate::domain::retrieval::{ChunkingConfig, ChunkingStrategy, TextChunk};

/// Chunking strategy that packs whole sentences into chunks
///
/// Consecutive chunks share up to `chunk_overlap` trailing characters of the
/// previous chunk. A single sentence longer than `chunk_size` becomes its own
/// chunk rather than being split mid-sentence.
#[derive(Debug, Clone, Default)]
pub struct SentenceChunker;

impl SentenceChunker {
    /// Create a new sentence chunker
    pub fn new() -> Self {
        Self
    }

    fn split_sentences(text: &str) -> Vec<&str> {
        text.unicode_sentences()
            .map(str::trim)
            .filter(|sentence| !sentence.is_empty())
            .collect()
    }

    /// Trailing `overlap` bytes of `chunk`, moved forward to a char boundary
    fn overlap_tail(chunk: &str, overlap: usize) -> &str {
        let mut start = chunk.len().saturating_sub(overlap);

        while !chunk.is_char_boundary(start) {
            start += 1;
        }

        chunk[start..].trim_start()
    }
}

impl ChunkingStrategy for SentenceChunker {
    fn chunk(&self, content: &str, config: &ChunkingConfig) -> Result<Vec<TextChunk>, DomainError> {
        config.validate()?;

        let content = content.trim();

        if content.is_empty() {
            return Ok(vec![]);
        }

        if content.len() <= config.chunk_size {
            return Ok(vec![TextChunk::new(content, 0)]);
        }

        let sentences = Self::split_sentences(content);
        let mut chunks: Vec<TextChunk> = Vec::new();
        let mut current_chunk = String::new();

        for sentence in sentences {
            if current_chunk.is_empty() {
                current_chunk.push_str(sentence);
            } else if current_chunk.len() + 1 + sentence.len() <= config.chunk_size {
                current_chunk.push(' ');
                current_chunk.push_str(sentence);
            } else {
                let overlap = if config.chunk_overlap > 0 {
                    Self::overlap_tail(&current_chunk, config.chunk_overlap).to_string()
                } else {
                    String::new()
                };

                if current_chunk.len() >= config.min_chunk_size {
                    let index = chunks.len();
                    chunks.push(TextChunk::new(std::mem::take(&mut current_chunk), index));
                }

                current_chunk = if overlap.is_empty() {
                    sentence.to_string()
                } else {
                    format!("{} {}", overlap, sentence)
                };
            }
        }

        if !current_chunk.is_empty() && current_chunk.len() >= config.min_chunk_size {
            let index = chunks.len();
            chunks.push(TextChunk::new(current_chunk, index));
        }

        if chunks.is_empty() {
            chunks.push(TextChunk::new(content, 0));
        }

        Ok(chunks)
    }

    fn name(&self) -> &'static str {
        "sentence"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_content() {
        let chunker = SentenceChunker::new();
        let config = ChunkingConfig::default();

        assert!(chunker.chunk("", &config).unwrap().is_empty());
        assert!(chunker.chunk("   \n ", &config).unwrap().is_empty());
    }

    #[test]
    fn test_single_sentence() {
        let chunker = SentenceChunker::new();
        let config = ChunkingConfig::new(1000, 0);

        let chunks = chunker.chunk("The sky is blue.", &config).unwrap();

        assert_eq!(chunks, vec![TextChunk::new("The sky is blue.", 0)]);
    }

    #[test]
    fn test_multiple_sentences_small_chunks() {
        let chunker = SentenceChunker::new();
        let config = ChunkingConfig::new(50, 0).with_min_chunk_size(5);

        let content = "First sentence here. Second sentence here. Third sentence here.";
        let chunks = chunker.chunk(content, &config).unwrap();

        assert!(chunks.len() > 1);

        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert!(chunk.content.len() <= config.chunk_size);
        }
    }

    #[test]
    fn test_overlap_carries_previous_text() {
        let chunker = SentenceChunker::new();
        let config = ChunkingConfig::new(40, 12).with_min_chunk_size(1);

        let content = "Alpha beta gamma delta. Epsilon zeta eta theta. Iota kappa lambda mu.";
        let chunks = chunker.chunk(content, &config).unwrap();

        assert!(chunks.len() >= 2);
        assert!(chunks[1].content.starts_with("gamma delta."));
    }

    #[test]
    fn test_overlap_respects_char_boundaries() {
        let chunker = SentenceChunker::new();
        let config = ChunkingConfig::new(30, 7).with_min_chunk_size(1);

        let content = "Привет мир как дела. Второе предложение тут. Третье.";
        let chunks = chunker.chunk(content, &config).unwrap();

        assert!(!chunks.is_empty());
    }

    #[test]
    fn test_unicode_sentences() {
        let chunker = SentenceChunker::new();
        let config = ChunkingConfig::new(100, 0).with_min_chunk_size(5);

        let content = "Hello world! Привет мир! 你好世界!";
        let chunks = chunker.chunk(content, &config).unwrap();

        let combined: String = chunks.iter().map(|c| c.content.as_str()).collect();
        assert!(combined.contains("Hello"));
        assert!(combined.contains("Привет"));
        assert!(combined.contains("你好"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let chunker = SentenceChunker::new();

        assert!(chunker.chunk("text", &ChunkingConfig::new(10, 10)).is_err());
    }

    #[test]
    fn test_name() {
        assert_eq!(SentenceChunker::new().name(), "sentence");
    }
}
