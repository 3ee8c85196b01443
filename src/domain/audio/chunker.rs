/// Split text into chunks that respect sentence boundaries.
///
/// Synthesis providers enforce a per-request character limit, so long texts
/// are packed greedily: sentences accumulate into the current chunk until
/// adding the next one would exceed `max_len`, then a new chunk starts.
/// A single sentence longer than `max_len` becomes its own oversized chunk
/// rather than being truncated mid-sentence.
///
/// Empty (or whitespace-only) input yields an empty sequence; callers treat
/// that as a no-op, not an error.
pub fn chunk_text(text: &str, max_len: usize) -> Vec<String> {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in sentences {
        if current.is_empty() {
            current = sentence;
            continue;
        }

        // +1 accounts for the joining space
        if current.len() + 1 + sentence.len() > max_len {
            chunks.push(current);
            current = sentence;
        } else {
            current.push(' ');
            current.push_str(&sentence);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Split text into sentences on terminal punctuation followed by whitespace.
/// Each returned sentence is trimmed and keeps its terminal punctuation.
fn split_sentences(text: &str) -> Vec<String> {
    let sentence_pattern = regex::Regex::new(r"[.!?]+\s+").unwrap();
    let mut sentences = Vec::new();
    let mut last_end = 0;

    for mat in sentence_pattern.find_iter(text) {
        let sentence = text[last_end..mat.end()].trim();
        if !sentence.is_empty() {
            sentences.push(sentence.to_string());
        }
        last_end = mat.end();
    }

    // Remaining text after the last sentence boundary
    let tail = text[last_end..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(chunk_text("", 5000).is_empty());
        assert!(chunk_text("   \n\t ", 5000).is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let text = "This is a short text.";
        let chunks = chunk_text(text, 5000);
        assert_eq!(chunks, vec![text.to_string()]);
    }

    #[test]
    fn test_boundaries_fall_on_sentence_punctuation() {
        let text = "Question? Answer! Statement. Trailing clause";
        let chunks = chunk_text(text, 12);
        assert_eq!(
            chunks,
            vec!["Question?", "Answer!", "Statement.", "Trailing clause"]
        );
    }

    #[test]
    fn test_chunks_respect_max_length() {
        let sentence = "This is a sentence. ";
        let text = sentence.repeat(300); // 6000 chars
        let chunks = chunk_text(&text, 3000);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(
                chunk.len() <= 3000,
                "chunk length {} exceeds limit",
                chunk.len()
            );
        }
    }

    #[test]
    fn test_concatenation_preserves_sentence_sequence() {
        let sentence = "Sentence number one is here. ";
        let text = sentence.repeat(250);
        let chunks = chunk_text(&text, 3000);

        let rejoined = chunks.join(" ");
        let original_words: Vec<&str> = text.split_whitespace().collect();
        let rejoined_words: Vec<&str> = rejoined.split_whitespace().collect();
        assert_eq!(original_words, rejoined_words);
    }

    #[test]
    fn test_oversized_sentence_is_its_own_chunk() {
        let long_sentence = format!("{}.", "word ".repeat(40).trim());
        let text = format!("Short one. {} Short two.", long_sentence);
        let chunks = chunk_text(&text, 50);

        assert!(chunks.iter().any(|c| c.len() > 50));
        assert!(chunks.contains(&long_sentence));
        // Nothing was truncated
        let rejoined = chunks.join(" ");
        assert_eq!(rejoined, text);
    }

    #[test]
    fn test_twelve_thousand_chars_at_five_thousand_limit() {
        // ~80-char sentences, ~12,000 chars total, 5,000-char limit
        let sentence = "The quick brown fox jumps over the lazy dog while the band plays on quietly. "; // 78 chars
        let text = sentence.repeat(154); // ~12,012 chars
        let chunks = chunk_text(text.trim(), 5000);

        assert_eq!(chunks.len(), 3);
        for chunk in &chunks {
            assert!(chunk.len() <= 5000);
        }
    }
}
