//! Token estimation and budget-aware chunking

use serde::Serialize;

/// Rough token count: `ceil(chars / chars_per_token)`, at least 1 for
/// non-empty text.
pub fn estimate_tokens(text: &str, chars_per_token: usize) -> usize {
    let chars = text.chars().count();
    if chars == 0 {
        return 0;
    }
    chars.div_ceil(chars_per_token.max(1)).max(1)
}

/// Split `text` into line-respecting chunks of at most `chunk_size_chars`.
///
/// Each line keeps its terminator. Lines longer than the chunk size are
/// hard-split on character boundaries. Concatenating the result yields the
/// input unchanged.
pub fn split_into_chunks(text: &str, chunk_size_chars: usize) -> Vec<String> {
    let size = chunk_size_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();

        if line_len > size {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(size) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        if current_len + line_len > size && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Prefix of a text's chunks that fits a token budget
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChunkedTextForTokenBudget {
    pub chunks: Vec<String>,
    pub used_tokens: usize,
    pub estimated_total_tokens: usize,
    pub total_chunk_count: usize,
    pub included_chunk_count: usize,
    pub omitted_chunk_count: usize,
    pub partial_chunk_included: bool,
    pub truncated: bool,
}

impl ChunkedTextForTokenBudget {
    pub fn text(&self) -> String {
        self.chunks.concat()
    }
}

/// Greedily take whole chunks while they fit `max_tokens`; the first chunk
/// that does not fit contributes a character prefix sized to what is left.
pub fn chunk_for_budget(
    text: &str,
    chunk_size_chars: usize,
    max_tokens: usize,
    chars_per_token: usize,
) -> ChunkedTextForTokenBudget {
    select_chunks(
        split_into_chunks(text, chunk_size_chars),
        max_tokens,
        chars_per_token,
    )
}

/// Budget selection over chunks that were already split
pub fn select_chunks(
    all: Vec<String>,
    max_tokens: usize,
    chars_per_token: usize,
) -> ChunkedTextForTokenBudget {
    let cpt = chars_per_token.max(1);
    let total_chunk_count = all.len();
    let total_chars: usize = all.iter().map(|c| c.chars().count()).sum();
    let estimated_total_tokens = total_chars.div_ceil(cpt);

    let mut chunks = Vec::new();
    let mut used_tokens = 0usize;
    let mut partial_chunk_included = false;

    for chunk in all {
        let cost = estimate_tokens(&chunk, cpt);
        if used_tokens + cost <= max_tokens {
            used_tokens += cost;
            chunks.push(chunk);
            continue;
        }

        let remaining = max_tokens - used_tokens;
        if remaining > 0 {
            let prefix: String = chunk.chars().take(remaining * cpt).collect();
            if !prefix.is_empty() {
                used_tokens += estimate_tokens(&prefix, cpt);
                chunks.push(prefix);
                partial_chunk_included = true;
            }
        }
        break;
    }

    let included_chunk_count = chunks.len();
    let omitted_chunk_count = total_chunk_count - included_chunk_count;

    ChunkedTextForTokenBudget {
        chunks,
        used_tokens,
        estimated_total_tokens,
        total_chunk_count,
        included_chunk_count,
        omitted_chunk_count,
        partial_chunk_included,
        truncated: partial_chunk_included || omitted_chunk_count > 0,
    }
}

impl ChunkedTextForTokenBudget {
    /// Chunks included in full
    pub fn whole_chunk_count(&self) -> usize {
        self.included_chunk_count - usize::from(self.partial_chunk_included)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens("", 4), 0);
        assert_eq!(estimate_tokens("a", 4), 1);
        assert_eq!(estimate_tokens("abcd", 4), 1);
        assert_eq!(estimate_tokens("abcde", 4), 2);
        assert_eq!(estimate_tokens("abc", 0), 3);
    }

    #[test]
    fn test_split_round_trips() {
        let samples = [
            "",
            "single line",
            "a\nb\nc\n",
            "short\na much longer line that exceeds the chunk size\n\n\ntail",
            "crlf\r\nlines\r\n",
            "ünïcödé\nçhárs\n",
        ];
        for text in samples {
            for size in [0, 1, 3, 8, 64] {
                assert_eq!(split_into_chunks(text, size).concat(), text, "size {size}");
            }
        }
    }

    #[test]
    fn test_split_packs_lines_greedily() {
        let chunks = split_into_chunks("aa\nbb\ncc\n", 6);
        assert_eq!(chunks, vec!["aa\nbb\n", "cc\n"]);
    }

    #[test]
    fn test_split_hard_splits_long_lines() {
        let chunks = split_into_chunks("x\nabcdefghij\ny\n", 4);
        assert_eq!(chunks, vec!["x\n", "abcd", "efgh", "ij\n", "y\n"]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 4));
    }

    #[test]
    fn test_budget_truncates_long_text() {
        let text = "a".repeat(400);
        let result = chunk_for_budget(&text, 100, 30, 4);
        assert!(result.truncated);
        assert!(result.used_tokens <= 30);
        assert_eq!(result.total_chunk_count, 4);
        assert_eq!(result.included_chunk_count, 2);
        assert!(result.partial_chunk_included);
        assert_eq!(result.omitted_chunk_count, 2);
        assert_eq!(result.text(), "a".repeat(120));
        assert_eq!(result.estimated_total_tokens, 100);
    }

    #[test]
    fn test_budget_fits_whole_text() {
        let result = chunk_for_budget("hello\nworld\n", 6, 100, 4);
        assert!(!result.truncated);
        assert_eq!(result.text(), "hello\nworld\n");
        assert_eq!(result.omitted_chunk_count, 0);
        assert_eq!(result.included_chunk_count, result.total_chunk_count);
    }

    #[test]
    fn test_budget_zero_tokens_omits_everything() {
        let result = chunk_for_budget("abc\n", 10, 0, 4);
        assert!(result.chunks.is_empty());
        assert!(result.truncated);
        assert_eq!(result.omitted_chunk_count, 1);
        assert_eq!(result.used_tokens, 0);
    }

    #[test]
    fn test_budget_empty_text() {
        let result = chunk_for_budget("", 10, 10, 4);
        assert!(!result.truncated);
        assert_eq!(result.total_chunk_count, 0);
    }
}
