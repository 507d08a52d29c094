//! Text chunking with separator-priority splitting and overlap.
//!
//! Long free-text sources are split on a priority-ordered separator
//! list (paragraph, then line, then sentence, then raw characters) so that
//! no semantic unit is cut mid-sentence when avoidable. Adjacent units
//! are then merged back up to the target chunk length, carrying a
//! configurable overlap between consecutive chunks.

/// Separators tried in priority order before the character fallback.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", ". "];

/// Split text into chunks targeting `chunk_size` characters with
/// `overlap` characters carried between consecutive chunks. A chunk
/// may exceed the target by at most the overlap it inherited.
///
/// Overlap is clamped to half the chunk size so a chunk can never be
/// dominated by repeated text.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() || chunk_size == 0 {
        return vec![];
    }

    if trimmed.len() <= chunk_size {
        return vec![trimmed.to_string()];
    }

    let overlap = overlap.min(chunk_size / 2);
    let units = split_units(trimmed, chunk_size, 0);
    merge_units(units, chunk_size, overlap)
}

/// Recursively split text into units no longer than `chunk_size`,
/// preferring coarser separators.
fn split_units(text: &str, chunk_size: usize, separator_index: usize) -> Vec<String> {
    if text.len() <= chunk_size {
        return vec![text.to_string()];
    }

    if separator_index >= SEPARATORS.len() {
        return char_windows(text, chunk_size);
    }

    let separator = SEPARATORS[separator_index];
    if !text.contains(separator) {
        return split_units(text, chunk_size, separator_index + 1);
    }

    text.split_inclusive(separator)
        .flat_map(|piece| split_units(piece, chunk_size, separator_index + 1))
        .collect()
}

/// Last-resort splitting into fixed-size character windows, respecting
/// UTF-8 boundaries.
fn char_windows(text: &str, chunk_size: usize) -> Vec<String> {
    let mut windows = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + chunk_size).min(text.len());
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        if end == start {
            break;
        }
        windows.push(text[start..end].to_string());
        start = end;
    }

    windows
}

/// Merge split units back into chunks approaching `chunk_size`,
/// carrying `overlap` trailing characters into the next chunk.
fn merge_units(units: Vec<String>, chunk_size: usize, overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for unit in units {
        if !current.is_empty() && current.len() + unit.len() > chunk_size {
            let tail = overlap_tail(&current, overlap);
            push_chunk(&mut chunks, &current);
            current = tail;
        }
        current.push_str(&unit);
    }
    push_chunk(&mut chunks, &current);

    tracing::debug!(
        "Chunked text into {} chunks (size: {}, overlap: {})",
        chunks.len(),
        chunk_size,
        overlap
    );

    chunks
}

fn push_chunk(chunks: &mut Vec<String>, chunk: &str) {
    let trimmed = chunk.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// The trailing `overlap` characters of a chunk, aligned to a UTF-8
/// boundary.
fn overlap_tail(text: &str, overlap: usize) -> String {
    if overlap == 0 || text.len() <= overlap {
        return String::new();
    }

    let mut start = text.len() - overlap;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text() {
        assert!(chunk_text("", 100, 10).is_empty());
        assert!(chunk_text("   \n  ", 100, 10).is_empty());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = chunk_text("Un petit voyage à Rome.", 100, 10);
        assert_eq!(chunks, vec!["Un petit voyage à Rome.".to_string()]);
    }

    #[test]
    fn test_sentences_are_not_cut() {
        let text = (1..=40)
            .map(|i| format!("Ceci est la phrase numero {}. ", i))
            .collect::<String>();
        let chunks = chunk_text(&text, 200, 0);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= 200);
            assert!(chunk.ends_with('.'), "chunk cut mid-sentence: {:?}", chunk);
        }
    }

    #[test]
    fn test_paragraphs_take_priority() {
        let paragraph = "Premier paragraphe sur les visas pour Dubai.";
        let text = format!("{}\n\n{}\n\n{}", paragraph, paragraph, paragraph);
        let chunks = chunk_text(&text, paragraph.len() + 2, 0);
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn test_char_fallback_respects_size() {
        let text = "0123456789".repeat(50);
        let chunks = chunk_text(&text, 100, 0);
        assert_eq!(chunks.len(), 5);
        assert!(chunks.iter().all(|c| c.len() == 100));
    }

    #[test]
    fn test_overlap_carries_tail_forward() {
        let text = "0123456789".repeat(50);
        let chunks = chunk_text(&text, 100, 20);

        assert!(chunks.len() > 1);
        let tail_of_first = &chunks[0][chunks[0].len() - 20..];
        assert!(chunks[1].starts_with(tail_of_first));
    }

    #[test]
    fn test_overlap_is_clamped() {
        // Overlap larger than the chunk cannot starve forward progress
        let text = "abcdefghij".repeat(30);
        let chunks = chunk_text(&text, 50, 500);
        assert!(chunks.len() >= 2);
    }

    #[test]
    fn test_utf8_boundaries() {
        let text = "é".repeat(300);
        let chunks = chunk_text(&text, 100, 10);
        assert!(!chunks.is_empty());
        for chunk in chunks {
            assert!(chunk.chars().all(|c| c == 'é'));
        }
    }
}
