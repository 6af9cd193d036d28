//! Splitting report text into size-bounded chunks.
//!
//! Chunks break at line boundaries. A single line longer than the limit is
//! the only thing ever cut, at character (not byte) positions.

/// Splits `text` into chunks of at most `max_chars` characters.
///
/// Joining the chunks with `"\n"` gives back `text` as long as no line
/// exceeds `max_chars`. Empty input gives no chunks.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current: Option<(String, usize)> = None;

    for line in text.split('\n') {
        for piece in hard_split(line, max_chars) {
            let piece_len = piece.chars().count();
            current = match current.take() {
                Some((mut chunk, len)) if len + 1 + piece_len <= max_chars => {
                    chunk.push('\n');
                    chunk.push_str(piece);
                    Some((chunk, len + 1 + piece_len))
                }
                Some((chunk, _)) => {
                    chunks.push(chunk);
                    Some((piece.to_string(), piece_len))
                }
                None => Some((piece.to_string(), piece_len)),
            };
        }
    }

    if let Some((chunk, _)) = current.filter(|(chunk, _)| !chunk.is_empty()) {
        chunks.push(chunk);
    }
    chunks
}

/// Cuts `line` into pieces of at most `max_chars` characters.
fn hard_split(line: &str, max_chars: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (index, _) in line.char_indices() {
        if count == max_chars {
            pieces.push(&line[start..index]);
            start = index;
            count = 0;
        }
        count += 1;
    }
    pieces.push(&line[start..]);
    pieces
}

/// Prefixes `--- Part i/N ---` to every chunk when there is more than one.
pub fn with_part_headers(chunks: Vec<String>) -> Vec<String> {
    let total = chunks.len();
    if total <= 1 {
        return chunks;
    }
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| format!("--- Part {}/{} ---\n{}", i + 1, total, chunk))
        .collect()
}
