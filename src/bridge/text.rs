//! Splitting room message bodies into lobby chat lines.
//!
//! The lobby protocol is line-based, so a multi-line body becomes several
//! commands, and each line is capped at the configured length in bytes.

/// Largest char boundary in `s` not above `byte_index`.
fn floor_char_boundary(s: &str, byte_index: usize) -> usize {
    if byte_index >= s.len() {
        return s.len();
    }
    let mut i = byte_index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Split one line into chunks of at most `max_len` bytes.
///
/// Prefers splitting at the last space that fits; never splits inside a
/// multi-byte character.
pub fn split_message(message: &str, max_len: usize) -> Vec<String> {
    if message.len() <= max_len {
        return vec![message.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = message;

    while !remaining.is_empty() {
        remaining = remaining.trim_start();
        if remaining.is_empty() {
            break;
        }
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        let split_at = floor_char_boundary(remaining, max_len);

        // Always make progress, even if the first char is wider than max_len
        if split_at == 0 {
            let first_char_end = remaining
                .char_indices()
                .nth(1)
                .map(|(i, _)| i)
                .unwrap_or(remaining.len());
            chunks.push(remaining[..first_char_end].to_string());
            remaining = &remaining[first_char_end..];
            continue;
        }

        let chunk = &remaining[..split_at];
        match chunk.rfind(' ') {
            Some(space_idx) if space_idx > 0 => {
                chunks.push(remaining[..space_idx].to_string());
                remaining = &remaining[space_idx + 1..];
            }
            _ => {
                chunks.push(chunk.to_string());
                remaining = &remaining[split_at..];
            }
        }
    }

    chunks
}

/// Lobby lines for a message body: one per non-blank line, each capped at `max_len`.
pub fn lobby_lines(body: &str, max_len: usize) -> Vec<String> {
    body.lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .flat_map(|line| split_message(line, max_len))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_message_untouched() {
        assert_eq!(split_message("hello", 10), vec!["hello"]);
    }

    #[test]
    fn test_split_on_spaces() {
        assert_eq!(
            split_message("the quick brown fox jumps", 10),
            vec!["the quick", "brown fox", "jumps"]
        );
    }

    #[test]
    fn test_hard_split_without_spaces() {
        assert_eq!(split_message("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_never_splits_multibyte_chars() {
        let chunks = split_message("ééééé", 3);
        assert_eq!(chunks, vec!["é", "é", "é", "é", "é"]);
        assert!(chunks.iter().all(|c| c.len() <= 3));
    }

    #[test]
    fn test_leading_space_does_not_yield_empty_chunk() {
        let chunks = split_message(" abcdefgh", 4);
        assert!(chunks.iter().all(|c| !c.is_empty()));
        assert_eq!(chunks.concat(), "abcdefgh");
    }

    #[test]
    fn test_lobby_lines() {
        assert_eq!(
            lobby_lines("first\r\n\nsecond line  \n", 1024),
            vec!["first", "second line"]
        );
        assert!(lobby_lines("\n \n", 1024).is_empty());
        assert_eq!(lobby_lines("aaaa bbbb\ncc", 4), vec!["aaaa", "bbbb", "cc"]);
    }
}
