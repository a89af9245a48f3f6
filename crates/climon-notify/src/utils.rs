//! Utility functions for notification channels

/// Maximum length of a response body kept in logs and errors
pub const MAX_BODY_LENGTH: usize = 4000;

/// Truncate a string to at most `max_len` bytes, snapping back to a char
/// boundary so multi-byte characters are never split.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated]", &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("hello world", 5), "hello... [truncated]");
    }

    #[test]
    fn test_truncate_string_respects_char_boundaries() {
        // '°' is two bytes; cutting at byte 3 would split it
        assert_eq!(truncate_string("25°C", 3), "25... [truncated]");
    }
}
