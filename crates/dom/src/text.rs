//! Character-offset helpers.
//!
//! Break tokens count characters (Unicode scalar values), strings index
//! bytes. Everything that turns one into the other goes through here.

/// Number of characters in `s`.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte index of the `chars`-th character, clamped to the end of `s`.
pub fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn prefix(s: &str, chars: usize) -> &str {
    &s[..byte_offset(s, chars)]
}

pub fn suffix(s: &str, chars: usize) -> &str {
    &s[byte_offset(s, chars)..]
}

pub fn char_at(s: &str, chars: usize) -> Option<char> {
    s.chars().nth(chars)
}

pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
