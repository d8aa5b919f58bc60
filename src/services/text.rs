/// Keep at most `max_chars` characters of `text`, cutting on char boundaries.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Console preview: `text` unchanged if it fits in `max_chars`, otherwise
/// cut so that the trailing `…` keeps the total at `max_chars`.
pub fn trim_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().nth(max_chars).is_none() {
        return text.to_string();
    }
    match max_chars {
        0 => String::new(),
        n => {
            let mut preview = truncate_chars(text, n - 1);
            preview.push('…');
            preview
        }
    }
}
