use unicode_width::UnicodeWidthChar;

/// Compute the display width of a string after stripping ANSI escapes.
pub fn display_width(text: &str) -> usize {
    let clean = strip_ansi_escapes::strip(text);
    let clean_str = String::from_utf8_lossy(&clean);
    unicode_width::UnicodeWidthStr::width(&*clean_str)
}

/// Cut plain (escape-free) text so it occupies at most `max_width` cells.
pub fn truncate_to_width(text: &str, max_width: usize) -> &str {
    let mut width = 0usize;
    for (idx, ch) in text.char_indices() {
        let w = ch.width().unwrap_or(0);
        if width + w > max_width {
            return &text[..idx];
        }
        width += w;
    }
    text
}

/// Like [`truncate_to_width`] but lets CSI escape sequences through
/// without counting them.
pub fn truncate_styled(text: &str, max_width: usize) -> &str {
    let mut width = 0usize;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if ch == '\x1b' {
            if chars.peek().map(|(_, next)| *next) == Some('[') {
                chars.next();
                for (_, next) in chars.by_ref() {
                    if ('\x40'..='\x7e').contains(&next) {
                        break;
                    }
                }
            }
            continue;
        }
        let w = ch.width().unwrap_or(0);
        if width + w > max_width {
            return &text[..idx];
        }
        width += w;
    }
    text
}
