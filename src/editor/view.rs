use crate::cursor;
use crate::width::truncate_to_width;

use super::buffer::{Position, TextBuffer};

/// How a buffer should be drawn into its zone.
#[derive(Debug, Clone, Copy)]
pub struct ViewOptions {
    pub line_numbers: bool,
    pub focused: bool,
}

/// Result of drawing a buffer: pre-rendered lines plus the caret cell
/// relative to the zone origin when the view is focused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedView {
    pub content: String,
    pub caret: Option<(u16, u16)>,
}

/// Gutter width for the current line count, including a separating space.
pub fn gutter_width(buffer: &TextBuffer, options: ViewOptions) -> usize {
    if !options.line_numbers {
        return 0;
    }
    buffer.line_count().to_string().len().max(2) + 1
}

/// Draw `buffer` into a `width` x `height` cell area. The buffer's scroll
/// offsets are updated first so the caret is visible.
pub fn render_buffer(
    buffer: &mut TextBuffer,
    width: u16,
    height: u16,
    options: ViewOptions,
) -> RenderedView {
    let gutter = gutter_width(buffer, options);
    let text_width = (width as usize).saturating_sub(gutter);
    buffer.scroll_to_cursor(height as usize, text_width);
    let (scroll_line, scroll_column) = buffer.scroll();
    let selection = buffer.selection_range();

    let mut rows = Vec::with_capacity(height as usize);
    for offset in 0..height as usize {
        let line_idx = scroll_line + offset;
        let mut row = String::new();
        let Some(line) = buffer.lines().get(line_idx) else {
            rows.push(row);
            continue;
        };

        if gutter > 0 {
            row.push_str(cursor::dim());
            row.push_str(&format!("{:>w$} ", line_idx + 1, w = gutter - 1));
            row.push_str(cursor::reset_style());
        }

        let visible: String = line.chars().skip(scroll_column).collect();
        let visible = truncate_to_width(&visible, text_width);
        match selection.and_then(|range| selected_columns(range, line_idx, line)) {
            Some((start, end)) => {
                push_with_highlight(&mut row, visible, scroll_column, start, end);
            }
            None => row.push_str(visible),
        }
        rows.push(row);
    }

    let caret = if options.focused {
        let Position { line, column } = buffer.cursor();
        let row = line.saturating_sub(scroll_line);
        let col = gutter + column.saturating_sub(scroll_column);
        Some((row as u16, col.min(width.saturating_sub(1) as usize) as u16))
    } else {
        None
    };

    RenderedView {
        content: rows.join("\n"),
        caret,
    }
}

/// Selected character columns of one line, as a half-open range.
fn selected_columns(
    (start, end): (Position, Position),
    line_idx: usize,
    line: &str,
) -> Option<(usize, usize)> {
    if line_idx < start.line || line_idx > end.line {
        return None;
    }
    let from = if line_idx == start.line { start.column } else { 0 };
    let to = if line_idx == end.line {
        end.column
    } else {
        line.chars().count()
    };
    Some((from, to))
}

fn push_with_highlight(row: &mut String, visible: &str, offset: usize, start: usize, end: usize) {
    let mut highlighted = false;
    for (idx, ch) in visible.chars().enumerate() {
        let column = offset + idx;
        let inside = column >= start && column < end;
        if inside != highlighted {
            row.push_str(if inside {
                cursor::reverse()
            } else {
                cursor::reset_style()
            });
            highlighted = inside;
        }
        row.push(ch);
    }
    if highlighted {
        row.push_str(cursor::reset_style());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: ViewOptions = ViewOptions {
        line_numbers: false,
        focused: true,
    };

    #[test]
    fn plain_view_clips_to_height() {
        let mut buffer = TextBuffer::from_text("a\nb\nc");
        let view = render_buffer(&mut buffer, 10, 2, PLAIN);
        assert_eq!(view.content, "a\nb");
        assert_eq!(view.caret, Some((0, 0)));
    }

    #[test]
    fn line_numbers_shift_the_caret() {
        let mut buffer = TextBuffer::from_text("x = 1");
        buffer.move_line_end(false);
        let options = ViewOptions {
            line_numbers: true,
            focused: true,
        };
        let view = render_buffer(&mut buffer, 20, 1, options);
        assert!(view.content.contains(" 1 "));
        assert!(view.content.ends_with("x = 1"));
        assert_eq!(view.caret, Some((0, 8)));
    }

    #[test]
    fn selection_is_reversed() {
        let mut buffer = TextBuffer::from_text("abcd");
        buffer.move_right(false);
        buffer.move_right(true);
        buffer.move_right(true);
        let view = render_buffer(&mut buffer, 10, 1, PLAIN);
        assert_eq!(view.content, "a\u{1b}[7mbc\u{1b}[0md");
    }

    #[test]
    fn unfocused_view_has_no_caret() {
        let mut buffer = TextBuffer::from_text("abc");
        let options = ViewOptions {
            line_numbers: false,
            focused: false,
        };
        assert_eq!(render_buffer(&mut buffer, 5, 1, options).caret, None);
    }

    #[test]
    fn long_lines_scroll_horizontally() {
        let mut buffer = TextBuffer::from_text("0123456789");
        buffer.move_line_end(false);
        let view = render_buffer(&mut buffer, 4, 1, PLAIN);
        assert_eq!(view.content, "789");
        assert_eq!(view.caret, Some((0, 3)));
    }
}
