use std::io::Write;

use crate::cursor;
use crate::display_width;
use crate::error::Result;
use crate::geometry::Rect;
use crate::registry::{ZoneId, ZoneState};

/// Renderer runtime parameters.
#[derive(Debug, Clone, Default)]
pub struct RendererSettings {
    /// Where the hardware cursor is parked after a frame; hidden when `None`.
    pub restore_cursor: Option<(u16, u16)>,
}

/// ANSI escape code renderer writing directly to a terminal handle.
pub struct AnsiRenderer {
    settings: RendererSettings,
}

impl AnsiRenderer {
    pub fn new(settings: RendererSettings) -> Self {
        Self { settings }
    }

    pub fn with_default() -> Self {
        Self::new(RendererSettings::default())
    }

    pub fn settings_mut(&mut self) -> &mut RendererSettings {
        &mut self.settings
    }

    pub fn render(&mut self, writer: &mut impl Write, dirty: &[(ZoneId, ZoneState)]) -> Result<()> {
        write!(writer, "{}", cursor::hide())?;
        for (_id, state) in dirty {
            render_zone(writer, state)?;
        }

        if let Some((row, col)) = self.settings.restore_cursor {
            write!(writer, "{}{}", cursor::move_to(row, col), cursor::show())?;
        }

        writer.flush()?;
        Ok(())
    }
}

fn render_zone(writer: &mut impl Write, state: &ZoneState) -> Result<()> {
    let Rect {
        x,
        y,
        width,
        height,
    } = state.rect;

    if width == 0 || height == 0 {
        return Ok(());
    }

    let mut lines = if state.is_pre_rendered {
        state.content.lines().map(str::to_string).collect::<Vec<_>>()
    } else {
        wrap_to_width(&state.content, width)
    };
    lines.resize(height as usize, String::new());

    for (offset, line) in lines.iter_mut().enumerate() {
        pad_line(line, width);
        write!(
            writer,
            "{}{}{}",
            cursor::move_to(y + offset as u16, x),
            line,
            cursor::reset_style()
        )?;
    }

    Ok(())
}

/// Hard-wrap plain text at `width` cells, breaking on characters.
fn wrap_to_width(content: &str, width: u16) -> Vec<String> {
    let width = width as usize;
    let mut lines = Vec::new();
    for raw in content.split('\n') {
        let mut current = String::new();
        let mut used = 0usize;
        for ch in raw.chars() {
            let w = display_width(ch.encode_utf8(&mut [0u8; 4]));
            if used + w > width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                used = 0;
            }
            current.push(ch);
            used += w;
        }
        lines.push(current);
    }
    lines
}

fn pad_line(line: &mut String, width: u16) {
    let display = display_width(line);
    let width = width as usize;
    if display < width {
        line.extend(std::iter::repeat_n(' ', width - display));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ZoneRegistry;
    use std::collections::HashMap;

    #[test]
    fn wrap_basic() {
        let lines = wrap_to_width("helloworld", 5);
        assert_eq!(lines, vec!["hello".to_string(), "world".to_string()]);
    }

    #[test]
    fn wrap_keeps_blank_lines() {
        let lines = wrap_to_width("a\n\nb", 4);
        assert_eq!(lines, vec!["a", "", "b"]);
    }

    #[test]
    fn renderer_writes_cursor_sequences() {
        let mut registry = ZoneRegistry::new();
        let mut solved = HashMap::new();
        solved.insert("zone".to_string(), Rect::new(2, 3, 5, 2));
        registry.sync_layout(&solved);
        registry.take_dirty();
        registry.apply_content("zone", "hi".to_string(), false).unwrap();
        let dirty = registry.take_dirty();

        let mut output = Vec::new();
        let mut renderer = AnsiRenderer::with_default();
        renderer.settings_mut().restore_cursor = Some((3, 4));
        renderer.render(&mut output, &dirty).unwrap();

        let rendered = String::from_utf8(output).unwrap();
        assert!(rendered.contains("\u{1b}[4;3Hhi   "));
        assert!(rendered.contains("\u{1b}[5;3H     "));
        assert!(rendered.ends_with("\u{1b}[4;5H\u{1b}[?25h"));
    }

    #[test]
    fn pre_rendered_lines_are_not_wrapped() {
        let mut registry = ZoneRegistry::new();
        let mut solved = HashMap::new();
        solved.insert("zone".to_string(), Rect::new(0, 0, 3, 2));
        registry.sync_layout(&solved);
        registry
            .apply_content("zone", "\u{1b}[7mab\u{1b}[0m\ncd".to_string(), true)
            .unwrap();
        let dirty = registry.take_dirty();

        let mut output = Vec::new();
        AnsiRenderer::with_default().render(&mut output, &dirty).unwrap();
        let rendered = String::from_utf8(output).unwrap();
        assert!(rendered.contains("\u{1b}[1;1H\u{1b}[7mab\u{1b}[0m "));
        assert!(rendered.contains("\u{1b}[2;1Hcd "));
    }
}
