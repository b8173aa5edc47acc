//! Text for the non-editor zones: title bar, splitters, status line and
//! the side panel.

use crate::cursor;
use crate::width::{display_width, truncate_styled, truncate_to_width};
use crate::workspace::{DragState, LayoutState, PaneId};

/// Key reference shown in the side panel.
pub const HELP_LINES: &[&str] = &[
    "Ctrl+G  code prompt",
    "Ctrl+D  debug prompt",
    "Esc     cancel prompt",
    "Ctrl+K  strip comments",
    "Ctrl+W  swap code/output",
    "Ctrl+O  open file",
    "Ctrl+S  save as",
    "Ctrl+T  set title",
    "Ctrl+B  side panel",
    "Tab     next pane",
    "Ctrl+Q  quit",
    "",
    "Ctrl+Alt+R  maximize pane",
    "Ctrl+Alt+E  equal thirds",
    "Ctrl+Alt+1/2/3  focus pane",
];

fn pane_label(pane: PaneId, focused: bool) -> String {
    if focused {
        format!("{} {} {}", cursor::reverse(), pane.label(), cursor::reset_style())
    } else {
        format!(" {} ", pane.label())
    }
}

/// Title bar: pad title, then the code pane's label.
pub fn top_bar(title: &str, layout: &LayoutState, busy: bool, width: u16) -> String {
    let mut line = format!(
        "{} {} {} {}",
        cursor::bold(),
        title,
        cursor::reset_style(),
        pane_label(PaneId::Code, layout.focus() == PaneId::Code)
    );
    if busy {
        line.push_str(" [generating]");
    }
    fit(&line, width)
}

/// Splitter rule carrying the label of the pane below it.
pub fn splitter(below: PaneId, layout: &LayoutState, width: u16) -> String {
    let dragging = matches!(
        (layout.drag(), below),
        (DragState::TopSplitter, PaneId::Context) | (DragState::BottomSplitter, PaneId::Output)
    );
    let label = pane_label(below, layout.focus() == below);
    let rule = if dragging { "━" } else { "─" };
    let used = 2 + display_width(&label);
    let mut line = format!("{rule}{rule}{label}");
    line.push_str(&rule.repeat((width as usize).saturating_sub(used)));
    if dragging {
        line = format!("{}{}{}", cursor::bold(), line, cursor::reset_style());
    }
    fit(&line, width)
}

/// Status line: last message plus the current pane heights.
pub fn status_line(message: &str, layout: &LayoutState, width: u16) -> String {
    let heights = layout.heights();
    let dims = format!(
        "{}/{}/{}",
        heights.code, heights.context, heights.output
    );
    let room = (width as usize).saturating_sub(dims.len() + 1);
    let message = truncate_to_width(message, room);
    let gap = (width as usize).saturating_sub(display_width(message) + dims.len());
    let line = format!(
        "{}{}{}{}{}",
        message,
        " ".repeat(gap),
        cursor::dim(),
        dims,
        cursor::reset_style()
    );
    fit(&line, width)
}

/// Vertical handle to the left of the side panel.
pub fn side_handle(layout: &LayoutState, height: u16) -> String {
    let glyph = if layout.drag() == DragState::SideHandle {
        "┃"
    } else {
        "│"
    };
    vec![glyph; height as usize].join("\n")
}

/// Side panel body: help followed by recent job events, each line clipped
/// to `content_width` with a one-column margin.
pub fn side_panel(job_log: &[String], content_width: u16, height: u16) -> String {
    if content_width == 0 {
        return String::new();
    }
    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("{}Keys{}", cursor::bold(), cursor::reset_style()));
    lines.extend(HELP_LINES.iter().map(|line| line.to_string()));
    lines.push(String::new());
    lines.push(format!("{}Jobs{}", cursor::bold(), cursor::reset_style()));
    let room = (height as usize).saturating_sub(lines.len());
    let skip = job_log.len().saturating_sub(room);
    lines.extend(job_log[skip..].iter().cloned());

    lines
        .iter()
        .take(height as usize)
        .map(|line| format!(" {}", truncate_styled(line, content_width as usize)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Clip a styled line to the zone width, closing any open style.
fn fit(line: &str, width: u16) -> String {
    if display_width(line) <= width as usize {
        return line.to_string();
    }
    format!(
        "{}{}",
        truncate_styled(line, width as usize),
        cursor::reset_style()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::workspace::LayoutSettings;

    fn layout() -> LayoutState {
        LayoutState::new(LayoutSettings::default(), Size::new(60, 30))
    }

    #[test]
    fn splitter_fills_width() {
        let line = splitter(PaneId::Context, &layout(), 40);
        assert_eq!(display_width(&line), 40);
        assert!(line.contains("context"));
    }

    #[test]
    fn status_line_right_aligns_heights() {
        let layout = layout();
        let line = status_line("ready", &layout, 30);
        assert!(line.starts_with("ready"));
        assert_eq!(display_width(&line), 30);
        assert!(line.contains("21/3/2"));
    }

    #[test]
    fn side_panel_keeps_latest_jobs() {
        let log: Vec<String> = (0..50).map(|n| format!("job-{n} finished")).collect();
        let body = side_panel(&log, 20, 25);
        assert_eq!(body.lines().count(), 25);
        assert!(body.contains("job-49"));
        assert!(!body.contains("job-10 "));
        assert!(body.lines().all(|line| display_width(line) <= 21));
    }
}
