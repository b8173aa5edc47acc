use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::pane::PaneId;

/// Layout actions reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutCommand {
    /// Maximize whichever pane currently has focus.
    MaximizeFocused,
    Maximize(PaneId),
    EqualThirds,
    Focus(PaneId),
}

/// Map a key press to a layout command. Only fires when Ctrl and Alt are
/// both held; anything else belongs to the focused pane.
pub fn layout_shortcut(key: &KeyEvent) -> Option<LayoutCommand> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if !key
        .modifiers
        .contains(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return None;
    }

    let KeyCode::Char(ch) = key.code else {
        return None;
    };
    match ch.to_ascii_lowercase() {
        'r' => Some(LayoutCommand::MaximizeFocused),
        'e' => Some(LayoutCommand::EqualThirds),
        '1' => Some(LayoutCommand::Focus(PaneId::Code)),
        '2' => Some(LayoutCommand::Focus(PaneId::Context)),
        '3' => Some(LayoutCommand::Focus(PaneId::Output)),
        _ => None,
    }
}
