//! Whole-pane text transforms bound to editor shortcuts.

mod comments;

pub use comments::strip_comments;

use crate::editor::TextBuffer;

/// Exchange the full contents of two panes.
pub fn swap_contents(first: &mut TextBuffer, second: &mut TextBuffer) {
    let first_text = first.value();
    let second_text = second.value();
    first.set_value(&second_text);
    second.set_value(&first_text);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_exchanges_text() {
        let mut code = TextBuffer::from_text("A");
        let mut output = TextBuffer::from_text("B");
        swap_contents(&mut code, &mut output);
        assert_eq!(code.value(), "B");
        assert_eq!(output.value(), "A");
    }
}
