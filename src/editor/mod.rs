//! Text widget behind the code, context and output panes.
//!
//! `TextBuffer` holds the text, caret, selection and read-only flag;
//! `render_buffer` turns it into pre-rendered zone content.

mod buffer;
mod view;

pub use buffer::{Position, TextBuffer};
pub use view::{RenderedView, ViewOptions, gutter_width, render_buffer};
