//! Terminal display width helpers.
//!
//! Provides ANSI-aware width calculation for rendered content so pane
//! padding stays aligned when lines carry colour escapes.

mod utils;

pub use utils::{display_width, truncate_styled, truncate_to_width};
