//! Three-pane workspace: code, context and output stacked vertically with
//! draggable splitters, plus a collapsible side panel on the right.
//!
//! `LayoutState` owns every geometry decision; `build_layout` turns it into
//! a zone tree for the runtime.

mod controller;
mod metrics;
mod pane;
mod screen;
mod shortcuts;
mod side_panel;

pub use controller::{
    CHROME_ROWS, DragState, LayoutChange, LayoutSettings, LayoutState, PointerTarget,
    SPLITTER_ROWS, STATUS_ROWS, TOP_BAR_ROWS,
};
pub use metrics::{LayoutRatios, PaneHeights, PaneMetrics};
pub use pane::PaneId;
pub use screen::{
    BOTTOM_SPLITTER_ZONE, MAIN_NODE, ROOT_NODE, SIDE_HANDLE_ZONE, SIDE_PANEL_ZONE, STATUS_ZONE,
    TOP_BAR_ZONE, TOP_SPLITTER_ZONE, build_layout,
};
pub use shortcuts::{LayoutCommand, layout_shortcut};
pub use side_panel::{CLOSED_THRESHOLD_PERCENT, SNAP_THRESHOLD_PERCENT, SidePanel};
