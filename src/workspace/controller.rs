use serde::Deserialize;

use crossterm::event::KeyEvent;

use crate::geometry::Size;

use super::metrics::{LayoutRatios, PaneHeights, PaneMetrics};
use super::pane::PaneId;
use super::shortcuts::{LayoutCommand, layout_shortcut};
use super::side_panel::SidePanel;

/// Rows above the code pane (title bar).
pub const TOP_BAR_ROWS: u16 = 1;
/// Rows taken by each splitter.
pub const SPLITTER_ROWS: u16 = 1;
/// Rows below the output pane (status line).
pub const STATUS_ROWS: u16 = 1;
/// Rows not available to the three panes.
pub const CHROME_ROWS: u16 = TOP_BAR_ROWS + 2 * SPLITTER_ROWS + STATUS_ROWS;

/// Tunables for the pane layout.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Minimum pane height as a share of the available rows.
    pub min_ratio: f32,
    /// A pane within this many rows of the maximum counts as maximized.
    pub maximize_slack: u16,
    /// Width the side panel opens to on double-click.
    pub side_panel_open_percent: f32,
    /// Two clicks closer than this count as a double-click.
    pub double_click_ms: u64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            min_ratio: 0.05,
            maximize_slack: 1,
            side_panel_open_percent: 80.0,
            double_click_ms: 400,
        }
    }
}

/// What a pointer event landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    TopBar,
    Pane(PaneId),
    TopSplitter,
    BottomSplitter,
    StatusLine,
    SideHandle,
    SidePanel,
}

/// Which handle, if any, is being dragged. Only one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    TopSplitter,
    BottomSplitter,
    SideHandle,
}

/// Effect of an event on the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutChange {
    /// Nothing observable changed.
    None,
    /// Pane heights or the side panel width changed; re-solve and refresh.
    Geometry,
    /// Keyboard focus moved to another pane.
    Focus(PaneId),
}

/// Geometry of the pad: three stacked panes, two splitters between them,
/// and the side panel. Event handlers mutate it in place and report what
/// changed so the caller can re-solve the zone layout.
#[derive(Debug, Clone)]
pub struct LayoutState {
    settings: LayoutSettings,
    viewport: Size,
    metrics: PaneMetrics,
    heights: PaneHeights,
    ratios: Option<LayoutRatios>,
    drag: DragState,
    side_panel: SidePanel,
    focus: PaneId,
}

impl LayoutState {
    pub fn new(settings: LayoutSettings, viewport: Size) -> Self {
        let metrics = Self::metrics_for(&settings, viewport);
        let side_panel = SidePanel::new(settings.side_panel_open_percent);
        Self {
            heights: metrics.initial(),
            metrics,
            settings,
            viewport,
            ratios: None,
            drag: DragState::Idle,
            side_panel,
            focus: PaneId::Code,
        }
    }

    fn metrics_for(settings: &LayoutSettings, viewport: Size) -> PaneMetrics {
        PaneMetrics::from_total(
            viewport.height.saturating_sub(CHROME_ROWS),
            settings.min_ratio,
        )
    }

    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn metrics(&self) -> PaneMetrics {
        self.metrics
    }

    pub fn heights(&self) -> PaneHeights {
        self.heights
    }

    pub fn ratios(&self) -> Option<LayoutRatios> {
        self.ratios
    }

    pub fn drag(&self) -> DragState {
        self.drag
    }

    /// Panes ignore pointer input while a handle is being dragged.
    pub fn pointer_captured(&self) -> bool {
        self.drag != DragState::Idle
    }

    pub fn side_panel(&self) -> &SidePanel {
        &self.side_panel
    }

    pub fn side_panel_mut(&mut self) -> &mut SidePanel {
        &mut self.side_panel
    }

    pub fn focus(&self) -> PaneId {
        self.focus
    }

    pub fn set_focus(&mut self, pane: PaneId) -> LayoutChange {
        if self.focus == pane {
            return LayoutChange::None;
        }
        self.focus = pane;
        LayoutChange::Focus(pane)
    }

    // ----- derived geometry -------------------------------------------------

    /// Columns used by the stacked panes (left of the side handle).
    pub fn main_width(&self) -> u16 {
        self.viewport
            .width
            .saturating_sub(self.side_columns())
            .saturating_sub(1)
    }

    pub fn side_columns(&self) -> u16 {
        self.side_panel.columns(self.viewport.width)
    }

    pub fn handle_column(&self) -> u16 {
        self.main_width()
    }

    pub fn pane_top(&self, pane: PaneId) -> u16 {
        let code_top = TOP_BAR_ROWS;
        match pane {
            PaneId::Code => code_top,
            PaneId::Context => code_top + self.heights.code + SPLITTER_ROWS,
            PaneId::Output => {
                code_top + self.heights.code + SPLITTER_ROWS + self.heights.context + SPLITTER_ROWS
            }
        }
    }

    pub fn pane_bottom(&self, pane: PaneId) -> u16 {
        self.pane_top(pane) + self.heights.get(pane)
    }

    pub fn top_splitter_row(&self) -> u16 {
        self.pane_bottom(PaneId::Code)
    }

    pub fn bottom_splitter_row(&self) -> u16 {
        self.pane_bottom(PaneId::Context)
    }

    /// Classify a cell for pointer routing.
    pub fn hit_test(&self, column: u16, row: u16) -> PointerTarget {
        let handle = self.handle_column();
        if column == handle {
            return PointerTarget::SideHandle;
        }
        if column > handle {
            return PointerTarget::SidePanel;
        }
        if row < TOP_BAR_ROWS {
            return PointerTarget::TopBar;
        }
        if row == self.top_splitter_row() {
            return PointerTarget::TopSplitter;
        }
        if row == self.bottom_splitter_row() {
            return PointerTarget::BottomSplitter;
        }
        PaneId::ALL
            .into_iter()
            .find(|pane| row >= self.pane_top(*pane) && row < self.pane_bottom(*pane))
            .map(PointerTarget::Pane)
            .unwrap_or(PointerTarget::StatusLine)
    }

    // ----- pointer ------------------------------------------------------------

    pub fn on_pointer_down(&mut self, target: PointerTarget) -> LayoutChange {
        match target {
            PointerTarget::TopSplitter => {
                self.drag = DragState::TopSplitter;
                LayoutChange::None
            }
            PointerTarget::BottomSplitter => {
                self.drag = DragState::BottomSplitter;
                LayoutChange::None
            }
            PointerTarget::SideHandle => {
                self.drag = DragState::SideHandle;
                LayoutChange::None
            }
            PointerTarget::Pane(pane) if !self.pointer_captured() => self.set_focus(pane),
            _ => LayoutChange::None,
        }
    }

    pub fn on_pointer_move(&mut self, column: u16, row: u16) -> LayoutChange {
        match self.drag {
            DragState::Idle => LayoutChange::None,
            DragState::TopSplitter => {
                let candidate = row as i32 - self.pane_top(PaneId::Code) as i32;
                self.drag_splitter(PaneId::Code, PaneId::Output, candidate)
            }
            DragState::BottomSplitter => {
                let candidate =
                    self.pane_bottom(PaneId::Output) as i32 - (row as i32 + SPLITTER_ROWS as i32);
                self.drag_splitter(PaneId::Output, PaneId::Code, candidate)
            }
            DragState::SideHandle => {
                let before = self.side_panel.width_percent();
                self.side_panel.drag_to(column, self.viewport.width);
                if self.side_panel.width_percent() != before {
                    LayoutChange::Geometry
                } else {
                    LayoutChange::None
                }
            }
        }
    }

    /// Pointer release always ends every drag.
    pub fn on_pointer_up(&mut self) -> LayoutChange {
        let was = std::mem::take(&mut self.drag);
        if was == DragState::SideHandle {
            let before = self.side_panel.width_percent();
            self.side_panel.release();
            if self.side_panel.width_percent() != before {
                return LayoutChange::Geometry;
            }
        }
        LayoutChange::None
    }

    /// Resize the pane next to a splitter (`adjacent`) to `candidate` rows,
    /// trading space with the context pane; when context would drop below
    /// the minimum, the deficit comes out of the `far` pane instead.
    fn drag_splitter(&mut self, adjacent: PaneId, far: PaneId, candidate: i32) -> LayoutChange {
        let min = self.metrics.min as i32;
        let total = self.metrics.total as i32;
        let current = self.heights.get(adjacent) as i32;
        let context = self.heights.context as i32 + (current - candidate);
        let before = self.heights;

        if candidate >= min && context >= min {
            self.heights.set(adjacent, candidate as u16);
            self.heights.context = context as u16;
        } else if context < min {
            let far_height = self.heights.get(far) as i32;
            if total - min - far_height >= min {
                let new_far = far_height - (min - context);
                if new_far >= min {
                    self.heights.set(far, new_far as u16);
                    self.heights.context = min as u16;
                    self.heights.set(adjacent, (total - new_far - min) as u16);
                    self.drag = match adjacent {
                        PaneId::Code => DragState::TopSplitter,
                        _ => DragState::BottomSplitter,
                    };
                }
            }
        }

        self.capture_ratios();
        if self.heights != before {
            LayoutChange::Geometry
        } else {
            LayoutChange::None
        }
    }

    // ----- double-click -------------------------------------------------------

    pub fn on_double_click(&mut self, target: PointerTarget) -> LayoutChange {
        match target {
            PointerTarget::Pane(pane) => {
                // Never at or below an equal-thirds height, or short
                // terminals would only ever toggle to thirds.
                let thirds = self.metrics.one_third().as_array();
                let tallest_third = thirds.into_iter().max().unwrap_or(0);
                let threshold = self
                    .metrics
                    .max
                    .saturating_sub(self.settings.maximize_slack)
                    .max(tallest_third + 1);
                let next = if self.heights.get(pane) >= threshold {
                    self.metrics.one_third()
                } else {
                    self.metrics.maximized(pane)
                };
                self.apply_heights(next)
            }
            PointerTarget::SideHandle => {
                self.side_panel.toggle();
                LayoutChange::Geometry
            }
            _ => LayoutChange::None,
        }
    }

    // ----- keyboard -----------------------------------------------------------

    /// Handle Ctrl+Alt layout shortcuts. Returns `None` when the key is not
    /// a layout shortcut so it can go to the focused pane.
    pub fn on_key_down(&mut self, key: &KeyEvent) -> Option<LayoutChange> {
        layout_shortcut(key).map(|command| self.apply_command(command))
    }

    pub fn apply_command(&mut self, command: LayoutCommand) -> LayoutChange {
        match command {
            LayoutCommand::MaximizeFocused => self.apply_command(LayoutCommand::Maximize(self.focus)),
            LayoutCommand::Maximize(pane) => self.apply_heights(self.metrics.maximized(pane)),
            LayoutCommand::EqualThirds => self.apply_heights(self.metrics.one_third()),
            LayoutCommand::Focus(pane) => self.set_focus(pane),
        }
    }

    // ----- viewport -----------------------------------------------------------

    /// Rescale the panes to a new viewport using the cached ratios. Heights
    /// stay put when the new viewport cannot fit three minimum panes.
    pub fn on_resize(&mut self, viewport: Size) -> LayoutChange {
        let old_total = self.metrics.total;
        let heights = self.heights;
        let ratios = *self
            .ratios
            .get_or_insert_with(|| LayoutRatios::capture(&heights, old_total));

        self.viewport = viewport;
        self.metrics = Self::metrics_for(&self.settings, viewport);
        let PaneMetrics { total, min, max } = self.metrics;

        if total > min.saturating_mul(3) {
            let scale = |ratio: f32| ((total as f32 * ratio).round() as u16).clamp(min, max);
            let code = scale(ratios.code);
            let context = scale(ratios.context);
            let output = total.saturating_sub(code).saturating_sub(context);
            self.heights = self.metrics.normalize(PaneHeights::new(code, context, output));
        }
        LayoutChange::Geometry
    }

    // ----- persistence --------------------------------------------------------

    /// Apply stored heights verbatim; they are normalised only when they do
    /// not fit the current viewport.
    pub fn restore_heights(&mut self, heights: PaneHeights) -> LayoutChange {
        self.heights = if self.metrics.contains(&heights) {
            heights
        } else {
            self.metrics.normalize(heights)
        };
        self.capture_ratios();
        LayoutChange::Geometry
    }

    fn apply_heights(&mut self, heights: PaneHeights) -> LayoutChange {
        self.heights = heights;
        self.capture_ratios();
        LayoutChange::Geometry
    }

    fn capture_ratios(&mut self) {
        self.ratios = Some(LayoutRatios::capture(&self.heights, self.metrics.total));
    }
}
