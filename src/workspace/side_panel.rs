/// Widths at or below this percentage count as closed.
pub const CLOSED_THRESHOLD_PERCENT: f32 = 2.0;
/// Releasing a drag below this percentage snaps the panel shut.
pub const SNAP_THRESHOLD_PERCENT: f32 = 1.0;

/// Collapsible panel docked to the right edge of the screen.
#[derive(Debug, Clone, PartialEq)]
pub struct SidePanel {
    width_percent: f32,
    open_percent: f32,
    content_width: u16,
}

impl SidePanel {
    pub fn new(open_percent: f32) -> Self {
        Self {
            width_percent: 0.0,
            open_percent: open_percent.clamp(0.0, 100.0),
            content_width: 0,
        }
    }

    pub fn width_percent(&self) -> f32 {
        self.width_percent
    }

    pub fn is_open(&self) -> bool {
        self.width_percent > CLOSED_THRESHOLD_PERCENT
    }

    pub fn set_width_percent(&mut self, percent: f32) {
        self.width_percent = percent.clamp(0.0, 100.0);
    }

    /// Width implied by a handle dragged to `column` inside a container
    /// `container_width` cells wide anchored at column 0.
    pub fn drag_to(&mut self, column: u16, container_width: u16) {
        if container_width == 0 {
            return;
        }
        let distance = container_width.saturating_sub(column).saturating_sub(1);
        self.set_width_percent(distance as f32 / container_width as f32 * 100.0);
    }

    /// End of a drag: tiny widths collapse to zero.
    pub fn release(&mut self) {
        if self.width_percent < SNAP_THRESHOLD_PERCENT {
            self.width_percent = 0.0;
        }
    }

    /// Double-click on the handle flips between closed and the open width.
    pub fn toggle(&mut self) {
        self.width_percent = if self.is_open() {
            0.0
        } else {
            self.open_percent
        };
    }

    /// Rendered columns for a container, always leaving one column for the
    /// drag handle.
    pub fn columns(&self, container_width: u16) -> u16 {
        let cols = (container_width as f32 * self.width_percent / 100.0).round() as u16;
        cols.min(container_width.saturating_sub(1))
    }

    /// Keep the inner text width in step with the rendered panel width.
    /// Returns `true` when the content width changed.
    pub fn observe_width(&mut self, rendered: u16) -> bool {
        let inner = rendered.saturating_sub(2);
        let changed = inner != self.content_width;
        self.content_width = inner;
        changed
    }

    pub fn content_width(&self) -> u16 {
        self.content_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_closed_and_toggles_to_open_width() {
        let mut panel = SidePanel::new(80.0);
        assert!(!panel.is_open());
        panel.toggle();
        assert_eq!(panel.width_percent(), 80.0);
        assert!(panel.is_open());
        panel.toggle();
        assert_eq!(panel.width_percent(), 0.0);
    }

    #[test]
    fn drag_measures_from_right_edge() {
        let mut panel = SidePanel::new(80.0);
        panel.drag_to(49, 100);
        assert_eq!(panel.width_percent(), 50.0);
        assert_eq!(panel.columns(100), 50);
    }

    #[test]
    fn release_below_one_percent_snaps_shut() {
        let mut panel = SidePanel::new(80.0);
        panel.set_width_percent(0.5);
        panel.release();
        assert_eq!(panel.width_percent(), 0.0);

        panel.set_width_percent(1.5);
        panel.release();
        assert_eq!(panel.width_percent(), 1.5);
        assert!(!panel.is_open());
    }

    #[test]
    fn columns_leave_room_for_handle() {
        let mut panel = SidePanel::new(80.0);
        panel.set_width_percent(100.0);
        assert_eq!(panel.columns(60), 59);
    }

    #[test]
    fn observed_width_drives_content_width() {
        let mut panel = SidePanel::new(80.0);
        assert!(panel.observe_width(30));
        assert_eq!(panel.content_width(), 28);
        assert!(!panel.observe_width(30));
    }
}
