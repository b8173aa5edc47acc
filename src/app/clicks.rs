use std::time::{Duration, Instant};

use crate::workspace::PointerTarget;

/// Turns successive presses into double-clicks: two presses on the same
/// target and cell within `window`. A third press starts a new sequence.
#[derive(Debug, Clone)]
pub struct ClickTracker {
    window: Duration,
    last: Option<(PointerTarget, (u16, u16), Instant)>,
}

impl ClickTracker {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Record a press at `cell` (column, row); returns `true` when it
    /// completes a double-click.
    pub fn press(&mut self, target: PointerTarget, cell: (u16, u16), at: Instant) -> bool {
        match self.last.take() {
            Some((previous, previous_cell, when))
                if previous == target
                    && previous_cell == cell
                    && at.saturating_duration_since(when) <= self.window =>
            {
                true
            }
            _ => {
                self.last = Some((target, cell, at));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::PaneId;

    #[test]
    fn two_quick_presses_on_one_cell() {
        let mut clicks = ClickTracker::new(Duration::from_millis(400));
        let start = Instant::now();
        let pane = PointerTarget::Pane(PaneId::Code);
        assert!(!clicks.press(pane, (4, 4), start));
        assert!(clicks.press(pane, (4, 4), start + Duration::from_millis(200)));
        assert!(!clicks.press(pane, (4, 4), start + Duration::from_millis(300)));
    }

    #[test]
    fn slow_or_moved_presses_do_not_count() {
        let mut clicks = ClickTracker::new(Duration::from_millis(400));
        let start = Instant::now();
        let handle = PointerTarget::SideHandle;
        assert!(!clicks.press(handle, (70, 3), start));
        assert!(!clicks.press(handle, (70, 3), start + Duration::from_millis(900)));
        assert!(!clicks.press(handle, (70, 9), start + Duration::from_millis(1000)));
        assert!(!clicks.press(PointerTarget::TopSplitter, (70, 9), start + Duration::from_millis(1100)));
    }
}
