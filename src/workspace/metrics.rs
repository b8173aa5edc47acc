use super::pane::PaneId;

/// Height bounds derived from the rows available to the three panes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaneMetrics {
    pub total: u16,
    pub min: u16,
    pub max: u16,
}

impl PaneMetrics {
    /// `min` is `min_ratio` of the total (at least one row, at most a third);
    /// `max` leaves room for the other two panes at `min`.
    pub fn from_total(total: u16, min_ratio: f32) -> Self {
        let mut min = ((total as f32 * min_ratio).round() as u16).max(1);
        if min.saturating_mul(3) > total {
            min = total / 3;
        }
        let max = total.saturating_sub(min.saturating_mul(2));
        Self { total, min, max }
    }

    pub fn one_third(&self) -> PaneHeights {
        let third = self.total / 3;
        PaneHeights::new(third, third, self.total - third * 2)
    }

    /// `pane` at `max`, the other two at `min`.
    pub fn maximized(&self, pane: PaneId) -> PaneHeights {
        let mut heights = PaneHeights::new(self.min, self.min, self.min);
        heights.set(pane, self.max);
        heights
    }

    /// Startup split: code dominant, context three minimums, output two.
    pub fn initial(&self) -> PaneHeights {
        let context = self.min.saturating_mul(3);
        let output = self.min.saturating_mul(2);
        match self.total.checked_sub(context + output) {
            Some(code) if code >= self.min => PaneHeights::new(code, context, output),
            _ => self.one_third(),
        }
    }

    pub fn contains(&self, heights: &PaneHeights) -> bool {
        heights.sum() == self.total as u32
            && heights
                .as_array()
                .iter()
                .all(|h| *h >= self.min && *h <= self.max)
    }

    /// Clamp every pane into `[min, max]` and push the rounding difference
    /// onto the panes bottom-up until the heights sum to `total`.
    pub fn normalize(&self, heights: PaneHeights) -> PaneHeights {
        let mut values = heights
            .as_array()
            .map(|h| h.clamp(self.min, self.max.max(self.min)) as i32);
        let mut diff = self.total as i32 - values.iter().sum::<i32>();

        for idx in (0..3).rev() {
            if diff == 0 {
                break;
            }
            if diff > 0 {
                let room = self.max as i32 - values[idx];
                let grow = diff.min(room.max(0));
                values[idx] += grow;
                diff -= grow;
            } else {
                let room = values[idx] - self.min as i32;
                let shrink = (-diff).min(room.max(0));
                values[idx] -= shrink;
                diff += shrink;
            }
        }

        PaneHeights::new(values[0] as u16, values[1] as u16, values[2] as u16)
    }
}

/// Current row count of each pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaneHeights {
    pub code: u16,
    pub context: u16,
    pub output: u16,
}

impl PaneHeights {
    pub const fn new(code: u16, context: u16, output: u16) -> Self {
        Self {
            code,
            context,
            output,
        }
    }

    pub fn get(&self, pane: PaneId) -> u16 {
        match pane {
            PaneId::Code => self.code,
            PaneId::Context => self.context,
            PaneId::Output => self.output,
        }
    }

    pub fn set(&mut self, pane: PaneId, height: u16) {
        match pane {
            PaneId::Code => self.code = height,
            PaneId::Context => self.context = height,
            PaneId::Output => self.output = height,
        }
    }

    pub fn sum(&self) -> u32 {
        self.code as u32 + self.context as u32 + self.output as u32
    }

    pub fn as_array(&self) -> [u16; 3] {
        [self.code, self.context, self.output]
    }
}

/// Fractions of the total held by each pane after the last manual resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutRatios {
    pub code: f32,
    pub context: f32,
    pub output: f32,
}

impl LayoutRatios {
    pub fn capture(heights: &PaneHeights, total: u16) -> Self {
        let total = total.max(1) as f32;
        Self {
            code: heights.code as f32 / total,
            context: heights.context as f32 / total,
            output: heights.output as f32 / total,
        }
    }
}
