/// The three stacked panes, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaneId {
    Code,
    Context,
    Output,
}

impl PaneId {
    pub const ALL: [PaneId; 3] = [PaneId::Code, PaneId::Context, PaneId::Output];

    pub fn index(self) -> usize {
        match self {
            PaneId::Code => 0,
            PaneId::Context => 1,
            PaneId::Output => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PaneId::Code => "code",
            PaneId::Context => "context",
            PaneId::Output => "output",
        }
    }

    pub fn zone_id(self) -> &'static str {
        match self {
            PaneId::Code => "pad:pane.code",
            PaneId::Context => "pad:pane.context",
            PaneId::Output => "pad:pane.output",
        }
    }

    /// Code and output carry a line-numbered editor; context is a plain area.
    pub fn has_line_numbers(self) -> bool {
        !matches!(self, PaneId::Context)
    }

    pub fn next(self) -> Self {
        match self {
            PaneId::Code => PaneId::Context,
            PaneId::Context => PaneId::Output,
            PaneId::Output => PaneId::Code,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            PaneId::Code => PaneId::Output,
            PaneId::Context => PaneId::Code,
            PaneId::Output => PaneId::Context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_cycle_wraps_both_ways() {
        assert_eq!(PaneId::Output.next(), PaneId::Code);
        assert_eq!(PaneId::Code.previous(), PaneId::Output);
        for pane in PaneId::ALL {
            assert_eq!(pane.next().previous(), pane);
        }
    }
}
