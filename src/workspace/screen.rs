use crate::layout::{Constraint, Direction, LayoutNode, LayoutTree};

use super::controller::{LayoutState, SPLITTER_ROWS, STATUS_ROWS, TOP_BAR_ROWS};
use super::pane::PaneId;

pub const ROOT_NODE: &str = "pad:root";
pub const MAIN_NODE: &str = "pad:main";
pub const TOP_BAR_ZONE: &str = "pad:topbar";
pub const TOP_SPLITTER_ZONE: &str = "pad:splitter.top";
pub const BOTTOM_SPLITTER_ZONE: &str = "pad:splitter.bottom";
pub const STATUS_ZONE: &str = "pad:status";
pub const SIDE_HANDLE_ZONE: &str = "pad:side.handle";
pub const SIDE_PANEL_ZONE: &str = "pad:side";

/// Build the zone tree for the current layout state. The pane rows come
/// straight from the state so the solved rects agree with its hit test.
pub fn build_layout(state: &LayoutState) -> LayoutTree {
    let heights = state.heights();
    let main = LayoutNode::container(MAIN_NODE, Direction::Column)
        .with_child(Constraint::Fixed(TOP_BAR_ROWS), LayoutNode::leaf(TOP_BAR_ZONE))
        .with_child(
            Constraint::Fixed(heights.code),
            LayoutNode::leaf(PaneId::Code.zone_id()),
        )
        .with_child(
            Constraint::Fixed(SPLITTER_ROWS),
            LayoutNode::leaf(TOP_SPLITTER_ZONE),
        )
        .with_child(
            Constraint::Fixed(heights.context),
            LayoutNode::leaf(PaneId::Context.zone_id()),
        )
        .with_child(
            Constraint::Fixed(SPLITTER_ROWS),
            LayoutNode::leaf(BOTTOM_SPLITTER_ZONE),
        )
        .with_child(
            Constraint::Fixed(heights.output),
            LayoutNode::leaf(PaneId::Output.zone_id()),
        )
        .with_child(Constraint::Fixed(STATUS_ROWS), LayoutNode::leaf(STATUS_ZONE));

    let root = LayoutNode::container(ROOT_NODE, Direction::Row)
        .with_child(Constraint::Flex(1), main)
        .with_child(Constraint::Fixed(1), LayoutNode::leaf(SIDE_HANDLE_ZONE))
        .with_child(
            Constraint::Fixed(state.side_columns()),
            LayoutNode::leaf(SIDE_PANEL_ZONE),
        );

    LayoutTree::new(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::workspace::controller::{LayoutSettings, PointerTarget};

    fn target_for(zone: &str) -> PointerTarget {
        match zone {
            TOP_BAR_ZONE => PointerTarget::TopBar,
            TOP_SPLITTER_ZONE => PointerTarget::TopSplitter,
            BOTTOM_SPLITTER_ZONE => PointerTarget::BottomSplitter,
            STATUS_ZONE => PointerTarget::StatusLine,
            SIDE_HANDLE_ZONE => PointerTarget::SideHandle,
            SIDE_PANEL_ZONE => PointerTarget::SidePanel,
            other => PaneId::ALL
                .into_iter()
                .find(|pane| pane.zone_id() == other)
                .map(PointerTarget::Pane)
                .unwrap_or_else(|| panic!("unexpected zone {other}")),
        }
    }

    #[test]
    fn solved_zones_agree_with_hit_test() {
        let mut state = LayoutState::new(LayoutSettings::default(), Size::new(60, 30));
        state.side_panel_mut().set_width_percent(30.0);

        let rects = build_layout(&state).solve(state.viewport()).unwrap();
        for (id, rect) in &rects {
            if id == ROOT_NODE || id == MAIN_NODE || rect.width == 0 || rect.height == 0 {
                continue;
            }
            let expected = target_for(id);
            for row in rect.y..rect.bottom() {
                for column in rect.x..rect.right() {
                    assert_eq!(state.hit_test(column, row), expected, "{id} at {column},{row}");
                }
            }
        }
    }

    #[test]
    fn closed_side_panel_has_no_width() {
        let state = LayoutState::new(LayoutSettings::default(), Size::new(80, 24));
        let rects = build_layout(&state).solve(state.viewport()).unwrap();
        assert_eq!(rects[SIDE_PANEL_ZONE].width, 0);
        assert_eq!(rects[SIDE_HANDLE_ZONE].x, 79);
        assert_eq!(rects[MAIN_NODE].width, 79);
        assert_eq!(rects[STATUS_ZONE].y, 23);
    }
}
