use std::collections::HashMap;

use crate::error::{PadError, Result};
use crate::geometry::{Rect, Size};

/// Layout direction for a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Row,
    Column,
}

/// Space distribution rules for child nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constraint {
    /// Exact number of cells along the container axis.
    Fixed(u16),
    /// Weighted share of whatever the fixed children leave.
    Flex(u16),
}

/// Unique identifier for layout nodes.
pub type NodeId = String;

/// Layout node representation (container or leaf).
#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub id: NodeId,
    pub direction: Direction,
    pub constraints: Vec<Constraint>,
    pub children: Vec<LayoutNode>,
}

impl LayoutNode {
    pub fn leaf(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            direction: Direction::Row,
            constraints: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn container(id: impl Into<NodeId>, direction: Direction) -> Self {
        Self {
            id: id.into(),
            direction,
            constraints: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Append a child with the constraint it takes along this node's axis.
    pub fn with_child(mut self, constraint: Constraint, child: LayoutNode) -> Self {
        self.constraints.push(constraint);
        self.children.push(child);
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Layout tree orchestrator.
#[derive(Debug, Clone)]
pub struct LayoutTree {
    pub root: LayoutNode,
}

impl LayoutTree {
    pub fn new(root: LayoutNode) -> Self {
        Self { root }
    }

    /// Solve the layout tree for a given terminal size, returning rects keyed by node id.
    pub fn solve(&self, size: Size) -> Result<HashMap<NodeId, Rect>> {
        if self.root.is_leaf() {
            return Err(PadError::EmptyLayout);
        }

        let mut rects = HashMap::new();
        solve_node(
            &self.root,
            Rect::new(0, 0, size.width, size.height),
            &mut rects,
        );
        Ok(rects)
    }
}

fn solve_node(node: &LayoutNode, rect: Rect, accum: &mut HashMap<NodeId, Rect>) {
    accum.insert(node.id.clone(), rect);
    if node.is_leaf() {
        return;
    }

    let axis_length = match node.direction {
        Direction::Row => rect.width,
        Direction::Column => rect.height,
    };
    let spans = distribute(axis_length, node.children.len(), &node.constraints);

    let mut cursor = match node.direction {
        Direction::Row => rect.x,
        Direction::Column => rect.y,
    };
    for (child, span) in node.children.iter().zip(spans) {
        let child_rect = match node.direction {
            Direction::Row => Rect::new(cursor, rect.y, span, rect.height),
            Direction::Column => Rect::new(rect.x, cursor, rect.width, span),
        };
        solve_node(child, child_rect, accum);
        cursor = cursor.saturating_add(span);
    }
}

/// Split `available` cells between `child_count` children.
///
/// Fixed children are sized first; if they overflow, the trailing
/// ones are shrunk. Flex children share the remainder by weight and leftover
/// cells go round-robin to flex children in order.
fn distribute(available: u16, child_count: usize, constraints: &[Constraint]) -> Vec<u16> {
    let resolved: Vec<Constraint> = (0..child_count)
        .map(|idx| constraints.get(idx).copied().unwrap_or(Constraint::Flex(1)))
        .collect();

    let mut lengths: Vec<u32> = resolved
        .iter()
        .map(|constraint| match *constraint {
            Constraint::Fixed(cells) => cells as u32,
            Constraint::Flex(_) => 0,
        })
        .collect();

    let total = available as u32;
    let mut used: u32 = lengths.iter().sum();
    for length in lengths.iter_mut().rev() {
        if used <= total {
            break;
        }
        let cut = (used - total).min(*length);
        *length -= cut;
        used -= cut;
    }

    let remaining = total.saturating_sub(used);
    let weights: Vec<u32> = resolved
        .iter()
        .map(|constraint| match *constraint {
            Constraint::Flex(weight) => weight.max(1) as u32,
            _ => 0,
        })
        .collect();
    let total_weight: u32 = weights.iter().sum();

    if total_weight > 0 && remaining > 0 {
        let mut leftover = remaining;
        for (length, weight) in lengths.iter_mut().zip(&weights) {
            let share = remaining * weight / total_weight;
            *length += share;
            leftover -= share;
        }
        let mut idx = 0;
        while leftover > 0 {
            if weights[idx % child_count] > 0 {
                lengths[idx % child_count] += 1;
                leftover -= 1;
            }
            idx += 1;
        }
    }

    lengths
        .into_iter()
        .map(|length| length.min(u16::MAX as u32) as u16)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distribute_single_child() {
        let values = distribute(80, 1, &[]);
        assert_eq!(values, vec![80]);
    }

    #[test]
    fn flex_remainder_goes_round_robin() {
        let values = distribute(10, 3, &[Constraint::Flex(1); 3]);
        assert_eq!(values, vec![4, 3, 3]);
        assert_eq!(values.iter().sum::<u16>(), 10);
    }

    #[test]
    fn overflowing_fixed_children_shrink_from_the_end() {
        let values = distribute(
            10,
            3,
            &[Constraint::Fixed(6), Constraint::Fixed(3), Constraint::Fixed(4)],
        );
        assert_eq!(values, vec![6, 3, 1]);
    }

    #[test]
    fn row_layout_with_mixed_constraints() {
        let root = LayoutNode::container("root", Direction::Row)
            .with_child(Constraint::Fixed(20), LayoutNode::leaf("left"))
            .with_child(Constraint::Fixed(25), LayoutNode::leaf("middle"))
            .with_child(Constraint::Flex(1), LayoutNode::leaf("right"));

        let tree = LayoutTree::new(root);
        let rects = tree.solve(Size::new(100, 20)).unwrap();

        assert_eq!(rects["left"].width, 20);
        assert_eq!(rects["middle"].width, 25);
        assert_eq!(rects["right"].width, 55);
        assert_eq!(rects["middle"].x, 20);
        assert_eq!(rects["right"].x, 45);
        assert_eq!(rects["right"].height, 20);
    }

    #[test]
    fn nested_column_stacks_children() {
        let column = LayoutNode::container("main", Direction::Column)
            .with_child(Constraint::Fixed(1), LayoutNode::leaf("top"))
            .with_child(Constraint::Fixed(7), LayoutNode::leaf("body"))
            .with_child(Constraint::Flex(1), LayoutNode::leaf("bottom"));
        let root = LayoutNode::container("root", Direction::Row)
            .with_child(Constraint::Flex(1), column)
            .with_child(Constraint::Fixed(10), LayoutNode::leaf("side"));

        let rects = LayoutTree::new(root).solve(Size::new(50, 12)).unwrap();

        assert_eq!(rects["main"].width, 40);
        assert_eq!(rects["body"].y, 1);
        assert_eq!(rects["bottom"].y, 8);
        assert_eq!(rects["bottom"].height, 4);
        assert_eq!(rects["side"].x, 40);
    }

    #[test]
    fn leaf_root_is_rejected() {
        let tree = LayoutTree::new(LayoutNode::leaf("alone"));
        assert!(matches!(
            tree.solve(Size::new(10, 10)),
            Err(PadError::EmptyLayout)
        ));
    }
}
