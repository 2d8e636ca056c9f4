// Node outline shapes and edge anchoring.
//
// Edges are drawn between points on the node outlines, not between the
// centers, so arrows and dashes stay visible whatever the node size. The
// boundary point moves continuously with both endpoints, which keeps edges
// visually stable while the simulation is running.

use eframe::egui::{Pos2, Rect, Vec2};

use crate::graph_state::{GraphNode, NodeKind};

/// Base radius of a reading node before degree scaling.
pub const READING_RADIUS: f32 = 12.0;
/// Base radius of a linked-item marker before degree scaling.
pub const ITEM_RADIUS: f32 = 6.0;

pub const NODE_MIN_WIDTH: f32 = 100.0;
pub const NODE_MIN_HEIGHT: f32 = 40.0;
pub const H_PAD: f32 = 20.0;
pub const V_PAD: f32 = 10.0;

/// Closed outline of a node in world coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Outline {
    Circle { center: Pos2, radius: f32 },
    Rect(Rect),
}

/// Computes the outline for a node from its kind, position, degree scale
/// and measured label size.
pub fn outline(node: &GraphNode) -> Outline {
    match node.kind {
        NodeKind::Reading => Outline::Circle {
            center: node.pos,
            radius: READING_RADIUS * node.scale,
        },
        NodeKind::LinkedItem => Outline::Circle {
            center: node.pos,
            radius: ITEM_RADIUS * node.scale,
        },
        NodeKind::Tag => {
            let size = Vec2::new(
                (node.label_size.x + H_PAD).max(NODE_MIN_WIDTH),
                (node.label_size.y + V_PAD).max(NODE_MIN_HEIGHT),
            );
            Outline::Rect(Rect::from_center_size(node.pos, size))
        }
    }
}

/// Point on the node's outline along the segment from its center toward
/// `target`. Falls back to the center when no boundary crossing exists
/// (coincident points, or a target inside a rectangular node).
pub fn boundary_point(node: &GraphNode, target: Pos2) -> Pos2 {
    match outline(node) {
        Outline::Circle { center, radius } => {
            let delta = target - center;
            let len = delta.length();
            if len <= f32::EPSILON {
                center
            } else {
                center + delta / len * radius
            }
        }
        Outline::Rect(rect) => rect_boundary_point(rect, target),
    }
}

fn rect_boundary_point(rect: Rect, target: Pos2) -> Pos2 {
    let center = rect.center();
    let corners = [
        rect.left_top(),
        rect.right_top(),
        rect.right_bottom(),
        rect.left_bottom(),
    ];
    let edges = [
        (corners[0], corners[1]),
        (corners[1], corners[2]),
        (corners[2], corners[3]),
        (corners[3], corners[0]),
    ];

    // Intersect the center->target segment with each side; of the bounded
    // hits, the one closest to the target wins.
    let mut best: Option<(f32, Pos2)> = None;
    for (a, b) in edges {
        if let Some(hit) = segment_intersection(center, target, a, b) {
            let d = (hit - target).length_sq();
            if best.map(|(bd, _)| d < bd).unwrap_or(true) {
                best = Some((d, hit));
            }
        }
    }
    best.map(|(_, hit)| hit).unwrap_or(center)
}

/// Intersection of segments `p1p2` and `p3p4`, bounded on both.
fn segment_intersection(p1: Pos2, p2: Pos2, p3: Pos2, p4: Pos2) -> Option<Pos2> {
    let r = p2 - p1;
    let s = p4 - p3;
    let denom = r.x * s.y - r.y * s.x;
    if denom.abs() <= f32::EPSILON {
        return None;
    }
    let q = p3 - p1;
    let t = (q.x * s.y - q.y * s.x) / denom;
    let u = (q.x * r.y - q.y * r.x) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(p1 + r * t)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_state::{NodeId, Payload};

    fn node(kind: NodeKind, pos: Pos2) -> GraphNode {
        let mut n = GraphNode::new(NodeId::new("n"), "n", kind, Payload::new());
        n.pos = pos;
        n
    }

    #[test]
    fn circle_boundary_sits_at_scaled_radius() {
        let mut n = node(NodeKind::Reading, Pos2::new(10.0, 10.0));
        n.scale = 1.5;
        let p = boundary_point(&n, Pos2::new(110.0, 10.0));
        assert!((p.x - (10.0 + READING_RADIUS * 1.5)).abs() < 1e-3);
        assert!((p.y - 10.0).abs() < 1e-3);
    }

    #[test]
    fn circle_boundary_falls_back_to_center_for_coincident_target() {
        let n = node(NodeKind::Reading, Pos2::new(5.0, 5.0));
        assert_eq!(boundary_point(&n, Pos2::new(5.0, 5.0)), n.pos);
    }

    #[test]
    fn rect_boundary_lies_on_the_perimeter() {
        let n = node(NodeKind::Tag, Pos2::ZERO);
        let Outline::Rect(rect) = outline(&n) else {
            panic!("tag nodes are rectangular");
        };

        for target in [
            Pos2::new(300.0, 0.0),
            Pos2::new(-300.0, 40.0),
            Pos2::new(17.0, 250.0),
            Pos2::new(-120.0, -90.0),
        ] {
            let p = boundary_point(&n, target);
            let on_x = (p.x - rect.left()).abs() < 1e-3 || (p.x - rect.right()).abs() < 1e-3;
            let on_y = (p.y - rect.top()).abs() < 1e-3 || (p.y - rect.bottom()).abs() < 1e-3;
            assert!(
                (on_x && p.y >= rect.top() - 1e-3 && p.y <= rect.bottom() + 1e-3)
                    || (on_y && p.x >= rect.left() - 1e-3 && p.x <= rect.right() + 1e-3),
                "{p:?} not on perimeter of {rect:?}"
            );
        }
    }

    #[test]
    fn rect_boundary_falls_back_to_center_for_inside_target() {
        let n = node(NodeKind::Tag, Pos2::ZERO);
        // Target well inside the minimum 100x40 box.
        assert_eq!(boundary_point(&n, Pos2::new(3.0, 2.0)), n.pos);
    }

    #[test]
    fn rect_grows_with_label_but_never_below_minimum() {
        let mut short = node(NodeKind::Tag, Pos2::ZERO);
        short.set_label("ab");
        let Outline::Rect(small) = outline(&short) else {
            panic!()
        };
        assert_eq!(small.width(), NODE_MIN_WIDTH);
        assert_eq!(small.height(), NODE_MIN_HEIGHT);

        let mut long = node(NodeKind::Tag, Pos2::ZERO);
        long.set_label("a rather long synthesis tag name");
        let Outline::Rect(big) = outline(&long) else {
            panic!()
        };
        assert!(big.width() > small.width());
    }

    #[test]
    fn boundary_moves_continuously_with_the_target() {
        // Small target displacement must not teleport the anchor point.
        let n = node(NodeKind::Tag, Pos2::ZERO);
        let a = boundary_point(&n, Pos2::new(200.0, 35.0));
        let b = boundary_point(&n, Pos2::new(200.0, 35.5));
        assert!((a - b).length() < 2.0);
    }
}
