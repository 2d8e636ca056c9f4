// Randomized initial placement.

use eframe::egui::{Pos2, Vec2};
use rand::Rng;

use crate::graph_state::KnowledgeGraph;

/// Half-extent of the seeding square per sqrt(node). Scaling the field with
/// `sqrt(n)` keeps the initial density roughly constant, which keeps the
/// early repulsion forces in the same range regardless of graph size.
pub const SPREAD_PER_NODE: f32 = 300.0;

pub fn field_extent(node_count: usize) -> f32 {
    SPREAD_PER_NODE * (node_count as f32).sqrt()
}

/// Places every node uniformly at random in the seeding square centered on
/// the origin and zeroes its velocity. Called on every reload; positions are
/// never persisted, so each load produces a fresh arrangement.
pub fn seed_positions<R: Rng>(graph: &mut KnowledgeGraph, rng: &mut R) {
    let extent = field_extent(graph.node_count());
    for node in graph.nodes_mut() {
        node.pos = Pos2::new(
            rng.random_range(-extent..=extent),
            rng.random_range(-extent..=extent),
        );
        node.vel = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_state::{GraphNode, NodeId, NodeKind, Payload};

    fn graph_of(n: usize) -> KnowledgeGraph {
        let mut g = KnowledgeGraph::new();
        for i in 0..n {
            g.add_node(GraphNode::new(
                NodeId::new(format!("r_{i}")),
                format!("r_{i}"),
                NodeKind::Reading,
                Payload::new(),
            ));
        }
        g
    }

    #[test]
    fn seeds_inside_the_scaled_field() {
        let mut g = graph_of(25);
        let extent = field_extent(25);
        seed_positions(&mut g, &mut rand::rng());

        for node in g.nodes() {
            assert!(node.pos.x.abs() <= extent);
            assert!(node.pos.y.abs() <= extent);
            assert_eq!(node.vel, Vec2::ZERO);
        }
    }

    #[test]
    fn field_grows_with_node_count() {
        assert_eq!(field_extent(0), 0.0);
        assert!(field_extent(4) < field_extent(100));
        assert_eq!(field_extent(4), 600.0);
    }

    #[test]
    fn reseeding_moves_a_populated_graph() {
        let mut g = graph_of(40);
        seed_positions(&mut g, &mut rand::rng());
        let spread: f32 = g.nodes().map(|n| n.pos.to_vec2().length()).sum();
        // 40 uniform draws collapsing onto the origin would mean a broken rng.
        assert!(spread > 0.0);
    }
}
