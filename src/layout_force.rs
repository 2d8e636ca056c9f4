// Force-directed layout engine.
//
// One fixed-parameter simulation: pairwise repulsion, zero-rest-length
// spring attraction along edges, and a weak pull toward the origin. The
// engine is frame-driven; the app calls `step` once per repaint while the
// layout is running.

use std::collections::HashSet;

use eframe::egui::Vec2;
use petgraph::stable_graph::NodeIndex;

use crate::graph_state::{KnowledgeGraph, NodeId};

/// Which nodes are excluded from integration during a tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PinPolicy {
    DraggedOnly,
    /// Selected nodes stay put too, so a user can arrange a neighborhood
    /// by hand while the rest keeps settling.
    #[default]
    DraggedOrSelected,
}

/// Tuned force coefficients. One immutable set; the defaults are the
/// values the whole feel of the layout was tuned around.
#[derive(Clone, Copy, Debug)]
pub struct SimulationConfig {
    pub k_repel: f32,
    pub k_attract: f32,
    pub damping: f32,
    pub k_center_pull: f32,
    /// Distance floor; all squared distances are clamped to `min_dist²`
    /// so coincident nodes produce large but finite forces.
    pub min_dist: f32,
    /// Per-side repulsion multiplier for minor kinds.
    pub minor_repel_factor: f32,
    pub pin_policy: PinPolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            k_repel: 80_000.0,
            k_attract: 0.03,
            damping: 0.85,
            k_center_pull: 0.002,
            min_dist: 50.0,
            minor_repel_factor: 0.25,
            pin_policy: PinPolicy::default(),
        }
    }
}

pub struct ForceLayout {
    pub config: SimulationConfig,
    running: bool,
}

impl ForceLayout {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self) {
        if !self.running {
            log::debug!("layout started");
        }
        self.running = true;
    }

    pub fn stop(&mut self) {
        if self.running {
            log::debug!("layout stopped");
        }
        self.running = false;
    }

    /// Advances the simulation by one tick. Forces are computed for every
    /// node against the frozen positions of the previous tick, then applied
    /// in a second pass; `pinned` nodes keep their position and end the
    /// tick with zero velocity. Edge anchors are refreshed afterwards.
    pub fn step(&self, graph: &mut KnowledgeGraph, pinned: &HashSet<NodeId>) {
        let cfg = &self.config;
        let min_dist_sq = cfg.min_dist * cfg.min_dist;

        let indices = graph.node_indices();
        let snapshot: Vec<BodySnapshot> = indices
            .iter()
            .filter_map(|&ix| {
                let node = graph.node_by_index(ix)?;
                Some(BodySnapshot {
                    ix,
                    pos: node.pos.to_vec2(),
                    minor: node.kind.is_minor(),
                    pinned: pinned.contains(&node.id),
                })
            })
            .collect();

        let mut forces = vec![Vec2::ZERO; snapshot.len()];
        for (i, a) in snapshot.iter().enumerate() {
            if a.pinned {
                continue;
            }
            let mut force = Vec2::ZERO;

            // Repulsion against every other node.
            for (j, b) in snapshot.iter().enumerate() {
                if i == j {
                    continue;
                }
                let delta = a.pos - b.pos;
                let dist_sq = delta.length_sq().max(min_dist_sq);
                let mut repel = cfg.k_repel / dist_sq;
                if a.minor {
                    repel *= cfg.minor_repel_factor;
                }
                if b.minor {
                    repel *= cfg.minor_repel_factor;
                }
                force += delta / dist_sq.sqrt() * repel;
            }

            // Spring attraction along incident edges, rest length zero.
            for nix in graph.neighbors_of(a.ix) {
                let Some(neighbor) = graph.node_by_index(nix) else {
                    continue;
                };
                let delta = neighbor.pos.to_vec2() - a.pos;
                let dist_sq = delta.length_sq().max(min_dist_sq);
                let dist = dist_sq.sqrt();
                force += delta / dist * (dist * cfg.k_attract);
            }

            // Weak pull toward the origin keeps components from drifting.
            force += -a.pos * cfg.k_center_pull;

            forces[i] = force;
        }

        for (i, body) in snapshot.iter().enumerate() {
            let Some(node) = graph.node_by_index_mut(body.ix) else {
                continue;
            };
            if body.pinned {
                node.vel = Vec2::ZERO;
                continue;
            }
            node.apply_impulse(forces[i]);
            node.vel *= cfg.damping;
            node.pos += node.vel;
        }

        graph.refresh_edge_lines();
    }
}

struct BodySnapshot {
    ix: NodeIndex,
    pos: Vec2,
    minor: bool,
    pinned: bool,
}
