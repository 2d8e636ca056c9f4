// Graph state module - node/edge value objects and the owning container.

use std::collections::{HashMap, HashSet};
use std::fmt;

use eframe::egui::{Pos2, Vec2};
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableUnGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use serde::{Deserialize, Serialize};

use crate::geometry;

/// Rough per-character width used to size rectangular nodes before the
/// canvas has measured the real label galley.
const LABEL_WIDTH_ESTIMATE: f32 = 7.0;
const LABEL_HEIGHT_ESTIMATE: f32 = 16.0;

// ------------------------------------------------------------------
// Identity and kinds
// ------------------------------------------------------------------

/// Stable node key, unique within one graph instance (e.g. `r_12`, `t_5`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Closed set of node kinds. The kind decides outline shape, color key,
/// renameability and the repulsion class of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Reading,
    Tag,
    LinkedItem,
}

impl NodeKind {
    /// Whether a rename flow is offered for this kind.
    pub fn renamable(self) -> bool {
        match self {
            NodeKind::Reading | NodeKind::Tag => true,
            NodeKind::LinkedItem => false,
        }
    }

    /// Minor kinds are the small annotation markers; they repel with a
    /// reduced coefficient so swarms of them do not dominate the layout.
    pub fn is_minor(self) -> bool {
        matches!(self, NodeKind::LinkedItem)
    }

    /// Key used when talking to the storage collaborator.
    pub fn storage_key(self) -> &'static str {
        match self {
            NodeKind::Reading => "reading",
            NodeKind::Tag => "tag",
            NodeKind::LinkedItem => "item",
        }
    }
}

// ------------------------------------------------------------------
// Visual emphasis
// ------------------------------------------------------------------

/// Derived highlight state. Recomputed wholesale on every selection
/// change; never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Emphasis {
    #[default]
    Normal,
    Highlighted,
    Dimmed,
}

impl Emphasis {
    pub fn opacity(self) -> f32 {
        match self {
            Emphasis::Normal | Emphasis::Highlighted => 1.0,
            Emphasis::Dimmed => 0.2,
        }
    }

    /// Painter order: lower ranks are drawn first and end up underneath.
    pub fn paint_rank(self) -> u8 {
        match self {
            Emphasis::Dimmed => 0,
            Emphasis::Normal => 1,
            Emphasis::Highlighted => 2,
        }
    }
}

// ------------------------------------------------------------------
// Node and edge value objects
// ------------------------------------------------------------------

pub type Payload = serde_json::Map<String, serde_json::Value>;

#[derive(Clone, Debug)]
pub struct GraphNode {
    pub id: NodeId,
    pub label: String,
    pub kind: NodeKind,
    /// Kind-specific attributes used only for tooltips and navigation.
    /// The simulation never reads this.
    pub payload: Payload,
    pub pos: Pos2,
    pub vel: Vec2,
    /// Non-decreasing function of the incident-edge count; 1.0 when
    /// disconnected. Recomputed by the container whenever edges change.
    pub scale: f32,
    /// Measured size of the label text, fed back by the canvas. Drives the
    /// outline of rectangular kinds.
    pub label_size: Vec2,
    pub emphasis: Emphasis,
}

impl GraphNode {
    pub fn new(id: NodeId, label: impl Into<String>, kind: NodeKind, payload: Payload) -> Self {
        let label = label.into();
        let label_size = estimate_label_size(&label);
        Self {
            id,
            label,
            kind,
            payload,
            pos: Pos2::ZERO,
            vel: Vec2::ZERO,
            scale: 1.0,
            label_size,
            emphasis: Emphasis::Normal,
        }
    }

    /// Instantaneous velocity change; the integrator applies damping.
    pub fn apply_impulse(&mut self, delta: Vec2) {
        self.vel += delta;
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
        self.label_size = estimate_label_size(&self.label);
    }

    fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(|v| v.as_str())
    }

    /// Color lookup key: readings and tags have fixed keys, linked items
    /// use their `item_type` payload entry when present.
    pub fn color_key(&self) -> &str {
        match self.kind {
            NodeKind::Reading => "reading",
            NodeKind::Tag => "tag",
            NodeKind::LinkedItem => self.payload_str("item_type").unwrap_or("default"),
        }
    }

    /// Hover tooltip: label, kind-specific payload lines, connection count.
    pub fn tooltip_text(&self, connections: usize) -> String {
        let mut parts = Vec::new();
        match self.kind {
            NodeKind::Reading => {
                parts.push(format!("Name: {}", self.label));
                if let Some(title) = self.payload_str("full_title") {
                    if title != self.label {
                        parts.push(format!("Title: {title}"));
                    }
                }
                if let Some(author) = self.payload_str("author") {
                    parts.push(format!("Author: {author}"));
                }
            }
            NodeKind::Tag => parts.push(format!("Tag: {}", self.label)),
            NodeKind::LinkedItem => {
                parts.push(format!(
                    "Type: {}",
                    self.payload_str("item_type").unwrap_or("item")
                ));
                if let Some(text) = self.payload_str("summary_text") {
                    parts.push(format!("Text: {text}"));
                }
            }
        }
        parts.push(format!("Connections: {connections}"));
        parts.join("\n")
    }
}

fn estimate_label_size(label: &str) -> Vec2 {
    Vec2::new(
        label.chars().count() as f32 * LABEL_WIDTH_ESTIMATE,
        LABEL_HEIGHT_ESTIMATE,
    )
}

/// Semantically undirected; the stored orientation only fixes which endpoint
/// comes first in `line`. Edges carry no independent identity.
#[derive(Clone, Debug, Default)]
pub struct GraphEdge {
    pub emphasis: Emphasis,
    /// Drawn endpoints on the two node outlines, recomputed only after all
    /// node positions of a tick have settled.
    pub line: Option<(Pos2, Pos2)>,
}

// ------------------------------------------------------------------
// Container
// ------------------------------------------------------------------

/// Owns the live node/edge set and keeps it referentially intact: every
/// edge endpoint exists, removing a node removes its edges, and edges are
/// unique per unordered endpoint pair.
#[derive(Default)]
pub struct KnowledgeGraph {
    graph: StableUnGraph<GraphNode, GraphEdge>,
    ids: HashMap<NodeId, NodeIndex>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.ids.contains_key(id)
    }

    pub fn index_of(&self, id: &NodeId) -> Option<NodeIndex> {
        self.ids.get(id).copied()
    }

    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.index_of(id).and_then(|ix| self.graph.node_weight(ix))
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut GraphNode> {
        let ix = self.index_of(id)?;
        self.graph.node_weight_mut(ix)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_weights()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut GraphNode> {
        self.graph.node_weights_mut()
    }

    pub fn node_indices(&self) -> Vec<NodeIndex> {
        self.graph.node_indices().collect()
    }

    pub fn node_by_index(&self, ix: NodeIndex) -> Option<&GraphNode> {
        self.graph.node_weight(ix)
    }

    pub fn node_by_index_mut(&mut self, ix: NodeIndex) -> Option<&mut GraphNode> {
        self.graph.node_weight_mut(ix)
    }

    /// Edges with their endpoint nodes, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&GraphNode, &GraphNode, &GraphEdge)> {
        self.graph.edge_references().filter_map(|e| {
            let from = self.graph.node_weight(e.source())?;
            let to = self.graph.node_weight(e.target())?;
            Some((from, to, e.weight()))
        })
    }

    pub fn neighbors_of(&self, ix: NodeIndex) -> Vec<NodeIndex> {
        self.graph.neighbors(ix).collect()
    }

    pub fn neighbors(&self, id: &NodeId) -> Vec<NodeId> {
        self.index_of(id)
            .map(|ix| {
                self.graph
                    .neighbors(ix)
                    .filter_map(|n| self.graph.node_weight(n))
                    .map(|n| n.id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn degree(&self, id: &NodeId) -> usize {
        self.index_of(id)
            .map(|ix| self.graph.edges(ix).count())
            .unwrap_or(0)
    }

    /// Inserts a node. A duplicate id is ignored and the existing node kept;
    /// the container is always rebuilt from scratch on load, so this only
    /// fires on malformed input data.
    pub fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        if let Some(&ix) = self.ids.get(&node.id) {
            log::warn!("duplicate node id {} ignored", node.id);
            return ix;
        }
        let id = node.id.clone();
        let ix = self.graph.add_node(node);
        self.ids.insert(id, ix);
        ix
    }

    /// Connects two nodes. A missing endpoint, a self pair, or an already
    /// connected unordered pair makes this a silent no-op, not an error.
    pub fn add_edge(&mut self, from: &NodeId, to: &NodeId) -> bool {
        let (Some(a), Some(b)) = (self.index_of(from), self.index_of(to)) else {
            return false;
        };
        if a == b || self.graph.find_edge(a, b).is_some() {
            return false;
        }
        self.graph.add_edge(a, b, GraphEdge::default());
        true
    }

    /// Removes a node and detaches every incident edge.
    pub fn remove_node(&mut self, id: &NodeId) -> bool {
        let Some(ix) = self.ids.remove(id) else {
            return false;
        };
        self.graph.remove_node(ix);
        true
    }

    pub fn clear(&mut self) {
        self.graph.clear();
        self.ids.clear();
    }

    // --------------------------------------------------------------
    // Derived state
    // --------------------------------------------------------------

    /// Recomputes every node's scale from its incident-edge count.
    /// `1 + sqrt(n) / 4` grows monotonically but sub-linearly, so hub
    /// nodes stand out without dwarfing the rest.
    pub fn refresh_scales(&mut self) {
        for ix in self.node_indices() {
            let degree = self.graph.edges(ix).count();
            if let Some(node) = self.graph.node_weight_mut(ix) {
                node.scale = 1.0 + (degree as f32).sqrt() / 4.0;
            }
        }
    }

    /// Recomputes the drawn endpoints of every edge from the current node
    /// positions. Called once per tick after integration, and after any
    /// out-of-band position change (drag, reload). Never mid-tick.
    pub fn refresh_edge_lines(&mut self) {
        let lines: Vec<(EdgeIndex, Pos2, Pos2)> = self
            .graph
            .edge_references()
            .filter_map(|e| {
                let from = self.graph.node_weight(e.source())?;
                let to = self.graph.node_weight(e.target())?;
                Some((
                    e.id(),
                    geometry::boundary_point(from, to.pos),
                    geometry::boundary_point(to, from.pos),
                ))
            })
            .collect();
        for (eix, a, b) in lines {
            if let Some(edge) = self.graph.edge_weight_mut(eix) {
                edge.line = Some((a, b));
            }
        }
    }

    /// Derives the highlight state for the given selection. Empty selection
    /// resets everything to `Normal`; otherwise the selection and its
    /// neighborhood are raised and the rest dimmed. Full recomputation,
    /// idempotent for a fixed selection.
    pub fn compute_highlight(&mut self, selected: &HashSet<NodeId>) {
        if selected.is_empty() {
            for node in self.graph.node_weights_mut() {
                node.emphasis = Emphasis::Normal;
            }
            for edge in self.graph.edge_weights_mut() {
                edge.emphasis = Emphasis::Normal;
            }
            return;
        }

        let mut hot_nodes: HashSet<NodeIndex> = selected
            .iter()
            .filter_map(|id| self.index_of(id))
            .collect();
        let mut hot_edges: HashSet<EdgeIndex> = HashSet::new();

        for ix in hot_nodes.clone() {
            for e in self.graph.edges(ix) {
                hot_edges.insert(e.id());
                hot_nodes.insert(e.source());
                hot_nodes.insert(e.target());
            }
        }

        for ix in self.graph.node_indices().collect::<Vec<_>>() {
            let emphasis = if hot_nodes.contains(&ix) {
                Emphasis::Highlighted
            } else {
                Emphasis::Dimmed
            };
            if let Some(node) = self.graph.node_weight_mut(ix) {
                node.emphasis = emphasis;
            }
        }
        for eix in self.graph.edge_indices().collect::<Vec<_>>() {
            let emphasis = if hot_edges.contains(&eix) {
                Emphasis::Highlighted
            } else {
                Emphasis::Dimmed
            };
            if let Some(edge) = self.graph.edge_weight_mut(eix) {
                edge.emphasis = emphasis;
            }
        }
    }

    /// Total kinetic energy of the simulation, `Σ |v|²`.
    pub fn kinetic_energy(&self) -> f32 {
        self.graph.node_weights().map(|n| n.vel.length_sq()).sum()
    }
}

// ------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------
