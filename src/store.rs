// Central owned state: the live graph, selection, colors, layout engine
// and the storage backend, plus the message/event surfaces the shell reads.

use std::collections::HashSet;

use crate::colors::ColorTheme;
use crate::graph_state::{GraphNode, KnowledgeGraph, NodeId, NodeKind, Payload};
use crate::layout_force::{ForceLayout, PinPolicy, SimulationConfig};
use crate::seeder;
use crate::storage::{GraphStore, ScopeId, StoreError};

/// Outbound notification for the host shell; the visualizer raises these,
/// the shell drains them once per frame and decides what opening a reading
/// or an anchor list actually means.
#[derive(Clone, Debug, PartialEq)]
pub enum ShellEvent {
    /// User asked to open the entity behind a node.
    Navigate { kind: NodeKind, payload: Payload },
    /// User asked to see the anchors recorded under a tag.
    ViewAnchors { tag_id: i64 },
}

pub struct Store {
    pub graph: KnowledgeGraph,
    pub selection: HashSet<NodeId>,
    pub colors: ColorTheme,
    pub layout: ForceLayout,
    pub scope: ScopeId,
    pub backend: Box<dyn GraphStore>,
    /// Node currently held by a pointer drag, if any.
    pub dragged: Option<NodeId>,
    pub shell_events: Vec<ShellEvent>,
    pub error_message: Option<String>,
    pub warning_message: Option<String>,
}

impl Store {
    pub fn new(scope: ScopeId, backend: Box<dyn GraphStore>) -> Self {
        Self {
            graph: KnowledgeGraph::new(),
            selection: HashSet::new(),
            colors: ColorTheme::default(),
            layout: ForceLayout::new(SimulationConfig::default()),
            scope,
            backend,
            dragged: None,
            shell_events: Vec::new(),
            error_message: None,
            warning_message: None,
        }
    }

    /// Full reload from the backend: stop the layout, rebuild the container
    /// from scratch, reseed, restart. On failure the previous graph is
    /// discarded and the layout stays stopped; a partial graph is never
    /// shown.
    pub fn reload(&mut self) {
        self.layout.stop();
        self.graph.clear();
        self.selection.clear();
        self.dragged = None;

        let data = match self.backend.load_graph(self.scope) {
            Ok(data) => data,
            Err(e) => {
                log::error!("graph load failed: {e}");
                self.error_message = Some(format!("Could not load graph: {e}"));
                return;
            }
        };
        match self.backend.color_settings(self.scope) {
            Ok(settings) => self.colors = ColorTheme::from_settings(&settings),
            Err(e) => {
                // Colors are cosmetic; keep the previous theme.
                log::warn!("color settings unavailable: {e}");
            }
        }

        for record in data.nodes {
            self.graph.add_node(GraphNode::new(
                record.id,
                record.label,
                record.kind,
                record.payload,
            ));
        }
        for edge in data.edges {
            // Dangling endpoints in the data are dropped here, silently.
            self.graph.add_edge(&edge.from_id, &edge.to_id);
        }

        self.graph.refresh_scales();
        seeder::seed_positions(&mut self.graph, &mut rand::rng());
        self.graph.refresh_edge_lines();
        self.graph.compute_highlight(&self.selection);

        log::info!(
            "loaded graph: {} nodes, {} edges",
            self.graph.node_count(),
            self.graph.edge_count()
        );
        if !self.graph.is_empty() {
            self.layout.start();
        }
    }

    /// The set excluded from integration this tick, per the pin policy.
    pub fn pinned_ids(&self) -> HashSet<NodeId> {
        let mut pinned = HashSet::new();
        if let Some(id) = &self.dragged {
            pinned.insert(id.clone());
        }
        if self.layout.config.pin_policy == PinPolicy::DraggedOrSelected {
            pinned.extend(self.selection.iter().cloned());
        }
        pinned
    }

    /// One frame of simulation, when running.
    pub fn tick(&mut self) {
        if self.layout.is_running() && !self.graph.is_empty() {
            let pinned = self.pinned_ids();
            self.layout.step(&mut self.graph, &pinned);
        }
    }

    pub fn surface_error(&mut self, err: &StoreError) {
        match err {
            StoreError::DuplicateName(name) => {
                log::warn!("name collision: {name}");
                self.warning_message = Some(format!("The name \"{name}\" is already in use."));
            }
            other => {
                log::error!("storage operation failed: {other}");
                self.error_message = Some(other.to_string());
            }
        }
    }

    pub fn drain_shell_events(&mut self) -> Vec<ShellEvent> {
        std::mem::take(&mut self.shell_events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{EdgeRecord, GraphData, MemoryStore, NodeRecord};

    fn record(id: &str, kind: NodeKind, label: &str) -> NodeRecord {
        NodeRecord {
            id: NodeId::new(id),
            kind,
            label: label.to_string(),
            payload: Payload::new(),
        }
    }

    fn edge(from: &str, to: &str) -> EdgeRecord {
        EdgeRecord {
            from_id: NodeId::new(from),
            to_id: NodeId::new(to),
        }
    }

    fn sample_data() -> GraphData {
        GraphData {
            nodes: vec![
                record("r_1", NodeKind::Reading, "Seeing Like a State"),
                record("t_1", NodeKind::Tag, "legibility"),
                record("item_1", NodeKind::LinkedItem, "note"),
            ],
            edges: vec![
                edge("r_1", "t_1"),
                edge("item_1", "r_1"),
                edge("r_1", "ghost"),
            ],
        }
    }

    fn store_with(data: GraphData) -> Store {
        Store::new(
            ScopeId(1),
            Box::new(MemoryStore::with_graph(ScopeId(1), data)),
        )
    }

    #[test]
    fn reload_builds_the_graph_and_starts_the_layout() {
        let mut store = store_with(sample_data());
        store.reload();

        assert_eq!(store.graph.node_count(), 3);
        // The dangling edge record is dropped.
        assert_eq!(store.graph.edge_count(), 2);
        assert!(store.layout.is_running());
        assert!(store.error_message.is_none());

        // Scales and edge anchors are ready before the first tick.
        assert!(store.graph.node(&NodeId::new("r_1")).unwrap().scale > 1.0);
        assert!(store.graph.edges().all(|(_, _, e)| e.line.is_some()));
    }

    #[test]
    fn reload_failure_clears_the_graph_and_stops_the_layout() {
        let mut store = store_with(sample_data());
        store.reload();
        assert!(store.layout.is_running());

        let mut offline = MemoryStore::new();
        offline.fail = true;
        store.backend = Box::new(offline);
        store.reload();

        assert!(store.graph.is_empty());
        assert!(!store.layout.is_running());
        assert!(store.error_message.is_some());
    }

    #[test]
    fn empty_scope_loads_an_empty_idle_graph() {
        let mut store = Store::new(ScopeId(9), Box::new(MemoryStore::new()));
        store.reload();
        assert!(store.graph.is_empty());
        assert!(!store.layout.is_running());
        assert!(store.error_message.is_none());
    }

    #[test]
    fn pinned_set_follows_the_policy() {
        let mut store = store_with(sample_data());
        store.reload();
        store.selection.insert(NodeId::new("t_1"));
        store.dragged = Some(NodeId::new("r_1"));

        let pinned = store.pinned_ids();
        assert!(pinned.contains(&NodeId::new("r_1")));
        assert!(pinned.contains(&NodeId::new("t_1")));

        store.layout.config.pin_policy = PinPolicy::DraggedOnly;
        let pinned = store.pinned_ids();
        assert!(pinned.contains(&NodeId::new("r_1")));
        assert!(!pinned.contains(&NodeId::new("t_1")));
    }

    #[test]
    fn tick_is_a_noop_while_idle() {
        let mut store = store_with(sample_data());
        store.reload();
        store.layout.stop();
        let positions: Vec<_> = store.graph.nodes().map(|n| n.pos).collect();
        store.tick();
        let after: Vec<_> = store.graph.nodes().map(|n| n.pos).collect();
        assert_eq!(positions, after);
    }

    #[test]
    fn duplicate_name_surfaces_as_a_warning_not_an_error() {
        let mut store = store_with(sample_data());
        store.surface_error(&StoreError::DuplicateName("legibility".into()));
        assert!(store.warning_message.is_some());
        assert!(store.error_message.is_none());
    }
}
