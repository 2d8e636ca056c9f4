// Storage boundary: the collaborator the visualizer loads from and writes
// renames/deletes through. The component never talks to a database itself;
// a host shell injects an implementation of `GraphStore`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph_state::{NodeId, NodeKind, Payload};

/// Scope the graph is loaded for (one project / collection).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeId(pub i64);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub kind: NodeKind,
    pub label: String,
    #[serde(default)]
    pub payload: Payload,
}

/// Endpoints reference `NodeRecord` ids; records with unknown endpoints are
/// dropped by the loader, not an error.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub from_id: NodeId,
    pub to_id: NodeId,
}

/// One full graph snapshot as produced by a backend.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// Non-fatal: a rename or create collided with an existing name.
    #[error("name already in use: {0}")]
    DuplicateName(String),
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),
    #[error("storage backend failure: {0}")]
    Backend(String),
}

pub trait GraphStore {
    fn load_graph(&mut self, scope: ScopeId) -> Result<GraphData, StoreError>;

    /// Raw `#rrggbb` strings keyed by color key; missing keys fall back to
    /// built-in defaults.
    fn color_settings(&mut self, scope: ScopeId) -> Result<HashMap<String, String>, StoreError>;

    fn rename_node(
        &mut self,
        kind: NodeKind,
        id: &NodeId,
        new_label: &str,
    ) -> Result<(), StoreError>;

    fn delete_node(&mut self, kind: NodeKind, id: &NodeId) -> Result<(), StoreError>;

    /// Creates a node of the given kind in the scope. The caller follows up
    /// with a full reload; creation is never an incremental insert.
    fn create_node(
        &mut self,
        scope: ScopeId,
        kind: NodeKind,
        label: &str,
    ) -> Result<NodeId, StoreError>;
}

// ------------------------------------------------------------------
// In-memory backend
// ------------------------------------------------------------------

/// `GraphStore` backed by plain maps. Stands in for a real database in the
/// demo binary and in tests.
#[derive(Default)]
pub struct MemoryStore {
    graphs: HashMap<ScopeId, GraphData>,
    colors: HashMap<ScopeId, HashMap<String, String>>,
    next_id: u64,
    /// When set, every call fails with `Backend`; used to exercise the
    /// failure paths in tests.
    pub fail: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_graph(scope: ScopeId, data: GraphData) -> Self {
        let mut store = Self::default();
        store.graphs.insert(scope, data);
        store
    }

    pub fn set_colors(&mut self, scope: ScopeId, colors: HashMap<String, String>) {
        self.colors.insert(scope, colors);
    }

    pub fn graph(&self, scope: ScopeId) -> Option<&GraphData> {
        self.graphs.get(&scope)
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail {
            Err(StoreError::Backend("memory store offline".into()))
        } else {
            Ok(())
        }
    }

    fn find_node_mut<'a>(
        data: &'a mut GraphData,
        id: &NodeId,
    ) -> Result<&'a mut NodeRecord, StoreError> {
        data.nodes
            .iter_mut()
            .find(|n| &n.id == id)
            .ok_or_else(|| StoreError::UnknownNode(id.clone()))
    }
}

impl GraphStore for MemoryStore {
    fn load_graph(&mut self, scope: ScopeId) -> Result<GraphData, StoreError> {
        self.check()?;
        Ok(self.graphs.get(&scope).cloned().unwrap_or_default())
    }

    fn color_settings(&mut self, scope: ScopeId) -> Result<HashMap<String, String>, StoreError> {
        self.check()?;
        Ok(self.colors.get(&scope).cloned().unwrap_or_default())
    }

    fn rename_node(
        &mut self,
        kind: NodeKind,
        id: &NodeId,
        new_label: &str,
    ) -> Result<(), StoreError> {
        self.check()?;
        for data in self.graphs.values_mut() {
            if !data.nodes.iter().any(|n| &n.id == id) {
                continue;
            }
            let taken = data
                .nodes
                .iter()
                .any(|n| n.kind == kind && &n.id != id && n.label == new_label);
            if taken {
                return Err(StoreError::DuplicateName(new_label.to_string()));
            }
            Self::find_node_mut(data, id)?.label = new_label.to_string();
            return Ok(());
        }
        Err(StoreError::UnknownNode(id.clone()))
    }

    fn delete_node(&mut self, _kind: NodeKind, id: &NodeId) -> Result<(), StoreError> {
        self.check()?;
        for data in self.graphs.values_mut() {
            if !data.nodes.iter().any(|n| &n.id == id) {
                continue;
            }
            data.nodes.retain(|n| &n.id != id);
            data.edges.retain(|e| &e.from_id != id && &e.to_id != id);
            return Ok(());
        }
        Err(StoreError::UnknownNode(id.clone()))
    }

    fn create_node(
        &mut self,
        scope: ScopeId,
        kind: NodeKind,
        label: &str,
    ) -> Result<NodeId, StoreError> {
        self.check()?;
        let data = self.graphs.entry(scope).or_default();
        if data.nodes.iter().any(|n| n.kind == kind && n.label == label) {
            return Err(StoreError::DuplicateName(label.to_string()));
        }
        // Skip over ids already used by seeded data.
        let id = loop {
            self.next_id += 1;
            let candidate = NodeId::new(format!("{}_{}", kind_prefix(kind), self.next_id));
            if !data.nodes.iter().any(|n| n.id == candidate) {
                break candidate;
            }
        };
        data.nodes.push(NodeRecord {
            id: id.clone(),
            kind,
            label: label.to_string(),
            payload: Payload::new(),
        });
        Ok(id)
    }
}

fn kind_prefix(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Reading => "r",
        NodeKind::Tag => "t",
        NodeKind::LinkedItem => "item",
    }
}
