// Deferred effects that must run outside the main reducer: every call
// into the storage backend goes through here, storage-first, and only a
// confirmed write touches the in-memory graph.

use crate::graph_state::{NodeId, NodeKind};
use crate::store::Store;

#[derive(Debug, Clone)]
pub enum Effect {
    /// Rebuild the graph from the backend (stop, clear, load, reseed, start)
    ReloadGraph,
    /// Persist a rename, then update the local label
    RenameNode {
        kind: NodeKind,
        id: NodeId,
        new_label: String,
    },
    /// Persist a delete, then drop the local node
    DeleteNode { kind: NodeKind, id: NodeId },
    /// Create a node in the backend, then reload the whole graph
    CreateNode { kind: NodeKind, label: String },
}

/// Execute a single effect against the store
pub fn run(store: &mut Store, effect: Effect) {
    match effect {
        Effect::ReloadGraph => store.reload(),

        Effect::RenameNode {
            kind,
            id,
            new_label,
        } => match store.backend.rename_node(kind, &id, &new_label) {
            Ok(()) => {
                if let Some(node) = store.graph.node_mut(&id) {
                    node.set_label(&new_label);
                }
                store.graph.refresh_edge_lines();
            }
            Err(e) => store.surface_error(&e),
        },

        Effect::DeleteNode { kind, id } => match store.backend.delete_node(kind, &id) {
            Ok(()) => {
                store.graph.remove_node(&id);
                store.selection.remove(&id);
                if store.dragged.as_ref() == Some(&id) {
                    store.dragged = None;
                }
                store.graph.refresh_scales();
                store.graph.compute_highlight(&store.selection);
            }
            Err(e) => store.surface_error(&e),
        },

        Effect::CreateNode { kind, label } => {
            match store.backend.create_node(store.scope, kind, &label) {
                Ok(id) => {
                    log::info!("created {} node {id}", kind.storage_key());
                    store.reload();
                }
                Err(e) => store.surface_error(&e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_state::Payload;
    use crate::storage::{EdgeRecord, GraphData, MemoryStore, NodeRecord, ScopeId};

    fn record(id: &str, kind: NodeKind, label: &str) -> NodeRecord {
        NodeRecord {
            id: NodeId::new(id),
            kind,
            label: label.to_string(),
            payload: Payload::new(),
        }
    }

    fn loaded_store() -> Store {
        let data = GraphData {
            nodes: vec![
                record("r_1", NodeKind::Reading, "The Craft of Research"),
                record("t_1", NodeKind::Tag, "sources"),
                record("t_2", NodeKind::Tag, "argument"),
            ],
            edges: vec![EdgeRecord {
                from_id: NodeId::new("r_1"),
                to_id: NodeId::new("t_1"),
            }],
        };
        let mut store = Store::new(
            ScopeId(1),
            Box::new(MemoryStore::with_graph(ScopeId(1), data)),
        );
        store.reload();
        store
    }

    #[test]
    fn confirmed_rename_updates_the_label() {
        let mut store = loaded_store();
        run(
            &mut store,
            Effect::RenameNode {
                kind: NodeKind::Tag,
                id: NodeId::new("t_1"),
                new_label: "evidence".into(),
            },
        );
        assert_eq!(store.graph.node(&NodeId::new("t_1")).unwrap().label, "evidence");
        assert!(store.warning_message.is_none());
    }

    #[test]
    fn rename_collision_keeps_the_label_and_warns() {
        let mut store = loaded_store();
        run(
            &mut store,
            Effect::RenameNode {
                kind: NodeKind::Tag,
                id: NodeId::new("t_1"),
                new_label: "argument".into(),
            },
        );
        assert_eq!(store.graph.node(&NodeId::new("t_1")).unwrap().label, "sources");
        assert!(store.warning_message.is_some());
        assert!(store.error_message.is_none());
    }

    #[test]
    fn delete_goes_through_the_backend_before_local_removal() {
        let mut store = loaded_store();
        store.selection.insert(NodeId::new("t_1"));
        run(
            &mut store,
            Effect::DeleteNode {
                kind: NodeKind::Tag,
                id: NodeId::new("t_1"),
            },
        );
        assert!(!store.graph.contains(&NodeId::new("t_1")));
        assert!(store.selection.is_empty());
        assert_eq!(store.graph.edge_count(), 0);
        // Degree of r_1 dropped, so its scale is back to 1.
        assert_eq!(store.graph.node(&NodeId::new("r_1")).unwrap().scale, 1.0);
    }

    #[test]
    fn backend_failure_leaves_the_graph_untouched() {
        let mut store = loaded_store();
        let mut offline = MemoryStore::new();
        offline.fail = true;
        store.backend = Box::new(offline);

        run(
            &mut store,
            Effect::DeleteNode {
                kind: NodeKind::Tag,
                id: NodeId::new("t_1"),
            },
        );
        assert!(store.graph.contains(&NodeId::new("t_1")));
        assert_eq!(store.graph.edge_count(), 1);
        assert!(store.error_message.is_some());
    }

    #[test]
    fn create_reloads_and_shows_the_new_node() {
        let mut store = loaded_store();
        run(
            &mut store,
            Effect::CreateNode {
                kind: NodeKind::Tag,
                label: "method".into(),
            },
        );
        assert!(store.error_message.is_none());
        assert_eq!(store.graph.node_count(), 4);
        assert!(store.graph.nodes().any(|n| n.label == "method"));
        assert!(store.layout.is_running());
    }

    #[test]
    fn create_collision_warns_without_reloading() {
        let mut store = loaded_store();
        // Park a marker position to detect an unwanted reseed.
        store.layout.stop();
        run(
            &mut store,
            Effect::CreateNode {
                kind: NodeKind::Tag,
                label: "sources".into(),
            },
        );
        assert!(store.warning_message.is_some());
        assert_eq!(store.graph.node_count(), 3);
        assert!(!store.layout.is_running());
    }
}
