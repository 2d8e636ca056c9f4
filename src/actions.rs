// Actions dispatched by the canvas, applied synchronously to the store.
// Anything that must go through the storage backend comes back as an
// `Effect` and runs after the reducer pass.

use eframe::egui::{Pos2, Vec2};

use crate::effects::Effect;
use crate::graph_state::{NodeId, NodeKind};
use crate::store::{ShellEvent, Store};

/// Actions that can be dispatched to modify the visualizer state
#[derive(Debug, Clone)]
pub enum Action {
    /// Rebuild the whole graph from the backend
    Reload,
    /// Toggle a node's membership in the selection
    ToggleSelect { id: NodeId },
    /// Click on empty canvas: drop the whole selection
    ClearSelection,
    /// Pointer drag picked up a node
    BeginDrag { id: NodeId },
    /// Dragged node follows the pointer in world coordinates
    DragTo { id: NodeId, pos: Pos2 },
    /// Pointer released the dragged node
    EndDrag,
    /// Inline rename was committed
    CommitRename { id: NodeId, new_label: String },
    /// Context-menu delete
    Delete { id: NodeId },
    /// Context-menu create on empty canvas
    CreateNode { kind: NodeKind, label: String },
    /// Double-click: hand the node's entity to the shell
    Navigate { id: NodeId },
    /// Context-menu on an edge: show the anchors behind it
    InspectEdge { from: NodeId, to: NodeId },
    /// Dismiss the error/warning banners
    ClearMessages,
}

/// Applies one action to the store, returning the effects to run after
/// the reducer pass.
pub fn update(store: &mut Store, action: Action) -> Vec<Effect> {
    match action {
        Action::Reload => return vec![Effect::ReloadGraph],

        Action::ToggleSelect { id } => {
            if !store.selection.remove(&id) {
                store.selection.insert(id);
            }
            store.graph.compute_highlight(&store.selection);
        }

        Action::ClearSelection => {
            store.selection.clear();
            store.graph.compute_highlight(&store.selection);
        }

        Action::BeginDrag { id } => {
            if store.graph.contains(&id) {
                store.dragged = Some(id);
            }
        }

        Action::DragTo { id, pos } => {
            if let Some(node) = store.graph.node_mut(&id) {
                node.pos = pos;
                node.vel = Vec2::ZERO;
            }
            // Keep edges attached while the layout is idle; when it runs,
            // the next tick refreshes them anyway.
            if !store.layout.is_running() {
                store.graph.refresh_edge_lines();
            }
        }

        Action::EndDrag => {
            if let Some(id) = store.dragged.take() {
                if let Some(node) = store.graph.node_mut(&id) {
                    node.vel = Vec2::ZERO;
                }
            }
        }

        Action::CommitRename { id, new_label } => {
            let new_label = new_label.trim().to_string();
            let unchanged = store
                .graph
                .node(&id)
                .map(|n| n.label == new_label)
                .unwrap_or(true);
            if !new_label.is_empty() && !unchanged {
                if let Some(kind) = store.graph.node(&id).map(|n| n.kind) {
                    return vec![Effect::RenameNode {
                        kind,
                        id,
                        new_label,
                    }];
                }
            }
        }

        Action::Delete { id } => {
            if let Some(kind) = store.graph.node(&id).map(|n| n.kind) {
                return vec![Effect::DeleteNode { kind, id }];
            }
        }

        Action::CreateNode { kind, label } => {
            let label = label.trim().to_string();
            if !label.is_empty() {
                return vec![Effect::CreateNode { kind, label }];
            }
        }

        Action::Navigate { id } => {
            if let Some(node) = store.graph.node(&id) {
                store.shell_events.push(ShellEvent::Navigate {
                    kind: node.kind,
                    payload: node.payload.clone(),
                });
            }
        }

        Action::InspectEdge { from, to } => {
            // Anchors hang off the tag endpoint, whichever side it is on.
            let tag = [&from, &to]
                .into_iter()
                .filter_map(|id| store.graph.node(id))
                .find(|n| n.kind == NodeKind::Tag);
            if let Some(tag) = tag {
                let tag_id = tag
                    .payload
                    .get("tag_id")
                    .and_then(|v| v.as_i64())
                    .unwrap_or_else(|| {
                        log::debug!("tag {} has no tag_id in payload", tag.id);
                        0
                    });
                store.shell_events.push(ShellEvent::ViewAnchors { tag_id });
            }
        }

        Action::ClearMessages => {
            store.error_message = None;
            store.warning_message = None;
        }
    }
    Vec::new()
}
