// Interactive knowledge-graph visualizer for a reading/annotation manager:
// a force-directed view of readings, synthesis tags and their linked
// annotation items, embeddable in a host shell through `GraphStore` (data
// in) and `ShellEvent` (navigation out).

mod actions;
mod app;
mod colors;
mod effects;
mod geometry;
mod graph_canvas;
mod graph_state;
mod layout_force;
mod seeder;
mod state;
mod storage;
mod store;

pub mod native;

pub use actions::Action;
pub use app::GraphApp;
pub use colors::ColorTheme;
pub use graph_canvas::{GraphCanvas, ViewTransform};
pub use graph_state::{
    Emphasis, GraphEdge, GraphNode, KnowledgeGraph, NodeId, NodeKind, Payload,
};
pub use layout_force::{ForceLayout, PinPolicy, SimulationConfig};
pub use state::State;
pub use storage::{EdgeRecord, GraphData, GraphStore, MemoryStore, NodeRecord, ScopeId, StoreError};
pub use store::{ShellEvent, Store};

use serde_json::json;

/// Builds the demo application: the visualizer wired to an in-memory
/// backend seeded with a small reading list.
pub fn create_app(_cc: &eframe::CreationContext<'_>) -> GraphApp {
    let scope = ScopeId(1);
    let mut backend = MemoryStore::with_graph(scope, demo_graph());
    backend.set_colors(
        scope,
        [
            ("reading".to_string(), "#cce0f5".to_string()),
            ("tag".to_string(), "#cce8cc".to_string()),
        ]
        .into(),
    );
    GraphApp::new(scope, Box::new(backend))
}

fn demo_graph() -> GraphData {
    fn node(id: &str, kind: NodeKind, label: &str, payload: Payload) -> NodeRecord {
        NodeRecord {
            id: NodeId::new(id),
            kind,
            label: label.to_string(),
            payload,
        }
    }
    fn edge(from: &str, to: &str) -> EdgeRecord {
        EdgeRecord {
            from_id: NodeId::new(from),
            to_id: NodeId::new(to),
        }
    }
    fn payload(entries: &[(&str, serde_json::Value)]) -> Payload {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    GraphData {
        nodes: vec![
            node(
                "r_1",
                NodeKind::Reading,
                "Seeing Like a State",
                payload(&[("author", json!("James C. Scott")), ("reading_id", json!(1))]),
            ),
            node(
                "r_2",
                NodeKind::Reading,
                "The Death and Life of Great American Cities",
                payload(&[("author", json!("Jane Jacobs")), ("reading_id", json!(2))]),
            ),
            node(
                "r_3",
                NodeKind::Reading,
                "Thinking in Systems",
                payload(&[("author", json!("Donella Meadows")), ("reading_id", json!(3))]),
            ),
            node("t_1", NodeKind::Tag, "legibility", payload(&[("tag_id", json!(1))])),
            node("t_2", NodeKind::Tag, "emergence", payload(&[("tag_id", json!(2))])),
            node("t_3", NodeKind::Tag, "planning", payload(&[("tag_id", json!(3))])),
            node(
                "item_1",
                NodeKind::LinkedItem,
                "high modernism",
                payload(&[
                    ("item_type", json!("term")),
                    ("summary_text", json!("aesthetic confidence in scientific progress")),
                ]),
            ),
            node(
                "item_2",
                NodeKind::LinkedItem,
                "sidewalk ballet",
                payload(&[
                    ("item_type", json!("term")),
                    ("summary_text", json!("order emerging from unplanned street life")),
                ]),
            ),
        ],
        edges: vec![
            edge("r_1", "t_1"),
            edge("r_1", "t_3"),
            edge("r_2", "t_2"),
            edge("r_2", "t_3"),
            edge("r_3", "t_2"),
            edge("item_1", "r_1"),
            edge("item_2", "r_2"),
        ],
    }
}
