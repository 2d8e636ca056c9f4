use crate::actions::{self, Action};
use crate::effects::{self, Effect};
use crate::store::Store;

/// Queued dispatch around the store: actions collected during a frame run
/// in order at the start of the next pass, and the effects they produce
/// run after the whole reducer pass.
pub struct State {
    pub store: Store,
    action_queue: Vec<Action>,
    effect_queue: Vec<Effect>,
}

impl State {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            action_queue: Vec::new(),
            effect_queue: Vec::new(),
        }
    }

    pub fn dispatch(&mut self, action: Action) {
        self.action_queue.push(action);
    }

    pub fn flush_actions(&mut self) {
        let actions = std::mem::take(&mut self.action_queue);
        for action in actions {
            let mut effects = actions::update(&mut self.store, action);
            self.effect_queue.append(&mut effects);
        }
    }

    pub fn flush_effects(&mut self) {
        let effects = std::mem::take(&mut self.effect_queue);
        for effect in effects {
            effects::run(&mut self.store, effect);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_state::NodeKind;
    use crate::storage::{GraphStore, MemoryStore, ScopeId};

    #[test]
    fn dispatched_actions_run_in_order_and_effects_after() {
        let store = Store::new(ScopeId(1), Box::new(MemoryStore::new()));
        let mut state = State::new(store);

        state.dispatch(Action::CreateNode {
            kind: NodeKind::Tag,
            label: "first".into(),
        });
        state.dispatch(Action::ClearMessages);

        // Nothing happens until the flush.
        assert!(state.store.graph.is_empty());

        state.flush_actions();
        assert!(state.store.graph.is_empty(), "creation is deferred");
        state.flush_effects();
        assert_eq!(state.store.graph.node_count(), 1);
        assert!(state.store.graph.nodes().any(|n| n.label == "first"));
    }

    #[test]
    fn reducer_state_is_visible_to_later_actions_in_the_same_flush() {
        let mut backend = MemoryStore::new();
        backend.create_node(ScopeId(1), NodeKind::Tag, "t").unwrap();
        let mut store = Store::new(ScopeId(1), Box::new(backend));
        store.reload();
        let id = store.graph.nodes().next().unwrap().id.clone();

        let mut state = State::new(store);
        state.dispatch(Action::ToggleSelect { id: id.clone() });
        state.dispatch(Action::ToggleSelect { id: id.clone() });
        state.flush_actions();

        // Toggled on then off again within one flush.
        assert!(!state.store.selection.contains(&id));
    }
}
