// eframe application: drives the simulation once per frame, hosts the
// canvas and surfaces error/warning banners.

use std::time::Duration;

use eframe::egui;

use crate::actions::Action;
use crate::graph_canvas::GraphCanvas;
use crate::state::State;
use crate::storage::{GraphStore, ScopeId};
use crate::store::{ShellEvent, Store};

pub struct GraphApp {
    state: State,
    canvas: GraphCanvas,
}

impl GraphApp {
    pub fn new(scope: ScopeId, backend: Box<dyn GraphStore>) -> Self {
        let store = Store::new(scope, backend);
        let mut state = State::new(store);
        state.dispatch(Action::Reload);
        Self {
            state,
            canvas: GraphCanvas::new(),
        }
    }

    fn banners_ui(&mut self, ui: &mut egui::Ui) {
        let mut dismiss = false;
        if let Some(error) = &self.state.store.error_message {
            ui.horizontal(|ui| {
                ui.colored_label(egui::Color32::RED, error);
                dismiss |= ui.small_button("✖").clicked();
            });
        }
        if let Some(warning) = &self.state.store.warning_message {
            ui.horizontal(|ui| {
                ui.colored_label(egui::Color32::from_rgb(0xb8, 0x86, 0x0b), warning);
                dismiss |= ui.small_button("✖").clicked();
            });
        }
        if dismiss {
            self.state.dispatch(Action::ClearMessages);
        }
    }

    /// The demo shell has no reader panes to open, so navigation requests
    /// are only logged.
    fn handle_shell_events(&mut self) {
        for event in self.state.store.drain_shell_events() {
            match event {
                ShellEvent::Navigate { kind, payload } => {
                    log::info!("navigate to {} {:?}", kind.storage_key(), payload);
                }
                ShellEvent::ViewAnchors { tag_id } => {
                    log::info!("view anchors for tag {tag_id}");
                }
            }
        }
    }
}

impl eframe::App for GraphApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Input queued during the previous frame runs first, then the
        // effects it produced, then one simulation tick.
        self.state.flush_actions();
        self.state.flush_effects();
        self.state.store.tick();

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Reload").clicked() {
                    self.state.dispatch(Action::Reload);
                }
                let layout = &self.state.store.layout;
                ui.label(if layout.is_running() {
                    "simulation: running"
                } else {
                    "simulation: idle"
                });
                ui.separator();
                ui.label(format!(
                    "{} nodes, {} edges",
                    self.state.store.graph.node_count(),
                    self.state.store.graph.edge_count()
                ));
            });
            self.banners_ui(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.canvas.show(ui, &mut self.state);
        });

        self.handle_shell_events();

        if self.state.store.layout.is_running() {
            ctx.request_repaint_after(Duration::from_millis(16));
        }
    }
}
