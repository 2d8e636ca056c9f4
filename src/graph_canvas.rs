// Interactive canvas: hit-testing, selection, drag vs pan, zoom about the
// cursor, context menus, inline rename and the paint pass. All pointer
// input is translated into `Action`s; the canvas itself owns only view
// state (transform, gesture, open editors).

use eframe::egui::{
    self, Align2, Color32, FontId, Pos2, Rect, Sense, Shape, Stroke, StrokeKind, Ui, Vec2,
};

use crate::actions::Action;
use crate::colors;
use crate::geometry::{self, Outline};
use crate::graph_state::{Emphasis, GraphNode, NodeId, NodeKind};
use crate::state::State;

const ZOOM_MIN: f32 = 0.1;
const ZOOM_MAX: f32 = 10.0;
/// World-space distance within which a click counts as hitting an edge.
const EDGE_HIT_SLOP: f32 = 6.0;

fn label_font() -> FontId {
    FontId::proportional(12.0)
}

// ------------------------------------------------------------------
// View transform
// ------------------------------------------------------------------

/// Pan/zoom between world coordinates (simulation space, origin at the
/// viewport center when untransformed) and screen coordinates.
#[derive(Clone, Copy, Debug)]
pub struct ViewTransform {
    pub offset: Vec2,
    pub zoom: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn to_screen(&self, center: Pos2, world: Pos2) -> Pos2 {
        center + self.offset + world.to_vec2() * self.zoom
    }

    pub fn to_world(&self, center: Pos2, screen: Pos2) -> Pos2 {
        ((screen - center - self.offset) / self.zoom).to_pos2()
    }

    /// Applies a zoom factor while keeping the world point under `anchor`
    /// fixed on screen.
    pub fn zoom_about(&mut self, center: Pos2, anchor: Pos2, factor: f32) {
        let world = self.to_world(center, anchor);
        self.zoom = (self.zoom * factor).clamp(ZOOM_MIN, ZOOM_MAX);
        self.offset = anchor - center - world.to_vec2() * self.zoom;
    }
}

// ------------------------------------------------------------------
// Canvas
// ------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq)]
enum Gesture {
    #[default]
    None,
    DragNode(NodeId),
    Pan,
}

#[derive(Clone, Debug)]
enum ContextTarget {
    Canvas,
    Node(NodeId),
    Edge(NodeId, NodeId),
}

struct RenameEdit {
    id: NodeId,
    buffer: String,
    request_focus: bool,
}

#[derive(Default)]
pub struct GraphCanvas {
    pub view: ViewTransform,
    gesture: Gesture,
    context_target: Option<ContextTarget>,
    rename: Option<RenameEdit>,
    new_tag_buffer: String,
}

impl GraphCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, ui: &mut Ui, state: &mut State) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let center = response.rect.center();

        self.measure_labels(&painter, state);

        // Zoom about the cursor; the hovered world point stays fixed.
        let zoom_delta = ui.input(|i| i.zoom_delta());
        if response.hovered() && (zoom_delta - 1.0).abs() > f32::EPSILON {
            if let Some(pointer) = response.hover_pos() {
                self.view.zoom_about(center, pointer, zoom_delta);
            }
        }

        let hovered = response
            .hover_pos()
            .and_then(|p| self.node_at(state, center, p));

        // A drag gesture is exclusively a node drag or a pan, decided by
        // what the press landed on.
        if response.drag_started() {
            if let Some(pointer) = response.interact_pointer_pos() {
                match self.node_at(state, center, pointer) {
                    Some(id) => {
                        state.dispatch(Action::BeginDrag { id: id.clone() });
                        self.gesture = Gesture::DragNode(id);
                    }
                    None => self.gesture = Gesture::Pan,
                }
            }
        }
        if response.dragged() {
            match &self.gesture {
                Gesture::DragNode(id) => {
                    if let Some(pointer) = response.interact_pointer_pos() {
                        state.dispatch(Action::DragTo {
                            id: id.clone(),
                            pos: self.view.to_world(center, pointer),
                        });
                    }
                }
                Gesture::Pan => self.view.offset += response.drag_delta(),
                Gesture::None => {}
            }
        }
        if response.drag_stopped() {
            if matches!(self.gesture, Gesture::DragNode(_)) {
                state.dispatch(Action::EndDrag);
            }
            self.gesture = Gesture::None;
        }

        if response.clicked() && !response.double_clicked() {
            match &hovered {
                Some(id) => state.dispatch(Action::ToggleSelect { id: id.clone() }),
                None => state.dispatch(Action::ClearSelection),
            }
        }
        if response.double_clicked() {
            if let Some(id) = &hovered {
                state.dispatch(Action::Navigate { id: id.clone() });
            }
        }

        if response.secondary_clicked() {
            if let Some(pointer) = response.interact_pointer_pos() {
                self.context_target = Some(match self.node_at(state, center, pointer) {
                    Some(id) => ContextTarget::Node(id),
                    None => match self.edge_at(state, center, pointer) {
                        Some((a, b)) => ContextTarget::Edge(a, b),
                        None => ContextTarget::Canvas,
                    },
                });
                self.new_tag_buffer.clear();
            }
        }
        let target = self.context_target.clone();
        response.context_menu(|ui| {
            self.context_menu_ui(ui, state, target.as_ref());
        });

        self.paint(&painter, center, state);

        if let Some(id) = &hovered {
            if self.gesture == Gesture::None && self.rename.is_none() {
                let connections = state.store.graph.degree(id);
                if let Some(node) = state.store.graph.node(id) {
                    let text = node.tooltip_text(connections);
                    response.clone().on_hover_ui_at_pointer(|ui| {
                        ui.label(text);
                    });
                }
            }
        }

        self.rename_editor_ui(ui, center, state);
    }

    /// Feeds measured label galleys back into the nodes; rectangular
    /// outlines size themselves from this.
    fn measure_labels(&self, painter: &egui::Painter, state: &mut State) {
        let sizes: Vec<(NodeId, Vec2)> = state
            .store
            .graph
            .nodes()
            .map(|n| {
                let galley =
                    painter.layout_no_wrap(n.label.clone(), label_font(), Color32::PLACEHOLDER);
                (n.id.clone(), galley.size())
            })
            .collect();
        for (id, size) in sizes {
            if let Some(node) = state.store.graph.node_mut(&id) {
                node.label_size = size;
            }
        }
    }

    // --------------------------------------------------------------
    // Hit-testing
    // --------------------------------------------------------------

    /// Topmost node under the screen point, respecting paint order:
    /// highlighted nodes win over dimmed ones.
    fn node_at(&self, state: &State, center: Pos2, screen: Pos2) -> Option<NodeId> {
        let world = self.view.to_world(center, screen);
        let mut best: Option<(u8, NodeId)> = None;
        for node in state.store.graph.nodes() {
            let inside = match geometry::outline(node) {
                Outline::Circle { center, radius } => (world - center).length_sq() <= radius * radius,
                Outline::Rect(rect) => rect.contains(world),
            };
            if !inside {
                continue;
            }
            let rank = node.emphasis.paint_rank();
            if best.as_ref().map(|(r, _)| rank >= *r).unwrap_or(true) {
                best = Some((rank, node.id.clone()));
            }
        }
        best.map(|(_, id)| id)
    }

    fn edge_at(&self, state: &State, center: Pos2, screen: Pos2) -> Option<(NodeId, NodeId)> {
        let world = self.view.to_world(center, screen);
        let slop = EDGE_HIT_SLOP / self.view.zoom.max(ZOOM_MIN);
        for (from, to, edge) in state.store.graph.edges() {
            let Some((a, b)) = edge.line else { continue };
            if dist_to_segment(world, a, b) <= slop {
                return Some((from.id.clone(), to.id.clone()));
            }
        }
        None
    }

    // --------------------------------------------------------------
    // Context menu and rename editor
    // --------------------------------------------------------------

    fn context_menu_ui(&mut self, ui: &mut Ui, state: &mut State, target: Option<&ContextTarget>) {
        match target {
            Some(ContextTarget::Node(id)) => {
                let Some((kind, label)) = state
                    .store
                    .graph
                    .node(id)
                    .map(|n| (n.kind, n.label.clone()))
                else {
                    ui.close();
                    return;
                };
                if ui.button("Open").clicked() {
                    state.dispatch(Action::Navigate { id: id.clone() });
                    ui.close();
                }
                if kind.renamable() && ui.button("Rename").clicked() {
                    self.rename = Some(RenameEdit {
                        id: id.clone(),
                        buffer: label,
                        request_focus: true,
                    });
                    ui.close();
                }
                if ui.button("Delete").clicked() {
                    state.dispatch(Action::Delete { id: id.clone() });
                    ui.close();
                }
            }
            Some(ContextTarget::Edge(from, to)) => {
                let has_tag = [from, to]
                    .into_iter()
                    .filter_map(|id| state.store.graph.node(id))
                    .any(|n| n.kind == NodeKind::Tag);
                if has_tag && ui.button("View anchors").clicked() {
                    state.dispatch(Action::InspectEdge {
                        from: from.clone(),
                        to: to.clone(),
                    });
                    ui.close();
                }
            }
            Some(ContextTarget::Canvas) | None => {
                ui.label("New tag:");
                let edit = ui.text_edit_singleline(&mut self.new_tag_buffer);
                let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if (ui.button("Add").clicked() || submitted) && !self.new_tag_buffer.trim().is_empty()
                {
                    state.dispatch(Action::CreateNode {
                        kind: NodeKind::Tag,
                        label: self.new_tag_buffer.trim().to_string(),
                    });
                    self.new_tag_buffer.clear();
                    ui.close();
                }
            }
        }
    }

    fn rename_editor_ui(&mut self, ui: &mut Ui, center: Pos2, state: &mut State) {
        let Some(edit) = &mut self.rename else { return };

        let Some(node) = state.store.graph.node(&edit.id) else {
            // Node vanished under the editor (deleted or reloaded).
            self.rename = None;
            return;
        };
        let anchor = self.view.to_screen(center, node.pos);
        let width = (node.label_size.x + 40.0).max(120.0);
        let rect = Rect::from_center_size(anchor, Vec2::new(width, 22.0));

        let resp = ui.put(rect, egui::TextEdit::singleline(&mut edit.buffer));
        if edit.request_focus {
            resp.request_focus();
            edit.request_focus = false;
        }

        if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.rename = None;
            return;
        }
        let committed = resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if committed {
            state.dispatch(Action::CommitRename {
                id: edit.id.clone(),
                new_label: edit.buffer.clone(),
            });
            self.rename = None;
        } else if resp.lost_focus() {
            // Clicking elsewhere cancels, matching the escape path.
            self.rename = None;
        }
    }

    // --------------------------------------------------------------
    // Painting
    // --------------------------------------------------------------

    fn paint(&self, painter: &egui::Painter, center: Pos2, state: &State) {
        painter.rect_filled(painter.clip_rect(), 0.0, colors::BACKGROUND);

        // Edges first, then nodes; within each pass dimmed items go under
        // normal ones and highlighted ones on top.
        let mut edges: Vec<(&GraphNode, &GraphNode, Emphasis, (Pos2, Pos2))> = state
            .store
            .graph
            .edges()
            .filter_map(|(from, to, e)| Some((from, to, e.emphasis, e.line?)))
            .collect();
        edges.sort_by_key(|(_, _, emphasis, _)| emphasis.paint_rank());
        for (from, to, emphasis, (a, b)) in edges {
            self.paint_edge(painter, center, from, to, emphasis, a, b);
        }

        let mut nodes: Vec<&GraphNode> = state.store.graph.nodes().collect();
        nodes.sort_by_key(|n| n.emphasis.paint_rank());
        for node in nodes {
            let selected = state.store.selection.contains(&node.id);
            self.paint_node(painter, center, state, node, selected);
        }
    }

    fn paint_edge(
        &self,
        painter: &egui::Painter,
        center: Pos2,
        from: &GraphNode,
        to: &GraphNode,
        emphasis: Emphasis,
        a: Pos2,
        b: Pos2,
    ) {
        let opacity = emphasis.opacity();
        let (color, width) = match emphasis {
            Emphasis::Highlighted => (colors::EDGE_HIGHLIGHT, 2.5),
            Emphasis::Normal => (colors::EDGE_COLOR, 2.0),
            Emphasis::Dimmed => (colors::EDGE_COLOR, 1.5),
        };
        let stroke = Stroke::new(
            width * self.view.zoom,
            color.gamma_multiply(opacity),
        );
        let points = [
            self.view.to_screen(center, a),
            self.view.to_screen(center, b),
        ];

        // Item attachments are drawn dotted to read as annotations rather
        // than structure.
        let dotted = from.kind.is_minor() || to.kind.is_minor();
        if dotted {
            let dash = 4.0 * self.view.zoom;
            painter.extend(Shape::dashed_line(&points, stroke, dash, dash));
        } else {
            painter.line_segment(points, stroke);
        }
    }

    fn paint_node(
        &self,
        painter: &egui::Painter,
        center: Pos2,
        state: &State,
        node: &GraphNode,
        selected: bool,
    ) {
        let opacity = node.emphasis.opacity();
        let theme = &state.store.colors;
        let fill = theme.fill(node.color_key()).gamma_multiply(opacity);
        let border = if selected {
            colors::SELECTION_STROKE
        } else {
            theme.border(node.color_key()).gamma_multiply(opacity)
        };
        let border_width = if selected { 3.0 } else { 1.5 };
        let zoom = self.view.zoom;

        match geometry::outline(node) {
            Outline::Circle {
                center: world_center,
                radius,
            } => {
                let screen_center = self.view.to_screen(center, world_center);
                painter.circle(
                    screen_center,
                    radius * zoom,
                    fill,
                    Stroke::new(border_width * zoom, border),
                );
                // Label below the circle.
                painter.text(
                    screen_center + Vec2::new(0.0, (radius + 4.0) * zoom),
                    Align2::CENTER_TOP,
                    &node.label,
                    label_font(),
                    colors::LABEL_COLOR.gamma_multiply(opacity),
                );
            }
            Outline::Rect(rect) => {
                let screen_rect = Rect::from_min_max(
                    self.view.to_screen(center, rect.min),
                    self.view.to_screen(center, rect.max),
                );
                let rounding = 5.0 * zoom;
                painter.rect_filled(screen_rect, rounding, fill);
                painter.rect_stroke(
                    screen_rect,
                    rounding,
                    Stroke::new(border_width * zoom, border),
                    StrokeKind::Middle,
                );
                painter.text(
                    screen_rect.center(),
                    Align2::CENTER_CENTER,
                    &node.label,
                    label_font(),
                    colors::LABEL_COLOR.gamma_multiply(opacity),
                );
            }
        }
    }
}

fn dist_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq <= f32::EPSILON {
        return (p - a).length();
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).length()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_world_round_trip() {
        let mut view = ViewTransform::default();
        view.offset = Vec2::new(30.0, -12.0);
        view.zoom = 2.5;
        let center = Pos2::new(400.0, 300.0);

        let world = Pos2::new(-75.0, 140.0);
        let back = view.to_world(center, view.to_screen(center, world));
        assert!((back - world).length() < 1e-3);
    }

    #[test]
    fn zoom_about_keeps_the_anchor_point_fixed() {
        let mut view = ViewTransform::default();
        view.offset = Vec2::new(10.0, 20.0);
        let center = Pos2::new(500.0, 400.0);
        let anchor = Pos2::new(620.0, 250.0);
        let world_before = view.to_world(center, anchor);

        view.zoom_about(center, anchor, 1.4);
        let world_after = view.to_world(center, anchor);
        assert!((world_after - world_before).length() < 1e-2);
        assert!((view.zoom - 1.4).abs() < 1e-6);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut view = ViewTransform::default();
        let center = Pos2::ZERO;
        view.zoom_about(center, Pos2::new(10.0, 10.0), 1e-6);
        assert_eq!(view.zoom, ZOOM_MIN);
        view.zoom_about(center, Pos2::new(10.0, 10.0), 1e9);
        assert_eq!(view.zoom, ZOOM_MAX);
    }

    #[test]
    fn point_to_segment_distance() {
        let a = Pos2::new(0.0, 0.0);
        let b = Pos2::new(10.0, 0.0);
        assert!((dist_to_segment(Pos2::new(5.0, 3.0), a, b) - 3.0).abs() < 1e-6);
        assert!((dist_to_segment(Pos2::new(-4.0, 0.0), a, b) - 4.0).abs() < 1e-6);
        // Degenerate segment.
        assert!((dist_to_segment(Pos2::new(3.0, 4.0), a, a) - 5.0).abs() < 1e-6);
    }
}
