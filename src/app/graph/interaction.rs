use eframe::egui::{self, Pos2, Rect, Ui, Vec2};

use super::super::render_utils::{circle_visible, screen_to_world};
use super::super::{DragState, RenderGraph, ViewModel};

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.05, 6.0);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    pub(in crate::app) fn hovered_index(
        ui: &Ui,
        visible_mask: &[bool],
        screen_positions: &[Pos2],
        screen_radii: &[f32],
    ) -> Option<(usize, f32)> {
        let pointer_pos = ui.input(|input| input.pointer.hover_pos());
        pointer_pos.and_then(|pointer| {
            (0..screen_positions.len())
                .filter(|&index| visible_mask.get(index).copied().unwrap_or(false))
                .filter_map(|index| {
                    let distance = screen_positions[index].distance(pointer);
                    if distance <= screen_radii[index] {
                        Some((index, distance))
                    } else {
                        None
                    }
                })
                .min_by(|a, b| a.1.total_cmp(&b.1))
        })
    }

    pub(in crate::app) fn visible_mask_into(
        rect: Rect,
        screen_positions: &[Pos2],
        screen_radii: &[f32],
        mask: &mut Vec<bool>,
    ) {
        mask.clear();
        mask.extend(
            (0..screen_positions.len())
                .map(|index| circle_visible(rect, screen_positions[index], screen_radii[index])),
        );
    }

    /// Selecting (or deselecting) a focal node changes every relative depth,
    /// so the render graph is rebuilt and the layout reheated.
    pub(in crate::app) fn set_selected(&mut self, selected: Option<String>) {
        if self.selected == selected {
            return;
        }
        self.selected = selected;
        self.content_preview = None;
        self.graph_dirty = true;
    }
}

/// Primary-button node dragging. The dragged node is pinned to the pointer
/// (in world space) for the duration and the simulation is held live at the
/// drag energy floor. Returns true while a drag is in progress.
pub(in crate::app) fn handle_node_drag(
    drag: &mut Option<DragState>,
    cache: &mut RenderGraph,
    response: &egui::Response,
    rect: Rect,
    pan: Vec2,
    zoom: f32,
    hovered: Option<usize>,
) -> bool {
    if response.drag_started_by(egui::PointerButton::Primary)
        && drag.is_none()
        && let Some(index) = hovered
    {
        *drag = Some(DragState { index });
        cache.begin_drag();
    }

    let Some(active) = drag.as_ref() else {
        return false;
    };

    if active.index >= cache.nodes.len() {
        *drag = None;
        cache.end_drag();
        return false;
    }

    if response.drag_stopped_by(egui::PointerButton::Primary) {
        cache.nodes[active.index].pinned = None;
        *drag = None;
        cache.end_drag();
        return false;
    }

    if let Some(pointer) = response.interact_pointer_pos() {
        cache.nodes[active.index].pinned = Some(screen_to_world(rect, pan, zoom, pointer));
    }
    true
}
