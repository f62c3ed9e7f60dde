use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align2, FontId, Rect, Sense, Stroke, Ui, Vec2, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::util::{display_name, format_bytes};
use crate::vault::{LinkKind, NodeKind};

use super::super::physics::step_physics;
use super::super::render_utils::{
    self, blend_color, draw_background, edge_visible, mute_color, with_opacity, world_to_screen,
};
use super::super::weighting::node_weights;
use super::super::{RenderGraph, SearchMatchCache, ViewModel};
use super::interaction::handle_node_drag;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl ViewModel {
    fn update_screen_space(rect: Rect, pan: Vec2, zoom: f32, cache: &mut RenderGraph) {
        cache.view_scratch.screen_positions.clear();
        cache.view_scratch.screen_radii.clear();
        for render_node in &cache.nodes {
            cache.view_scratch.screen_positions.push(world_to_screen(
                rect,
                pan,
                zoom,
                render_node.world_pos,
            ));
            cache
                .view_scratch
                .screen_radii
                .push((render_node.weighted_radius * zoom.powf(0.40)).clamp(2.5, 46.0));
        }
    }

    // ascending by size so the big nodes paint on top
    fn ensure_draw_order(cache: &mut RenderGraph) {
        if !cache.view_scratch.draw_order_dirty
            && cache.view_scratch.draw_order.len() == cache.nodes.len()
        {
            return;
        }

        cache.view_scratch.draw_order.clear();
        cache.view_scratch.draw_order.extend(0..cache.nodes.len());
        cache
            .view_scratch
            .draw_order
            .sort_by(|a, b| cache.nodes[*a].size.cmp(&cache.nodes[*b].size));
        cache.view_scratch.draw_order_dirty = false;
    }

    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let search_query = self.search.trim();
        if search_query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.graph_revision == self.render_graph_revision
            && cached.query == search_query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let cache = self.graph_cache.as_ref()?;
        let matcher = SkimMatcherV2::default();
        let matches = cache
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                fuzzy_match_score(&matcher, display_name(&node.name), search_query)
                    .map(|_| index)
            })
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: search_query.to_owned(),
            graph_revision: self.render_graph_revision,
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        if self.graph_dirty {
            self.rebuild_render_graph();
        }

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        let palette = render_utils::palette(self.settings.theme);
        draw_background(&painter, rect, self.pan, self.zoom, &palette);

        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);

        let search_matches = self.cached_search_matches();
        let pan = self.pan;
        let zoom = self.zoom;
        let params = self.settings.simulation;
        let visibility = self.settings.visibility;
        let selected_id = self.selected.clone();

        let drag = &mut self.drag;
        let Some(cache) = self.graph_cache.as_mut() else {
            self.visible_node_count = 0;
            self.visible_edge_count = 0;
            ui.label("The vault is empty.");
            return;
        };

        let mut physics_moving = false;
        if cache.is_running() {
            physics_moving = step_physics(cache, params);
        }

        Self::update_screen_space(rect, pan, zoom, cache);
        {
            let scratch = &mut cache.view_scratch;
            Self::visible_mask_into(
                rect,
                &scratch.screen_positions,
                &scratch.screen_radii,
                &mut scratch.visible_mask,
            );
        }
        self.visible_node_count = cache
            .view_scratch
            .visible_mask
            .iter()
            .filter(|visible| **visible)
            .count();

        let hovered = Self::hovered_index(
            ui,
            &cache.view_scratch.visible_mask,
            &cache.view_scratch.screen_positions,
            &cache.view_scratch.screen_radii,
        );
        let hovered_index = hovered.map(|(index, _)| index);

        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        let dragging = handle_node_drag(drag, cache, &response, rect, pan, zoom, hovered_index);
        if physics_moving || dragging {
            ui.ctx().request_repaint();
        }

        let pending_selection = if response.clicked_by(egui::PointerButton::Primary) {
            Some(hovered_index.and_then(|index| cache.nodes.get(index).map(|node| node.id.clone())))
        } else {
            None
        };

        let selected_index = selected_id
            .as_deref()
            .and_then(|id| cache.index_by_id.get(id).copied());
        let label_size = visibility.label_size;

        let node_opacity = |cache: &RenderGraph, index: usize| {
            let node = &cache.nodes[index];
            let is_focal = selected_index == Some(index);
            node_weights(node.relative_depth, label_size, is_focal).opacity
        };

        let zoom_sqrt = zoom.sqrt();
        let mut visible_edge_count = 0usize;
        for edge_position in 0..cache.edges.len() {
            let edge = cache.edges[edge_position];
            let (src, dst) = (edge.source, edge.target);
            if src >= cache.nodes.len() || dst >= cache.nodes.len() {
                continue;
            }

            let start = cache.view_scratch.screen_positions[src];
            let end = cache.view_scratch.screen_positions[dst];
            let src_visible = cache.view_scratch.visible_mask[src];
            let dst_visible = cache.view_scratch.visible_mask[dst];
            if !src_visible && !dst_visible && !edge_visible(rect, start, end, 2.5) {
                continue;
            }

            let is_backlink = visibility.show_backlinks
                && edge.kind == LinkKind::Reference
                && selected_index == Some(dst);

            let (width, base_color) = if is_backlink {
                ((1.8 * zoom_sqrt).clamp(1.0, 3.6), palette.backlink)
            } else {
                match edge.kind {
                    LinkKind::ParentChild => {
                        ((1.0 * zoom_sqrt).clamp(0.5, 2.6), palette.parent_link)
                    }
                    LinkKind::Reference => {
                        ((1.2 * zoom_sqrt).clamp(0.6, 3.0), palette.reference_link)
                    }
                }
            };

            // edges fade with their dimmest endpoint
            let opacity =
                node_opacity(cache, src).min(node_opacity(cache, dst)) * 0.85;
            painter.line_segment([start, end], Stroke::new(width, with_opacity(base_color, opacity)));
            visible_edge_count += 1;
        }
        self.visible_edge_count = visible_edge_count;

        let search_active = search_matches
            .as_ref()
            .is_some_and(|matches| !matches.is_empty());

        Self::ensure_draw_order(cache);
        if visibility.show_nodes {
            for position_in_order in 0..cache.view_scratch.draw_order.len() {
                let index = cache.view_scratch.draw_order[position_in_order];
                if !cache.view_scratch.visible_mask.get(index).copied().unwrap_or(false) {
                    continue;
                }

                let render_node = &cache.nodes[index];
                let position = cache.view_scratch.screen_positions[index];
                let radius = cache.view_scratch.screen_radii[index];

                let is_selected = selected_index == Some(index);
                let is_hovered = hovered_index == Some(index);
                let is_search_match = search_matches
                    .as_ref()
                    .is_some_and(|matches| matches.contains(&index));

                let weights = node_weights(render_node.relative_depth, label_size, is_selected);

                let base_color = match render_node.kind {
                    NodeKind::Folder => palette.folder,
                    NodeKind::File => render_utils::file_color(&render_node.name),
                };
                let mut color =
                    mute_color(base_color, weights.lightness_shift, weights.saturation_shift);
                if is_search_match {
                    color = blend_color(color, palette.reference_link, 0.55);
                } else if search_active && !is_selected {
                    color = with_opacity(color, 0.45);
                }

                painter.circle_filled(position, radius, with_opacity(color, weights.opacity));
                painter.circle_stroke(
                    position,
                    radius,
                    Stroke::new(1.0, with_opacity(palette.node_stroke, weights.opacity * 0.8)),
                );

                if is_selected {
                    painter.circle_stroke(
                        position,
                        radius + 3.0,
                        Stroke::new(2.0, palette.selected_stroke),
                    );
                } else if is_hovered {
                    painter.circle_stroke(
                        position,
                        radius + 2.0,
                        Stroke::new(1.5, with_opacity(palette.selected_stroke, 0.7)),
                    );
                }

                if visibility.show_labels {
                    let should_draw_label = is_selected
                        || is_hovered
                        || is_search_match
                        || radius > 14.0
                        || zoom > 1.2;
                    if should_draw_label {
                        painter.text(
                            position + vec2(radius + 4.0, 0.0),
                            Align2::LEFT_CENTER,
                            display_name(&render_node.name),
                            FontId::proportional((weights.label_size * zoom_sqrt).clamp(8.0, 22.0)),
                            with_opacity(palette.text, weights.label_opacity),
                        );
                    }
                }
            }
        }

        if let Some(index) = hovered_index {
            let render_node = &cache.nodes[index];
            let depth_text = if selected_id.is_some() {
                format!("depth \u{0394}{}", render_node.relative_depth)
            } else {
                format!("depth {}", render_node.depth)
            };
            let kind_text = match render_node.kind {
                NodeKind::Folder => "folder",
                NodeKind::File => "file",
            };
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!(
                    "{}  |  {}  |  {}  |  {}  |  {} links",
                    display_name(&render_node.name),
                    kind_text,
                    depth_text,
                    format_bytes(render_node.size),
                    render_node.degree,
                ),
                FontId::proportional(13.0),
                palette.text,
            );
        }

        if let Some(selection) = pending_selection {
            self.set_selected(selection);
        }
    }
}
