use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};

use crate::settings::NodeScaleMode;
use crate::util::stable_pair;
use crate::vault::{LinkKind, Node, NodeKind};

use super::super::render_utils::{degree_radius, size_radius};
use super::super::weighting::{node_weights, relative_depth};
use super::super::{
    PhysicsScratch, RenderEdge, RenderGraph, RenderNode, ViewModel, ViewScratch,
};

impl ViewModel {
    fn focal_depth(&self) -> Option<usize> {
        self.selected
            .as_ref()
            .and_then(|id| self.graph.nodes.get(id))
            .map(|node| node.depth)
    }

    fn make_render_node(id: String, index: usize, is_root: bool) -> RenderNode {
        let (jx, jy) = stable_pair(&id);
        let mut direction = vec2(jx, jy);
        if direction.length_sq() <= 0.0001 {
            let angle = ((index as f32) * 0.618_034 + 0.11) * std::f32::consts::TAU;
            direction = vec2(angle.cos(), angle.sin());
        } else {
            direction = direction.normalized();
        }

        // the root starts at rest in the center; everything else drifts
        // outward along a stable per-id direction
        let initial_speed = if is_root { 0.0 } else { 1.2 };

        RenderNode {
            id,
            name: String::new(),
            kind: NodeKind::File,
            depth: 0,
            size: 0,
            degree: 0,
            relative_depth: 0,
            base_radius: 0.0,
            weighted_radius: 0.0,
            world_pos: Vec2::ZERO,
            velocity: direction * initial_speed,
            pinned: None,
        }
    }

    /// Project a snapshot node onto its render twin. Everything derived is
    /// refreshed; layout state (position, velocity, pin) is left alone.
    fn refresh_render_node(
        render_node: &mut RenderNode,
        node: &Node,
        degree: usize,
        base_radius: f32,
        focal_depth: Option<usize>,
        is_focal: bool,
        label_size: f32,
    ) {
        let rd = relative_depth(node.depth, focal_depth);
        let weights = node_weights(rd, label_size, is_focal);

        render_node.name = node.name.clone();
        render_node.kind = node.kind;
        render_node.depth = node.depth;
        render_node.size = node.size;
        render_node.degree = degree;
        render_node.relative_depth = rd;
        render_node.base_radius = base_radius;
        render_node.weighted_radius = base_radius * weights.radius_multiplier;
    }

    /// Links mapped to render indices. Hidden kinds are left out entirely,
    /// so they exert no force; duplicates collapse to one spring; self-links
    /// stay in the snapshot but have no place in the layout.
    fn collect_edges(&self, index_by_id: &HashMap<String, usize>) -> Vec<RenderEdge> {
        let mut edges = Vec::new();
        for link in &self.graph.links {
            let visible = match link.kind {
                LinkKind::ParentChild => self.settings.visibility.show_parent_child_links,
                LinkKind::Reference => self.settings.visibility.show_reference_links,
            };
            if !visible {
                continue;
            }

            if let Some(&source) = index_by_id.get(&link.source)
                && let Some(&target) = index_by_id.get(&link.target)
                && source != target
            {
                edges.push(RenderEdge {
                    source,
                    target,
                    kind: link.kind,
                });
            }
        }
        edges.sort_unstable_by_key(|edge| {
            (edge.source, edge.target, edge.kind == LinkKind::Reference)
        });
        edges.dedup();
        edges
    }

    pub(in crate::app) fn rebuild_render_graph(&mut self) {
        self.render_graph_revision = self.render_graph_revision.wrapping_add(1);
        self.search_match_cache = None;

        let dragged_id = self
            .drag
            .as_ref()
            .and_then(|drag| self.graph_cache.as_ref()?.nodes.get(drag.index))
            .map(|node| node.id.clone());

        let mut ids = self.graph.nodes.keys().cloned().collect::<Vec<_>>();
        ids.sort_unstable();

        if ids.is_empty() {
            self.graph_cache = None;
            self.drag = None;
            self.visible_node_count = 0;
            self.visible_edge_count = 0;
            self.graph_dirty = false;
            return;
        }

        let degrees = self.graph.degrees();
        let mut min_size = u64::MAX;
        let mut max_size = 1u64;
        let mut min_degree = usize::MAX;
        let mut max_degree = 1usize;
        for node in self.graph.nodes.values() {
            let size = node.size.max(1);
            min_size = min_size.min(size);
            max_size = max_size.max(size);
            let degree = degrees.get(node.id.as_str()).copied().unwrap_or(0);
            min_degree = min_degree.min(degree);
            max_degree = max_degree.max(degree);
        }
        if min_size == u64::MAX {
            min_size = 1;
        }
        if min_degree == usize::MAX {
            min_degree = 0;
        }

        let scale_mode = self.settings.visibility.node_scale_mode;
        let label_size = self.settings.visibility.label_size;
        let focal_depth = self.focal_depth();

        let mut index_by_id = HashMap::with_capacity(ids.len());
        for (index, id) in ids.iter().enumerate() {
            index_by_id.insert(id.clone(), index);
        }
        let root_index = index_by_id.get(&self.graph.root_id).copied();
        let edges = self.collect_edges(&index_by_id);

        let mut prior_nodes = self
            .graph_cache
            .take()
            .map(|cache| {
                cache
                    .nodes
                    .into_iter()
                    .map(|node| (node.id.clone(), node))
                    .collect::<HashMap<_, _>>()
            })
            .unwrap_or_default();

        let mut nodes = Vec::with_capacity(ids.len());
        for (index, id) in ids.iter().enumerate() {
            let mut render_node = prior_nodes.remove(id).unwrap_or_else(|| {
                Self::make_render_node(
                    id.clone(),
                    index,
                    root_index.is_some_and(|root| root == index),
                )
            });

            // ids came straight out of the node map, the lookup cannot miss
            if let Some(node) = self.graph.nodes.get(id) {
                let degree = degrees.get(id.as_str()).copied().unwrap_or(0);
                let base_radius = match scale_mode {
                    NodeScaleMode::Size => size_radius(node.size, min_size, max_size),
                    NodeScaleMode::Degree => {
                        degree_radius(degree as u64, min_degree as u64, max_degree as u64)
                    }
                };
                let is_focal = self.selected.as_deref() == Some(id.as_str());
                Self::refresh_render_node(
                    &mut render_node,
                    node,
                    degree,
                    base_radius,
                    focal_depth,
                    is_focal,
                    label_size,
                );
            }
            nodes.push(render_node);
        }

        let mut cache = RenderGraph {
            nodes,
            edges,
            index_by_id,
            root_index,
            alpha: 0.0,
            alpha_target: 0.0,
            phase: super::super::SimPhase::Settled,
            physics_scratch: PhysicsScratch::default(),
            view_scratch: ViewScratch::default(),
        };
        cache.view_scratch.draw_order_dirty = true;
        cache.restart();

        self.drag = dragged_id.and_then(|id| {
            cache
                .index_by_id
                .get(&id)
                .map(|&index| super::super::DragState { index })
        });
        self.visible_node_count = cache.nodes.len();
        self.visible_edge_count = cache.edges.len();
        self.graph_cache = Some(cache);
        self.graph_dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::settings::Settings;
    use crate::vault::{
        depth_from_path, Link, LinkKind, Node, NodeKind, ScanResult, VaultGraph, ROOT_ID,
    };

    use super::super::super::physics::step_physics;
    use super::super::super::ViewModel;

    fn node(id: &str, kind: NodeKind, size: u64) -> Node {
        Node {
            id: id.to_string(),
            name: id.rsplit('/').next().unwrap_or(id).to_string(),
            kind,
            path: id.to_string(),
            size,
            depth: depth_from_path(id),
        }
    }

    fn link(source: &str, target: &str, kind: LinkKind) -> Link {
        Link {
            source: source.to_string(),
            target: target.to_string(),
            kind,
        }
    }

    fn sample_result() -> ScanResult {
        let nodes = [
            node(ROOT_ID, NodeKind::Folder, 35),
            node("/a.md", NodeKind::File, 10),
            node("/b.md", NodeKind::File, 20),
            node("/docs", NodeKind::Folder, 5),
            node("/docs/c.md", NodeKind::File, 5),
        ]
        .into_iter()
        .map(|n| (n.id.clone(), n))
        .collect();

        ScanResult {
            graph: VaultGraph {
                root_id: ROOT_ID.to_string(),
                nodes,
                links: vec![
                    link(ROOT_ID, "/a.md", LinkKind::ParentChild),
                    link(ROOT_ID, "/b.md", LinkKind::ParentChild),
                    link(ROOT_ID, "/docs", LinkKind::ParentChild),
                    link("/docs", "/docs/c.md", LinkKind::ParentChild),
                    link("/a.md", "/b.md", LinkKind::Reference),
                    link("/a.md", "/b.md", LinkKind::Reference),
                ],
            },
            skipped: Vec::new(),
        }
    }

    fn model() -> ViewModel {
        ViewModel::new(PathBuf::from("."), sample_result(), Settings::default())
    }

    #[test]
    fn rebuild_includes_every_node_and_dedups_springs() {
        let mut model = model();
        model.rebuild_render_graph();

        let cache = model.graph_cache.as_ref().expect("cache");
        assert_eq!(cache.nodes.len(), 5);
        // four parent-child springs plus one deduped reference spring
        assert_eq!(cache.edges.len(), 5);
        assert_eq!(cache.root_index, Some(cache.index_by_id[ROOT_ID]));
        assert!(cache.is_running());

        // the full snapshot still counts both reference occurrences
        assert_eq!(model.graph.degree("/a.md"), 3);
    }

    #[test]
    fn rebuild_preserves_layout_state_by_id() {
        let mut model = model();
        model.rebuild_render_graph();

        {
            let cache = model.graph_cache.as_mut().expect("cache");
            let index = cache.index_by_id["/a.md"];
            cache.nodes[index].world_pos = eframe::egui::vec2(42.0, -7.0);
        }

        model.graph_dirty = true;
        model.rebuild_render_graph();

        let cache = model.graph_cache.as_ref().expect("cache");
        let index = cache.index_by_id["/a.md"];
        assert_eq!(cache.nodes[index].world_pos, eframe::egui::vec2(42.0, -7.0));
    }

    #[test]
    fn hidden_reference_links_change_the_layout_but_not_the_graph() {
        let mut shown = model();
        shown.rebuild_render_graph();

        let mut hidden = model();
        hidden.settings.visibility.show_reference_links = false;
        hidden.rebuild_render_graph();

        // snapshot queries are untouched by visibility
        assert_eq!(hidden.graph.backlinks("/b.md"), vec!["/a.md", "/a.md"]);
        assert_eq!(hidden.graph.degree("/b.md"), shown.graph.degree("/b.md"));

        let hidden_cache = hidden.graph_cache.as_ref().expect("cache");
        assert_eq!(hidden_cache.edges.len(), 4);

        // without the reference spring the endpoints end up further apart
        let params = shown.settings.simulation;
        for _ in 0..120 {
            step_physics(shown.graph_cache.as_mut().expect("cache"), params);
            step_physics(hidden.graph_cache.as_mut().expect("cache"), params);
        }

        let distance = |model: &ViewModel| {
            let cache = model.graph_cache.as_ref().expect("cache");
            let a = cache.nodes[cache.index_by_id["/a.md"]].world_pos;
            let b = cache.nodes[cache.index_by_id["/b.md"]].world_pos;
            (a - b).length()
        };
        assert!(
            distance(&shown) < distance(&hidden),
            "reference spring should pull the pair closer: {} vs {}",
            distance(&shown),
            distance(&hidden)
        );
    }

    #[test]
    fn selection_shifts_relative_depth_and_weighted_radii() {
        let mut model = model();
        model.rebuild_render_graph();
        let (flat_radius_a, deep_radius_c) = {
            let cache = model.graph_cache.as_ref().expect("cache");
            let a = cache.index_by_id["/a.md"];
            let c = cache.index_by_id["/docs/c.md"];
            // without a focal node the weighting follows absolute depth
            assert_eq!(cache.nodes[a].relative_depth, 0);
            assert_eq!(cache.nodes[c].relative_depth, 1);
            (cache.nodes[a].weighted_radius, cache.nodes[c].weighted_radius)
        };

        model.set_selected(Some("/docs/c.md".to_string()));
        assert!(model.graph_dirty);
        model.rebuild_render_graph();

        let cache = model.graph_cache.as_ref().expect("cache");
        let a = cache.index_by_id["/a.md"];
        let c = cache.index_by_id["/docs/c.md"];

        // depth-0 notes are now one level away from the focal note
        assert_eq!(cache.nodes[a].relative_depth, 1);
        assert!(cache.nodes[a].weighted_radius < flat_radius_a);

        // the focal node jumps back to full weight
        assert_eq!(cache.nodes[c].relative_depth, 0);
        assert!(cache.nodes[c].weighted_radius > deep_radius_c);
    }

    #[test]
    fn degree_scale_mode_changes_base_radii() {
        let mut by_size = model();
        by_size.rebuild_render_graph();

        let mut by_degree = model();
        by_degree.settings.visibility.node_scale_mode =
            crate::settings::NodeScaleMode::Degree;
        by_degree.rebuild_render_graph();

        let radius = |model: &ViewModel, id: &str| {
            let cache = model.graph_cache.as_ref().expect("cache");
            cache.nodes[cache.index_by_id[id]].base_radius
        };

        // /a.md is the smallest file but the best connected node
        assert!(radius(&by_size, "/a.md") < radius(&by_size, "/b.md"));
        assert!(radius(&by_degree, "/a.md") >= radius(&by_degree, "/b.md"));
    }
}
