mod controls;
mod details;

use std::path::PathBuf;

use eframe::egui::{self, Align, Context, Layout, Ui, Vec2};

use crate::settings::{Settings, Theme};
use crate::util::display_name;
use crate::vault::ScanResult;

use super::ViewModel;

impl ViewModel {
    pub(in crate::app) const RANKING_ROWS: usize = 8;

    pub(in crate::app) fn new(
        vault_root: PathBuf,
        result: ScanResult,
        settings: Settings,
    ) -> Self {
        let ScanResult { graph, skipped } = result;
        let top_by_size = graph.top_by_size(Self::RANKING_ROWS);
        let top_by_degree = graph.top_by_degree(Self::RANKING_ROWS);

        Self {
            vault_root,
            graph,
            skipped,
            settings,
            search: String::new(),
            selected: None,
            pan: Vec2::ZERO,
            zoom: 1.0,
            graph_dirty: true,
            render_graph_revision: 0,
            graph_cache: None,
            search_match_cache: None,
            content_preview: None,
            top_by_size,
            top_by_degree,
            drag: None,
            visible_node_count: 0,
            visible_edge_count: 0,
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        rescan_requested: &mut bool,
        is_rescanning: bool,
    ) {
        ctx.set_visuals(match self.settings.theme {
            Theme::Dark => egui::Visuals::dark(),
            Theme::Light => egui::Visuals::light(),
        });

        if self.graph_dirty {
            self.rebuild_render_graph();
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("vaultmap");
                    ui.separator();
                    ui.label(format!("vault: {}", self.vault_root.display()));
                    ui.label(format!("nodes: {}", self.graph.node_count()));
                    ui.label(format!("links: {}", self.graph.link_count()));

                    if !self.skipped.is_empty() {
                        let skipped = &self.skipped;
                        ui.label(format!("skipped: {}", skipped.len()))
                            .on_hover_ui(|ui| {
                                for entry in skipped {
                                    ui.label(format!("{} ({})", entry.path, entry.reason));
                                }
                            });
                    }

                    let rescan_button =
                        ui.add_enabled(!is_rescanning, egui::Button::new("Rescan"));
                    if rescan_button.clicked() {
                        *rescan_requested = true;
                    }
                    if is_rescanning {
                        ui.spinner();
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!(
                            "in view: {} nodes, {} links",
                            self.visible_node_count, self.visible_edge_count
                        ));
                        let phase = match &self.graph_cache {
                            Some(cache) if cache.is_running() => "settling",
                            Some(_) => "settled",
                            None => "empty",
                        };
                        ui.label(phase);
                    });
                });
            });

        egui::SidePanel::right("inspector")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        self.draw_controls(ui);
                        ui.separator();
                        self.draw_rankings(ui);
                        ui.separator();
                        self.draw_details(ui);
                    });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_graph(ui);
        });
    }

    fn draw_rankings(&mut self, ui: &mut Ui) {
        let mut pending = None;

        ui.label(egui::RichText::new("Largest").strong());
        for id in &self.top_by_size {
            let Some(node) = self.graph.nodes.get(id) else {
                continue;
            };
            let label = format!(
                "{}  ({})",
                display_name(&node.name),
                crate::util::format_bytes(node.size)
            );
            if ui.link(label).on_hover_text(id.as_str()).clicked() {
                pending = Some(id.clone());
            }
        }

        ui.add_space(6.0);
        ui.label(egui::RichText::new("Most linked").strong());
        for id in &self.top_by_degree {
            let Some(node) = self.graph.nodes.get(id) else {
                continue;
            };
            let label = format!(
                "{}  ({} links)",
                display_name(&node.name),
                self.graph.degree(id)
            );
            if ui.link(label).on_hover_text(id.as_str()).clicked() {
                pending = Some(id.clone());
            }
        }

        if let Some(id) = pending {
            self.set_selected(Some(id));
        }
    }
}
