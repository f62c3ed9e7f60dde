use eframe::egui::{self, Ui};

use crate::settings::{NodeScaleMode, SimulationParams, Theme};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Controls");
        ui.add_space(4.0);

        ui.label("Search")
            .on_hover_text("Fuzzy-highlight matching notes without changing the layout.");
        ui.text_edit_singleline(&mut self.search);

        ui.add_space(6.0);
        ui.label(egui::RichText::new("Forces").strong());

        let mut forces_changed = false;
        let sim = &mut self.settings.simulation;
        forces_changed |= ui
            .add(egui::Slider::new(&mut sim.charge_strength, 0.0..=600.0).text("repulsion"))
            .on_hover_text("Node-to-node repulsion; shallow nodes repel hardest.")
            .changed();
        forces_changed |= ui
            .add(egui::Slider::new(&mut sim.link_distance, 10.0..=200.0).text("link distance"))
            .changed();
        forces_changed |= ui
            .add(egui::Slider::new(&mut sim.center_force, 0.0..=1.0).text("centering"))
            .changed();
        forces_changed |= ui
            .add(
                egui::Slider::new(&mut sim.parent_child_strength, 0.0..=1.5)
                    .text("folder strength"),
            )
            .on_hover_text("Spring strength of folder containment links.")
            .changed();
        forces_changed |= ui
            .add(
                egui::Slider::new(&mut sim.reference_strength, 0.0..=1.0)
                    .text("wikilink strength"),
            )
            .changed();
        forces_changed |= ui
            .add(egui::Slider::new(&mut sim.collide_strength, 0.0..=2.0).text("collision"))
            .changed();

        if ui.button("Reset forces").clicked() {
            self.settings.simulation = SimulationParams::default();
            forces_changed = true;
        }

        if forces_changed && let Some(cache) = self.graph_cache.as_mut() {
            cache.restart();
        }

        ui.add_space(6.0);
        ui.label(egui::RichText::new("Display").strong());

        let visibility = &mut self.settings.visibility;
        ui.checkbox(&mut visibility.show_nodes, "nodes");
        ui.checkbox(&mut visibility.show_labels, "labels");

        // hidden link kinds are dropped from the layout, not just undrawn
        let mut links_changed = false;
        links_changed |= ui
            .checkbox(&mut visibility.show_parent_child_links, "folder links")
            .changed();
        links_changed |= ui
            .checkbox(&mut visibility.show_reference_links, "wikilinks")
            .changed();
        ui.checkbox(&mut visibility.show_backlinks, "highlight backlinks")
            .on_hover_text("Tint wikilinks pointing at the selected note.");

        ui.add(egui::Slider::new(&mut visibility.label_size, 8.0..=20.0).text("label size"));

        ui.horizontal(|ui| {
            ui.label("scale by");
            links_changed |= ui
                .selectable_value(&mut visibility.node_scale_mode, NodeScaleMode::Size, "size")
                .changed();
            links_changed |= ui
                .selectable_value(
                    &mut visibility.node_scale_mode,
                    NodeScaleMode::Degree,
                    "links",
                )
                .changed();
        });

        if links_changed {
            self.graph_dirty = true;
        }

        ui.horizontal(|ui| {
            ui.label("theme");
            ui.selectable_value(&mut self.settings.theme, Theme::Dark, "dark");
            ui.selectable_value(&mut self.settings.theme, Theme::Light, "light");
        });
    }
}
