use eframe::egui::{self, RichText, Ui};

use crate::util::{display_name, format_bytes};
use crate::vault::{FsSource, NodeKind, VaultSource};

use super::super::{ContentPreview, ViewModel};

const PREVIEW_LIMIT: usize = 4096;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection");
        ui.add_space(4.0);

        let Some(selected_id) = self.selected.clone() else {
            ui.label("Click a node in the graph or a ranking entry.");
            return;
        };

        let Some(node) = self.graph.nodes.get(&selected_id) else {
            ui.label("The selected note is gone from the latest scan.");
            return;
        };

        let name = node.name.clone();
        let kind = node.kind;
        let size = node.size;
        let depth = node.depth;
        let is_markdown = kind == NodeKind::File && name.ends_with(".md");

        ui.label(RichText::new(display_name(&name)).strong());
        ui.small(selected_id.as_str());
        ui.add_space(6.0);

        let kind_text = match kind {
            NodeKind::Folder => "folder",
            NodeKind::File => "file",
        };
        ui.label(format!("kind: {kind_text}"));
        ui.label(format!("size: {}", format_bytes(size)));
        ui.label(format!("depth: {depth}"));
        ui.label(format!("links: {}", self.graph.degree(&selected_id)));

        let mut pending = None;

        let backlinks = self
            .graph
            .backlinks(&selected_id)
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        ui.separator();
        ui.label(RichText::new(format!("Backlinks ({})", backlinks.len())).strong());
        if backlinks.is_empty() {
            ui.label("Nothing links here.");
        } else {
            for source in &backlinks {
                let label = source.rsplit('/').next().unwrap_or(source);
                if ui
                    .link(display_name(label))
                    .on_hover_text(source.as_str())
                    .clicked()
                {
                    pending = Some(source.clone());
                }
            }
        }

        let outgoing = self
            .graph
            .outgoing_references(&selected_id)
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        ui.separator();
        ui.label(RichText::new(format!("Outgoing links ({})", outgoing.len())).strong());
        if outgoing.is_empty() {
            ui.label("No wikilinks in this note.");
        } else {
            for target in &outgoing {
                let label = target.rsplit('/').next().unwrap_or(target);
                if ui
                    .link(display_name(label))
                    .on_hover_text(target.as_str())
                    .clicked()
                {
                    pending = Some(target.clone());
                }
            }
        }

        if is_markdown {
            self.ensure_content_preview(&selected_id);
            if let Some(preview) = &self.content_preview {
                ui.separator();
                ui.label(RichText::new("Preview").strong());
                match &preview.text {
                    Ok(text) => {
                        egui::ScrollArea::vertical()
                            .id_salt("content_preview_scroll")
                            .max_height(220.0)
                            .auto_shrink([false, true])
                            .show(ui, |ui| {
                                ui.label(RichText::new(text).monospace());
                            });
                    }
                    Err(error) => {
                        ui.label(format!("Could not read the note: {error}"));
                    }
                }
            }
        }

        if let Some(id) = pending {
            self.set_selected(Some(id));
        }
    }

    /// Lazily read the selected note's text from disk, once per selection.
    fn ensure_content_preview(&mut self, id: &str) {
        if self
            .content_preview
            .as_ref()
            .is_some_and(|preview| preview.id == id)
        {
            return;
        }

        let source = FsSource::new(self.vault_root.clone());
        let text = source
            .read_text(id)
            .map(|text| {
                if text.len() > PREVIEW_LIMIT {
                    let mut cut = PREVIEW_LIMIT;
                    while !text.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    format!("{}\n...", &text[..cut])
                } else {
                    text
                }
            })
            .map_err(|error| error.to_string());

        self.content_preview = Some(ContentPreview {
            id: id.to_string(),
            text,
        });
    }
}
