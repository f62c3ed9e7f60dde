use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Pos2, Vec2};
use log::warn;

use crate::settings::Settings;
use crate::vault::{scan_vault, FsSource, LinkKind, NodeKind, ScanResult, SkippedEntry, VaultGraph};

mod graph;
mod physics;
mod render_utils;
mod ui;
mod weighting;

type ScanMessage = Result<ScanResult, String>;

pub struct VaultMapApp {
    vault_root: PathBuf,
    state: AppState,
    rescan_rx: Option<Receiver<ScanMessage>>,
}

enum AppState {
    Loading { rx: Receiver<ScanMessage> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    vault_root: PathBuf,
    graph: VaultGraph,
    skipped: Vec<SkippedEntry>,
    settings: Settings,
    search: String,
    /// Focal node: drives depth-relative weighting and the details panel.
    selected: Option<String>,
    pan: Vec2,
    zoom: f32,
    graph_dirty: bool,
    render_graph_revision: u64,
    graph_cache: Option<RenderGraph>,
    search_match_cache: Option<SearchMatchCache>,
    content_preview: Option<ContentPreview>,
    top_by_size: Vec<String>,
    top_by_degree: Vec<String>,
    drag: Option<DragState>,
    visible_node_count: usize,
    visible_edge_count: usize,
}

struct SearchMatchCache {
    query: String,
    graph_revision: u64,
    matches: Arc<HashSet<usize>>,
}

/// On-demand file content for the details panel.
struct ContentPreview {
    id: String,
    text: Result<String, String>,
}

struct DragState {
    index: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SimPhase {
    Running,
    Settled,
}

/// Per-session layout state: everything mutable the simulation touches
/// lives here, parallel to (not inside) the immutable `VaultGraph`.
struct RenderGraph {
    nodes: Vec<RenderNode>,
    edges: Vec<RenderEdge>,
    index_by_id: HashMap<String, usize>,
    root_index: Option<usize>,
    alpha: f32,
    alpha_target: f32,
    phase: SimPhase,
    physics_scratch: PhysicsScratch,
    view_scratch: ViewScratch,
}

#[derive(Clone)]
struct RenderNode {
    id: String,
    name: String,
    kind: NodeKind,
    depth: usize,
    size: u64,
    degree: usize,
    relative_depth: usize,
    base_radius: f32,
    /// Base radius times the depth-relative multiplier; collision input.
    weighted_radius: f32,
    world_pos: Vec2,
    velocity: Vec2,
    /// Set while the user drags this node; cleared on release.
    pinned: Option<Vec2>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
struct RenderEdge {
    source: usize,
    target: usize,
    kind: LinkKind,
}

#[derive(Default)]
struct PhysicsScratch {
    forces: Vec<Vec2>,
    positions: Vec<Vec2>,
    radii: Vec<f32>,
    charges: Vec<f32>,
}

#[derive(Default)]
struct ViewScratch {
    screen_positions: Vec<Pos2>,
    screen_radii: Vec<f32>,
    visible_mask: Vec<bool>,
    draw_order: Vec<usize>,
    draw_order_dirty: bool,
}

impl VaultMapApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, vault_root: PathBuf) -> Self {
        let state = AppState::Loading {
            rx: Self::spawn_scan(vault_root.clone()),
        };
        Self {
            vault_root,
            state,
            rescan_rx: None,
        }
    }

    fn spawn_scan(vault_root: PathBuf) -> Receiver<ScanMessage> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let source = FsSource::new(vault_root);
            let result = scan_vault(&source).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn ready_state(&self, result: ScanResult, previous: Option<&ViewModel>) -> AppState {
        let mut model = ViewModel::new(
            self.vault_root.clone(),
            result,
            previous
                .map(|model| model.settings)
                .unwrap_or_else(|| Settings::load(&self.vault_root)),
        );

        // a rescan keeps the camera and, when still valid, the selection
        if let Some(previous) = previous {
            model.pan = previous.pan;
            model.zoom = previous.zoom;
            model.search = previous.search.clone();
            if let Some(selected) = &previous.selected
                && model.graph.nodes.contains_key(selected)
            {
                model.selected = Some(selected.clone());
            }
        }

        AppState::Ready(Box::new(model))
    }
}

impl eframe::App for VaultMapApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(match result {
                        Ok(scan) => self.ready_state(scan, None),
                        Err(error) => AppState::Error(error),
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Scanning vault...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint();
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to scan vault");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(AppState::Loading {
                            rx: Self::spawn_scan(self.vault_root.clone()),
                        });
                    }
                });
            }
            AppState::Ready(model) => {
                let mut rescan_requested = false;
                let is_rescanning = self.rescan_rx.is_some();
                model.show(ctx, &mut rescan_requested, is_rescanning);

                if rescan_requested && self.rescan_rx.is_none() {
                    self.rescan_rx = Some(Self::spawn_scan(self.vault_root.clone()));
                }
            }
        }

        // a finished rescan supersedes the current graph; an in-flight one
        // keeps the old model interactive
        if let Some(rx) = self.rescan_rx.take() {
            match rx.try_recv() {
                Ok(Ok(scan)) => {
                    let previous = match &self.state {
                        AppState::Ready(model) => Some(model.as_ref()),
                        _ => None,
                    };
                    transition = Some(self.ready_state(scan, previous));
                }
                Ok(Err(error)) => {
                    transition = Some(AppState::Error(error));
                }
                Err(TryRecvError::Empty) => {
                    self.rescan_rx = Some(rx);
                    ctx.request_repaint_after(std::time::Duration::from_millis(100));
                }
                Err(TryRecvError::Disconnected) => {
                    transition = Some(AppState::Error(
                        "background scan worker disconnected".to_owned(),
                    ));
                }
            }
        }

        if let Some(next_state) = transition {
            self.state = next_state;
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let AppState::Ready(model) = &self.state
            && let Err(error) = model.settings.save(&self.vault_root)
        {
            warn!("could not persist settings: {error:#}");
        }
    }
}
