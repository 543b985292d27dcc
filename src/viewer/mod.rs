use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::Context as _;
use eframe::egui::{self, Context, Pos2};
use graph_lens::config::{EngineConfig, PayloadLimits};
use graph_lens::graph::{Graph, Node, normalize_with_limits};
use graph_lens::interaction::{EngineCallbacks, InteractionController, ZoomCommand};
use graph_lens::layout::ViewDimension;
use graph_lens::session::{GraphLoader, LoadTicket};
use graph_lens::surface::ResourceKind;
use serde_json::Value;
use tracing::{info, warn};

mod backend;
mod canvas;
mod details;
mod panels;

use backend::EguiBackend;

type LoadResult = Result<Graph, String>;

pub struct GraphLensApp {
    payload_path: PathBuf,
    config: EngineConfig,
    dimension: ViewDimension,
    loader: GraphLoader,
    state: AppState,
    reload: Option<PendingLoad>,
}

struct PendingLoad {
    ticket: LoadTicket,
    rx: Receiver<LoadResult>,
}

enum AppState {
    Loading(PendingLoad),
    Ready(Box<ViewModel>),
    Error(String),
}

/// Things the engine reported through its callbacks during the last frame.
#[derive(Debug)]
enum ViewerEvent {
    NodeMenu { id: String, pos: Pos2 },
    SelectionChanged,
    ZoomCompleted(ZoomCommand),
}

struct ViewModel {
    controller: InteractionController<EguiBackend>,
    events: Rc<RefCell<Vec<ViewerEvent>>>,
    search_text: String,
    node_menu: Option<(String, Pos2)>,
    surface_error: Option<String>,
}

impl GraphLensApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        payload_path: PathBuf,
        config: EngineConfig,
        dimension: ViewDimension,
    ) -> Self {
        let mut loader = GraphLoader::new();
        let pending = Self::spawn_load(&mut loader, payload_path.clone(), config.limits);
        Self {
            payload_path,
            config,
            dimension,
            loader,
            state: AppState::Loading(pending),
            reload: None,
        }
    }

    fn spawn_load(loader: &mut GraphLoader, path: PathBuf, limits: PayloadLimits) -> PendingLoad {
        let ticket = loader.issue();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = read_payload(&path, &limits).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        PendingLoad { ticket, rx }
    }

    fn start_load(&mut self) -> AppState {
        AppState::Loading(Self::spawn_load(
            &mut self.loader,
            self.payload_path.clone(),
            self.config.limits,
        ))
    }
}

fn read_payload(path: &Path, limits: &PayloadLimits) -> anyhow::Result<Graph> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    let graph = normalize_with_limits(&value, limits);
    info!(
        path = %path.display(),
        nodes = graph.node_count(),
        links = graph.link_count(),
        "payload loaded"
    );
    Ok(graph)
}

/// Polls a pending load. `Some` once the worker answered or died.
fn poll_load(loader: &mut GraphLoader, pending: &PendingLoad) -> Option<LoadResult> {
    let result = match pending.rx.try_recv() {
        Ok(result) => result,
        Err(TryRecvError::Empty) => return None,
        Err(TryRecvError::Disconnected) => Err("Background load worker disconnected".to_owned()),
    };
    // `None` here means a newer request superseded this one.
    loader.accept(pending.ticket, result)
}

impl eframe::App for GraphLensApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading(pending) => {
                if let Some(result) = poll_load(&mut self.loader, pending) {
                    transition = Some(match result {
                        Ok(graph) => AppState::Ready(Box::new(ViewModel::new(
                            ctx,
                            graph,
                            self.config.clone(),
                            self.dimension,
                        ))),
                        Err(error) => AppState::Error(error),
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint();
            }
            AppState::Error(error) => {
                let mut retry = false;
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
                if retry {
                    transition = Some(self.start_load());
                }
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload.is_some();
                model.show(ctx, &self.payload_path, &mut reload_requested, is_reloading);

                if reload_requested {
                    // A newer ticket supersedes whatever is still in flight.
                    self.reload = Some(Self::spawn_load(
                        &mut self.loader,
                        self.payload_path.clone(),
                        self.config.limits,
                    ));
                }

                if let Some(pending) = self.reload.take() {
                    match poll_load(&mut self.loader, &pending) {
                        Some(Ok(graph)) => model.replace_graph(graph),
                        Some(Err(error)) => {
                            warn!(%error, "reload failed");
                            transition = Some(AppState::Error(error));
                        }
                        None => self.reload = Some(pending),
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload = None;
            self.state = next_state;
        }
    }
}

impl ViewModel {
    fn new(ctx: &Context, graph: Graph, config: EngineConfig, dimension: ViewDimension) -> Self {
        let mut controller =
            InteractionController::new(config, EguiBackend::new(ctx.clone()), dimension);
        let events = Rc::new(RefCell::new(Vec::new()));
        controller.set_callbacks(callbacks(&events));
        controller.set_graph(graph);

        let mut model = Self {
            controller,
            events,
            search_text: String::new(),
            node_menu: None,
            surface_error: None,
        };
        model.prepare_surface();
        model
    }

    /// Registers a surface for the current view and uploads the node sprite into it.
    fn prepare_surface(&mut self) {
        let label = self.controller.layout().dimension().label();
        match self.controller.register_surface(label) {
            Ok(_) => self.attach_surface_resources(),
            Err(error) => self.surface_error = Some(error.to_string()),
        }
    }

    fn attach_surface_resources(&mut self) {
        self.surface_error = None;
        if let Some(surface) = self.controller.surfaces_mut().active_mut() {
            surface.attach_resource("nodes", ResourceKind::Texture, "node-sprite");
            surface.attach_resource("nodes", ResourceKind::Material, "node-tint");
            surface.attach_resource("links", ResourceKind::Geometry, "link-batch");
        }
    }

    fn switch_dimension(&mut self, dimension: ViewDimension) {
        match self.controller.set_dimension(dimension) {
            Ok(()) => self.attach_surface_resources(),
            Err(error) => self.surface_error = Some(error.to_string()),
        }
    }

    fn replace_graph(&mut self, graph: Graph) {
        self.node_menu = None;
        self.controller.set_graph(graph);
        if !self.search_text.is_empty() {
            self.controller
                .search_input(&self.search_text, std::time::Instant::now());
        }
    }

    fn drain_events(&mut self) {
        let events = std::mem::take(&mut *self.events.borrow_mut());
        for event in events {
            match event {
                ViewerEvent::NodeMenu { id, pos } => self.node_menu = Some((id, pos)),
                ViewerEvent::SelectionChanged => self.node_menu = None,
                ViewerEvent::ZoomCompleted(command) => {
                    tracing::debug!(?command, "zoom finished");
                }
            }
        }
    }

    fn show(
        &mut self,
        ctx: &Context,
        payload_path: &Path,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("graph-lens");
                    ui.separator();
                    ui.label(format!("payload: {}", payload_path.display()));
                    let graph = self.controller.graph();
                    ui.label(format!("nodes: {}", graph.node_count()));
                    ui.label(format!("links: {}", graph.link_count()));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload payload"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if is_loading {
                        ui.spinner();
                    }
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.draw_controls(ui));
            });

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.draw_details(ui));
            });

        egui::CentralPanel::default().show(ctx, |ui| match self.surface_error.clone() {
            Some(error) => {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Visualization unavailable");
                    ui.label(error);
                    if ui.button("Try again").clicked() {
                        self.prepare_surface();
                    }
                });
            }
            None => self.draw_canvas(ui),
        });

        self.drain_events();
        self.draw_node_menu(ctx);
    }
}

fn callbacks(events: &Rc<RefCell<Vec<ViewerEvent>>>) -> EngineCallbacks {
    let menu_sink = Rc::clone(events);
    let nodes_sink = Rc::clone(events);
    let edges_sink = Rc::clone(events);
    let zoom_sink = Rc::clone(events);

    EngineCallbacks {
        on_node_right_click: Some(Box::new(move |node: &Node, pos: Pos2| {
            menu_sink.borrow_mut().push(ViewerEvent::NodeMenu {
                id: node.id.clone(),
                pos,
            });
        })),
        on_selected_nodes_change: Some(Box::new(move |_: &HashSet<String>| {
            nodes_sink.borrow_mut().push(ViewerEvent::SelectionChanged);
        })),
        on_selected_edges_change: Some(Box::new(move |_: &HashSet<String>| {
            edges_sink.borrow_mut().push(ViewerEvent::SelectionChanged);
        })),
        on_zoom_complete: Some(Box::new(move |command| {
            zoom_sink
                .borrow_mut()
                .push(ViewerEvent::ZoomCompleted(command));
        })),
        ..EngineCallbacks::default()
    }
}
