mod camera;
mod hit;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use eframe::egui::{Modifiers, PointerButton, Pos2, Rect};
use tracing::{debug, info};

use crate::config::{EngineConfig, ForceConfig, StyleConfig};
use crate::error::EngineResult;
use crate::graph::{Graph, Link, Node};
use crate::layout::{LayoutEngine, LayoutMode, LockedAxes, ViewDimension};
use crate::search::{MatchSet, SearchDebouncer, Searcher, Suggestion};
use crate::selection::{Region, SelectionChange, SelectionEngine, SelectionMode, SelectionState};
use crate::style::{
    FrameStyle, SearchView, StyleInputs, VisibilityState, base_node_radius, resolve_frame,
};
use crate::surface::{RenderSurfaceManager, SurfaceBackend, SurfaceRequest};

pub use camera::{OrbitCamera, Projection, ZoomCommand, default_viewport};
pub use hit::{
    HIT_TOLERANCE, ScreenLink, ScreenNode, curve_control, distance_to_polyline, hit_link, hit_node,
    link_polyline,
};

type NodeCallback = Box<dyn FnMut(&Node)>;
type NodeAtCallback = Box<dyn FnMut(&Node, Pos2)>;
type LinkCallback = Box<dyn FnMut(&Link)>;
type IdSetCallback = Box<dyn FnMut(&HashSet<String>)>;
type ZoomCallback = Box<dyn FnMut(ZoomCommand)>;

/// Host hooks. Every hook is optional and runs synchronously inside the call that caused it.
#[derive(Default)]
pub struct EngineCallbacks {
    pub on_node_click: Option<NodeCallback>,
    pub on_node_right_click: Option<NodeAtCallback>,
    pub on_link_click: Option<LinkCallback>,
    pub on_selected_nodes_change: Option<IdSetCallback>,
    pub on_selected_edges_change: Option<IdSetCallback>,
    pub on_zoom_complete: Option<ZoomCallback>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyCommand {
    ClearSelection,
    CycleSelectionMode,
    ZoomIn,
    ZoomOut,
    ZoomFit,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Press {
        pos: Pos2,
        button: PointerButton,
        modifiers: Modifiers,
    },
    Move {
        pos: Pos2,
    },
    Release {
        pos: Pos2,
        button: PointerButton,
        modifiers: Modifiers,
    },
    Scroll {
        delta: f32,
    },
}

#[derive(Clone, Debug, Default)]
enum PointerState {
    #[default]
    Idle,
    PressedNode {
        index: usize,
        origin: Pos2,
        depth: f32,
        dragging: bool,
    },
    PressedEmpty {
        origin: Pos2,
        last: Pos2,
        moved: bool,
    },
    Drawing {
        origin: Pos2,
        points: Vec<Pos2>,
    },
    RegionDrag {
        last: Pos2,
        indices: Vec<usize>,
        depth: f32,
    },
    Panning {
        last: Pos2,
    },
}

/// Everything a renderer needs to draw one frame.
#[derive(Clone, Debug, Default)]
pub struct FrameOutput {
    pub style: FrameStyle,
    /// Indexed like `graph.nodes()`; `None` for nodes behind the camera.
    pub nodes: Vec<Option<ScreenNode>>,
    /// Region being drawn, in screen space.
    pub pending_region: Option<Region>,
    pub layout_moving: bool,
    /// Search input is waiting out its debounce or the index is still being built.
    pub search_settling: bool,
    /// False when there is no live surface to draw into.
    pub surface_ready: bool,
}

/// Turns pointer and keyboard input into selection, layout and camera changes, and produces the
/// per-frame render state.
pub struct InteractionController<B: SurfaceBackend> {
    config: EngineConfig,
    graph: Arc<Graph>,
    revision: u64,
    selection: SelectionEngine,
    layout: LayoutEngine,
    searcher: Searcher,
    debouncer: SearchDebouncer,
    search_matches: Option<MatchSet>,
    visibility: VisibilityState,
    camera: OrbitCamera,
    surfaces: RenderSurfaceManager<B>,
    callbacks: EngineCallbacks,
    pending_zoom: Option<ZoomCommand>,
    active_zoom: Option<ZoomCommand>,
    pointer: PointerState,
    screen_nodes: Vec<Option<ScreenNode>>,
    viewport: Rect,
}

impl<B: SurfaceBackend> InteractionController<B> {
    pub fn new(config: EngineConfig, backend: B, dimension: ViewDimension) -> Self {
        let mut layout = LayoutEngine::new(config.force, config.tree, dimension);
        layout.set_node_radius(base_node_radius(&config.style));

        Self {
            selection: SelectionEngine::new(),
            layout,
            searcher: Searcher::new(&config.search),
            debouncer: SearchDebouncer::new(config.search.debounce()),
            search_matches: None,
            visibility: VisibilityState::default(),
            camera: OrbitCamera::new(config.camera, dimension),
            surfaces: RenderSurfaceManager::new(backend),
            callbacks: EngineCallbacks::default(),
            pending_zoom: None,
            active_zoom: None,
            pointer: PointerState::Idle,
            screen_nodes: Vec::new(),
            viewport: default_viewport(),
            graph: Arc::new(Graph::empty()),
            revision: 0,
            config,
        }
    }

    pub fn set_callbacks(&mut self, callbacks: EngineCallbacks) {
        self.callbacks = callbacks;
    }

    pub fn callbacks_mut(&mut self) -> &mut EngineCallbacks {
        &mut self.callbacks
    }

    /// Swaps in a new graph. Selection from the old graph is dropped without notification, the
    /// layout restarts in force mode and the search index is rebuilt in chunks.
    pub fn set_graph(&mut self, graph: Graph) {
        self.revision += 1;
        info!(
            revision = self.revision,
            nodes = graph.node_count(),
            links = graph.link_count(),
            "graph replaced"
        );

        self.graph = Arc::new(graph);
        self.selection.reset_for_graph();
        self.layout.reset(&self.graph);
        self.searcher.rebuild(Arc::clone(&self.graph), self.revision);
        self.pointer = PointerState::Idle;
        self.screen_nodes.clear();
        self.pending_zoom = None;
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn selection(&self) -> &SelectionState {
        self.selection.state()
    }

    /// Region of the last box or lasso selection, in screen space.
    pub fn last_region(&self) -> Option<&Region> {
        self.selection.last_region()
    }

    pub fn layout(&self) -> &LayoutEngine {
        &self.layout
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn visibility(&self) -> &VisibilityState {
        &self.visibility
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn surfaces(&self) -> &RenderSurfaceManager<B> {
        &self.surfaces
    }

    pub fn surfaces_mut(&mut self) -> &mut RenderSurfaceManager<B> {
        &mut self.surfaces
    }

    /// Registers a fresh render surface for the current view, tearing down the previous one.
    pub fn register_surface(&mut self, label: &str) -> EngineResult<u64> {
        let request = SurfaceRequest {
            label: label.to_string(),
            dimension: self.layout.dimension(),
        };
        self.surfaces.register(request).map(|surface| surface.id())
    }

    pub fn set_selection_mode(&mut self, mode: SelectionMode) {
        let change = self.selection.set_mode(mode);
        self.pointer = PointerState::Idle;
        self.notify(change);
    }

    pub fn set_layout_mode(&mut self, mode: LayoutMode) {
        self.layout.set_mode(mode);
    }

    pub fn set_locked_axes(&mut self, locked: LockedAxes) {
        self.layout.set_locked_axes(locked);
    }

    /// Switches between the flat and the 3D view. The old surface is torn down and a new one
    /// registered for the new view.
    pub fn set_dimension(&mut self, dimension: ViewDimension) -> EngineResult<()> {
        if dimension == self.layout.dimension() {
            return Ok(());
        }
        self.layout.set_dimension(dimension);
        self.camera.set_dimension(dimension);
        self.register_surface(dimension.label()).map(|_| ())
    }

    pub fn style_config(&self) -> StyleConfig {
        self.config.style
    }

    pub fn set_style_config(&mut self, style: StyleConfig) {
        self.config.style = style;
        self.layout.set_node_radius(base_node_radius(&style));
    }

    pub fn set_force_config(&mut self, force: ForceConfig) {
        self.config.force = force;
        self.layout.set_force_config(force);
    }

    pub fn set_category_hidden(&mut self, category: &str, hidden: bool) {
        self.visibility.set_hidden(category, hidden);
    }

    pub fn show_all_categories(&mut self) {
        self.visibility.show_all();
    }

    /// Feeds raw search box input. The term takes effect once it has been stable for the
    /// debounce interval.
    pub fn search_input(&mut self, term: &str, now: Instant) {
        self.debouncer.input(term, now);
    }

    /// Applies pending search input immediately.
    pub fn search_submit(&mut self) {
        if let Some(term) = self.debouncer.flush().map(str::to_string) {
            self.apply_search(&term);
        }
    }

    pub fn search_term(&self) -> &str {
        self.debouncer.applied()
    }

    pub fn search_matches(&self) -> Option<&HashSet<String>> {
        self.search_matches.as_deref()
    }

    pub fn suggestions(&mut self, limit: usize) -> Vec<Suggestion> {
        let term = self.debouncer.applied().to_string();
        self.searcher.ranked(&term, limit)
    }

    pub fn search_index_progress(&self) -> f32 {
        self.searcher.build_progress()
    }

    fn apply_search(&mut self, term: &str) {
        self.search_matches = if term.trim().is_empty() {
            None
        } else {
            Some(self.searcher.query(term))
        };
    }

    /// Queues a camera command. It runs on the next frame and is then forgotten.
    pub fn zoom(&mut self, command: ZoomCommand) {
        self.pending_zoom = Some(command);
    }

    pub fn zoom_to_node(&mut self, id: &str) {
        if let Some(index) = self.graph.node_index(id) {
            self.zoom(ZoomCommand::ToNode(index));
        }
    }

    pub fn key(&mut self, command: KeyCommand) {
        match command {
            KeyCommand::ClearSelection => {
                let change = self.selection.clear();
                self.notify(change);
            }
            KeyCommand::CycleSelectionMode => {
                let change = self.selection.cycle_mode();
                self.pointer = PointerState::Idle;
                self.notify(change);
            }
            KeyCommand::ZoomIn => self.zoom(ZoomCommand::In),
            KeyCommand::ZoomOut => self.zoom(ZoomCommand::Out),
            KeyCommand::ZoomFit => self.zoom(ZoomCommand::Fit),
        }
    }

    /// Selects a node as if it had been clicked.
    pub fn select_node(&mut self, id: &str) {
        let graph = Arc::clone(&self.graph);
        let change = self.selection.click_node(&graph, id);
        if let Some(node) = graph.node(id)
            && let Some(callback) = self.callbacks.on_node_click.as_mut()
        {
            callback(node);
        }
        self.notify(change);
    }

    pub fn pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Press {
                pos,
                button,
                modifiers,
            } => self.pointer_pressed(pos, button, modifiers),
            PointerEvent::Move { pos } => self.pointer_moved(pos),
            PointerEvent::Release {
                pos,
                button,
                modifiers,
            } => self.pointer_released(pos, button, modifiers),
            PointerEvent::Scroll { delta } => self.camera.scroll_zoom(delta),
        }
    }

    fn pointer_pressed(&mut self, pos: Pos2, button: PointerButton, _modifiers: Modifiers) {
        match button {
            PointerButton::Secondary => {
                if let Some(index) = hit_node(&self.screen_nodes, pos)
                    && let Some(node) = self.graph.nodes().get(index)
                    && let Some(callback) = self.callbacks.on_node_right_click.as_mut()
                {
                    callback(node, pos);
                }
                return;
            }
            PointerButton::Middle => {
                self.pointer = PointerState::Panning { last: pos };
                return;
            }
            _ => {}
        }
        if button != PointerButton::Primary {
            return;
        }

        let mode = self.selection.mode();
        if mode.is_multi() && self.selection.region_contains(pos) {
            let indices = self.selected_indices();
            if !indices.is_empty() {
                let depth = self.average_depth(&indices);
                self.pointer = PointerState::RegionDrag {
                    last: pos,
                    indices,
                    depth,
                };
                return;
            }
        }

        if let Some(index) = hit_node(&self.screen_nodes, pos) {
            let depth = self.screen_nodes[index].map_or(self.camera.distance(), |node| node.depth);
            self.pointer = PointerState::PressedNode {
                index,
                origin: pos,
                depth,
                dragging: false,
            };
            return;
        }

        self.pointer = if mode.is_multi() {
            PointerState::Drawing {
                origin: pos,
                points: vec![pos],
            }
        } else {
            PointerState::PressedEmpty {
                origin: pos,
                last: pos,
                moved: false,
            }
        };
    }

    fn pointer_moved(&mut self, pos: Pos2) {
        let viewport = self.viewport;
        match &mut self.pointer {
            PointerState::Idle => {}
            PointerState::PressedNode {
                index,
                origin,
                depth,
                dragging,
            } => {
                if !*dragging && hit::drag_exceeds_threshold(pos - *origin) {
                    *dragging = true;
                    self.layout.begin_drag(*index);
                }
                if *dragging {
                    let world = self.camera.unproject(viewport, pos, *depth);
                    self.layout.drag_to(*index, world);
                }
            }
            PointerState::PressedEmpty {
                origin,
                last,
                moved,
            } => {
                if !*moved && hit::drag_exceeds_threshold(pos - *origin) {
                    *moved = true;
                }
                if *moved {
                    let delta = pos - *last;
                    match self.layout.dimension() {
                        ViewDimension::Three => self.camera.orbit(delta),
                        ViewDimension::Two => self.camera.pan(viewport, delta),
                    }
                }
                *last = pos;
            }
            PointerState::Drawing { points, .. } => {
                if points.last() != Some(&pos) {
                    points.push(pos);
                }
            }
            PointerState::RegionDrag {
                last,
                indices,
                depth,
            } => {
                let delta = pos - *last;
                let world = self.camera.screen_delta_to_world(viewport, delta, *depth);
                self.layout.translate_nodes(indices, world);
                self.selection.translate_region(delta);
                *last = pos;
            }
            PointerState::Panning { last } => {
                self.camera.pan(viewport, pos - *last);
                *last = pos;
            }
        }
    }

    fn pointer_released(&mut self, pos: Pos2, button: PointerButton, modifiers: Modifiers) {
        if button == PointerButton::Middle {
            self.pointer = PointerState::Idle;
            return;
        }
        if button != PointerButton::Primary {
            return;
        }

        match std::mem::take(&mut self.pointer) {
            PointerState::Idle | PointerState::Panning { .. } => {}
            PointerState::PressedNode {
                index, dragging, ..
            } => {
                if dragging {
                    self.layout.end_drag(index);
                } else if let Some(id) = self.graph.nodes().get(index).map(|node| node.id.clone()) {
                    self.select_node(&id);
                }
            }
            PointerState::PressedEmpty { moved, .. } => {
                if !moved {
                    self.click_empty_or_link(pos);
                }
            }
            PointerState::Drawing { origin, mut points } => {
                points.push(pos);
                let region = match self.selection.mode() {
                    SelectionMode::Lasso => Region::Lasso(points),
                    _ => Region::from_corners(origin, pos),
                };
                if region.is_degenerate() {
                    self.click_empty_or_link(pos);
                    return;
                }

                let graph = Arc::clone(&self.graph);
                let positions = self
                    .screen_nodes
                    .iter()
                    .map(|node| node.map(|node| node.center))
                    .collect::<Vec<_>>();
                let additive = modifiers.shift || modifiers.command;
                let change = self.selection.select_region(&graph, region, &positions, additive);
                self.notify(change);
            }
            PointerState::RegionDrag { indices, .. } => {
                self.layout.end_group_drag(&indices);
            }
        }
    }

    fn click_empty_or_link(&mut self, pos: Pos2) {
        let graph = Arc::clone(&self.graph);
        if let Some(index) = self.link_at(pos)
            && let Some(link) = graph.links().get(index)
        {
            let change = self.selection.click_link(&graph, &link.id);
            if let Some(callback) = self.callbacks.on_link_click.as_mut() {
                callback(link);
            }
            self.notify(change);
            return;
        }

        let change = self.selection.click_empty();
        self.notify(change);
    }

    fn link_at(&self, pos: Pos2) -> Option<usize> {
        let width = crate::style::base_link_width(&self.config.style);
        let links = (0..self.graph.link_count())
            .filter_map(|index| {
                let (source, target) = self.graph.link_endpoints(index)?;
                let start = self.screen_nodes.get(source).copied().flatten()?;
                let end = self.screen_nodes.get(target).copied().flatten()?;
                let curvature = match self.layout.mode() {
                    LayoutMode::Tree => 0.0,
                    LayoutMode::Force => self.graph.links()[index].curvature.unwrap_or(0.0),
                };
                Some(ScreenLink {
                    index,
                    start: start.center,
                    end: end.center,
                    curvature,
                    width,
                })
            })
            .collect::<Vec<_>>();
        hit_link(&links, pos)
    }

    fn selected_indices(&self) -> Vec<usize> {
        let state = self.selection.state();
        state
            .selected_node_ids
            .iter()
            .filter_map(|id| self.graph.node_index(id))
            .collect()
    }

    fn average_depth(&self, indices: &[usize]) -> f32 {
        let depths = indices
            .iter()
            .filter_map(|&index| self.screen_nodes.get(index).copied().flatten())
            .map(|node| node.depth)
            .collect::<Vec<_>>();
        if depths.is_empty() {
            self.camera.distance()
        } else {
            depths.iter().sum::<f32>() / depths.len() as f32
        }
    }

    fn notify(&mut self, change: SelectionChange) {
        let state = self.selection.state();
        if change.nodes
            && let Some(callback) = self.callbacks.on_selected_nodes_change.as_mut()
        {
            callback(&state.selected_node_ids);
        }
        if change.edges
            && let Some(callback) = self.callbacks.on_selected_edges_change.as_mut()
        {
            callback(&state.selected_edge_ids);
        }
    }

    /// Advances search, layout and camera by one frame and resolves what to draw.
    pub fn frame(&mut self, viewport: Rect, now: Instant, delta_seconds: f32) -> FrameOutput {
        self.viewport = viewport;

        let published = self.searcher.step();
        if let Some(term) = self.debouncer.poll(now).map(str::to_string) {
            self.apply_search(&term);
        } else if published {
            let term = self.debouncer.applied().to_string();
            self.apply_search(&term);
        }

        let layout_moving = self.layout.tick(delta_seconds);
        if self.layout.take_fit_request() && self.pending_zoom.is_none() {
            self.pending_zoom = Some(ZoomCommand::Fit);
        }

        if let Some(command) = self.pending_zoom.take() {
            let node = match command {
                ZoomCommand::ToNode(index) => self.layout.position(index),
                _ => None,
            };
            debug!(?command, "zoom command");
            self.camera.start_zoom(command, self.layout.bounds(), node);
            self.active_zoom = self.camera.is_transitioning().then_some(command);
        }
        if self.camera.update(delta_seconds)
            && let Some(command) = self.active_zoom.take()
            && let Some(callback) = self.callbacks.on_zoom_complete.as_mut()
        {
            callback(command);
        }

        let style = {
            let search = match self.search_matches.as_deref() {
                Some(matches) => SearchView::active(matches),
                None => SearchView::INACTIVE,
            };
            let inputs = StyleInputs {
                selection: self.selection.state(),
                search,
                visibility: &self.visibility,
                layout_mode: self.layout.mode(),
                config: self.config.style,
            };
            resolve_frame(&self.graph, &inputs)
        };

        self.screen_nodes = self
            .layout
            .nodes()
            .iter()
            .zip(&style.nodes)
            .map(|(node, node_style)| {
                self.camera
                    .project(viewport, node.position)
                    .map(|projection| ScreenNode::from_projection(projection, node_style.radius))
            })
            .collect();

        let pending_region = match &self.pointer {
            PointerState::Drawing { origin, points } => Some(match self.selection.mode() {
                SelectionMode::Lasso => Region::Lasso(points.clone()),
                _ => Region::from_corners(*origin, points.last().copied().unwrap_or(*origin)),
            }),
            _ => None,
        };

        FrameOutput {
            style,
            nodes: self.screen_nodes.clone(),
            pending_region,
            layout_moving,
            search_settling: self.debouncer.is_pending() || self.searcher.is_building(),
            surface_ready: self
                .surfaces
                .active()
                .is_some_and(|surface| surface.context().is_some() && !surface.is_disposed()),
        }
    }

}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::graph::normalize;
    use crate::selection::Selected;
    use crate::surface::HeadlessBackend;

    fn controller() -> InteractionController<HeadlessBackend> {
        let mut controller = InteractionController::new(
            EngineConfig::default(),
            HeadlessBackend::default(),
            ViewDimension::Three,
        );
        controller.set_graph(normalize(&json!({
            "nodes": [{"id": "a", "name": "Alice"}, {"id": "b", "name": "Bob"}],
            "links": [{"id": "ab", "source": "a", "target": "b"}],
        })));
        controller
    }

    fn press_release(controller: &mut InteractionController<HeadlessBackend>, pos: Pos2) {
        controller.pointer(PointerEvent::Press {
            pos,
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
        });
        controller.pointer(PointerEvent::Release {
            pos,
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
        });
    }

    #[test]
    fn clicking_a_projected_node_selects_it_and_fires_callback() {
        let mut controller = controller();
        let clicked = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&clicked);
        controller.callbacks_mut().on_node_click =
            Some(Box::new(move |node: &Node| sink.borrow_mut().push(node.id.clone())));

        let frame = controller.frame(default_viewport(), Instant::now(), 1.0 / 60.0);
        let target = frame.nodes[0].expect("node a on screen").center;
        press_release(&mut controller, target);

        assert_eq!(controller.selection().primary, Some(Selected::Node("a".into())));
        assert_eq!(*clicked.borrow(), vec!["a".to_string()]);
    }

    #[test]
    fn zoom_commands_are_one_shot() {
        let mut controller = controller();
        let completed = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&completed);
        controller.callbacks_mut().on_zoom_complete =
            Some(Box::new(move |_| *sink.borrow_mut() += 1));

        let start = Instant::now();
        // Let the initial fit run out first.
        for _ in 0..200 {
            controller.frame(default_viewport(), start, 0.1);
        }
        let before = *completed.borrow();
        controller.key(KeyCommand::ZoomIn);
        for _ in 0..20 {
            controller.frame(default_viewport(), start, 0.1);
        }
        assert_eq!(*completed.borrow(), before + 1);
    }

    #[test]
    fn debounced_search_dims_unmatched_nodes() {
        let mut controller = controller();
        let start = Instant::now();
        controller.frame(default_viewport(), start, 1.0 / 60.0);

        controller.search_input("ali", start);
        let frame = controller.frame(default_viewport(), start + Duration::from_millis(10), 1.0 / 60.0);
        assert!(controller.search_matches().is_none());
        assert_eq!(frame.style.nodes[1].opacity, crate::style::DEFAULT_OPACITY);

        let frame = controller.frame(default_viewport(), start + Duration::from_millis(200), 1.0 / 60.0);
        assert_eq!(controller.search_term(), "ali");
        assert_eq!(frame.style.nodes[1].opacity, crate::style::SEARCH_DIM_OPACITY);
        assert_eq!(frame.style.nodes[0].opacity, crate::style::DEFAULT_OPACITY);
    }

    #[test]
    fn frames_keep_coming_while_search_settles() {
        let mut controller = controller();
        let start = Instant::now();
        let mut frames = 0;
        while controller.frame(default_viewport(), start, 1.0 / 60.0).search_settling {
            frames += 1;
            assert!(frames <= 100, "index never finished");
        }

        controller.search_input("bob", start);
        let frame = controller.frame(default_viewport(), start + Duration::from_millis(10), 1.0 / 60.0);
        assert!(frame.search_settling);

        let frame = controller.frame(default_viewport(), start + Duration::from_millis(200), 1.0 / 60.0);
        assert!(!frame.search_settling);
        assert_eq!(controller.search_term(), "bob");
    }

    #[test]
    fn graph_swap_clears_selection_silently() {
        let mut controller = controller();
        let notified = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&notified);
        controller.set_selection_mode(SelectionMode::Box);
        controller.select_node("a");
        controller.callbacks_mut().on_selected_nodes_change =
            Some(Box::new(move |_: &HashSet<String>| *sink.borrow_mut() += 1));

        controller.set_graph(normalize(&json!({"nodes": [{"id": "z"}]})));
        assert!(controller.selection().is_empty());
        assert_eq!(*notified.borrow(), 0);
        assert_eq!(controller.layout().mode(), LayoutMode::Force);
    }

    #[test]
    fn dimension_switch_registers_a_new_surface() {
        let mut controller = controller();
        let first = controller.register_surface("3D").expect("surface");
        controller.set_dimension(ViewDimension::Two).expect("flat surface");
        let second = controller.surfaces().active().expect("active").id();
        assert_ne!(first, second);
        assert_eq!(controller.surfaces().backend().live_contexts(), 1);
    }
}
