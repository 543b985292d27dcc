mod force;
mod tree;
mod vec3;

use tracing::debug;

use crate::config::{ForceConfig, TreeConfig};
use crate::graph::Graph;
use crate::util::stable_triple;
use force::{ForceScratch, StepParams, step_force};
use tree::{TreeAxes, TreeInput, tree_positions};

pub use vec3::{Axis, Vec3, vec3};

const ALPHA_MIN: f32 = 0.001;
/// Energy the simulation is held at while the user drags nodes.
const DRAG_ALPHA_TARGET: f32 = 0.3;
/// Frames to wait for a layout to settle before a requested fit happens anyway.
const FIT_SETTLE_FRAMES: u32 = 90;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LayoutMode {
    #[default]
    Force,
    Tree,
}

impl LayoutMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Force => "Force",
            Self::Tree => "Tree",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LockedAxes {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl LockedAxes {
    pub fn is_locked(self, axis: Axis) -> bool {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn toggle(&mut self, axis: Axis) {
        match axis {
            Axis::X => self.x = !self.x,
            Axis::Y => self.y = !self.y,
            Axis::Z => self.z = !self.z,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewDimension {
    Two,
    #[default]
    Three,
}

impl ViewDimension {
    pub fn label(self) -> &'static str {
        match self {
            Self::Two => "2D",
            Self::Three => "3D",
        }
    }
}

/// Position state of one node. A set `fx`/`fy`/`fz` pins that coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NodeLayout {
    pub position: Vec3,
    pub velocity: Vec3,
    pub fx: Option<f32>,
    pub fy: Option<f32>,
    pub fz: Option<f32>,
}

impl NodeLayout {
    pub fn pin_at(&mut self, position: Vec3) {
        self.fx = Some(position.x);
        self.fy = Some(position.y);
        self.fz = Some(position.z);
        self.position = position;
        self.velocity = Vec3::ZERO;
    }

    pub fn unpin(&mut self) {
        self.fx = None;
        self.fy = None;
        self.fz = None;
    }

    pub fn is_pinned(&self) -> bool {
        self.fx.is_some() || self.fy.is_some() || self.fz.is_some()
    }

    pub fn is_fully_pinned(&self) -> bool {
        self.fx.is_some() && self.fy.is_some() && self.fz.is_some()
    }

    pub(crate) fn apply_pin(&mut self) {
        if let Some(x) = self.fx {
            self.position.x = x;
        }
        if let Some(y) = self.fy {
            self.position.y = y;
        }
        if let Some(z) = self.fz {
            self.position.z = z;
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct FitRequest {
    pending: bool,
    ready: bool,
    frames_left: u32,
}

/// Node positions for the current graph, driven either by the force simulation or by the
/// deterministic tree layout.
pub struct LayoutEngine {
    mode: LayoutMode,
    locked: LockedAxes,
    dimension: ViewDimension,
    nodes: Vec<NodeLayout>,
    ids: Vec<String>,
    edges: Vec<(usize, usize)>,
    adjacency: Vec<Vec<usize>>,
    is_country: Vec<bool>,
    force_config: ForceConfig,
    tree_config: TreeConfig,
    node_radius: f32,
    alpha: f32,
    dragging: bool,
    fit: FitRequest,
    scratch: ForceScratch,
}

impl LayoutEngine {
    pub fn new(force_config: ForceConfig, tree_config: TreeConfig, dimension: ViewDimension) -> Self {
        Self {
            mode: LayoutMode::Force,
            locked: LockedAxes::default(),
            dimension,
            nodes: Vec::new(),
            ids: Vec::new(),
            edges: Vec::new(),
            adjacency: Vec::new(),
            is_country: Vec::new(),
            force_config,
            tree_config,
            node_radius: 8.0,
            alpha: 1.0,
            dragging: false,
            fit: FitRequest::default(),
            scratch: ForceScratch::default(),
        }
    }

    /// Takes a new graph. Always returns to force mode with fresh, deterministic positions.
    pub fn reset(&mut self, graph: &Graph) {
        let node_count = graph.node_count();
        self.ids = graph.nodes().iter().map(|node| node.id.clone()).collect();
        self.is_country = graph
            .nodes()
            .iter()
            .map(|node| node.node_type == "country" || node.category == "country")
            .collect();
        self.edges = (0..graph.link_count())
            .filter_map(|index| graph.link_endpoints(index))
            .collect();
        self.adjacency = vec![Vec::new(); node_count];
        for &(from, to) in &self.edges {
            if from == to {
                continue;
            }
            self.adjacency[from].push(to);
            self.adjacency[to].push(from);
        }

        let spread = (node_count as f32).sqrt() * self.force_config.link_distance * 0.5 + 1.0;
        let flat = self.is_flat();
        self.nodes = self
            .ids
            .iter()
            .map(|id| {
                let (x, y, z) = stable_triple(id);
                NodeLayout {
                    position: vec3(x, y, if flat { 0.0 } else { z }) * spread,
                    ..NodeLayout::default()
                }
            })
            .collect();

        if self.mode != LayoutMode::Force {
            debug!("graph replaced, layout back to force mode");
        }
        self.mode = LayoutMode::Force;
        self.dragging = false;
        self.alpha = 1.0;
        self.request_fit();
    }

    pub fn mode(&self) -> LayoutMode {
        self.mode
    }

    pub fn locked_axes(&self) -> LockedAxes {
        self.locked
    }

    pub fn dimension(&self) -> ViewDimension {
        self.dimension
    }

    pub fn nodes(&self) -> &[NodeLayout] {
        &self.nodes
    }

    pub fn position(&self, index: usize) -> Option<Vec3> {
        self.nodes.get(index).map(|node| node.position)
    }

    pub fn force_config(&self) -> ForceConfig {
        self.force_config
    }

    pub fn set_force_config(&mut self, config: ForceConfig) {
        if config != self.force_config {
            self.force_config = config;
            self.reheat(0.5);
        }
    }

    pub fn set_node_radius(&mut self, radius: f32) {
        self.node_radius = radius.max(0.1);
    }

    pub fn set_mode(&mut self, mode: LayoutMode) {
        if mode == self.mode {
            return;
        }

        debug!(from = ?self.mode, to = ?mode, "layout mode changed");
        self.mode = mode;
        match mode {
            LayoutMode::Tree => self.apply_tree(),
            LayoutMode::Force => self.release_tree(),
        }
        self.request_fit();
    }

    pub fn set_locked_axes(&mut self, locked: LockedAxes) {
        if locked == self.locked {
            return;
        }
        self.locked = locked;
        if self.mode == LayoutMode::Tree {
            self.apply_tree();
            self.request_fit();
        }
    }

    pub fn set_dimension(&mut self, dimension: ViewDimension) {
        if dimension == self.dimension {
            return;
        }
        self.dimension = dimension;

        match self.mode {
            LayoutMode::Tree => self.apply_tree(),
            LayoutMode::Force if dimension == ViewDimension::Two => {
                for node in &mut self.nodes {
                    node.position.z = 0.0;
                    node.velocity.z = 0.0;
                    if node.fz.is_some() {
                        node.fz = Some(0.0);
                    }
                }
                self.reheat(0.5);
            }
            LayoutMode::Force => {
                for (node, id) in self.nodes.iter_mut().zip(&self.ids) {
                    if node.fz.is_none() {
                        node.velocity.z = stable_triple(id).2 * self.force_config.max_speed * 0.5;
                    }
                }
                self.reheat(0.5);
            }
        }
        self.request_fit();
    }

    /// Runs one frame of the active layout. Returns whether anything moved.
    pub fn tick(&mut self, delta_seconds: f32) -> bool {
        let moving = self.mode == LayoutMode::Force && self.simulate(delta_seconds);

        if self.fit.pending {
            if !moving || self.fit.frames_left == 0 {
                self.fit.pending = false;
                self.fit.ready = true;
            } else {
                self.fit.frames_left -= 1;
            }
        }
        moving
    }

    fn simulate(&mut self, delta_seconds: f32) -> bool {
        let has_free = self.nodes.iter().any(|node| !node.is_fully_pinned());
        if !has_free || (self.alpha < ALPHA_MIN && !self.dragging) {
            return false;
        }

        let params = StepParams {
            alpha: self.alpha,
            delta_seconds,
            node_radius: self.node_radius,
            flat: self.is_flat(),
        };
        let moved = step_force(
            &mut self.nodes,
            &self.edges,
            self.force_config,
            params,
            &mut self.scratch,
        );

        let target = if self.dragging { DRAG_ALPHA_TARGET } else { 0.0 };
        self.alpha += (target - self.alpha) * self.force_config.clamped().alpha_decay;
        moved
    }

    /// Whether the layout asked for a zoom-to-fit and has now settled. Consumes the request.
    pub fn take_fit_request(&mut self) -> bool {
        std::mem::take(&mut self.fit.ready)
    }

    pub fn request_fit(&mut self) {
        self.fit = FitRequest {
            pending: true,
            ready: false,
            frames_left: FIT_SETTLE_FRAMES,
        };
    }

    pub fn reheat(&mut self, alpha: f32) {
        self.alpha = self.alpha.max(alpha.clamp(0.0, 1.0));
    }

    pub fn begin_drag(&mut self, index: usize) {
        let Some(node) = self.nodes.get_mut(index) else {
            return;
        };
        let position = node.position;
        node.pin_at(position);
        self.dragging = true;
        self.reheat(DRAG_ALPHA_TARGET);
    }

    pub fn drag_to(&mut self, index: usize, position: Vec3) {
        let flat = self.is_flat();
        let Some(node) = self.nodes.get_mut(index) else {
            return;
        };
        let mut position = position;
        if flat {
            position.z = 0.0;
        }
        node.pin_at(position);
    }

    /// Ends a node drag. Force mode lets the node go again; tree mode keeps it where it was put.
    pub fn end_drag(&mut self, index: usize) {
        self.end_group_drag(&[index]);
    }

    /// Moves a group of nodes by `delta`, pinning each at its new position.
    pub fn translate_nodes(&mut self, indices: &[usize], delta: Vec3) {
        let mut delta = delta;
        if self.is_flat() {
            delta.z = 0.0;
        }
        for &index in indices {
            if let Some(node) = self.nodes.get_mut(index) {
                let position = node.position + delta;
                node.pin_at(position);
            }
        }
        self.dragging = true;
        self.reheat(DRAG_ALPHA_TARGET);
    }

    pub fn end_group_drag(&mut self, indices: &[usize]) {
        self.dragging = false;
        if self.mode != LayoutMode::Force {
            return;
        }
        for &index in indices {
            if let Some(node) = self.nodes.get_mut(index) {
                node.unpin();
            }
        }
    }

    /// Axis-aligned bounds of every node, `None` for an empty layout.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = self.nodes.first()?.position;
        Some(self.nodes.iter().fold((first, first), |(min, max), node| {
            (min.min(node.position), max.max(node.position))
        }))
    }

    fn is_flat(&self) -> bool {
        self.dimension == ViewDimension::Two
    }

    fn axis_free(&self, axis: Axis) -> bool {
        !self.locked.is_locked(axis) && !(axis == Axis::Z && self.is_flat())
    }

    fn apply_tree(&mut self) {
        let axes = TreeAxes::from_free(|axis| self.axis_free(axis));
        let current = self.nodes.iter().map(|node| node.position).collect::<Vec<_>>();
        let positions = tree_positions(
            &TreeInput {
                adjacency: &self.adjacency,
                is_country: &self.is_country,
                positions: &current,
            },
            axes,
            &self.tree_config,
        );

        for (node, position) in self.nodes.iter_mut().zip(positions) {
            node.pin_at(position);
        }
        self.dragging = false;
    }

    /// Unpins every node and gives each a deterministic nudge so the simulation restarts from
    /// the tree shape instead of sitting in it.
    fn release_tree(&mut self) {
        let kick = self.force_config.max_speed * 0.5;
        let flat = self.is_flat();
        for (node, id) in self.nodes.iter_mut().zip(&self.ids) {
            node.unpin();
            let (x, y, z) = stable_triple(id);
            node.velocity = vec3(x, y, if flat { 0.0 } else { z }) * kick;
        }
        self.alpha = 1.0;
    }
}
