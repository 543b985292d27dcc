mod edge_identity;
mod geometry;

use std::collections::HashSet;

use eframe::egui::Pos2;
use tracing::debug;

use crate::graph::Graph;

pub use edge_identity::{CURVATURE_EPSILON, EdgeRef, resolve_edge_ref};
pub use geometry::{Region, point_in_polygon};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SelectionMode {
    #[default]
    Individual,
    Box,
    Lasso,
}

impl SelectionMode {
    pub const ALL: [Self; 3] = [Self::Individual, Self::Box, Self::Lasso];

    pub fn next(self) -> Self {
        match self {
            Self::Individual => Self::Box,
            Self::Box => Self::Lasso,
            Self::Lasso => Self::Individual,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Individual => "Individual",
            Self::Box => "Box",
            Self::Lasso => "Lasso",
        }
    }

    pub fn is_multi(self) -> bool {
        !matches!(self, Self::Individual)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Selected {
    Node(String),
    Link(String),
}

#[derive(Clone, Debug, Default)]
pub struct SelectionState {
    pub mode: SelectionMode,
    pub selected_node_ids: HashSet<String>,
    pub selected_edge_ids: HashSet<String>,
    pub primary: Option<Selected>,
    pub derived_subgraph: Option<Graph>,
}

impl SelectionState {
    pub fn is_empty(&self) -> bool {
        self.selected_node_ids.is_empty()
            && self.selected_edge_ids.is_empty()
            && self.primary.is_none()
            && self.derived_subgraph.is_none()
    }

    pub fn is_node_selected(&self, id: &str) -> bool {
        self.selected_node_ids.contains(id)
            || matches!(&self.primary, Some(Selected::Node(primary)) if primary == id)
    }

    pub fn is_link_selected(&self, id: &str) -> bool {
        self.selected_edge_ids.contains(id)
            || matches!(&self.primary, Some(Selected::Link(primary)) if primary == id)
    }
}

/// Which parts of the selection an operation touched, so callers only notify what changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectionChange {
    pub nodes: bool,
    pub edges: bool,
    pub primary: bool,
}

impl SelectionChange {
    pub fn any(self) -> bool {
        self.nodes || self.edges || self.primary
    }
}

#[derive(Debug, Default)]
pub struct SelectionEngine {
    state: SelectionState,
    last_region: Option<Region>,
}

impl SelectionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn mode(&self) -> SelectionMode {
        self.state.mode
    }

    pub fn last_region(&self) -> Option<&Region> {
        self.last_region.as_ref()
    }

    /// Switches mode. Every actual transition clears the whole selection.
    pub fn set_mode(&mut self, mode: SelectionMode) -> SelectionChange {
        if mode == self.state.mode {
            return SelectionChange::default();
        }

        debug!(from = ?self.state.mode, to = ?mode, "selection mode changed");
        let change = self.clear();
        self.state.mode = mode;
        change
    }

    pub fn cycle_mode(&mut self) -> SelectionChange {
        self.set_mode(self.state.mode.next())
    }

    pub fn clear(&mut self) -> SelectionChange {
        let change = SelectionChange {
            nodes: !self.state.selected_node_ids.is_empty(),
            edges: !self.state.selected_edge_ids.is_empty(),
            primary: self.state.primary.is_some() || self.state.derived_subgraph.is_some(),
        };
        self.state.selected_node_ids.clear();
        self.state.selected_edge_ids.clear();
        self.state.primary = None;
        self.state.derived_subgraph = None;
        self.last_region = None;
        change
    }

    /// Drops everything that referred to the previous graph. Stays silent: nothing is reported.
    pub fn reset_for_graph(&mut self) {
        self.clear();
    }

    pub fn click_node(&mut self, graph: &Graph, id: &str) -> SelectionChange {
        if !graph.contains_node(id) {
            return SelectionChange::default();
        }

        let primary = Some(Selected::Node(id.to_string()));
        if !self.state.mode.is_multi() {
            return self.set_primary(primary);
        }

        let subgraph = graph.neighborhood(id);
        self.replace_with_subgraph(subgraph, primary)
    }

    pub fn click_link(&mut self, graph: &Graph, id: &str) -> SelectionChange {
        let Some(link) = graph.link(id) else {
            return SelectionChange::default();
        };

        let primary = Some(Selected::Link(id.to_string()));
        if !self.state.mode.is_multi() {
            return self.set_primary(primary);
        }

        let subgraph = graph.induced_subgraph(
            [link.source_id.as_str(), link.target_id.as_str()],
            [link.id.as_str()],
        );
        self.replace_with_subgraph(subgraph, primary)
    }

    /// Selects through an edge reference that may lack an id.
    pub fn click_edge_ref(&mut self, graph: &Graph, edge: &EdgeRef) -> SelectionChange {
        match resolve_edge_ref(graph, edge) {
            Some(link) => {
                let id = link.id.clone();
                self.click_link(graph, &id)
            }
            None => SelectionChange::default(),
        }
    }

    pub fn click_empty(&mut self) -> SelectionChange {
        self.clear()
    }

    /// Selects every node whose projected position lies in `region`, plus the links whose two
    /// endpoints are selected. `screen_positions` is indexed like `graph.nodes()`; `None` marks a
    /// node that is not on screen. With `additive` the result is merged into the current sets.
    pub fn select_region(
        &mut self,
        graph: &Graph,
        region: Region,
        screen_positions: &[Option<Pos2>],
        additive: bool,
    ) -> SelectionChange {
        if !self.state.mode.is_multi() {
            return SelectionChange::default();
        }

        let mut node_ids = if additive {
            self.state.selected_node_ids.clone()
        } else {
            HashSet::new()
        };
        for (node, position) in graph.nodes().iter().zip(screen_positions) {
            if let Some(position) = position
                && region.contains(*position)
            {
                node_ids.insert(node.id.clone());
            }
        }

        let mut edge_ids = if additive {
            self.state.selected_edge_ids.clone()
        } else {
            HashSet::new()
        };
        for link in graph.links() {
            if node_ids.contains(&link.source_id) && node_ids.contains(&link.target_id) {
                edge_ids.insert(link.id.clone());
            }
        }

        debug!(
            nodes = node_ids.len(),
            edges = edge_ids.len(),
            additive,
            "region selection"
        );

        let subgraph = graph.induced_subgraph(
            node_ids.iter().map(String::as_str),
            edge_ids.iter().map(String::as_str),
        );
        let primary = if additive { self.state.primary.clone() } else { None };
        let change = self.apply(node_ids, edge_ids, primary, Some(subgraph));
        self.last_region = Some(region);
        change
    }

    /// Moves the remembered region along with a drag of the selected nodes.
    pub fn translate_region(&mut self, delta: eframe::egui::Vec2) {
        if let Some(region) = self.last_region.as_mut() {
            region.translate(delta);
        }
    }

    pub fn region_contains(&self, point: Pos2) -> bool {
        self.last_region
            .as_ref()
            .is_some_and(|region| region.contains(point))
    }

    fn set_primary(&mut self, primary: Option<Selected>) -> SelectionChange {
        self.apply(HashSet::new(), HashSet::new(), primary, None)
    }

    fn replace_with_subgraph(
        &mut self,
        subgraph: Graph,
        primary: Option<Selected>,
    ) -> SelectionChange {
        let node_ids = subgraph.nodes().iter().map(|node| node.id.clone()).collect();
        let edge_ids = subgraph.links().iter().map(|link| link.id.clone()).collect();
        self.last_region = None;
        self.apply(node_ids, edge_ids, primary, Some(subgraph))
    }

    fn apply(
        &mut self,
        node_ids: HashSet<String>,
        edge_ids: HashSet<String>,
        primary: Option<Selected>,
        subgraph: Option<Graph>,
    ) -> SelectionChange {
        let change = SelectionChange {
            nodes: node_ids != self.state.selected_node_ids,
            edges: edge_ids != self.state.selected_edge_ids,
            primary: primary != self.state.primary
                || subgraph.is_some() != self.state.derived_subgraph.is_some(),
        };

        self.state.selected_node_ids = node_ids;
        self.state.selected_edge_ids = edge_ids;
        self.state.primary = primary;
        self.state.derived_subgraph = subgraph;
        change
    }
}
