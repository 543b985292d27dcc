use std::collections::HashSet;

use eframe::egui::Color32;
use serde_json::Value;

use crate::config::StyleConfig;
use crate::graph::{DEFAULT_LINK_COLOR, Graph, Link, Node, category_color, palette_color};
use crate::layout::LayoutMode;
use crate::selection::SelectionState;

pub const SELECTED_NODE_COLOR: Color32 = Color32::from_rgb(0xFF, 0xD4, 0x3B);
pub const SELECTED_LINK_COLOR: Color32 = Color32::WHITE;
pub const HIDDEN_COLOR: Color32 = Color32::from_rgb(0x40, 0x40, 0x40);
pub const SEARCH_DIM_COLOR: Color32 = Color32::from_rgb(0x2A, 0x2A, 0x2A);

pub const SELECTED_OPACITY: f32 = 1.0;
pub const DEFAULT_OPACITY: f32 = 0.9;
pub const SEARCH_DIM_OPACITY: f32 = 0.3;
pub const SELECTED_SCALE: f32 = 2.5;

const BASE_NODE_RADIUS: f32 = 4.0;
const NODE_RADIUS_RANGE: f32 = 8.0;
const MIN_LINK_WIDTH: f32 = 0.15;

pub fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

/// Pulls a color towards its own gray level, `amount` 1.0 being fully gray.
pub fn desaturate(color: Color32, amount: f32) -> Color32 {
    let luma = (color.r() as f32 * 0.299) + (color.g() as f32 * 0.587) + (color.b() as f32 * 0.114);
    let gray = Color32::from_rgba_unmultiplied(luma as u8, luma as u8, luma as u8, color.a());
    blend_color(color, gray, amount)
}

pub fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let [r, g, b, _] = color.to_srgba_unmultiplied();
    Color32::from_rgba_unmultiplied(r, g, b, (opacity.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn search_dimmed(color: Color32) -> Color32 {
    blend_color(desaturate(color, 0.8), SEARCH_DIM_COLOR, 0.6)
}

/// Categories the user switched off. Hidden nodes stay in the scene, drawn in a flat gray.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisibilityState {
    hidden_categories: HashSet<String>,
}

impl VisibilityState {
    pub fn is_hidden(&self, category: &str) -> bool {
        self.hidden_categories.contains(category)
    }

    pub fn set_hidden(&mut self, category: &str, hidden: bool) {
        if hidden {
            self.hidden_categories.insert(category.to_string());
        } else {
            self.hidden_categories.remove(category);
        }
    }

    pub fn toggle(&mut self, category: &str) {
        let hidden = self.is_hidden(category);
        self.set_hidden(category, !hidden);
    }

    pub fn show_all(&mut self) {
        self.hidden_categories.clear();
    }

}

/// The search side of styling: whether a term is active and which nodes it matched.
#[derive(Clone, Copy, Debug)]
pub struct SearchView<'a> {
    matches: Option<&'a HashSet<String>>,
}

impl<'a> SearchView<'a> {
    pub const INACTIVE: SearchView<'static> = SearchView { matches: None };

    pub fn active(matches: &'a HashSet<String>) -> Self {
        Self {
            matches: Some(matches),
        }
    }

    /// True only when a search is active and `id` is not among its matches.
    pub fn dims(&self, id: &str) -> bool {
        self.matches.is_some_and(|matches| !matches.contains(id))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct StyleInputs<'a> {
    pub selection: &'a SelectionState,
    pub search: SearchView<'a>,
    pub visibility: &'a VisibilityState,
    pub layout_mode: LayoutMode,
    pub config: StyleConfig,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStyle {
    pub color: Color32,
    pub radius: f32,
    pub opacity: f32,
    pub is_selected: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkStyle {
    pub color: Color32,
    pub source_color: Color32,
    pub target_color: Color32,
    pub width: f32,
    pub opacity: f32,
    pub is_selected: bool,
    pub curvature: f32,
}

pub fn base_node_radius(config: &StyleConfig) -> f32 {
    BASE_NODE_RADIUS + (config.node_size.clamp(0.0, 100.0) / 100.0) * NODE_RADIUS_RANGE
}

pub fn base_link_width(config: &StyleConfig) -> f32 {
    MIN_LINK_WIDTH + config.edge_thickness.clamp(0.0, 100.0) / 100.0
}

/// Node attributes. Selection beats a hidden category, which beats search dimming.
pub fn node_style(node: &Node, inputs: &StyleInputs<'_>) -> NodeStyle {
    let radius = base_node_radius(&inputs.config);
    let base = category_color(&node.category);

    if inputs.selection.is_node_selected(&node.id) {
        return NodeStyle {
            color: SELECTED_NODE_COLOR,
            radius: radius * SELECTED_SCALE,
            opacity: SELECTED_OPACITY,
            is_selected: true,
        };
    }

    let (color, opacity) = if inputs.visibility.is_hidden(&node.category) {
        (HIDDEN_COLOR, DEFAULT_OPACITY)
    } else if inputs.search.dims(&node.id) {
        (search_dimmed(base), SEARCH_DIM_OPACITY)
    } else {
        (base, DEFAULT_OPACITY)
    };

    NodeStyle {
        color,
        radius,
        opacity,
        is_selected: false,
    }
}

fn link_base_color(link: &Link) -> Color32 {
    link.properties
        .get("category")
        .and_then(Value::as_str)
        .and_then(palette_color)
        .unwrap_or(DEFAULT_LINK_COLOR)
}

/// Link attributes under the same precedence as nodes. A link is hidden or dimmed when either
/// endpoint is.
pub fn link_style(link: &Link, graph: &Graph, inputs: &StyleInputs<'_>) -> LinkStyle {
    let width = base_link_width(&inputs.config);
    let curvature = match inputs.layout_mode {
        LayoutMode::Tree => 0.0,
        LayoutMode::Force => link.curvature.unwrap_or(0.0),
    };

    if inputs.selection.is_link_selected(&link.id) {
        return LinkStyle {
            color: SELECTED_LINK_COLOR,
            source_color: SELECTED_LINK_COLOR,
            target_color: SELECTED_LINK_COLOR,
            width: width * SELECTED_SCALE,
            opacity: SELECTED_OPACITY,
            is_selected: true,
            curvature,
        };
    }

    let source = graph.node(&link.source_id);
    let target = graph.node(&link.target_id);
    let endpoint_hidden = |node: Option<&Node>| {
        node.is_some_and(|node| inputs.visibility.is_hidden(&node.category))
    };

    if endpoint_hidden(source) || endpoint_hidden(target) {
        return LinkStyle {
            color: HIDDEN_COLOR,
            source_color: HIDDEN_COLOR,
            target_color: HIDDEN_COLOR,
            width,
            opacity: DEFAULT_OPACITY,
            is_selected: false,
            curvature,
        };
    }

    let base = link_base_color(link);
    let source_color = source.map_or(base, |node| category_color(&node.category));
    let target_color = target.map_or(base, |node| category_color(&node.category));

    if inputs.search.dims(&link.source_id) || inputs.search.dims(&link.target_id) {
        return LinkStyle {
            color: search_dimmed(base),
            source_color: search_dimmed(source_color),
            target_color: search_dimmed(target_color),
            width,
            opacity: SEARCH_DIM_OPACITY,
            is_selected: false,
            curvature,
        };
    }

    LinkStyle {
        color: base,
        source_color,
        target_color,
        width,
        opacity: DEFAULT_OPACITY,
        is_selected: false,
        curvature,
    }
}

/// Styles for every node and link of a graph, indexed like `graph.nodes()` and `graph.links()`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameStyle {
    pub nodes: Vec<NodeStyle>,
    pub links: Vec<LinkStyle>,
}

pub fn resolve_frame(graph: &Graph, inputs: &StyleInputs<'_>) -> FrameStyle {
    FrameStyle {
        nodes: graph
            .nodes()
            .iter()
            .map(|node| node_style(node, inputs))
            .collect(),
        links: graph
            .links()
            .iter()
            .map(|link| link_style(link, graph, inputs))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::graph::normalize;
    use crate::selection::{SelectionEngine, SelectionMode};

    fn graph() -> Graph {
        normalize(&json!({
            "nodes": [
                {"id": "a", "name": "Alice", "category": "person"},
                {"id": "b", "name": "Acme", "category": "organization"},
            ],
            "links": [{"id": "ab", "source": "a", "target": "b", "category": "funding"}],
        }))
    }

    fn inputs<'a>(
        selection: &'a SelectionState,
        search: SearchView<'a>,
        visibility: &'a VisibilityState,
    ) -> StyleInputs<'a> {
        StyleInputs {
            selection,
            search,
            visibility,
            layout_mode: LayoutMode::Force,
            config: StyleConfig::default(),
        }
    }

    #[test]
    fn default_styles_use_palette_and_opacity() {
        let graph = graph();
        let selection = SelectionState::default();
        let visibility = VisibilityState::default();
        let frame = resolve_frame(&graph, &inputs(&selection, SearchView::INACTIVE, &visibility));

        assert_eq!(frame.nodes[0].color, category_color("person"));
        assert_eq!(frame.nodes[0].opacity, DEFAULT_OPACITY);
        assert_eq!(frame.links[0].color, category_color("funding"));
        assert_eq!(frame.links[0].source_color, category_color("person"));
        assert!((frame.links[0].width - 0.4).abs() < 1e-6);
    }

    #[test]
    fn selection_beats_hidden_category() {
        let graph = graph();
        let mut engine = SelectionEngine::new();
        engine.click_node(&graph, "a");
        let mut visibility = VisibilityState::default();
        visibility.set_hidden("person", true);

        let style = node_style(
            &graph.nodes()[0],
            &inputs(engine.state(), SearchView::INACTIVE, &visibility),
        );
        assert!(style.is_selected);
        assert_eq!(style.color, SELECTED_NODE_COLOR);
        assert_eq!(style.opacity, SELECTED_OPACITY);
        assert_eq!(style.radius, base_node_radius(&StyleConfig::default()) * SELECTED_SCALE);
    }

    #[test]
    fn hidden_category_beats_search_dimming() {
        let graph = graph();
        let selection = SelectionState::default();
        let mut visibility = VisibilityState::default();
        visibility.set_hidden("organization", true);
        let matches = HashSet::new();

        let frame = resolve_frame(
            &graph,
            &inputs(&selection, SearchView::active(&matches), &visibility),
        );
        assert_eq!(frame.nodes[1].color, HIDDEN_COLOR);
        assert_eq!(frame.nodes[1].opacity, DEFAULT_OPACITY);
        assert_eq!(frame.links[0].color, HIDDEN_COLOR);
        assert_eq!(frame.nodes[0].opacity, SEARCH_DIM_OPACITY);
    }

    #[test]
    fn links_dim_when_either_endpoint_misses_the_search() {
        let graph = graph();
        let selection = SelectionState::default();
        let visibility = VisibilityState::default();
        let matches = HashSet::from(["a".to_string()]);

        let frame = resolve_frame(
            &graph,
            &inputs(&selection, SearchView::active(&matches), &visibility),
        );
        assert_eq!(frame.nodes[0].opacity, DEFAULT_OPACITY);
        assert_eq!(frame.nodes[1].opacity, SEARCH_DIM_OPACITY);
        assert_eq!(frame.links[0].opacity, SEARCH_DIM_OPACITY);
    }

    #[test]
    fn selected_links_are_wider_and_tree_mode_straightens() {
        let graph = normalize(&json!({
            "nodes": [{"id": "a"}, {"id": "b"}],
            "links": [{"source": "a", "target": "b"}, {"source": "a", "target": "b"}],
        }));
        let mut engine = SelectionEngine::new();
        engine.set_mode(SelectionMode::Box);
        engine.click_link(&graph, "a->b");
        let visibility = VisibilityState::default();

        let mut style_inputs = inputs(engine.state(), SearchView::INACTIVE, &visibility);
        let frame = resolve_frame(&graph, &style_inputs);
        assert!(frame.links[0].is_selected);
        assert_eq!(frame.links[0].width, base_link_width(&StyleConfig::default()) * SELECTED_SCALE);
        assert_eq!(frame.links[1].curvature, 0.75);

        style_inputs.layout_mode = LayoutMode::Tree;
        let frame = resolve_frame(&graph, &style_inputs);
        assert!(frame.links.iter().all(|link| link.curvature == 0.0));
    }

    #[test]
    fn widths_stay_positive_for_any_thickness() {
        for thickness in [-50.0, 0.0, 100.0, 400.0] {
            let config = StyleConfig {
                edge_thickness: thickness,
                ..StyleConfig::default()
            };
            assert!(base_link_width(&config) > 0.0);
        }
    }
}
