use std::collections::HashSet;

use eframe::egui::pos2;
use graph_lens::graph::{Graph, normalize};
use graph_lens::selection::{EdgeRef, Region, Selected, SelectionEngine, SelectionMode};
use serde_json::json;

fn triangle_with_tail() -> Graph {
    normalize(&json!({
        "nodes": [{"id": "a"}, {"id": "b"}, {"id": "c"}, {"id": "d"}],
        "links": [
            {"id": "ab", "source": "a", "target": "b"},
            {"id": "bc", "source": "b", "target": "c"},
            {"id": "ca", "source": "c", "target": "a"},
            {"id": "cd", "source": "c", "target": "d"},
        ],
    }))
}

#[test]
fn individual_mode_never_fills_the_id_sets() {
    let graph = triangle_with_tail();
    let mut engine = SelectionEngine::new();

    engine.click_node(&graph, "c");
    let state = engine.state();
    assert_eq!(state.primary, Some(Selected::Node("c".into())));
    assert!(state.selected_node_ids.is_empty());
    assert!(state.derived_subgraph.is_none());

    let positions = vec![Some(pos2(0.0, 0.0)); graph.node_count()];
    let change = engine.select_region(
        &graph,
        Region::from_corners(pos2(-5.0, -5.0), pos2(5.0, 5.0)),
        &positions,
        false,
    );
    assert!(!change.any());
}

#[test]
fn multi_mode_click_selects_the_induced_neighborhood() {
    let graph = triangle_with_tail();
    let mut engine = SelectionEngine::new();
    engine.set_mode(SelectionMode::Lasso);

    engine.click_node(&graph, "d");
    let state = engine.state();
    let subgraph = state.derived_subgraph.as_ref().expect("subgraph");
    assert_eq!(subgraph.node_count(), 2);
    assert_eq!(subgraph.link_count(), 1);
    for link in subgraph.links() {
        assert!(subgraph.contains_node(&link.source_id));
        assert!(subgraph.contains_node(&link.target_id));
    }
    assert_eq!(
        state.selected_node_ids,
        ["c", "d"].into_iter().map(String::from).collect::<HashSet<_>>()
    );
}

#[test]
fn switching_modes_clears_everything() {
    let graph = triangle_with_tail();
    let mut engine = SelectionEngine::new();
    engine.set_mode(SelectionMode::Box);
    engine.click_link(&graph, "ab");
    assert!(!engine.state().is_empty());

    let change = engine.set_mode(SelectionMode::Individual);
    assert!(change.nodes && change.edges);
    assert!(engine.state().is_empty());
}

#[test]
fn lasso_selects_enclosed_nodes_and_links_between_them() {
    let graph = triangle_with_tail();
    let mut engine = SelectionEngine::new();
    engine.set_mode(SelectionMode::Lasso);

    let positions = vec![
        Some(pos2(10.0, 10.0)),
        Some(pos2(20.0, 10.0)),
        Some(pos2(15.0, 20.0)),
        Some(pos2(80.0, 80.0)),
    ];
    let lasso = Region::Lasso(vec![
        pos2(0.0, 0.0),
        pos2(30.0, 0.0),
        pos2(30.0, 30.0),
        pos2(0.0, 30.0),
    ]);
    engine.select_region(&graph, lasso, &positions, false);

    let state = engine.state();
    assert_eq!(state.selected_node_ids.len(), 3);
    assert_eq!(
        state.selected_edge_ids,
        ["ab", "bc", "ca"].into_iter().map(String::from).collect::<HashSet<_>>()
    );
    assert!(engine.region_contains(pos2(15.0, 15.0)));

    // Additive selection keeps what was there.
    let far = Region::from_corners(pos2(70.0, 70.0), pos2(90.0, 90.0));
    engine.select_region(&graph, far, &positions, true);
    assert_eq!(engine.state().selected_node_ids.len(), 4);
    assert!(engine.state().selected_edge_ids.contains("cd"));
}

#[test]
fn edges_without_ids_match_by_endpoints_and_curvature() {
    let graph = normalize(&json!({
        "nodes": [{"id": "a"}, {"id": "b"}],
        "links": [
            {"source": "a", "target": "b", "curvature": 0.5},
            {"source": "a", "target": "b", "curvature": 0.75},
        ],
    }));
    let mut engine = SelectionEngine::new();

    engine.click_edge_ref(&graph, &EdgeRef::without_id("a", "b", Some(0.755)));
    assert_eq!(
        engine.state().primary,
        Some(Selected::Link(graph.links()[1].id.clone()))
    );

    let ambiguous = EdgeRef::without_id("a", "b", None);
    assert!(!ambiguous.same_edge(&EdgeRef::without_id("a", "b", None)));
}
