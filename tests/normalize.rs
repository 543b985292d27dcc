use graph_lens::config::PayloadLimits;
use graph_lens::graph::{normalize, normalize_str, normalize_with_limits};
use serde_json::json;

#[test]
fn alice_and_bob_share_one_link() {
    let payload = json!({
        "nodes": [{"id": "a", "name": "Alice"}, {"id": "b", "name": "Bob"}],
        "links": [{"source": "a", "target": "b", "label": "knows"}],
    });
    let graph = normalize(&payload);
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.link_count(), 1);

    let link = &graph.links()[0];
    assert_eq!(link.source_name, "Alice");
    assert_eq!(link.target_name, "Bob");
    assert_eq!(link.label, "knows");

    let without_bob = json!({
        "nodes": [{"id": "a", "name": "Alice"}],
        "links": [{"source": "a", "target": "b", "label": "knows"}],
    });
    let graph = normalize(&without_bob);
    assert_eq!(graph.node_count(), 1);
    assert_eq!(graph.link_count(), 0);
}

#[test]
fn legacy_array_form_matches_object_form() {
    let nodes = json!([
        {"gid": 1, "Entity Name": "Department of Energy", "labels": ["Agency"]},
        {"gid": 2, "name": "Grant 42", "node_type": "Funding", "Amount": 1250000},
    ]);
    let links = json!([
        {"from_gid": 1, "to_gid": 2, "relationship_summary": "awarded", "article_url": "https://example.org/a"},
    ]);

    let object_form = normalize(&json!({"nodes": nodes, "links": links}));
    let legacy_form = normalize(&json!([{"nodes": nodes}, {"links": links}]));
    assert_eq!(object_form, legacy_form);

    let grant = object_form.node("2").expect("grant node");
    assert_eq!(grant.node_type, "funding");
    assert_eq!(grant.display_label(), "$1,250,000");

    let agency = object_form.node("1").expect("agency node");
    assert_eq!(agency.name, "Department of Energy");
    assert_eq!(agency.node_type, "agency");

    let link = &object_form.links()[0];
    assert_eq!(link.label, "awarded");
    assert_eq!(link.url.as_deref(), Some("https://example.org/a"));
}

#[test]
fn normalizing_the_wire_form_is_a_fixed_point() {
    let payload = json!({
        "nodes": [
            {"id": "x", "title": "Acme University", "highlight": true},
            {"elementId": "y", "entity_name": "Jane Roe", "nodeType": "Person"},
            {"id": "z", "name": "Solar Program"},
        ],
        "links": [
            {"source": "x", "target": "y", "type": "EMPLOYS"},
            {"source": "y", "target": "x", "relationship_type": "WORKS_AT"},
            {"id": "e3", "sourceId": "x", "targetId": "z", "curvature": 0.2, "weight": 3},
        ],
    });

    let once = normalize(&payload);
    let twice = normalize(&once.to_wire());
    assert_eq!(once, twice);
    assert_eq!(twice.link_count(), 3);
}

#[test]
fn parallel_links_get_distinct_curvatures() {
    let graph = normalize(&json!({
        "nodes": [{"id": "a"}, {"id": "b"}],
        "links": [
            {"source": "a", "target": "b"},
            {"source": "b", "target": "a"},
            {"source": "a", "target": "b", "curvature": -0.3},
        ],
    }));

    let curvatures = graph
        .links()
        .iter()
        .map(|link| link.curvature)
        .collect::<Vec<_>>();
    assert_eq!(curvatures[2], Some(-0.3));
    assert!(curvatures[0].is_some() && curvatures[1].is_some());
    assert_ne!(curvatures[0], curvatures[1]);
    assert_ne!(graph.links()[0].id, graph.links()[1].id);
}

#[test]
fn malformed_payloads_give_an_empty_graph() {
    assert!(normalize(&json!("nope")).is_empty());
    assert!(normalize(&json!({"vertices": []})).is_empty());
    assert!(normalize(&json!({"nodes": 3})).is_empty());
    assert!(normalize_str("{ not json").is_empty());
    assert!(normalize(&serde_json::Value::Null).is_empty());
}

#[test]
fn large_payloads_are_capped() {
    let limits = PayloadLimits {
        threshold: 4,
        max_nodes: 3,
        max_links: 1,
    };
    let nodes = (0..6).map(|i| json!({"id": format!("n{i}")})).collect::<Vec<_>>();
    let links = (0..5)
        .map(|i| json!({"source": format!("n{i}"), "target": format!("n{}", i + 1)}))
        .collect::<Vec<_>>();

    let graph = normalize_with_limits(&json!({"nodes": nodes, "links": links}), &limits);
    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.link_count(), 1);
    assert_eq!(graph.links()[0].source_id, "n0");
}

#[test]
fn links_without_ids_survive_next_to_explicit_lookalikes() {
    let graph = normalize(&json!({
        "nodes": [{"id": "a"}, {"id": "b"}],
        "links": [
            {"id": "a->b", "source": "a", "target": "b"},
            {"source": "a", "target": "b"},
        ],
    }));
    assert_eq!(graph.link_count(), 2);
    assert_eq!(graph.links()[0].id, "a->b");
    assert_ne!(graph.links()[1].id, "a->b");

    let again = normalize(&graph.to_wire());
    assert_eq!(again, graph);
}
