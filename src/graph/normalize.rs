use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::aliases::{
    LINK_ID_KEYS, LINK_LABEL_KEYS, LINK_SOURCE_KEYS, LINK_TARGET_KEYS, LINK_TITLE_KEYS,
    LINK_TYPE_KEYS, LINK_URL_KEYS, NODE_CATEGORY_KEYS, NODE_ID_KEYS, NODE_NAME_KEYS,
    NODE_TYPE_KEYS, resolve_alias, scalar_text,
};
use super::category::infer_category;
use super::{Graph, Link, Node};
use crate::config::PayloadLimits;
use crate::error::EngineError;
use crate::util::normalize_type_key;

const CURVATURE_KEY: &str = "curvature";

/// Normalizes a raw payload with the default payload limits.
pub fn normalize(raw: &Value) -> Graph {
    normalize_with_limits(raw, &PayloadLimits::default())
}

/// Parses and normalizes a JSON document. Unparseable text yields an empty graph.
pub fn normalize_str(raw: &str) -> Graph {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => normalize(&value),
        Err(error) => {
            warn!("{}", EngineError::MalformedPayload(error.to_string()));
            Graph::empty()
        }
    }
}

/// Converts any accepted payload shape into a canonical [`Graph`]. Never fails: malformed
/// payloads give an empty graph and unusable entries are skipped, each with a warning.
pub fn normalize_with_limits(raw: &Value, limits: &PayloadLimits) -> Graph {
    let (node_entries, link_entries) = match split_payload(raw) {
        Ok(parts) => parts,
        Err(error) => {
            warn!("{error}");
            return Graph::empty();
        }
    };

    let limited = node_entries.len() > limits.threshold;
    let node_entries = if limited && node_entries.len() > limits.max_nodes {
        debug!(
            kept = limits.max_nodes,
            total = node_entries.len(),
            "payload node limit applied"
        );
        &node_entries[..limits.max_nodes]
    } else {
        &node_entries[..]
    };

    let mut nodes = Vec::with_capacity(node_entries.len());
    let mut seen_ids = HashSet::with_capacity(node_entries.len());
    for (index, entry) in node_entries.iter().enumerate() {
        let Some(node) = normalize_node(index, entry) else {
            continue;
        };
        if !seen_ids.insert(node.id.clone()) {
            warn!(id = %node.id, "dropping node with duplicate id");
            continue;
        }
        nodes.push(node);
    }

    let names = nodes
        .iter()
        .map(|node| (node.id.as_str(), node.name.as_str()))
        .collect::<HashMap<_, _>>();
    let link_cap = if limited { limits.max_links } else { usize::MAX };

    let mut resolved = Vec::with_capacity(link_entries.len().min(link_cap));
    for entry in &link_entries {
        if resolved.len() >= link_cap {
            debug!(kept = link_cap, "payload link limit applied");
            break;
        }

        let Some(mut link) = normalize_link(entry) else {
            continue;
        };

        let Some(source_name) = names.get(link.source_id.as_str()) else {
            report_dangling(&link, &link.source_id, limited);
            continue;
        };
        let Some(target_name) = names.get(link.target_id.as_str()) else {
            report_dangling(&link, &link.target_id, limited);
            continue;
        };
        link.source_name = (*source_name).to_string();
        link.target_name = (*target_name).to_string();
        resolved.push(link);
    }

    // Synthetic ids must not shadow any payload id, including ones that appear later.
    let explicit_ids = resolved
        .iter()
        .filter(|link| link.explicit_id)
        .map(|link| link.id.clone())
        .collect::<HashSet<_>>();

    let mut links = Vec::with_capacity(resolved.len());
    let mut link_ids = HashSet::with_capacity(resolved.len());
    let mut synthetic_counts: HashMap<String, usize> = HashMap::new();
    for mut link in resolved {
        if !link.explicit_id {
            link.id = synthetic_link_id(&link, &explicit_ids, &link_ids, &mut synthetic_counts);
        }

        if !link_ids.insert(link.id.clone()) {
            warn!(id = %link.id, "dropping link with duplicate id");
            continue;
        }
        links.push(link);
    }

    assign_parallel_curvature(&mut links);

    let graph = Graph::from_parts(nodes, links);
    debug!(
        nodes = graph.node_count(),
        links = graph.link_count(),
        "graph payload normalized"
    );
    graph
}

/// `source->target`, then `source->target#1`, `#2`, ... skipping ids already taken.
fn synthetic_link_id(
    link: &Link,
    explicit_ids: &HashSet<String>,
    assigned: &HashSet<String>,
    counts: &mut HashMap<String, usize>,
) -> String {
    let base = format!("{}->{}", link.source_id, link.target_id);
    let count = counts.entry(base.clone()).or_insert(0);
    loop {
        let candidate = if *count == 0 {
            base.clone()
        } else {
            format!("{base}#{count}")
        };
        *count += 1;
        if !explicit_ids.contains(&candidate) && !assigned.contains(&candidate) {
            return candidate;
        }
    }
}

fn report_dangling(link: &Link, missing: &str, limited: bool) {
    let error = EngineError::DanglingLink {
        link: link.id_for_diagnostics(),
        missing: missing.to_string(),
    };
    if limited {
        // Endpoints cut by the node limit are expected.
        debug!("{error}");
    } else {
        warn!("{error}");
    }
}

impl Link {
    fn id_for_diagnostics(&self) -> String {
        if self.explicit_id {
            self.id.clone()
        } else {
            format!("{}->{}", self.source_id, self.target_id)
        }
    }
}

/// Accepted shapes: `{nodes, links}` (either key may be missing), a null payload, and the legacy
/// array of wrapper objects such as `[{nodes: [...]}, {links: [...]}]`.
fn split_payload(raw: &Value) -> Result<(Vec<&Value>, Vec<&Value>), EngineError> {
    match raw {
        Value::Null => Ok((Vec::new(), Vec::new())),
        Value::Object(object) => {
            if !object.contains_key("nodes") && !object.contains_key("links") {
                return Err(EngineError::MalformedPayload(
                    "object has neither `nodes` nor `links`".into(),
                ));
            }
            Ok((
                entries(object, "nodes")?.collect(),
                entries(object, "links")?.collect(),
            ))
        }
        Value::Array(parts) => {
            let mut nodes = Vec::new();
            let mut links = Vec::new();
            let mut recognized = false;
            for part in parts {
                let Value::Object(object) = part else {
                    return Err(EngineError::MalformedPayload(
                        "legacy array payload contains a non-object element".into(),
                    ));
                };
                recognized |= object.contains_key("nodes") || object.contains_key("links");
                nodes.extend(entries(object, "nodes")?);
                links.extend(entries(object, "links")?);
            }

            if recognized {
                Ok((nodes, links))
            } else {
                Err(EngineError::MalformedPayload(
                    "legacy array payload has no `nodes` or `links` wrapper".into(),
                ))
            }
        }
        other => Err(EngineError::MalformedPayload(format!(
            "unexpected top-level JSON {}",
            json_kind(other)
        ))),
    }
}

fn entries<'a>(
    object: &'a Map<String, Value>,
    key: &str,
) -> Result<impl Iterator<Item = &'a Value> + 'a, EngineError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(Vec::new().into_iter()),
        Some(Value::Array(items)) => Ok(items.iter().collect::<Vec<_>>().into_iter()),
        Some(other) => Err(EngineError::MalformedPayload(format!(
            "`{key}` is a JSON {}, expected an array",
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Resolves an alias and records which keys were consumed by it. When nothing resolves, every
/// alias key counts as consumed so blank leftovers do not linger among the properties.
fn take_alias(
    entry: &Map<String, Value>,
    keys: &[&'static str],
    consumed: &mut Vec<&'static str>,
) -> Option<String> {
    match resolve_alias(entry, keys) {
        Some(resolved) => {
            consumed.extend_from_slice(resolved.examined(keys));
            Some(resolved.text)
        }
        None => {
            consumed.extend_from_slice(keys);
            None
        }
    }
}

fn remaining_properties(entry: &Map<String, Value>, consumed: &[&str]) -> Map<String, Value> {
    entry
        .iter()
        .filter(|(key, _)| !consumed.iter().any(|taken| *taken == key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn normalize_node(index: usize, entry: &Value) -> Option<Node> {
    let Value::Object(entry) = entry else {
        warn!(index, "skipping node entry that is not an object");
        return None;
    };

    let mut consumed = Vec::new();
    let id = take_alias(entry, NODE_ID_KEYS, &mut consumed).unwrap_or_else(|| format!("node-{index}"));
    let name = take_alias(entry, NODE_NAME_KEYS, &mut consumed).unwrap_or_else(|| id.clone());

    let node_type = take_alias(entry, NODE_TYPE_KEYS, &mut consumed)
        .or_else(|| {
            entry
                .get("labels")
                .and_then(Value::as_array)
                .and_then(|labels| labels.first())
                .and_then(scalar_text)
        })
        .map(|raw| normalize_type_key(&raw))
        .unwrap_or_default();

    let category = take_alias(entry, NODE_CATEGORY_KEYS, &mut consumed)
        .map(|raw| normalize_type_key(&raw))
        .filter(|category| !category.is_empty())
        .or_else(|| (!node_type.is_empty()).then(|| node_type.clone()))
        .unwrap_or_else(|| infer_category(&name).to_string());

    Some(Node {
        properties: remaining_properties(entry, &consumed),
        id,
        name,
        node_type,
        category,
    })
}

fn normalize_link(entry: &Value) -> Option<Link> {
    let Value::Object(entry) = entry else {
        warn!("skipping link entry that is not an object");
        return None;
    };

    // Every endpoint alias is consumed, whichever one won.
    let mut consumed = LINK_SOURCE_KEYS
        .iter()
        .chain(LINK_TARGET_KEYS)
        .copied()
        .collect::<Vec<_>>();
    consumed.push(CURVATURE_KEY);

    let source = resolve_alias(entry, LINK_SOURCE_KEYS).map(|resolved| resolved.text);
    let target = resolve_alias(entry, LINK_TARGET_KEYS).map(|resolved| resolved.text);
    let (Some(source_id), Some(target_id)) = (source, target) else {
        warn!("skipping link with a missing source or target");
        return None;
    };

    let id = take_alias(entry, LINK_ID_KEYS, &mut consumed);
    let label = take_alias(entry, LINK_LABEL_KEYS, &mut consumed).unwrap_or_default();
    let link_type = take_alias(entry, LINK_TYPE_KEYS, &mut consumed).unwrap_or_default();
    let title = take_alias(entry, LINK_TITLE_KEYS, &mut consumed);
    let url = take_alias(entry, LINK_URL_KEYS, &mut consumed);
    let curvature = entry
        .get(CURVATURE_KEY)
        .and_then(Value::as_f64)
        .filter(|value| value.is_finite())
        .map(|value| value as f32);

    Some(Link {
        explicit_id: id.is_some(),
        id: id.unwrap_or_default(),
        source_id,
        target_id,
        source_name: String::new(),
        target_name: String::new(),
        label,
        link_type,
        title,
        url,
        curvature,
        properties: remaining_properties(entry, &consumed),
    })
}

/// Spreads links that share an unordered endpoint pair so they render as distinct arcs.
/// Curvatures carried by the payload are left alone.
fn assign_parallel_curvature(links: &mut [Link]) {
    let mut groups: HashMap<(&str, &str), Vec<usize>> = HashMap::new();
    for (index, link) in links.iter().enumerate() {
        let pair = if link.source_id <= link.target_id {
            (link.source_id.as_str(), link.target_id.as_str())
        } else {
            (link.target_id.as_str(), link.source_id.as_str())
        };
        groups.entry(pair).or_default().push(index);
    }

    let parallel = groups
        .into_values()
        .filter(|group| group.len() > 1)
        .collect::<Vec<_>>();
    for group in parallel {
        for (position, index) in group.into_iter().enumerate() {
            let link = &mut links[index];
            if link.curvature.is_none() {
                link.curvature = Some(parallel_curvature(position));
            }
        }
    }
}

pub(crate) fn parallel_curvature(position: usize) -> f32 {
    0.5 * (1.0 + position as f32 * 0.5)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn aliases_resolve_ids_names_and_types() {
        let graph = normalize(&json!({
            "nodes": [
                {"gid": 17, "Entity Name": "Ministry of Health", "labels": ["Agency"]},
                {"elementId": "e-2", "title": "Report", "node_type": "Place of Performance"},
            ],
        }));

        let first = graph.node("17").expect("gid resolves");
        assert_eq!(first.name, "Ministry of Health");
        assert_eq!(first.node_type, "agency");
        assert_eq!(first.category, "agency");
        assert!(first.properties.contains_key("labels"));
        assert!(!first.properties.contains_key("gid"));

        let second = graph.node("e-2").expect("elementId resolves");
        assert_eq!(second.node_type, "place_of_performance");
    }

    #[test]
    fn category_falls_back_to_name_heuristic() {
        let graph = normalize(&json!({
            "nodes": [
                {"id": "x", "name": "Annual Summit"},
                {"id": "y", "name": "Someone", "category": "Council"},
                {"id": "z"},
            ],
        }));
        assert_eq!(graph.node("x").map(|node| node.category.as_str()), Some("event"));
        assert_eq!(graph.node("y").map(|node| node.category.as_str()), Some("council"));
        assert_eq!(graph.node("z").map(|node| node.name.as_str()), Some("z"));
        assert_eq!(graph.node("z").map(|node| node.category.as_str()), Some("person"));
    }

    #[test]
    fn missing_ids_get_positional_fallbacks() {
        let raw = json!({"nodes": [{"name": "A"}, {"name": "B"}]});
        let first = normalize(&raw);
        let second = normalize(&raw);
        assert_eq!(first.nodes()[0].id, "node-0");
        assert_eq!(first.nodes()[1].id, "node-1");
        assert_eq!(first, second);
    }

    #[test]
    fn duplicate_node_ids_keep_the_first() {
        let graph = normalize(&json!({
            "nodes": [{"id": "a", "name": "first"}, {"id": "a", "name": "second"}],
        }));
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.node("a").map(|node| node.name.as_str()), Some("first"));
    }

    #[test]
    fn links_resolve_endpoint_aliases_and_names() {
        let graph = normalize(&json!({
            "nodes": [{"id": "a", "name": "Alice"}, {"id": "b", "name": "Bob"}],
            "links": [
                {"from_gid": "a", "to_gid": "b", "relationship_summary": "knows", "Article URL": "https://x.test"},
                {"source": {"id": "b"}, "targetId": "a", "type": "REPLIED"},
            ],
        }));

        assert_eq!(graph.link_count(), 2);
        let first = &graph.links()[0];
        assert_eq!(first.id, "a->b");
        assert!(!first.explicit_id);
        assert_eq!(first.label, "knows");
        assert_eq!(first.url.as_deref(), Some("https://x.test"));
        assert_eq!(first.source_name, "Alice");
        assert_eq!(first.target_name, "Bob");

        let second = &graph.links()[1];
        assert_eq!(second.source_id, "b");
        assert_eq!(second.label, "REPLIED");
        assert_eq!(second.link_type, "REPLIED");
    }

    #[test]
    fn parallel_links_are_curved_apart() {
        let graph = normalize(&json!({
            "nodes": [{"id": "a"}, {"id": "b"}, {"id": "c"}],
            "links": [
                {"source": "a", "target": "b"},
                {"source": "b", "target": "a"},
                {"source": "a", "target": "b", "curvature": 0.1},
                {"source": "b", "target": "c"},
            ],
        }));

        let curvatures = graph
            .links()
            .iter()
            .map(|link| link.curvature)
            .collect::<Vec<_>>();
        assert_eq!(curvatures, vec![Some(0.5), Some(0.75), Some(0.1), None]);
        assert_eq!(graph.links()[2].id, "a->b#1");
    }

    #[test]
    fn synthetic_ids_skip_explicit_ones() {
        let graph = normalize(&json!({
            "nodes": [{"id": "a"}, {"id": "b"}],
            "links": [
                {"source": "a", "target": "b"},
                {"id": "a->b", "source": "a", "target": "b"},
                {"source": "a", "target": "b"},
                {"id": "a->b#2", "source": "b", "target": "a"},
            ],
        }));

        let ids = graph
            .links()
            .iter()
            .map(|link| (link.id.as_str(), link.explicit_id))
            .collect::<Vec<_>>();
        assert_eq!(
            ids,
            vec![("a->b#1", false), ("a->b", true), ("a->b#3", false), ("a->b#2", true)]
        );
    }

    #[test]
    fn malformed_payloads_give_empty_graphs() {
        assert!(normalize(&json!(42)).is_empty());
        assert!(normalize(&json!({"vertices": []})).is_empty());
        assert!(normalize(&json!({"nodes": "nope"})).is_empty());
        assert!(normalize(&json!([1, 2])).is_empty());
        assert!(normalize(&Value::Null).is_empty());
        assert!(normalize_str("{ not json").is_empty());
    }

    #[test]
    fn large_payloads_are_capped() {
        let limits = PayloadLimits {
            threshold: 3,
            max_nodes: 4,
            max_links: 2,
        };
        let nodes = (0..6).map(|index| json!({"id": index})).collect::<Vec<_>>();
        let links = (0..5)
            .map(|index| json!({"source": index, "target": index + 1}))
            .collect::<Vec<_>>();
        let graph = normalize_with_limits(&json!({"nodes": nodes, "links": links}), &limits);

        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.link_count(), 2);
        assert!(graph.links().iter().all(|link| graph.contains_node(&link.target_id)));
    }

    #[test]
    fn curvature_formula() {
        assert_eq!(parallel_curvature(0), 0.5);
        assert_eq!(parallel_curvature(2), 1.0);
    }
}
