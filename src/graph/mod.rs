mod aliases;
mod category;
mod normalize;

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};

use crate::util::format_amount;

pub use aliases::{
    LINK_ID_KEYS, LINK_LABEL_KEYS, LINK_SOURCE_KEYS, LINK_TARGET_KEYS, LINK_TITLE_KEYS,
    LINK_TYPE_KEYS, LINK_URL_KEYS, NODE_CATEGORY_KEYS, NODE_ID_KEYS, NODE_NAME_KEYS,
    NODE_TYPE_KEYS, first_alias,
};
pub use category::{
    CATEGORY_RULES, DEFAULT_CATEGORY, DEFAULT_LINK_COLOR, DEFAULT_NODE_COLOR, category_color,
    infer_category, palette_color,
};
pub use normalize::{normalize, normalize_str, normalize_with_limits};

/// Upper bound on the number of flagged nodes surfaced as highlights.
pub const HIGHLIGHT_LIMIT: usize = 20;

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: String,
    pub name: String,
    /// Lowercase, underscore separated. Empty when the payload carried no type.
    pub node_type: String,
    pub category: String,
    /// Original fields of the payload entry that were not consumed as canonical keys.
    pub properties: Map<String, Value>,
}

impl Node {
    pub fn is_highlighted(&self) -> bool {
        self.properties
            .get("highlight")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn is_amount(&self) -> bool {
        matches!(self.node_type.as_str(), "amount" | "funding")
            || matches!(self.category.as_str(), "amount" | "funding")
    }

    /// Looks up a monetary value in `Amount`, `amount`, `value`, a nested `properties` map, or
    /// finally any key whose name contains "amount".
    pub fn amount(&self) -> Option<f64> {
        fn numeric(value: &Value) -> Option<f64> {
            match value {
                Value::Number(number) => number.as_f64(),
                Value::String(text) => {
                    let cleaned = text
                        .chars()
                        .filter(|ch| ch.is_ascii_digit() || *ch == '.' || *ch == '-')
                        .collect::<String>();
                    cleaned.parse().ok()
                }
                _ => None,
            }
        }

        fn lookup(map: &Map<String, Value>) -> Option<f64> {
            for key in ["Amount", "amount", "value"] {
                if let Some(found) = map.get(key).and_then(numeric) {
                    return Some(found);
                }
            }

            if let Some(nested) = map.get("properties").and_then(Value::as_object)
                && let Some(found) = lookup(nested)
            {
                return Some(found);
            }

            map.iter()
                .filter(|(key, _)| key.to_lowercase().contains("amount"))
                .find_map(|(_, value)| numeric(value))
        }

        lookup(&self.properties)
    }

    /// Text shown next to the node: the formatted amount for amount/funding nodes, the name
    /// otherwise.
    pub fn display_label(&self) -> String {
        if self.is_amount()
            && let Some(amount) = self.amount()
        {
            return format_amount(amount);
        }
        self.name.clone()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Link {
    pub id: String,
    /// False when `id` was synthesized during normalization.
    pub explicit_id: bool,
    pub source_id: String,
    pub target_id: String,
    pub source_name: String,
    pub target_name: String,
    pub label: String,
    pub link_type: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub curvature: Option<f32>,
    pub properties: Map<String, Value>,
}

impl Link {
    pub fn other_end(&self, node_id: &str) -> Option<&str> {
        if self.source_id == node_id {
            Some(&self.target_id)
        } else if self.target_id == node_id {
            Some(&self.source_id)
        } else {
            None
        }
    }
}

/// Canonical graph. Immutable once built: every link endpoint names a node of the graph.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    links: Vec<Link>,
    node_index: HashMap<String, usize>,
    link_index: HashMap<String, usize>,
    incident: Vec<Vec<usize>>,
}

impl Graph {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a graph from already-canonical parts. Nodes with a repeated id and links whose
    /// endpoints are not present are skipped, so the endpoint invariant always holds.
    pub fn from_parts(nodes: Vec<Node>, links: Vec<Link>) -> Self {
        let mut graph = Self::default();
        for node in nodes {
            if graph.node_index.contains_key(&node.id) {
                continue;
            }
            graph.node_index.insert(node.id.clone(), graph.nodes.len());
            graph.nodes.push(node);
            graph.incident.push(Vec::new());
        }

        for link in links {
            let (Some(&source), Some(&target)) = (
                graph.node_index.get(&link.source_id),
                graph.node_index.get(&link.target_id),
            ) else {
                continue;
            };
            if graph.link_index.contains_key(&link.id) {
                continue;
            }

            let index = graph.links.len();
            graph.link_index.insert(link.id.clone(), index);
            graph.incident[source].push(index);
            if target != source {
                graph.incident[target].push(index);
            }
            graph.links.push(link);
        }

        graph
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).map(|&index| &self.nodes[index])
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.node_index.get(id).copied()
    }

    pub fn link(&self, id: &str) -> Option<&Link> {
        self.link_index.get(id).map(|&index| &self.links[index])
    }

    pub fn link_index(&self, id: &str) -> Option<usize> {
        self.link_index.get(id).copied()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn incident_links(&self, id: &str) -> impl Iterator<Item = &Link> + '_ {
        self.node_index
            .get(id)
            .into_iter()
            .flat_map(|&index| self.incident[index].iter())
            .map(|&link| &self.links[link])
    }

    pub fn degree_at(&self, index: usize) -> usize {
        self.incident.get(index).map_or(0, Vec::len)
    }

    pub fn degree(&self, id: &str) -> usize {
        self.node_index(id).map_or(0, |index| self.degree_at(index))
    }

    /// Endpoint node indices of the link at `index`.
    pub fn link_endpoints(&self, index: usize) -> Option<(usize, usize)> {
        let link = self.links.get(index)?;
        Some((
            self.node_index(&link.source_id)?,
            self.node_index(&link.target_id)?,
        ))
    }

    /// Graph made of the given nodes and links. Links whose endpoints fall outside the node set
    /// are left out, and missing endpoints of requested links are not added.
    pub fn induced_subgraph<'a>(
        &self,
        node_ids: impl IntoIterator<Item = &'a str>,
        link_ids: impl IntoIterator<Item = &'a str>,
    ) -> Graph {
        let wanted_nodes = node_ids.into_iter().collect::<HashSet<_>>();
        let wanted_links = link_ids.into_iter().collect::<HashSet<_>>();

        let nodes = self
            .nodes
            .iter()
            .filter(|node| wanted_nodes.contains(node.id.as_str()))
            .cloned()
            .collect();
        let links = self
            .links
            .iter()
            .filter(|link| wanted_links.contains(link.id.as_str()))
            .cloned()
            .collect();

        Graph::from_parts(nodes, links)
    }

    /// One-hop neighborhood of a node: the node, every incident link and their other endpoints.
    pub fn neighborhood(&self, id: &str) -> Graph {
        let Some(node) = self.node(id) else {
            return Graph::empty();
        };

        let mut node_ids = vec![node.id.as_str()];
        let mut link_ids = Vec::new();
        for link in self.incident_links(id) {
            link_ids.push(link.id.as_str());
            if let Some(other) = link.other_end(id) {
                node_ids.push(other);
            }
        }
        self.induced_subgraph(node_ids, link_ids)
    }

    /// Every distinct category of the graph, sorted.
    pub fn categories(&self) -> Vec<String> {
        let mut categories = self
            .nodes
            .iter()
            .map(|node| node.category.clone())
            .collect::<Vec<_>>();
        categories.sort();
        categories.dedup();
        categories
    }

    /// Nodes flagged with `highlight: true`, in payload order, capped at [`HIGHLIGHT_LIMIT`].
    pub fn highlights(&self) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|node| node.is_highlighted())
            .take(HIGHLIGHT_LIMIT)
            .collect()
    }

    /// Canonical wire form. Feeding it back through normalization yields an equal graph.
    pub fn to_wire(&self) -> Value {
        let nodes = self
            .nodes
            .iter()
            .map(|node| {
                let mut entry = node.properties.clone();
                entry.insert("id".into(), Value::String(node.id.clone()));
                entry.insert("name".into(), Value::String(node.name.clone()));
                if !node.node_type.is_empty() {
                    entry.insert("node_type".into(), Value::String(node.node_type.clone()));
                }
                entry.insert("category".into(), Value::String(node.category.clone()));
                Value::Object(entry)
            })
            .collect();

        let links = self
            .links
            .iter()
            .map(|link| {
                let mut entry = link.properties.clone();
                if link.explicit_id {
                    entry.insert("id".into(), Value::String(link.id.clone()));
                }
                entry.insert("source".into(), Value::String(link.source_id.clone()));
                entry.insert("target".into(), Value::String(link.target_id.clone()));
                if !link.label.is_empty() {
                    entry.insert("label".into(), Value::String(link.label.clone()));
                }
                if !link.link_type.is_empty() {
                    // `type` doubles as a label alias, so it is only safe once `label` is set.
                    let key = if link.label.is_empty() { "link_type" } else { "type" };
                    entry.insert(key.into(), Value::String(link.link_type.clone()));
                }
                if let Some(title) = &link.title {
                    entry.insert("title".into(), Value::String(title.clone()));
                }
                if let Some(url) = &link.url {
                    entry.insert("url".into(), Value::String(url.clone()));
                }
                if let Some(curvature) = link.curvature {
                    entry.insert("curvature".into(), Value::from(f64::from(curvature)));
                }
                Value::Object(entry)
            })
            .collect();

        let mut wire = Map::new();
        wire.insert("nodes".into(), Value::Array(nodes));
        wire.insert("links".into(), Value::Array(links));
        Value::Object(wire)
    }
}

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes && self.links == other.links
    }
}
