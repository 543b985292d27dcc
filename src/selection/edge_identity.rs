use crate::graph::{Graph, Link};

/// Two curvatures closer than this describe the same arc.
pub const CURVATURE_EPSILON: f32 = 0.01;

/// A reference to an edge as a renderer or host reports it. The id may be missing.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeRef {
    pub id: Option<String>,
    pub source: String,
    pub target: String,
    pub curvature: Option<f32>,
}

impl EdgeRef {
    pub fn from_link(link: &Link) -> Self {
        Self {
            id: Some(link.id.clone()),
            source: link.source_id.clone(),
            target: link.target_id.clone(),
            curvature: link.curvature,
        }
    }

    pub fn without_id(source: impl Into<String>, target: impl Into<String>, curvature: Option<f32>) -> Self {
        Self {
            id: None,
            source: source.into(),
            target: target.into(),
            curvature,
        }
    }

    /// Ids decide when both sides carry one. Otherwise the endpoints must agree and both sides
    /// need a curvature within [`CURVATURE_EPSILON`] of each other.
    ///
    /// Edges with neither id nor curvature are never considered the same: they cannot be told
    /// apart from parallel edges between the same endpoints.
    pub fn same_edge(&self, other: &EdgeRef) -> bool {
        if let (Some(left), Some(right)) = (&self.id, &other.id) {
            return left == right;
        }

        if self.source != other.source || self.target != other.target {
            return false;
        }

        match (self.curvature, other.curvature) {
            (Some(left), Some(right)) => (left - right).abs() < CURVATURE_EPSILON,
            _ => false,
        }
    }
}

/// Finds the graph link an edge reference points at.
pub fn resolve_edge_ref<'g>(graph: &'g Graph, edge: &EdgeRef) -> Option<&'g Link> {
    if let Some(id) = &edge.id
        && let Some(link) = graph.link(id)
    {
        return Some(link);
    }

    graph
        .links()
        .iter()
        .find(|link| EdgeRef::from_link(link).same_edge(edge))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(id: Option<&str>, curvature: Option<f32>) -> EdgeRef {
        EdgeRef {
            id: id.map(str::to_string),
            source: "a".into(),
            target: "b".into(),
            curvature,
        }
    }

    #[test]
    fn ids_take_precedence() {
        assert!(edge(Some("x"), Some(0.5)).same_edge(&edge(Some("x"), None)));
        assert!(!edge(Some("x"), Some(0.5)).same_edge(&edge(Some("y"), Some(0.5))));
    }

    #[test]
    fn curvature_breaks_ties_without_ids() {
        assert!(edge(None, Some(0.5)).same_edge(&edge(None, Some(0.505))));
        assert!(!edge(None, Some(0.5)).same_edge(&edge(None, Some(0.75))));
        assert!(!edge(Some("x"), Some(0.5)).same_edge(&edge(None, None)));
        assert!(!edge(None, None).same_edge(&edge(None, Some(0.5))));
    }

    #[test]
    fn edges_without_id_or_curvature_never_match() {
        assert!(!edge(None, None).same_edge(&edge(None, None)));
    }

    #[test]
    fn direction_matters() {
        let reversed = EdgeRef::without_id("b", "a", Some(0.5));
        assert!(!edge(None, Some(0.5)).same_edge(&reversed));
    }
}
