use eframe::egui::{Pos2, Vec2, vec2};

use super::camera::Projection;

/// Extra pixels around nodes and links that still count as a hit.
pub const HIT_TOLERANCE: f32 = 4.0;
const CURVE_SEGMENTS: usize = 16;

/// A node as it appears on screen this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenNode {
    pub center: Pos2,
    pub radius: f32,
    pub depth: f32,
}

impl ScreenNode {
    pub fn from_projection(projection: Projection, world_radius: f32) -> Self {
        Self {
            center: projection.screen,
            radius: (world_radius * projection.scale).clamp(1.5, 80.0),
            depth: projection.depth,
        }
    }
}

/// Control point of the quadratic curve a link with `curvature` is drawn along.
pub fn curve_control(start: Pos2, end: Pos2, curvature: f32) -> Pos2 {
    let delta = end - start;
    let midpoint = start + delta * 0.5;
    let normal = vec2(-delta.y, delta.x);
    midpoint + normal * curvature
}

/// Points along a link, straight or curved, from `start` to `end` inclusive.
pub fn link_polyline(start: Pos2, end: Pos2, curvature: f32) -> Vec<Pos2> {
    if curvature.abs() <= f32::EPSILON {
        return vec![start, end];
    }

    let control = curve_control(start, end, curvature);
    (0..=CURVE_SEGMENTS)
        .map(|step| {
            let t = step as f32 / CURVE_SEGMENTS as f32;
            let inverse = 1.0 - t;
            let point = (start.to_vec2() * (inverse * inverse))
                + (control.to_vec2() * (2.0 * inverse * t))
                + (end.to_vec2() * (t * t));
            point.to_pos2()
        })
        .collect()
}

fn distance_to_segment(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_sq();
    if length_sq <= f32::EPSILON {
        return (point - start).length();
    }
    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    (point - (start + segment * t)).length()
}

pub fn distance_to_polyline(point: Pos2, polyline: &[Pos2]) -> f32 {
    polyline
        .windows(2)
        .map(|pair| distance_to_segment(point, pair[0], pair[1]))
        .fold(f32::INFINITY, f32::min)
}

/// Index of the node under `pointer`. Overlapping candidates resolve to the one nearest the
/// camera.
pub fn hit_node(nodes: &[Option<ScreenNode>], pointer: Pos2) -> Option<usize> {
    nodes
        .iter()
        .enumerate()
        .filter_map(|(index, node)| {
            let node = node.as_ref()?;
            let distance = (node.center - pointer).length();
            (distance <= node.radius + HIT_TOLERANCE).then_some((index, node.depth))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

/// A link as a hit-test candidate: its index, endpoints on screen, curvature and width.
#[derive(Clone, Copy, Debug)]
pub struct ScreenLink {
    pub index: usize,
    pub start: Pos2,
    pub end: Pos2,
    pub curvature: f32,
    pub width: f32,
}

/// Index of the link closest to `pointer` within its half width plus tolerance.
pub fn hit_link(links: &[ScreenLink], pointer: Pos2) -> Option<usize> {
    links
        .iter()
        .filter_map(|link| {
            let polyline = link_polyline(link.start, link.end, link.curvature);
            let distance = distance_to_polyline(pointer, &polyline);
            (distance <= link.width * 0.5 + HIT_TOLERANCE).then_some((link.index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

pub fn drag_exceeds_threshold(delta: Vec2) -> bool {
    delta.length_sq() > 3.0 * 3.0
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    fn node(x: f32, y: f32, depth: f32) -> Option<ScreenNode> {
        Some(ScreenNode {
            center: pos2(x, y),
            radius: 5.0,
            depth,
        })
    }

    #[test]
    fn nearest_overlapping_node_wins() {
        let nodes = [node(10.0, 10.0, 50.0), node(12.0, 10.0, 20.0), None];
        assert_eq!(hit_node(&nodes, pos2(11.0, 10.0)), Some(1));
        assert_eq!(hit_node(&nodes, pos2(100.0, 100.0)), None);
    }

    #[test]
    fn curved_links_are_hit_along_the_arc() {
        let link = ScreenLink {
            index: 3,
            start: pos2(0.0, 0.0),
            end: pos2(100.0, 0.0),
            curvature: 0.5,
            width: 1.0,
        };
        // The arc bulges away from the chord, so its midpoint is off the straight line.
        let apex = link_polyline(link.start, link.end, link.curvature)[CURVE_SEGMENTS / 2];
        assert!(apex.y.abs() > 10.0);
        assert_eq!(hit_link(&[link], apex), Some(3));
        assert_eq!(hit_link(&[link], pos2(50.0, 0.0)), None);
    }

    #[test]
    fn straight_links_hit_near_the_segment() {
        let link = ScreenLink {
            index: 0,
            start: pos2(0.0, 0.0),
            end: pos2(100.0, 0.0),
            curvature: 0.0,
            width: 2.0,
        };
        assert_eq!(hit_link(&[link], pos2(50.0, 3.0)), Some(0));
        assert_eq!(hit_link(&[link], pos2(50.0, 9.0)), None);
    }
}
