use super::super::vec3::{Vec3, vec3};
use super::octree::OctNode;

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) strength: f32,
    pub(super) spacing: f32,
    pub(super) max_distance_sq: f32,
}

/// Direction for two points that sit on top of each other. Derived from the indices so the
/// pair separates the same way every run.
fn tie_break_direction(from: usize, to: usize) -> Vec3 {
    let azimuth = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    let polar = ((from as f32) * 0.302_775 + (to as f32) * 0.732_051).fract() * std::f32::consts::PI;
    vec3(
        polar.sin() * azimuth.cos(),
        polar.sin() * azimuth.sin(),
        polar.cos(),
    )
}

fn repulsion_between(point_a: Vec3, point_b: Vec3, strength: f32, softening: f32) -> Vec3 {
    let delta = point_a - point_b;
    let distance_sq = delta.length_sq();
    let distance = distance_sq.sqrt();
    let direction = if distance > 0.0001 {
        delta / distance
    } else {
        vec3(1.0, 0.0, 0.0)
    };
    direction * (strength / (distance_sq + softening))
}

pub(super) fn accumulate_repulsion_for_node(
    node: &OctNode,
    index: usize,
    positions: &[Vec3],
    strength: f32,
    softening: f32,
    theta: f32,
    force: &mut Vec3,
) {
    if node.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other_index in &node.indices {
            if other_index == index {
                continue;
            }
            *force += repulsion_between(point, positions[other_index], strength, softening);
        }
        return;
    }

    let delta = point - node.center_of_mass;
    let distance_sq = delta.length_sq().max(0.0001);
    let distance = distance_sq.sqrt();
    let can_approximate = !node.bounds.contains(point)
        && ((node.bounds.side_length() / distance) < theta)
        && node.mass > 1.0;

    if can_approximate {
        let scaled = (strength * node.mass) / (distance_sq + softening);
        *force += (delta / distance) * scaled;
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_repulsion_for_node(child, index, positions, strength, softening, theta, force);
    }
}

fn push_apart(from: usize, to: usize, positions: &[Vec3], radii: &[f32], params: CollisionParams, forces: &mut [Vec3]) {
    let delta = positions[from] - positions[to];
    let distance = delta.length();
    let direction = if distance > 0.0001 {
        delta / distance
    } else {
        tie_break_direction(from, to)
    };

    let min_distance = (radii[from] + radii[to]) * params.spacing;
    if distance < min_distance {
        let overlap_push = (min_distance - distance) * params.strength;
        forces[from] += direction * overlap_push;
        forces[to] -= direction * overlap_push;
    }
}

pub(super) fn accumulate_collision_pairs(
    node_a: &OctNode,
    node_b: &OctNode,
    same_node: bool,
    positions: &[Vec3],
    radii: &[f32],
    params: CollisionParams,
    forces: &mut [Vec3],
) {
    if node_a.bounds.distance_sq_to(node_b.bounds) > params.max_distance_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[offset + 1..] {
                    push_apart(from, to, positions, radii, params, forces);
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    push_apart(from, to, positions, radii, params, forces);
                }
            }
        }
        return;
    }

    if same_node {
        for first in 0..node_a.children.len() {
            let Some(child_a) = node_a.children[first].as_deref() else {
                continue;
            };

            accumulate_collision_pairs(child_a, child_a, true, positions, radii, params, forces);

            for second in (first + 1)..node_a.children.len() {
                let Some(child_b) = node_a.children[second].as_deref() else {
                    continue;
                };
                accumulate_collision_pairs(child_a, child_b, false, positions, radii, params, forces);
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children.iter().flatten() {
            accumulate_collision_pairs(child, node_b, false, positions, radii, params, forces);
        }
    } else {
        for child in node_b.children.iter().flatten() {
            accumulate_collision_pairs(node_a, child, false, positions, radii, params, forces);
        }
    }
}
