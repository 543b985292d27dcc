mod forces;
mod octree;

use crate::config::ForceConfig;

use super::NodeLayout;
use super::vec3::Vec3;
use forces::{CollisionParams, accumulate_collision_pairs, accumulate_repulsion_for_node};
use octree::OctNode;

const BARNES_HUT_THETA: f32 = 0.72;
const SOFTENING: f32 = 400.0;

#[derive(Default)]
pub(super) struct ForceScratch {
    forces: Vec<Vec3>,
    positions: Vec<Vec3>,
    radii: Vec<f32>,
}

#[derive(Clone, Copy)]
pub(super) struct StepParams {
    /// Simulation energy in `[0, 1]`; scales every force.
    pub(super) alpha: f32,
    pub(super) delta_seconds: f32,
    pub(super) node_radius: f32,
    /// Keep every free node on the z = 0 plane.
    pub(super) flat: bool,
}

/// Advances the force simulation by one frame. Returns whether any node moved.
pub(super) fn step_force(
    nodes: &mut [NodeLayout],
    edges: &[(usize, usize)],
    config: ForceConfig,
    params: StepParams,
    scratch: &mut ForceScratch,
) -> bool {
    let node_count = nodes.len();
    if node_count == 0 {
        return false;
    }

    let config = config.clamped();
    scratch.forces.clear();
    scratch.forces.resize(node_count, Vec3::ZERO);
    scratch.positions.clear();
    scratch.positions.extend(nodes.iter().map(|node| node.position));
    scratch.radii.clear();
    scratch.radii.resize(node_count, params.node_radius.max(0.1));

    let alpha = params.alpha.clamp(0.0, 1.0);
    let forces = &mut scratch.forces;
    let positions = &scratch.positions;
    let radii = &scratch.radii;

    if node_count > 1
        && let Some(octree) = OctNode::build(positions)
    {
        let repulsion = config.charge * alpha;
        for (index, force) in forces.iter_mut().enumerate() {
            accumulate_repulsion_for_node(
                &octree,
                index,
                positions,
                repulsion,
                SOFTENING,
                BARNES_HUT_THETA,
                force,
            );
        }

        let spacing = config.collision_radius;
        let max_collision_distance = params.node_radius * 2.0 * spacing;
        if max_collision_distance > 0.0 && config.collision_strength > 0.0 {
            accumulate_collision_pairs(
                &octree,
                &octree,
                true,
                positions,
                radii,
                CollisionParams {
                    strength: config.collision_strength,
                    spacing,
                    max_distance_sq: max_collision_distance * max_collision_distance,
                },
                forces,
            );
        }
    }

    for &(from, to) in edges {
        if from >= node_count || to >= node_count || from == to {
            continue;
        }

        let delta = positions[from] - positions[to];
        let distance = delta.length();
        if distance <= 0.0001 {
            continue;
        }

        let direction = delta / distance;
        let spring = (distance - config.link_distance) * config.link_strength * alpha;
        forces[from] -= direction * spring;
        forces[to] += direction * spring;
    }

    for (force, position) in forces.iter_mut().zip(positions) {
        *force -= *position * (config.center_strength * alpha);
    }

    let time_step_scale = (params.delta_seconds * 60.0).clamp(0.25, 3.0);
    let damping_factor = config.velocity_damping.powf(time_step_scale);
    let max_speed_sq = config.max_speed * config.max_speed;
    let min_sleep_speed_sq = 0.02 * 0.02;
    let mut any_motion = false;

    for (node, force) in nodes.iter_mut().zip(forces.iter()) {
        if node.is_fully_pinned() {
            node.apply_pin();
            node.velocity = Vec3::ZERO;
            continue;
        }

        let mut force = *force;
        if params.flat {
            force.z = 0.0;
        }

        let mut velocity = (node.velocity + (force * time_step_scale)) * damping_factor;
        let speed_sq = velocity.length_sq();
        if speed_sq > max_speed_sq {
            velocity *= config.max_speed / speed_sq.sqrt();
        }
        if velocity.length_sq() < min_sleep_speed_sq {
            velocity = Vec3::ZERO;
        }
        if params.flat {
            velocity.z = 0.0;
        }

        node.velocity = velocity;
        node.position += velocity * time_step_scale;
        if params.flat {
            node.position.z = 0.0;
        }
        node.apply_pin();

        if velocity.length_sq() > 0.000_001 {
            any_motion = true;
        }
    }

    any_motion
}

#[cfg(test)]
mod tests {
    use super::super::vec3::vec3;
    use super::*;

    fn params() -> StepParams {
        StepParams {
            alpha: 1.0,
            delta_seconds: 1.0 / 60.0,
            node_radius: 4.0,
            flat: false,
        }
    }

    fn layout_at(position: Vec3) -> NodeLayout {
        NodeLayout {
            position,
            ..NodeLayout::default()
        }
    }

    #[test]
    fn linked_nodes_settle_near_link_distance() {
        let config = ForceConfig {
            charge: 0.0,
            center_strength: 0.0,
            collision_strength: 0.0,
            link_strength: 0.2,
            ..ForceConfig::default()
        };
        let mut nodes = vec![layout_at(vec3(-150.0, 0.0, 0.0)), layout_at(vec3(150.0, 0.0, 0.0))];
        let mut scratch = ForceScratch::default();
        for _ in 0..600 {
            step_force(&mut nodes, &[(0, 1)], config, params(), &mut scratch);
        }

        let distance = (nodes[0].position - nodes[1].position).length();
        assert!((distance - config.link_distance).abs() < 5.0, "distance {distance}");
    }

    #[test]
    fn pinned_nodes_do_not_move() {
        let mut nodes = vec![layout_at(Vec3::ZERO), layout_at(vec3(5.0, 0.0, 0.0))];
        nodes[0].pin_at(vec3(1.0, 2.0, 3.0));
        let mut scratch = ForceScratch::default();
        step_force(&mut nodes, &[(0, 1)], ForceConfig::default(), params(), &mut scratch);
        assert_eq!(nodes[0].position, vec3(1.0, 2.0, 3.0));
        assert_ne!(nodes[1].position, vec3(5.0, 0.0, 0.0));
    }

    #[test]
    fn flat_mode_keeps_nodes_on_the_plane() {
        let mut nodes = vec![layout_at(vec3(0.0, 0.0, 4.0)), layout_at(vec3(1.0, 1.0, -4.0))];
        let mut scratch = ForceScratch::default();
        let params = StepParams {
            flat: true,
            ..params()
        };
        step_force(&mut nodes, &[], ForceConfig::default(), params, &mut scratch);
        assert!(nodes.iter().all(|node| node.position.z == 0.0));
    }
}
