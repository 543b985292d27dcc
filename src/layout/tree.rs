use std::collections::VecDeque;

use crate::config::TreeConfig;

use super::vec3::{Axis, Vec3};

/// Graph facts the tree layout needs, indexed like the layout's nodes.
pub(super) struct TreeInput<'a> {
    pub(super) adjacency: &'a [Vec<usize>],
    pub(super) is_country: &'a [bool],
    /// Current positions; locked axes keep the root's coordinate from here.
    pub(super) positions: &'a [Vec3],
}

/// Axes available to the tree layout, in role order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct TreeAxes {
    pub(super) depth: Option<Axis>,
    pub(super) breadth: Option<Axis>,
    pub(super) component: Option<Axis>,
}

impl TreeAxes {
    /// Depth takes the first free axis of y, x, z. Breadth takes the next free one of x, z, y and
    /// whatever is left separates components.
    pub(super) fn from_free(free: impl Fn(Axis) -> bool) -> Self {
        let depth = [Axis::Y, Axis::X, Axis::Z].into_iter().find(|axis| free(*axis));
        let breadth = [Axis::X, Axis::Z, Axis::Y]
            .into_iter()
            .find(|axis| free(*axis) && Some(*axis) != depth);
        let component = Axis::ALL
            .into_iter()
            .find(|axis| free(*axis) && Some(*axis) != depth && Some(*axis) != breadth);
        Self {
            depth,
            breadth,
            component,
        }
    }
}

struct Component {
    root: usize,
    /// BFS order from the root.
    order: Vec<usize>,
    depth: Vec<(usize, usize)>,
    children: Vec<(usize, Vec<usize>)>,
}

/// Deterministic layered layout of every component. Returns one position per node.
pub(super) fn tree_positions(input: &TreeInput<'_>, axes: TreeAxes, config: &TreeConfig) -> Vec<Vec3> {
    let node_count = input.adjacency.len();
    let mut positions = vec![Vec3::ZERO; node_count];
    if node_count == 0 {
        return positions;
    }

    let level_spacing = config.level_spacing.max(1.0);
    let sibling_spacing = config.sibling_spacing.max(1.0);
    let gap_slots = config.component_gap.max(0.0);

    let mut breadth_cursor = 0.0_f32;
    let mut component_cursor = 0.0_f32;
    for component in components(input) {
        let root_position = input.positions.get(component.root).copied().unwrap_or_default();
        let mut base = Vec3::ZERO;
        for axis in Axis::ALL {
            if Some(axis) != axes.depth && Some(axis) != axes.breadth && Some(axis) != axes.component {
                base[axis] = root_position[axis];
            }
        }

        if axes.breadth.is_none() {
            // A single free axis: nodes line up in BFS order, which keeps depth monotone.
            for (rank, &index) in component.order.iter().enumerate() {
                let mut position = base;
                if let Some(depth_axis) = axes.depth {
                    position[depth_axis] = -(breadth_cursor + rank as f32) * sibling_spacing;
                }
                positions[index] = position;
            }
            breadth_cursor += component.order.len() as f32 + gap_slots;
            continue;
        }

        let slots = assign_slots(&component, node_count);
        let width = component
            .order
            .iter()
            .map(|&index| slots[index])
            .fold(0.0_f32, f32::max);

        for &(index, depth) in &component.depth {
            let mut position = base;
            if let Some(depth_axis) = axes.depth {
                position[depth_axis] = -(depth as f32) * level_spacing;
            }
            if let Some(breadth_axis) = axes.breadth {
                let offset = if axes.component.is_some() { 0.0 } else { breadth_cursor };
                position[breadth_axis] = (offset + slots[index]) * sibling_spacing;
            }
            if let Some(component_axis) = axes.component {
                position[component_axis] = component_cursor * level_spacing;
            }
            positions[index] = position;
        }

        if axes.component.is_some() {
            component_cursor += 1.0 + gap_slots;
        } else {
            breadth_cursor += width + 1.0 + gap_slots;
        }
    }

    positions
}

fn components(input: &TreeInput<'_>) -> Vec<Component> {
    let node_count = input.adjacency.len();
    let mut component_of = vec![usize::MAX; node_count];
    let mut members: Vec<Vec<usize>> = Vec::new();

    for start in 0..node_count {
        if component_of[start] != usize::MAX {
            continue;
        }

        let id = members.len();
        let mut queue = VecDeque::from([start]);
        let mut group = Vec::new();
        component_of[start] = id;
        while let Some(current) = queue.pop_front() {
            group.push(current);
            for &next in &input.adjacency[current] {
                if next < node_count && component_of[next] == usize::MAX {
                    component_of[next] = id;
                    queue.push_back(next);
                }
            }
        }
        members.push(group);
    }

    members
        .into_iter()
        .map(|group| {
            let root = choose_root(&group, input);
            bfs_tree(root, input.adjacency)
        })
        .collect()
}

/// A country node when the component has one, else the highest degree. Lower index breaks ties.
pub(super) fn choose_root(group: &[usize], input: &TreeInput<'_>) -> usize {
    let mut sorted = group.to_vec();
    sorted.sort_unstable();

    if let Some(&country) = sorted
        .iter()
        .find(|&&index| input.is_country.get(index).copied().unwrap_or(false))
    {
        return country;
    }

    let mut best = sorted[0];
    for &index in &sorted[1..] {
        if input.adjacency[index].len() > input.adjacency[best].len() {
            best = index;
        }
    }
    best
}

fn bfs_tree(root: usize, adjacency: &[Vec<usize>]) -> Component {
    let mut seen = vec![false; adjacency.len()];
    let mut queue = VecDeque::from([(root, 0usize)]);
    let mut order = Vec::new();
    let mut depth = Vec::new();
    let mut children = Vec::new();
    seen[root] = true;

    while let Some((current, level)) = queue.pop_front() {
        order.push(current);
        depth.push((current, level));

        let mut own = Vec::new();
        for &next in &adjacency[current] {
            if next < adjacency.len() && !seen[next] {
                seen[next] = true;
                own.push(next);
                queue.push_back((next, level + 1));
            }
        }
        children.push((current, own));
    }

    Component {
        root,
        order,
        depth,
        children,
    }
}

/// Leaf slots in depth-first order; every parent sits at the midpoint of its children's span.
fn assign_slots(component: &Component, node_count: usize) -> Vec<f32> {
    let leaf: &[usize] = &[];
    let mut children_of = vec![leaf; node_count];
    for (parent, own) in &component.children {
        children_of[*parent] = own.as_slice();
    }

    let mut slots = vec![0.0_f32; node_count];
    let mut next_leaf = 0.0_f32;
    // (node, children already pushed)
    let mut stack = vec![(component.root, false)];
    while let Some((node, expanded)) = stack.pop() {
        let children = children_of[node];
        if children.is_empty() {
            slots[node] = next_leaf;
            next_leaf += 1.0;
            continue;
        }

        if expanded {
            let first = slots[children[0]];
            let last = slots[children[children.len() - 1]];
            slots[node] = (first + last) * 0.5;
            continue;
        }

        stack.push((node, true));
        for &child in children.iter().rev() {
            stack.push((child, false));
        }
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjacency(node_count: usize, edges: &[(usize, usize)]) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); node_count];
        for &(from, to) in edges {
            adjacency[from].push(to);
            adjacency[to].push(from);
        }
        adjacency
    }

    fn layout(adjacency: &[Vec<usize>], is_country: &[bool], axes: TreeAxes) -> Vec<Vec3> {
        let positions = vec![Vec3::ZERO; adjacency.len()];
        tree_positions(
            &TreeInput {
                adjacency,
                is_country,
                positions: &positions,
            },
            axes,
            &TreeConfig::default(),
        )
    }

    fn planar() -> TreeAxes {
        TreeAxes::from_free(|axis| axis != Axis::Z)
    }

    #[test]
    fn axis_roles_follow_lock_state() {
        let all = TreeAxes::from_free(|_| true);
        assert_eq!((all.depth, all.breadth, all.component), (Some(Axis::Y), Some(Axis::X), Some(Axis::Z)));

        let no_y = TreeAxes::from_free(|axis| axis != Axis::Y);
        assert_eq!((no_y.depth, no_y.breadth), (Some(Axis::X), Some(Axis::Z)));

        let only_z = TreeAxes::from_free(|axis| axis == Axis::Z);
        assert_eq!((only_z.depth, only_z.breadth), (Some(Axis::Z), None));

        let none = TreeAxes::from_free(|_| false);
        assert_eq!(none.depth, None);
    }

    #[test]
    fn root_prefers_country_then_degree() {
        let star = adjacency(4, &[(0, 1), (1, 2), (1, 3)]);
        let positions = vec![Vec3::ZERO; 4];
        let input = TreeInput {
            adjacency: &star,
            is_country: &[false, false, false, false],
            positions: &positions,
        };
        assert_eq!(choose_root(&[0, 1, 2, 3], &input), 1);

        let input = TreeInput {
            is_country: &[false, false, false, true],
            ..input
        };
        assert_eq!(choose_root(&[0, 1, 2, 3], &input), 3);
    }

    #[test]
    fn parents_are_centered_over_children() {
        let tree = adjacency(4, &[(0, 1), (0, 2), (0, 3)]);
        let positions = layout(&tree, &[false; 4], planar());

        assert_eq!(positions[0].x, positions[2].x);
        assert!(positions[1].x < positions[2].x && positions[2].x < positions[3].x);
        assert!(positions[1].y < positions[0].y);
        assert_eq!(positions[1].y, positions[3].y);
        assert!(positions.iter().all(|position| position.z == 0.0));
    }

    #[test]
    fn layout_is_deterministic() {
        let graph = adjacency(6, &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5)]);
        let first = layout(&graph, &[false; 6], planar());
        let second = layout(&graph, &[false; 6], planar());
        assert_eq!(first, second);
    }

    #[test]
    fn components_do_not_overlap() {
        let graph = adjacency(4, &[(0, 1), (2, 3)]);
        let positions = layout(&graph, &[false; 4], planar());
        let first_max = positions[0].x.max(positions[1].x);
        let second_min = positions[2].x.min(positions[3].x);
        assert!(second_min > first_max);
    }

    #[test]
    fn locked_axes_collapse_to_root_plane() {
        let graph = adjacency(3, &[(0, 1), (1, 2)]);
        let current = vec![
            Vec3 { x: 0.0, y: 0.0, z: 9.0 },
            Vec3 { x: 0.0, y: 0.0, z: 7.0 },
            Vec3 { x: 0.0, y: 0.0, z: -3.0 },
        ];
        let positions = tree_positions(
            &TreeInput {
                adjacency: &graph,
                is_country: &[false; 3],
                positions: &current,
            },
            planar(),
            &TreeConfig::default(),
        );
        // Node 1 has the highest degree and becomes the root.
        assert!(positions.iter().all(|position| position.z == 7.0));
    }
}
