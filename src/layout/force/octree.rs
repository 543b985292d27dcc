use super::super::vec3::{Vec3, vec3};

const OCTREE_LEAF_CAPACITY: usize = 12;
const OCTREE_MAX_DEPTH: usize = 10;

#[derive(Clone, Copy)]
pub(super) struct OctBounds {
    pub(super) center: Vec3,
    pub(super) half_extent: f32,
}

impl OctBounds {
    fn from_points(points: &[Vec3]) -> Option<Self> {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for point in points {
            min = min.min(*point);
            max = max.max(*point);
        }

        if !min.is_finite() || !max.is_finite() {
            return None;
        }

        let center = (min + max) * 0.5;
        let span = (max - min).max(Vec3::splat(1.0));
        let half_extent = (span.max_element() * 0.5) + 1.0;

        Some(Self {
            center,
            half_extent,
        })
    }

    pub(super) fn contains(self, point: Vec3) -> bool {
        let delta = point - self.center;
        delta.x.abs() <= self.half_extent
            && delta.y.abs() <= self.half_extent
            && delta.z.abs() <= self.half_extent
    }

    fn child(self, octant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let sign = |bit: usize| if octant & bit == 0 { -quarter } else { quarter };

        Self {
            center: self.center + vec3(sign(1), sign(2), sign(4)),
            half_extent: quarter,
        }
    }

    fn octant_for(self, point: Vec3) -> usize {
        usize::from(point.x >= self.center.x)
            | (usize::from(point.y >= self.center.y) << 1)
            | (usize::from(point.z >= self.center.z) << 2)
    }

    pub(super) fn side_length(self) -> f32 {
        self.half_extent * 2.0
    }

    pub(super) fn distance_sq_to(self, other: Self) -> f32 {
        let reach = self.half_extent + other.half_extent;
        let gap = |a: f32, b: f32| ((a - b).abs() - reach).max(0.0);
        let dx = gap(self.center.x, other.center.x);
        let dy = gap(self.center.y, other.center.y);
        let dz = gap(self.center.z, other.center.z);
        (dx * dx) + (dy * dy) + (dz * dz)
    }
}

pub(super) struct OctNode {
    pub(super) bounds: OctBounds,
    pub(super) center_of_mass: Vec3,
    pub(super) mass: f32,
    pub(super) indices: Vec<usize>,
    pub(super) children: [Option<Box<OctNode>>; 8],
}

impl OctNode {
    pub(super) fn build(positions: &[Vec3]) -> Option<Self> {
        let bounds = OctBounds::from_points(positions)?;
        let indices = (0..positions.len()).collect::<Vec<_>>();
        Some(Self::build_node(bounds, indices, positions, 0))
    }

    fn build_node(bounds: OctBounds, indices: Vec<usize>, positions: &[Vec3], depth: usize) -> Self {
        let mut center_of_mass = Vec3::ZERO;
        for &index in &indices {
            center_of_mass += positions[index];
        }

        let mass = indices.len() as f32;
        if mass > 0.0 {
            center_of_mass /= mass;
        }

        let mut node = Self {
            bounds,
            center_of_mass,
            mass,
            indices,
            children: std::array::from_fn(|_| None),
        };

        if depth >= OCTREE_MAX_DEPTH || node.indices.len() <= OCTREE_LEAF_CAPACITY {
            return node;
        }

        let mut buckets = std::array::from_fn::<_, 8, _>(|_| Vec::new());
        for &index in &node.indices {
            buckets[bounds.octant_for(positions[index])].push(index);
        }

        // Coincident points cannot be separated by splitting further.
        let non_empty = buckets.iter().filter(|bucket| !bucket.is_empty()).count();
        if non_empty <= 1 {
            return node;
        }

        for (octant, bucket) in buckets.into_iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }

            node.children[octant] = Some(Box::new(Self::build_node(
                bounds.child(octant),
                bucket,
                positions,
                depth + 1,
            )));
        }
        node.indices.clear();
        node
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_large_point_sets_and_keeps_mass() {
        let positions = (0..64)
            .map(|index| {
                let value = index as f32;
                vec3(value % 4.0 * 10.0, (value / 4.0).floor() % 4.0 * 10.0, (value / 16.0).floor() * 10.0)
            })
            .collect::<Vec<_>>();
        let tree = OctNode::build(&positions).expect("finite points");

        assert!(!tree.is_leaf());
        assert_eq!(tree.mass, 64.0);
        let child_mass = tree
            .children
            .iter()
            .flatten()
            .map(|child| child.mass)
            .sum::<f32>();
        assert_eq!(child_mass, 64.0);
        for position in &positions {
            assert!(tree.bounds.contains(*position));
        }
    }

    #[test]
    fn coincident_points_stay_in_one_leaf() {
        let positions = vec![Vec3::ZERO; 40];
        let tree = OctNode::build(&positions).expect("finite points");
        assert!(tree.is_leaf());
        assert_eq!(tree.indices.len(), 40);
    }

    #[test]
    fn non_finite_points_build_nothing() {
        assert!(OctNode::build(&[vec3(f32::NAN, 0.0, 0.0)]).is_none());
        assert!(OctNode::build(&[]).is_none());
    }
}
