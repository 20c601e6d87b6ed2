/*!
Binary space partition tree over the triangles of a static mesh.

Used to answer "closest point on this mesh" without scanning every triangle.

Build
- Each node computes the AABB of its triangles' vertices, splits on the plane
  through the AABB center whose normal is the cardinal axis of greatest extent
  (X wins ties over Y, Y over Z).
- A triangle goes positive when all three vertices are on or above the plane,
  negative when none are, and to both sides when it straddles.
- A child keeps splitting while it is strictly smaller than its parent and holds
  more than 3 triangles; otherwise it becomes a leaf.

Nodes live in an arena and reference their children by index. Triangles are
identified by their position in the flattened index buffer divided by 3.
*/

use crate::collision::types::{Point3, Vec3};
use crate::geometry::{closest_point_on_triangle, point_above_plane, signed_distance_plane_point};

/// Triangle sets at or below this size never split further.
const MIN_SPLIT_TRIANGLES: usize = 3;

#[derive(Clone, Debug, PartialEq)]
pub enum BspNode {
    Split {
        point: Point3,
        /// Cardinal unit axis.
        normal: Vec3,
        positive: usize,
        negative: usize,
    },
    Leaf {
        triangles: Vec<usize>,
    },
}

#[derive(Clone, Debug)]
pub struct BspTree {
    nodes: Vec<BspNode>,
    root: usize,
}

impl BspTree {
    pub fn build(vertices: &[Point3], indices: &[u32]) -> Self {
        let triangle_count = indices.len() / 3;
        let mut tree = Self {
            nodes: Vec::new(),
            root: 0,
        };
        if triangle_count == 0 {
            tree.nodes.push(BspNode::Leaf {
                triangles: Vec::new(),
            });
            return tree;
        }
        let all: Vec<usize> = (0..triangle_count).collect();
        tree.root = tree.build_split(vertices, indices, all);
        tree
    }

    /// Assemble a tree from raw nodes. No validation: queries skip dangling
    /// child indices and out-of-range triangles with a warning.
    pub fn from_nodes(nodes: Vec<BspNode>, root: usize) -> Self {
        Self { nodes, root }
    }

    pub fn nodes(&self) -> &[BspNode] {
        &self.nodes
    }

    pub fn root(&self) -> usize {
        self.root
    }

    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self.root, 1usize)];
        while let Some((index, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            if let Some(BspNode::Split { positive, negative, .. }) = self.nodes.get(index) {
                stack.push((*positive, depth + 1));
                stack.push((*negative, depth + 1));
            }
        }
        deepest
    }

    fn push(&mut self, node: BspNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn build_split(&mut self, vertices: &[Point3], indices: &[u32], triangles: Vec<usize>) -> usize {
        let (point, normal) = partition_plane(vertices, indices, &triangles);

        let mut positive_set = Vec::new();
        let mut negative_set = Vec::new();
        for &t in &triangles {
            let Some(corners) = triangle_vertices(vertices, indices, t) else {
                log::warn!("triangle {t} indexes outside the mesh buffers, left out of the tree");
                continue;
            };
            let above = corners
                .iter()
                .filter(|v| point_above_plane(&normal, &point, v))
                .count();
            match above {
                3 => positive_set.push(t),
                0 => negative_set.push(t),
                _ => {
                    positive_set.push(t);
                    negative_set.push(t);
                }
            }
        }

        let parent_len = triangles.len();
        let positive = self.build_child(vertices, indices, positive_set, parent_len);
        let negative = self.build_child(vertices, indices, negative_set, parent_len);
        self.push(BspNode::Split {
            point,
            normal,
            positive,
            negative,
        })
    }

    fn build_child(
        &mut self,
        vertices: &[Point3],
        indices: &[u32],
        triangles: Vec<usize>,
        parent_len: usize,
    ) -> usize {
        if triangles.len() < parent_len && triangles.len() > MIN_SPLIT_TRIANGLES {
            self.build_split(vertices, indices, triangles)
        } else {
            self.push(BspNode::Leaf { triangles })
        }
    }

    /// Collect every triangle that may hold the closest point to `point` within `radius`.
    ///
    /// Children are visited positive first. Triangles duplicated across a split
    /// can appear more than once.
    pub fn find_closest_triangles(&self, point: &Point3, radius: f32, out: &mut Vec<usize>) {
        let mut stack = vec![self.root];
        while let Some(index) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                log::warn!("BSP node {index} is missing, skipping branch");
                continue;
            };
            match node {
                BspNode::Leaf { triangles } => out.extend_from_slice(triangles),
                BspNode::Split {
                    point: plane_point,
                    normal,
                    positive,
                    negative,
                } => {
                    let distance = signed_distance_plane_point(normal, plane_point, point);
                    if distance.abs() <= radius {
                        // Stack order: positive pops first.
                        stack.push(*negative);
                        stack.push(*positive);
                    } else if distance >= 0.0 {
                        stack.push(*positive);
                    } else {
                        stack.push(*negative);
                    }
                }
            }
        }
    }

    /// Closest point on the mesh to `point`, all in mesh-local space.
    ///
    /// `None` when no candidate triangle was found.
    pub fn closest_point(
        &self,
        vertices: &[Point3],
        indices: &[u32],
        point: &Point3,
        radius: f32,
    ) -> Option<Point3> {
        self.closest_triangle(vertices, indices, point, radius).map(|(_, p)| p)
    }

    /// Like [`BspTree::closest_point`], also naming the triangle the point lies on.
    pub fn closest_triangle(
        &self,
        vertices: &[Point3],
        indices: &[u32],
        point: &Point3,
        radius: f32,
    ) -> Option<(usize, Point3)> {
        let mut candidates = Vec::new();
        self.find_closest_triangles(point, radius, &mut candidates);
        closest_triangle_among(vertices, indices, &candidates, point)
    }
}

/// Linear scan keeping the minimum squared distance. Later candidates win ties.
pub fn closest_point_among(
    vertices: &[Point3],
    indices: &[u32],
    triangles: &[usize],
    point: &Point3,
) -> Option<Point3> {
    closest_triangle_among(vertices, indices, triangles, point).map(|(_, p)| p)
}

fn closest_triangle_among(
    vertices: &[Point3],
    indices: &[u32],
    triangles: &[usize],
    point: &Point3,
) -> Option<(usize, Point3)> {
    let mut best: Option<(f32, usize, Point3)> = None;
    for &t in triangles {
        let Some([a, b, c]) = triangle_vertices(vertices, indices, t) else {
            log::warn!("BSP triangle {t} indexes outside the mesh buffers, skipping");
            continue;
        };
        let nearest = closest_point_on_triangle(&a, &b, &c, point);
        let distance = (point - nearest).norm_squared();
        if best.is_none_or(|(shortest, _, _)| distance <= shortest) {
            best = Some((distance, t, nearest));
        }
    }
    best.map(|(_, t, p)| (t, p))
}

/// Corners of triangle `triangle`, or `None` when the buffers do not hold it.
pub fn triangle_vertices(vertices: &[Point3], indices: &[u32], triangle: usize) -> Option<[Point3; 3]> {
    let base = triangle.checked_mul(3)?;
    let corner = |k: usize| -> Option<Point3> {
        let index = *indices.get(base.checked_add(k)?)?;
        vertices.get(index as usize).copied()
    };
    Some([corner(0)?, corner(1)?, corner(2)?])
}

fn partition_plane(vertices: &[Point3], indices: &[u32], triangles: &[usize]) -> (Point3, Vec3) {
    let mut mins = Vec3::repeat(f32::INFINITY);
    let mut maxs = Vec3::repeat(f32::NEG_INFINITY);
    for &t in triangles {
        for v in triangle_vertices(vertices, indices, t).into_iter().flatten() {
            mins = mins.inf(&v.coords);
            maxs = maxs.sup(&v.coords);
        }
    }
    let extents = maxs - mins;
    let normal = if extents.x >= extents.y && extents.x >= extents.z {
        Vec3::x()
    } else if extents.y >= extents.z {
        Vec3::y()
    } else {
        Vec3::z()
    };
    (Point3::from((mins + maxs) * 0.5), normal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::mesh::{box_mesh, grid_mesh};

    fn brute_force(vertices: &[Point3], indices: &[u32], point: &Point3) -> Point3 {
        let all: Vec<usize> = (0..indices.len() / 3).collect();
        closest_point_among(vertices, indices, &all, point).unwrap()
    }

    #[test]
    fn out_of_range_triangles_are_skipped() {
        let vertices = vec![
            Point3::new(-1.0, 0.0, -1.0),
            Point3::new(-1.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, -1.0),
        ];
        // Second triangle points past the vertex buffer, third is cut short.
        let indices = vec![0, 1, 2, 0, 7, 2, 1, 2];
        let tree = BspTree::build(&vertices, &indices);
        let (triangle, point) = tree
            .closest_triangle(&vertices, &indices, &Point3::new(-0.5, 2.0, -0.5), 3.0)
            .unwrap();
        assert_eq!(triangle, 0);
        assert!((point - Point3::new(-0.5, 0.0, -0.5)).norm() < 1.0e-6);

        let dangling = BspTree::from_nodes(vec![BspNode::Leaf { triangles: vec![5] }], 0);
        assert_eq!(dangling.closest_point(&vertices, &indices, &Point3::origin(), 1.0), None);
        assert_eq!(triangle_vertices(&vertices, &indices, 1), None);
    }

    /// Bumpy terrain: a grid with a deterministic height field.
    fn terrain() -> (Vec<Point3>, Vec<u32>) {
        let grid = grid_mesh(8.0, 8).unwrap();
        let vertices = grid
            .vertices()
            .iter()
            .map(|v| Point3::new(v.x, (v.x * 1.3).sin() * 0.4 + (v.z * 0.7).cos() * 0.3, v.z))
            .collect();
        (vertices, grid.indices().to_vec())
    }

    #[test]
    fn root_is_split_and_children_are_valid() {
        let (vertices, indices) = terrain();
        let tree = BspTree::build(&vertices, &indices);
        assert!(matches!(tree.nodes()[tree.root()], BspNode::Split { .. }));
        for node in tree.nodes() {
            if let BspNode::Split { positive, negative, normal, .. } = node {
                assert!(*positive < tree.nodes().len());
                assert!(*negative < tree.nodes().len());
                assert!((normal.norm() - 1.0).abs() < 1.0e-6);
            }
        }
        assert!(tree.depth() > 2);
    }

    #[test]
    fn longest_axis_wins_with_x_first_on_ties() {
        let cube = box_mesh([1.0, 1.0, 1.0]).unwrap();
        let tree = BspTree::build(cube.vertices(), cube.indices());
        let BspNode::Split { normal, point, .. } = &tree.nodes()[tree.root()] else {
            panic!("root must split");
        };
        assert_eq!(*normal, Vec3::x());
        assert_eq!(*point, Point3::origin());

        let slab = box_mesh([1.0, 1.0, 4.0]).unwrap();
        let tree = BspTree::build(slab.vertices(), slab.indices());
        let BspNode::Split { normal, .. } = &tree.nodes()[tree.root()] else {
            panic!("root must split");
        };
        assert_eq!(*normal, Vec3::z());
    }

    #[test]
    fn straddling_triangles_land_on_both_sides() {
        // One triangle crossing x = 0 plus three on each side.
        let mut vertices = vec![
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let mut indices = vec![0, 1, 2];
        for side in [-1.0f32, 1.0] {
            for k in 0..3 {
                let base = vertices.len() as u32;
                let x = side * (2.0 + k as f32);
                vertices.push(Point3::new(x, 0.0, 0.0));
                vertices.push(Point3::new(x + side * 0.5, 0.0, 0.0));
                vertices.push(Point3::new(x, 0.0, 0.5));
                indices.extend_from_slice(&[base, base + 1, base + 2]);
            }
        }
        let tree = BspTree::build(&vertices, &indices);
        let BspNode::Split { positive, negative, .. } = &tree.nodes()[tree.root()] else {
            panic!("root must split");
        };
        // Four triangles per side: not more than 3 and smaller than 7, so both recurse or
        // end in leaves that include triangle 0.
        let mut left = Vec::new();
        let mut right = Vec::new();
        collect(&tree, *positive, &mut right);
        collect(&tree, *negative, &mut left);
        assert!(right.contains(&0) && left.contains(&0));
        assert!(right.iter().all(|t| *t == 0 || *t >= 4));
        assert!(left.iter().all(|t| *t <= 3));
    }

    fn collect(tree: &BspTree, index: usize, out: &mut Vec<usize>) {
        match &tree.nodes()[index] {
            BspNode::Leaf { triangles } => out.extend_from_slice(triangles),
            BspNode::Split { positive, negative, .. } => {
                collect(tree, *positive, out);
                collect(tree, *negative, out);
            }
        }
    }

    #[test]
    fn tree_query_never_loses_to_brute_force() {
        let (vertices, indices) = terrain();
        let tree = BspTree::build(&vertices, &indices);
        for i in 0..40 {
            let f = i as f32;
            let p = Point3::new((f * 0.37).sin() * 5.0, 0.5 + (f * 0.11).cos(), (f * 0.53).cos() * 5.0);
            // A radius at least as large as the true distance guarantees completeness.
            let exact = brute_force(&vertices, &indices, &p);
            let radius = (exact - p).norm() + 1.0e-3;
            let fast = tree.closest_point(&vertices, &indices, &p, radius).unwrap();
            let fast_d = (fast - p).norm_squared();
            let exact_d = (exact - p).norm_squared();
            assert!(fast_d <= exact_d + 1.0e-6, "tree {fast_d} vs brute {exact_d} at {p:?}");
        }
    }

    #[test]
    fn missing_child_is_skipped_not_fatal() {
        let tree = BspTree::from_nodes(
            vec![
                BspNode::Leaf { triangles: vec![0] },
                BspNode::Split {
                    point: Point3::origin(),
                    normal: Vec3::x(),
                    positive: 0,
                    negative: 42,
                },
            ],
            1,
        );
        let mut out = Vec::new();
        tree.find_closest_triangles(&Point3::origin(), 1.0, &mut out);
        assert_eq!(out, vec![0]);
    }

    #[test]
    fn empty_mesh_yields_no_point() {
        let tree = BspTree::build(&[], &[]);
        assert_eq!(tree.closest_point(&[], &[], &Point3::origin(), 1.0), None);
    }

    #[test]
    fn far_side_queries_visit_one_child() {
        let cube = box_mesh([1.0, 1.0, 1.0]).unwrap();
        let tree = BspTree::build(cube.vertices(), cube.indices());
        let mut near_plane = Vec::new();
        let mut far_right = Vec::new();
        tree.find_closest_triangles(&Point3::new(0.0, 0.0, 0.0), 0.5, &mut near_plane);
        tree.find_closest_triangles(&Point3::new(5.0, 0.0, 0.0), 0.5, &mut far_right);
        assert!(far_right.len() < near_plane.len());
        // -x face triangles are 8 and 9 in `box_mesh`.
        assert!(!far_right.contains(&8) && !far_right.contains(&9));
    }
}
