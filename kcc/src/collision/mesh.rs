//! Static triangle mesh collider data.
//!
//! A mesh keeps its raw buffers for closest-point queries and a parry `TriMesh`
//! for ray casts and sweeps. The BSP tree used by closest-point queries is built
//! on first use and is immutable afterwards.

use std::fmt;
use std::sync::OnceLock;

use rapier3d::parry::shape::TriMesh;

use crate::bsp::{BspTree, triangle_vertices};
use crate::error::KccError;
use crate::geometry::normalize_or_zero;

use super::types::{Point3, Transform, Vec3};

pub struct TriangleMesh {
    vertices: Vec<Point3>,
    /// Flattened triangle list, three indices per triangle.
    indices: Vec<u32>,
    shape: TriMesh,
    tree: OnceLock<BspTree>,
}

impl TriangleMesh {
    pub fn new(vertices: Vec<Point3>, indices: Vec<u32>) -> Result<Self, KccError> {
        if indices.len() % 3 != 0 {
            return Err(KccError::MeshIndexCount(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(KccError::MeshIndexOutOfRange {
                index,
                vertex_count: vertices.len(),
            });
        }
        let triangles: Vec<[u32; 3]> = indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]]).collect();
        let shape = TriMesh::new(vertices.clone(), triangles)
            .map_err(|err| KccError::MeshRejected(format!("{err:?}")))?;
        Ok(Self {
            vertices,
            indices,
            shape,
            tree: OnceLock::new(),
        })
    }

    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// The parry shape used by ray casts and sweeps.
    pub fn shape(&self) -> &TriMesh {
        &self.shape
    }

    /// BSP tree over the triangles, built on first call.
    pub fn tree(&self) -> &BspTree {
        self.tree.get_or_init(|| {
            log::info!("building BSP tree over {} triangles", self.triangle_count());
            BspTree::build(&self.vertices, &self.indices)
        })
    }

    /// Closest point on the mesh surface to `world_point`, using the mesh placed at `pose`.
    pub fn closest_point(&self, pose: &Transform, world_point: &Point3, radius: f32) -> Option<Point3> {
        self.closest_face(pose, world_point, radius).map(|(point, _)| point)
    }

    /// Closest point plus the world-space normal of the face it lies on.
    ///
    /// The normal follows the winding (counter-clockwise faces out) and is zero
    /// for a degenerate triangle.
    pub fn closest_face(&self, pose: &Transform, world_point: &Point3, radius: f32) -> Option<(Point3, Vec3)> {
        let local = pose.inverse_transform_point(world_point);
        let (triangle, point) = self
            .tree()
            .closest_triangle(&self.vertices, &self.indices, &local, radius)?;
        let [a, b, c] = triangle_vertices(&self.vertices, &self.indices, triangle)?;
        let normal = normalize_or_zero(&(b - a).cross(&(c - a)));
        Some((pose.transform_point(&point), pose.transform_vector(&normal)))
    }
}

impl fmt::Debug for TriangleMesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriangleMesh")
            .field("vertices", &self.vertices.len())
            .field("triangles", &self.triangle_count())
            .field("tree_built", &self.tree.get().is_some())
            .finish()
    }
}

/// Axis-aligned box as a 12-triangle mesh, handy for scenes and tests.
pub fn box_mesh(half_extents: [f32; 3]) -> Result<TriangleMesh, KccError> {
    let [hx, hy, hz] = half_extents;
    let vertices = vec![
        Point3::new(-hx, -hy, -hz),
        Point3::new(hx, -hy, -hz),
        Point3::new(hx, hy, -hz),
        Point3::new(-hx, hy, -hz),
        Point3::new(-hx, -hy, hz),
        Point3::new(hx, -hy, hz),
        Point3::new(hx, hy, hz),
        Point3::new(-hx, hy, hz),
    ];
    #[rustfmt::skip]
    let indices = vec![
        0, 2, 1, 0, 3, 2, // -z
        4, 5, 6, 4, 6, 7, // +z
        0, 1, 5, 0, 5, 4, // -y
        3, 7, 6, 3, 6, 2, // +y
        0, 4, 7, 0, 7, 3, // -x
        1, 2, 6, 1, 6, 5, // +x
    ];
    TriangleMesh::new(vertices, indices)
}

/// Flat `size`×`size` grid of quads on the local XZ plane, `cells` per side.
pub fn grid_mesh(size: f32, cells: u32) -> Result<TriangleMesh, KccError> {
    let cells = cells.max(1);
    let step = size / cells as f32;
    let half = size * 0.5;
    let mut vertices = Vec::with_capacity(((cells + 1) * (cells + 1)) as usize);
    for z in 0..=cells {
        for x in 0..=cells {
            vertices.push(Point3::new(x as f32 * step - half, 0.0, z as f32 * step - half));
        }
    }
    let row = cells + 1;
    let mut indices = Vec::with_capacity((cells * cells * 6) as usize);
    for z in 0..cells {
        for x in 0..cells {
            let i = z * row + x;
            indices.extend_from_slice(&[i, i + row, i + 1, i + 1, i + row, i + row + 1]);
        }
    }
    TriangleMesh::new(vertices, indices)
}
