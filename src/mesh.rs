//! Geometry for the focal objects.
//!
//! [`SurfaceMesh`] is the solid icosphere the dissolve engine classifies
//! point by point; [`WireframeMesh`] is the unique-edge line list the
//! constellation core draws.
//!
//! Both start from the same twelve golden-ratio vertices. Subdivision splits
//! every icosahedron face into `(detail + 1)²` triangles and pushes the new
//! vertices out onto the sphere, so `detail = 0` is the plain icosahedron.

use glam::{Quat, Vec3};
use std::collections::{HashMap, HashSet};

/// Golden ratio.
const PHI: f32 = 1.618_034;

/// Base icosahedron vertices (unnormalized).
const ICOSAHEDRON_VERTICES: [[f32; 3]; 12] = [
    [-1.0, PHI, 0.0],
    [1.0, PHI, 0.0],
    [-1.0, -PHI, 0.0],
    [1.0, -PHI, 0.0],
    [0.0, -1.0, PHI],
    [0.0, 1.0, PHI],
    [0.0, -1.0, -PHI],
    [0.0, 1.0, -PHI],
    [PHI, 0.0, -1.0],
    [PHI, 0.0, 1.0],
    [-PHI, 0.0, -1.0],
    [-PHI, 0.0, 1.0],
];

/// Base icosahedron faces, counter-clockwise seen from outside.
const ICOSAHEDRON_FACES: [[usize; 3]; 20] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

/// Indexed triangle mesh with per-vertex normals.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMesh {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Unit normals, parallel to `positions`.
    pub normals: Vec<Vec3>,
    /// Triangles as vertex index triples.
    pub triangles: Vec<[u32; 3]>,
}

impl SurfaceMesh {
    /// Subdivided icosahedron projected onto a sphere.
    ///
    /// Vertices shared between neighbouring sub-triangles are welded, so an
    /// icosphere of a given detail has `10·(detail+1)² + 2` vertices.
    pub fn icosphere(radius: f32, detail: u32) -> Self {
        let n = detail as usize + 1;
        let base: Vec<Vec3> = ICOSAHEDRON_VERTICES
            .iter()
            .map(|v| Vec3::from_array(*v).normalize())
            .collect();

        let mut welder = Welder::default();
        let mut triangles = Vec::with_capacity(20 * n * n);

        for face in ICOSAHEDRON_FACES {
            // Row i runs from the a-c edge to the b-c edge, shrinking toward c.
            // Grid points are keyed by their integer barycentric weights so a
            // point on a shared edge welds exactly.
            let mut grid: Vec<Vec<u32>> = Vec::with_capacity(n + 1);
            for i in 0..=n {
                let cols = n - i;
                let row = (0..=cols)
                    .map(|j| {
                        let weights = [(face[0], cols - j), (face[1], j), (face[2], i)];
                        welder.index_of(&base, weights, n, radius)
                    })
                    .collect();
                grid.push(row);
            }

            for i in 0..n {
                for j in 0..(2 * (n - i) - 1) {
                    let k = j / 2;
                    let tri = if j % 2 == 0 {
                        [grid[i][k], grid[i][k + 1], grid[i + 1][k]]
                    } else {
                        [grid[i][k + 1], grid[i + 1][k + 1], grid[i + 1][k]]
                    };
                    triangles.push(tri);
                }
            }
        }

        let positions = welder.positions;
        let normals = positions.iter().map(|p| p.normalize_or_zero()).collect();
        Self {
            positions,
            normals,
            triangles,
        }
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Unique undirected edges as index pairs `(low, high)`, in first-seen order.
    pub fn edges(&self) -> Vec<(u32, u32)> {
        let mut seen = HashSet::with_capacity(self.triangles.len() * 3 / 2);
        let mut edges = Vec::with_capacity(self.triangles.len() * 3 / 2);
        for tri in &self.triangles {
            for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                let key = (a.min(b), a.max(b));
                if seen.insert(key) {
                    edges.push(key);
                }
            }
        }
        edges
    }

    /// Lowest and highest Y over all vertices; `(0, 0)` for an empty mesh.
    pub fn y_extent(&self) -> (f32, f32) {
        if self.positions.is_empty() {
            return (0.0, 0.0);
        }
        self.positions
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)))
    }
}

#[derive(Default)]
struct Welder {
    positions: Vec<Vec3>,
    lookup: HashMap<[(usize, usize); 3], u32>,
}

impl Welder {
    fn index_of(&mut self, base: &[Vec3], weights: [(usize, usize); 3], n: usize, radius: f32) -> u32 {
        let mut key = weights.map(|(v, w)| if w == 0 { (usize::MAX, 0) } else { (v, w) });
        key.sort_unstable();
        if let Some(&index) = self.lookup.get(&key) {
            return index;
        }
        let p = weights
            .iter()
            .fold(Vec3::ZERO, |acc, &(v, w)| acc + base[v] * (w as f32 / n as f32));
        let index = self.positions.len() as u32;
        self.positions.push(p.normalize() * radius);
        self.lookup.insert(key, index);
        index
    }
}

/// Wireframe mesh for line rendering.
///
/// ```ignore
/// let core = WireframeMesh::icosahedron(1.2, 1);
/// assert_eq!(core.line_count(), 120);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WireframeMesh {
    /// Line segments as pairs of endpoints (start, end).
    pub lines: Vec<(Vec3, Vec3)>,
}

impl WireframeMesh {
    /// Create a wireframe from arbitrary line segments.
    pub fn custom(lines: Vec<(Vec3, Vec3)>) -> Self {
        Self { lines }
    }

    /// Every unique edge of a surface mesh.
    pub fn from_surface(mesh: &SurfaceMesh) -> Self {
        let lines = mesh
            .edges()
            .into_iter()
            .map(|(a, b)| (mesh.positions[a as usize], mesh.positions[b as usize]))
            .collect();
        Self { lines }
    }

    /// Subdivided icosahedron outline.
    pub fn icosahedron(radius: f32, detail: u32) -> Self {
        Self::from_surface(&SurfaceMesh::icosphere(radius, detail))
    }

    /// Number of line segments.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Flatten to vertex data for GPU upload (2 vertices per line).
    pub fn to_vertices(&self) -> Vec<Vec3> {
        let mut out = Vec::with_capacity(self.lines.len() * 2);
        for (a, b) in &self.lines {
            out.push(*a);
            out.push(*b);
        }
        out
    }

    /// A rotated and uniformly scaled copy.
    pub fn transformed(&self, rotation: Quat, scale: f32) -> Self {
        let mut lines = Vec::with_capacity(self.lines.len());
        self.transform_into(rotation, scale, &mut lines);
        Self { lines }
    }

    /// Write the rotated and scaled segments into a reusable buffer.
    pub fn transform_into(&self, rotation: Quat, scale: f32, out: &mut Vec<(Vec3, Vec3)>) {
        out.clear();
        out.extend(
            self.lines
                .iter()
                .map(|(a, b)| (rotation * (*a * scale), rotation * (*b * scale))),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icosphere_counts() {
        for detail in 0..5u32 {
            let n = (detail + 1) as usize;
            let mesh = SurfaceMesh::icosphere(1.0, detail);
            assert_eq!(mesh.triangle_count(), 20 * n * n);
            assert_eq!(mesh.vertex_count(), 10 * n * n + 2);
            assert_eq!(mesh.edges().len(), 30 * n * n);
        }
    }

    #[test]
    fn test_icosphere_on_sphere() {
        let mesh = SurfaceMesh::icosphere(1.5, 4);
        for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
            assert!((p.length() - 1.5).abs() < 1e-4);
            assert!((n.length() - 1.0).abs() < 1e-4);
        }
        let (lo, hi) = mesh.y_extent();
        assert!(lo < -1.4 && hi > 1.4);
    }

    #[test]
    fn test_icosphere_winding_faces_outward() {
        let mesh = SurfaceMesh::icosphere(1.0, 2);
        for tri in &mesh.triangles {
            let [a, b, c] = tri.map(|i| mesh.positions[i as usize]);
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn test_wireframe_icosahedron() {
        let plain = WireframeMesh::icosahedron(1.0, 0);
        assert_eq!(plain.line_count(), 30);
        assert_eq!(plain.to_vertices().len(), 60);

        let core = WireframeMesh::icosahedron(1.2, 1);
        assert_eq!(core.line_count(), 120);
    }

    #[test]
    fn test_transformed_scales() {
        let mesh = WireframeMesh::icosahedron(1.0, 0);
        let scaled = mesh.transformed(Quat::from_rotation_y(0.7), 2.0);
        for (a, _) in &scaled.lines {
            assert!((a.length() - 2.0).abs() < 1e-4);
        }
    }
}
