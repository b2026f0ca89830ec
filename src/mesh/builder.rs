//! Heightfield to triangle mesh conversion with a border skirt.
//!
//! Each chunk's height grid carries one extra ring of samples on every side.
//! Those border vertices live in their own index space: they take part in
//! triangulation so that normals along the seam see the neighbouring slope,
//! but they are never written to the emitted vertex buffer. Adjacent chunks
//! therefore shade continuously without knowing about each other.
//!
//! LOD simplification keeps an interior vertex only when `(x - 1)` and
//! `(y - 1)` are multiples of the skip factor. The border ring is always
//! present, and the strip between the border and the first interior line is
//! always one cell wide.

use glam::{Vec2, Vec3};

use super::payload::MeshPayload;
use super::settings::MeshSettings;
use crate::terrain::HeightGrid;

/// Address of a vertex in either the emitted buffer or the border buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum VertexRef {
    Mesh(u32),
    Border(u32),
}

/// Builds [`MeshPayload`]s for one mesh layout and LOD skip factor
#[derive(Clone, Debug)]
pub struct MeshBuilder {
    vertices_per_line: usize,
    mesh_world_size: f32,
    skip: usize,
}

impl MeshBuilder {
    /// Create a builder. A skip factor of zero is treated as one.
    pub fn new(settings: &MeshSettings, skip: u32) -> Self {
        let skip = skip.max(1) as usize;
        debug_assert_eq!(
            settings.resolution() % skip,
            0,
            "LOD skip {} does not divide chunk resolution {}",
            skip,
            settings.resolution()
        );
        Self {
            vertices_per_line: settings.vertices_per_line(),
            mesh_world_size: settings.mesh_world_size(),
            skip,
        }
    }

    pub fn skip(&self) -> usize {
        self.skip
    }

    /// Number of vertices an emitted mesh will have
    pub fn emitted_vertex_count(&self) -> usize {
        let per_side = self.retained_lines().len() - 2;
        per_side * per_side
    }

    /// Build using raw grid samples as vertex height
    pub fn build(&self, grid: &HeightGrid) -> MeshPayload {
        self.build_with_heights(grid, |raw| raw)
    }

    /// Build a flat plane at height zero
    pub fn build_flat(&self) -> MeshPayload {
        self.build(&HeightGrid::flat(self.vertices_per_line, self.vertices_per_line))
    }

    /// Build, mapping each raw sample through `height` to get vertex height.
    ///
    /// # Panics
    /// Panics if the grid is not `vertices_per_line` square.
    pub fn build_with_heights<F>(&self, grid: &HeightGrid, height: F) -> MeshPayload
    where
        F: Fn(f32) -> f32,
    {
        let n = self.vertices_per_line;
        assert!(
            grid.width() == n && grid.height() == n,
            "height grid is {}x{}, mesh layout expects {}x{}",
            grid.width(),
            grid.height(),
            n,
            n
        );

        let last = n - 1;
        let resolution = (n - 1 - super::settings::NUM_BORDER_VERTICES) as f32;
        let top_left = Vec2::new(-1.0, 1.0) * self.mesh_world_size / 2.0;
        let lines = self.retained_lines();

        let mut assembly = MeshAssembly::with_capacity(self.emitted_vertex_count(), n * 4);
        let mut index_map: Vec<Option<VertexRef>> = vec![None; n * n];

        for y in 0..n {
            for x in 0..n {
                let is_border = x == 0 || x == last || y == 0 || y == last;
                let is_retained = is_border || ((x - 1) % self.skip == 0 && (y - 1) % self.skip == 0);
                if !is_retained {
                    continue;
                }

                let percent = Vec2::new(x as f32 - 1.0, y as f32 - 1.0) / resolution;
                let position = Vec3::new(
                    top_left.x + percent.x * self.mesh_world_size,
                    height(grid.get(x, y)),
                    top_left.y - percent.y * self.mesh_world_size,
                );

                index_map[y * n + x] = Some(if is_border {
                    assembly.push_border(position)
                } else {
                    assembly.push_vertex(position, percent)
                });
            }
        }

        for rows in lines.windows(2) {
            let (y0, y1) = (rows[0], rows[1]);
            for cols in lines.windows(2) {
                let (x0, x1) = (cols[0], cols[1]);
                let (Some(a), Some(b), Some(c), Some(d)) = (
                    index_map[y0 * n + x0],
                    index_map[y0 * n + x1],
                    index_map[y1 * n + x0],
                    index_map[y1 * n + x1],
                ) else {
                    debug_assert!(false, "quad corner was not retained");
                    continue;
                };
                assembly.push_triangle(d, a, b);
                assembly.push_triangle(a, d, c);
            }
        }

        assembly.finish()
    }

    /// Grid lines (same for rows and columns) that carry vertices at this LOD:
    /// the border line, every `skip`-th interior line, then the far border.
    fn retained_lines(&self) -> Vec<usize> {
        let last = self.vertices_per_line - 1;
        let mut lines = Vec::with_capacity(last / self.skip + 3);
        lines.push(0);
        lines.extend((1..last).filter(|i| (i - 1) % self.skip == 0));
        lines.push(last);
        lines
    }
}

/// Vertex/triangle buffers under construction, including border-only data
struct MeshAssembly {
    positions: Vec<Vec3>,
    uvs: Vec<Vec2>,
    indices: Vec<u32>,
    border_positions: Vec<Vec3>,
    border_triangles: Vec<[VertexRef; 3]>,
}

impl MeshAssembly {
    fn with_capacity(vertices: usize, border_vertices: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices),
            uvs: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(vertices * 6),
            border_positions: Vec::with_capacity(border_vertices),
            border_triangles: Vec::new(),
        }
    }

    fn push_vertex(&mut self, position: Vec3, uv: Vec2) -> VertexRef {
        self.positions.push(position);
        self.uvs.push(uv);
        VertexRef::Mesh(self.positions.len() as u32 - 1)
    }

    fn push_border(&mut self, position: Vec3) -> VertexRef {
        self.border_positions.push(position);
        VertexRef::Border(self.border_positions.len() as u32 - 1)
    }

    fn push_triangle(&mut self, a: VertexRef, b: VertexRef, c: VertexRef) {
        match (a, b, c) {
            (VertexRef::Mesh(a), VertexRef::Mesh(b), VertexRef::Mesh(c)) => {
                self.indices.extend_from_slice(&[a, b, c]);
            }
            _ => self.border_triangles.push([a, b, c]),
        }
    }

    fn position(&self, vertex: VertexRef) -> Vec3 {
        match vertex {
            VertexRef::Mesh(i) => self.positions[i as usize],
            VertexRef::Border(i) => self.border_positions[i as usize],
        }
    }

    /// Area-weighted vertex normals.
    ///
    /// Every triangle, border ones included, adds its unnormalized face
    /// normal to all three corners; only emitted vertices are kept.
    fn bake_normals(&self) -> Vec<Vec3> {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        let mut border_normals = vec![Vec3::ZERO; self.border_positions.len()];

        let mesh_triangles = self
            .indices
            .chunks_exact(3)
            .map(|t| [VertexRef::Mesh(t[0]), VertexRef::Mesh(t[1]), VertexRef::Mesh(t[2])]);

        for triangle in mesh_triangles.chain(self.border_triangles.iter().copied()) {
            let [a, b, c] = triangle.map(|v| self.position(v));
            let face = (b - a).cross(c - a);
            for vertex in triangle {
                match vertex {
                    VertexRef::Mesh(i) => normals[i as usize] += face,
                    VertexRef::Border(i) => border_normals[i as usize] += face,
                }
            }
        }

        for normal in &mut normals {
            *normal = normal.normalize_or_zero();
        }
        normals
    }

    fn finish(self) -> MeshPayload {
        let normals = self.bake_normals();
        MeshPayload {
            positions: self.positions,
            uvs: self.uvs,
            normals,
            indices: self.indices,
        }
    }
}
