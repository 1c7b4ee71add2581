//! Height grid triangulation with border-aware normals
//!
//! A chunk's height grid carries one extra ring of cells around the area that
//! is actually rendered. Vertices on that ring are built like any other
//! vertex, and the triangles touching them are kept in a separate list: they
//! never reach the output, but their face normals are accumulated into the
//! interior vertices they share. The edge normals of a chunk therefore match
//! the ones its neighbour computes, and lighting is continuous across chunk
//! seams without either chunk seeing the other's data.
//!
//! ```text
//!   B  B  B  B  B      B = border vertex (not emitted)
//!   B  i  i  i  B      i = interior vertex
//!   B  i  i  i  B
//!   B  i  i  i  B
//!   B  B  B  B  B
//! ```

use std::sync::Arc;

use super::geometry::{face_normal, GeometryBuffer, Shading};
use crate::core::error::Error;
use crate::core::types::{Result, Vec2, Vec3};
use crate::terrain::curve::{HeightCurve, KeyframeCurve};
use crate::terrain::height_grid::HeightGrid;

/// Largest supported simplification level (step 12)
pub const MAX_SIMPLIFICATION_LEVEL: u32 = 6;

/// Lattice step for a simplification level: 1 for level 0, else `2 * level`.
pub fn simplification_step(level: u32) -> usize {
    if level == 0 { 1 } else { level as usize * 2 }
}

/// Whether a grid of side `grid_size` can be triangulated with `step`.
pub fn is_step_aligned(grid_size: usize, step: usize) -> bool {
    step > 0 && grid_size > 0 && (grid_size - 1) % step == 0 && grid_size - 1 >= 2 * step
}

/// Interior vertices per side for a grid of side `grid_size` at `step`.
pub fn vertices_per_line(grid_size: usize, step: usize) -> usize {
    (grid_size - 1) / step - 1
}

/// Index into either the interior vertex array or the border vertex array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexIndex {
    Interior(u32),
    Border(u32),
}

impl VertexIndex {
    fn interior(self) -> Option<usize> {
        match self {
            VertexIndex::Interior(i) => Some(i as usize),
            VertexIndex::Border(_) => None,
        }
    }
}

/// Working buffers for one build
struct MeshData {
    vertices: Vec<Vec3>,
    uvs: Vec<Vec2>,
    border_vertices: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
    border_triangles: Vec<[VertexIndex; 3]>,
}

impl MeshData {
    fn with_capacity(per_line: usize) -> Self {
        let interior = per_line * per_line;
        Self {
            vertices: Vec::with_capacity(interior),
            uvs: Vec::with_capacity(interior),
            border_vertices: Vec::with_capacity(per_line * 4 + 4),
            triangles: Vec::with_capacity(per_line.saturating_sub(1).pow(2) * 2),
            border_triangles: Vec::with_capacity(per_line * 8 + 8),
        }
    }

    fn add_vertex(&mut self, index: VertexIndex, position: Vec3, uv: Vec2) {
        match index {
            VertexIndex::Interior(i) => {
                debug_assert_eq!(i as usize, self.vertices.len());
                self.vertices.push(position);
                self.uvs.push(uv);
            }
            VertexIndex::Border(i) => {
                debug_assert_eq!(i as usize, self.border_vertices.len());
                self.border_vertices.push(position);
            }
        }
    }

    fn add_triangle(&mut self, a: VertexIndex, b: VertexIndex, c: VertexIndex) {
        match (a, b, c) {
            (VertexIndex::Interior(a), VertexIndex::Interior(b), VertexIndex::Interior(c)) => {
                self.triangles.push([a, b, c]);
            }
            _ => self.border_triangles.push([a, b, c]),
        }
    }

    fn position(&self, index: VertexIndex) -> Vec3 {
        match index {
            VertexIndex::Interior(i) => self.vertices[i as usize],
            VertexIndex::Border(i) => self.border_vertices[i as usize],
        }
    }

    /// Area-weighted vertex normals from both triangle lists; border vertices
    /// receive nothing.
    fn bake_normals(&self) -> Vec<Vec3> {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];

        for &[a, b, c] in &self.triangles {
            let (a, b, c) = (a as usize, b as usize, c as usize);
            let n = face_normal(self.vertices[a], self.vertices[b], self.vertices[c]);
            normals[a] += n;
            normals[b] += n;
            normals[c] += n;
        }

        for &[a, b, c] in &self.border_triangles {
            let n = face_normal(self.position(a), self.position(b), self.position(c));
            for index in [a, b, c].into_iter().filter_map(VertexIndex::interior) {
                normals[index] += n;
            }
        }

        for n in &mut normals {
            *n = n.normalize_or_zero();
        }
        normals
    }

    fn into_smooth(self) -> GeometryBuffer {
        let normals = self.bake_normals();
        GeometryBuffer {
            vertices: self.vertices,
            uvs: self.uvs,
            triangles: self.triangles,
            normals,
            shading: Shading::Smooth,
        }
    }

    fn into_flat(self) -> GeometryBuffer {
        let corner_count = self.triangles.len() * 3;
        let mut vertices = Vec::with_capacity(corner_count);
        let mut uvs = Vec::with_capacity(corner_count);
        let mut triangles = Vec::with_capacity(self.triangles.len());

        for tri in &self.triangles {
            let base = vertices.len() as u32;
            for &i in tri {
                vertices.push(self.vertices[i as usize]);
                uvs.push(self.uvs[i as usize]);
            }
            triangles.push([base, base + 1, base + 2]);
        }

        let mut geometry = GeometryBuffer {
            vertices,
            uvs,
            triangles,
            normals: Vec::new(),
            shading: Shading::Flat,
        };
        geometry.recalculate_normals();
        geometry
    }
}

/// Converts height grids into chunk geometry.
#[derive(Clone)]
pub struct MeshBuilder {
    height_multiplier: f32,
    height_curve: Arc<dyn HeightCurve>,
    flat_shading: bool,
}

impl std::fmt::Debug for MeshBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshBuilder")
            .field("height_multiplier", &self.height_multiplier)
            .field("flat_shading", &self.flat_shading)
            .finish_non_exhaustive()
    }
}

impl Default for MeshBuilder {
    fn default() -> Self {
        Self::new(1.0, Arc::new(KeyframeCurve::linear()), false)
    }
}

impl MeshBuilder {
    pub fn new(height_multiplier: f32, height_curve: Arc<dyn HeightCurve>, flat_shading: bool) -> Self {
        Self {
            height_multiplier,
            height_curve,
            flat_shading,
        }
    }

    pub fn height_multiplier(&self) -> f32 {
        self.height_multiplier
    }

    pub fn height_curve(&self) -> &Arc<dyn HeightCurve> {
        &self.height_curve
    }

    pub fn flat_shading(&self) -> bool {
        self.flat_shading
    }

    /// Triangulate `grid` at `simplification_level`.
    ///
    /// Fails with [`Error::UnalignedGrid`] if `(grid.size() - 1)` is not a
    /// multiple of the simplification step or leaves no interior vertices.
    pub fn build(&self, grid: &HeightGrid, simplification_level: u32) -> Result<GeometryBuffer> {
        let step = simplification_step(simplification_level);
        let bordered_size = grid.size();
        if !is_step_aligned(bordered_size, step) {
            return Err(Error::UnalignedGrid { size: bordered_size, step });
        }

        let mesh_size = (bordered_size - 2 * step) as f32;
        let unsimplified_size = (bordered_size - 2) as f32;
        let top_left_x = (unsimplified_size - 1.0) / -2.0;
        let top_left_z = (unsimplified_size - 1.0) / 2.0;

        let lattice_line = (bordered_size - 1) / step + 1;
        let index_map = vertex_index_map(bordered_size, step);
        let mut data = MeshData::with_capacity(vertices_per_line(bordered_size, step));

        for ly in 0..lattice_line {
            for lx in 0..lattice_line {
                let (x, y) = (lx * step, ly * step);
                let index = index_map[ly * lattice_line + lx];

                let percent = Vec2::new(
                    (x as f32 - step as f32) / mesh_size,
                    (y as f32 - step as f32) / mesh_size,
                );
                let height = self.height_curve.evaluate(grid.get(x, y)) * self.height_multiplier;
                let position = Vec3::new(
                    top_left_x + percent.x * unsimplified_size,
                    height,
                    top_left_z - percent.y * unsimplified_size,
                );
                data.add_vertex(index, position, percent);

                if lx + 1 < lattice_line && ly + 1 < lattice_line {
                    let a = index;
                    let b = index_map[ly * lattice_line + lx + 1];
                    let c = index_map[(ly + 1) * lattice_line + lx];
                    let d = index_map[(ly + 1) * lattice_line + lx + 1];
                    data.add_triangle(a, d, c);
                    data.add_triangle(d, a, b);
                }
            }
        }

        log::trace!(
            "Built mesh step {step}: {} vertices, {} triangles, {} border triangles",
            data.vertices.len(),
            data.triangles.len(),
            data.border_triangles.len()
        );

        Ok(if self.flat_shading { data.into_flat() } else { data.into_smooth() })
    }
}

/// Classify every lattice cell as interior or border, numbering each kind in
/// row-major lattice order.
fn vertex_index_map(bordered_size: usize, step: usize) -> Vec<VertexIndex> {
    let lattice_line = (bordered_size - 1) / step + 1;
    let last = bordered_size - 1;
    let mut map = Vec::with_capacity(lattice_line * lattice_line);
    let mut interior = 0u32;
    let mut border = 0u32;

    for ly in 0..lattice_line {
        for lx in 0..lattice_line {
            let (x, y) = (lx * step, ly * step);
            if x == 0 || y == 0 || x == last || y == last {
                map.push(VertexIndex::Border(border));
                border += 1;
            } else {
                map.push(VertexIndex::Interior(interior));
                interior += 1;
            }
        }
    }
    map
}
