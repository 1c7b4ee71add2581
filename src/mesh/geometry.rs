//! Renderable geometry produced by the mesh builder

use crate::core::types::{Vec2, Vec3};

/// How normals were produced
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Shading {
    /// Per-vertex normals baked from the height field, including the border ring
    #[default]
    Smooth,
    /// Three unique vertices per triangle, normals equal to the face normal
    Flat,
}

/// Triangle mesh of one terrain chunk at one level of detail.
///
/// `vertices`, `uvs` and `normals` are parallel arrays. Every index in
/// `triangles` is below `vertices.len()`, and front faces are wound so an
/// upward-facing surface has +Y normals.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeometryBuffer {
    pub vertices: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub triangles: Vec<[u32; 3]>,
    pub normals: Vec<Vec3>,
    pub shading: Shading,
}

impl GeometryBuffer {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Flat index list (three entries per triangle)
    pub fn indices(&self) -> &[u32] {
        bytemuck::cast_slice(&self.triangles)
    }

    /// Vertex positions as raw bytes for GPU upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Normals as raw bytes for GPU upload
    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    /// UVs as raw bytes for GPU upload
    pub fn uv_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.uvs)
    }

    /// Index buffer as raw bytes for GPU upload
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.triangles)
    }

    /// True if the parallel arrays agree in length and every index is in range.
    pub fn is_well_formed(&self) -> bool {
        let n = self.vertices.len();
        self.uvs.len() == n
            && self.normals.len() == n
            && self.indices().iter().all(|&i| (i as usize) < n)
    }

    /// Recompute normals from the triangles: each vertex gets the normalized
    /// sum of the unit normals of the faces using it. With unshared vertices
    /// this yields hard face normals.
    pub fn recalculate_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];

        for &[a, b, c] in &self.triangles {
            let (a, b, c) = (a as usize, b as usize, c as usize);
            let face = face_normal(self.vertices[a], self.vertices[b], self.vertices[c]).normalize_or_zero();
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }

        for n in &mut normals {
            *n = n.normalize_or_zero();
        }
        self.normals = normals;
    }
}

/// Non-unit normal of triangle (a, b, c); its length is twice the triangle area.
#[inline]
pub fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> GeometryBuffer {
        GeometryBuffer {
            vertices: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, -1.0),
                Vec3::new(1.0, 0.0, -1.0),
            ],
            uvs: vec![Vec2::ZERO; 4],
            triangles: vec![[0, 3, 2], [3, 0, 1]],
            normals: Vec::new(),
            shading: Shading::Smooth,
        }
    }

    #[test]
    fn test_face_normal_winding() {
        let n = face_normal(Vec3::ZERO, Vec3::new(1.0, 0.0, -1.0), Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(n, Vec3::Y);
    }

    #[test]
    fn test_recalculate_normals() {
        let mut mesh = quad();
        mesh.recalculate_normals();
        assert!(mesh.is_well_formed());
        for n in &mesh.normals {
            assert!((*n - Vec3::Y).length() < 1e-6);
        }
    }

    #[test]
    fn test_byte_views() {
        let mut mesh = quad();
        mesh.recalculate_normals();
        assert_eq!(mesh.indices(), &[0, 3, 2, 3, 0, 1]);
        assert_eq!(mesh.vertex_bytes().len(), 4 * 12);
        assert_eq!(mesh.index_bytes().len(), 6 * 4);
        assert_eq!(mesh.uv_bytes().len(), 4 * 8);
    }

    #[test]
    fn test_out_of_range_index_detected() {
        let mut mesh = quad();
        mesh.recalculate_normals();
        mesh.triangles.push([0, 1, 4]);
        assert!(!mesh.is_well_formed());
    }
}
