// src/terrain/mesh_builder.rs
use glam::{Vec2, Vec3};

use crate::terrain::height_curve::HeightCurve;
use crate::terrain::height_field::HeightField;

/// Coarsest supported simplification level (stride `2 * MAX_LOD`).
pub const MAX_LOD: u32 = 6;

/// Grid step between visited interior lines at a given simplification level.
pub fn lod_stride(lod: u32) -> usize {
    if lod == 0 { 1 } else { 2 * lod as usize }
}

/// Engine-agnostic triangle mesh buffers.
///
/// `indices` reference only interior vertices; the skirt ring that stitched
/// the normals is consumed during the build and never emitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffers {
    pub vertices: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<i32>,
}

impl MeshBuffers {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Builds the triangle mesh for one chunk of terrain.
///
/// The height field must be square and bordered: its outer ring holds the
/// neighboring chunks' edge heights. Simplification stride is 1 for LOD 0 and
/// `2 * lod` above that; the border ring is always visited at full resolution
/// so skirt data lines up with the neighbor's true edge regardless of LOD.
///
/// Visited cells get a vertex index from a lookup table: interior cells count
/// up from 0 in row-major order, border cells count down from -1. Border
/// vertices and the triangles touching them are kept in side lists — they
/// contribute slope information to the normals of edge vertices (so two
/// adjacent chunks light identically along their seam) but are excluded from
/// the emitted buffers.
///
/// Heights are shaped by `height_curve` and scaled by `height_multiplier`.
/// The mesh spans `±(N-1)/2` world units around the origin in x/z, matching
/// the chunk pitch used by the scheduler.
///
/// Panics if the field is not square, the interior is smaller than 2x2, the
/// LOD is out of range, or the stride does not divide `N - 1`. Those are
/// programmer errors; configuration sanitization keeps user input inside
/// these bounds.
pub fn build_terrain_mesh(
    field: &HeightField,
    height_multiplier: f32,
    height_curve: &HeightCurve,
    lod: u32,
    flat_shaded: bool,
) -> MeshBuffers {
    let bordered = field.width();
    assert_eq!(field.height(), bordered, "height field must be square");
    assert!(bordered >= 4, "bordered field must be at least 4x4");
    assert!(lod <= MAX_LOD, "LOD {} exceeds MAX_LOD {}", lod, MAX_LOD);

    let n = bordered - 2;
    let stride = lod_stride(lod);
    assert_eq!(
        (n - 1) % stride,
        0,
        "stride {} must divide interior resolution {} - 1",
        stride,
        n
    );

    // Grid lines visited along each axis: both border lines plus every
    // stride-th interior line. Divisibility puts the last interior step
    // exactly on column n.
    let mut visited: Vec<usize> = Vec::with_capacity((n - 1) / stride + 3);
    visited.push(0);
    visited.extend((1..=n).step_by(stride));
    visited.push(n + 1);

    let per_line = (n - 1) / stride + 1;
    let interior_count = per_line * per_line;
    let border_count = 4 * (visited.len() - 1);

    let mut vertex_index_map = vec![0i32; bordered * bordered];
    let mut interior_index = 0i32;
    let mut border_index = -1i32;
    for &y in &visited {
        for &x in &visited {
            let is_border = x == 0 || x == n + 1 || y == 0 || y == n + 1;
            vertex_index_map[y * bordered + x] = if is_border {
                let index = border_index;
                border_index -= 1;
                index
            } else {
                let index = interior_index;
                interior_index += 1;
                index
            };
        }
    }

    let mut mesh = WorkingMesh::with_capacity(interior_count, border_count);

    let extent = (n - 1) as f32;
    let top_left_x = -extent / 2.0;
    let top_left_z = extent / 2.0;

    for (vy, &y) in visited.iter().enumerate() {
        for (vx, &x) in visited.iter().enumerate() {
            let index = vertex_index_map[y * bordered + x];

            // Interior spans [0,1]^2; border cells land one cell outside.
            let percent = Vec2::new((x as f32 - 1.0) / extent, (y as f32 - 1.0) / extent);
            let height = height_curve.evaluate(field.get(x, y)) * height_multiplier;
            let position = Vec3::new(
                top_left_x + percent.x * extent,
                height,
                top_left_z - percent.y * extent,
            );
            mesh.add_vertex(position, percent, index);

            if vx + 1 < visited.len() && vy + 1 < visited.len() {
                let nx = visited[vx + 1];
                let ny = visited[vy + 1];
                let a = vertex_index_map[y * bordered + x];
                let b = vertex_index_map[y * bordered + nx];
                let c = vertex_index_map[ny * bordered + x];
                let d = vertex_index_map[ny * bordered + nx];
                mesh.add_triangle(a, d, c);
                mesh.add_triangle(d, a, b);
            }
        }
    }

    mesh.into_buffers(flat_shaded)
}

/// Build-time scratch: interior and border vertices live in separate lists,
/// telling them apart by index sign.
struct WorkingMesh {
    vertices: Vec<Vec3>,
    uvs: Vec<Vec2>,
    triangles: Vec<i32>,
    border_vertices: Vec<Vec3>,
    border_triangles: Vec<i32>,
}

impl WorkingMesh {
    fn with_capacity(interior: usize, border: usize) -> Self {
        WorkingMesh {
            vertices: Vec::with_capacity(interior),
            uvs: Vec::with_capacity(interior),
            triangles: Vec::new(),
            border_vertices: Vec::with_capacity(border),
            border_triangles: Vec::new(),
        }
    }

    fn add_vertex(&mut self, position: Vec3, uv: Vec2, index: i32) {
        if index < 0 {
            debug_assert_eq!(self.border_vertices.len() as i32, -index - 1);
            self.border_vertices.push(position);
        } else {
            debug_assert_eq!(self.vertices.len() as i32, index);
            self.vertices.push(position);
            self.uvs.push(uv);
        }
    }

    fn add_triangle(&mut self, a: i32, b: i32, c: i32) {
        if a < 0 || b < 0 || c < 0 {
            self.border_triangles.extend([a, b, c]);
        } else {
            self.triangles.extend([a, b, c]);
        }
    }

    fn position(&self, index: i32) -> Vec3 {
        if index < 0 {
            self.border_vertices[(-index - 1) as usize]
        } else {
            self.vertices[index as usize]
        }
    }

    /// Area-weighted normal accumulation over interior and border triangles.
    /// Border slots are skipped (their normals are never emitted); border
    /// triangles still push their face normal into interior edge vertices.
    fn smooth_normals(&self) -> Vec<Vec3> {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];

        let triples = self
            .triangles
            .chunks_exact(3)
            .chain(self.border_triangles.chunks_exact(3));
        for triple in triples {
            let pa = self.position(triple[0]);
            let pb = self.position(triple[1]);
            let pc = self.position(triple[2]);
            let face = (pb - pa).cross(pc - pa);
            for &index in triple {
                if index >= 0 {
                    normals[index as usize] += face;
                }
            }
        }

        for normal in &mut normals {
            *normal = if normal.length_squared() > 1e-12 {
                normal.normalize()
            } else {
                Vec3::Y
            };
        }
        normals
    }

    fn into_buffers(self, flat_shaded: bool) -> MeshBuffers {
        if flat_shaded {
            return self.flat_shaded_buffers();
        }

        let normals = self.smooth_normals();
        MeshBuffers {
            vertices: self.vertices.iter().map(|v| v.to_array()).collect(),
            normals: normals.iter().map(|n| n.to_array()).collect(),
            uvs: self.uvs.iter().map(|uv| uv.to_array()).collect(),
            indices: self.triangles,
        }
    }

    /// Flat shading duplicates every triangle corner so each face carries a
    /// uniform normal. Only emitted (interior) triangles are duplicated.
    fn flat_shaded_buffers(self) -> MeshBuffers {
        let count = self.triangles.len();
        let mut vertices = Vec::with_capacity(count);
        let mut normals = Vec::with_capacity(count);
        let mut uvs = Vec::with_capacity(count);
        let mut indices = Vec::with_capacity(count);

        for triple in self.triangles.chunks_exact(3) {
            let pa = self.vertices[triple[0] as usize];
            let pb = self.vertices[triple[1] as usize];
            let pc = self.vertices[triple[2] as usize];

            let face = (pb - pa).cross(pc - pa);
            let normal = if face.length_squared() > 1e-12 {
                face.normalize()
            } else {
                Vec3::Y
            };

            for &corner in triple {
                indices.push(vertices.len() as i32);
                vertices.push(self.vertices[corner as usize].to_array());
                uvs.push(self.uvs[corner as usize].to_array());
                normals.push(normal.to_array());
            }
        }

        MeshBuffers {
            vertices,
            normals,
            uvs,
            indices,
        }
    }
}
