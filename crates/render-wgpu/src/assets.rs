use bytemuck::{Pod, Zeroable};

/// Mesh vertex as laid out in the vertex buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// CPU-side indexed triangle mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Flat square in the XZ plane, centered on the origin, facing +Y.
    /// UVs span `[0, 1]`; tiling is applied in the shader.
    pub fn plane(size: f32) -> Self {
        let h = size * 0.5;
        let n = [0.0, 1.0, 0.0];
        #[rustfmt::skip]
        let vertices = vec![
            Vertex { position: [-h, 0.0, -h], normal: n, uv: [0.0, 0.0] },
            Vertex { position: [-h, 0.0, h], normal: n, uv: [0.0, 1.0] },
            Vertex { position: [h, 0.0, h], normal: n, uv: [1.0, 1.0] },
            Vertex { position: [h, 0.0, -h], normal: n, uv: [1.0, 0.0] },
        ];
        Self {
            vertices,
            indices: vec![0, 1, 2, 2, 3, 0],
        }
    }

    /// Box with the given half extents, flat-shaded (four vertices per face).
    pub fn cuboid(hx: f32, hy: f32, hz: f32) -> Self {
        // (normal, tangent u, tangent v) per face; corners wind counter-clockwise
        // seen from outside.
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ];
        let half = [hx, hy, hz];
        let mut mesh = Self::default();
        for (normal, u, v) in faces {
            let base = mesh.vertices.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let mut position = [0.0; 3];
                for axis in 0..3 {
                    position[axis] = (normal[axis] + u[axis] * su + v[axis] * sv) * half[axis];
                }
                mesh.vertices.push(Vertex {
                    position,
                    normal,
                    uv: [(su + 1.0) * 0.5, (1.0 - sv) * 0.5],
                });
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        mesh
    }
}

/// CPU-side RGBA8 image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    /// Tightly packed rows, 4 bytes per texel.
    pub rgba: Vec<u8>,
}

impl TextureData {
    /// 1x1 texture of one color.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: rgba.to_vec(),
        }
    }

    /// `size`x`size` checkerboard with `cells` squares per side.
    pub fn checker(size: u32, cells: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let size = size.max(1);
        let cell = (size / cells.max(1)).max(1);
        let mut rgba = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let texel = if (x / cell + y / cell) % 2 == 0 { a } else { b };
                rgba.extend_from_slice(&texel);
            }
        }
        Self {
            width: size,
            height: size,
            rgba,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && self.rgba.len() == (self.width * self.height * 4) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    fn assert_outward_winding(mesh: &MeshData) {
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| mesh.vertices[i as usize]);
            let face = cross(sub(b.position, a.position), sub(c.position, a.position));
            assert!(dot(face, a.normal) > 0.0, "triangle {tri:?} winds inward");
        }
    }

    #[test]
    fn plane_faces_up_and_winds_ccw() {
        let mesh = MeshData::plane(2.0);
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices.len(), 6);
        assert_outward_winding(&mesh);
    }

    #[test]
    fn cuboid_spans_half_extents() {
        let mesh = MeshData::cuboid(1.0, 0.5, 2.0);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        for v in &mesh.vertices {
            assert_eq!(v.position[0].abs(), 1.0);
            assert_eq!(v.position[1].abs(), 0.5);
            assert_eq!(v.position[2].abs(), 2.0);
        }
        assert_outward_winding(&mesh);
    }

    #[test]
    fn checker_alternates_cells() {
        let black = [0, 0, 0, 255];
        let white = [255, 255, 255, 255];
        let tex = TextureData::checker(4, 2, black, white);
        assert!(tex.is_valid());
        let texel = |x: u32, y: u32| {
            let i = ((y * 4 + x) * 4) as usize;
            [tex.rgba[i], tex.rgba[i + 1], tex.rgba[i + 2], tex.rgba[i + 3]]
        };
        assert_eq!(texel(0, 0), black);
        assert_eq!(texel(2, 0), white);
        assert_eq!(texel(2, 2), black);
        assert!(TextureData::solid([1, 2, 3, 4]).is_valid());
    }
}
