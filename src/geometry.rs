use wgpu::util::DeviceExt;

use crate::resources::{self, MeshData};

/// Every mesh the scene can reference. The store owns one vertex buffer
/// per id; the rest of the crate only ever passes these ids around.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshId {
    Cube,
    TexCube,
    Cylinder,
    Cone,
    Mug,
    Frame,
    Mirror,
}

impl MeshId {
    pub const ALL: [MeshId; 7] = [
        MeshId::Cube,
        MeshId::TexCube,
        MeshId::Cylinder,
        MeshId::Cone,
        MeshId::Mug,
        MeshId::Frame,
        MeshId::Mirror,
    ];
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 4],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

impl ModelVertex {
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // Position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Normal
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Texture coordinates
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 7]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // Tangent
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 9]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Bitangent
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

pub struct Mesh {
    pub vertex_buffer: wgpu::Buffer,
    pub num_vertices: u32,
}

impl Mesh {
    fn new(device: &wgpu::Device, label: &str, vertices: &[ModelVertex]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            vertex_buffer,
            num_vertices: vertices.len() as u32,
        }
    }
}

/// Immutable mesh buffers for the fixed shape set, built once at startup.
pub struct GeometryStore {
    meshes: Vec<Mesh>,
}

impl GeometryStore {
    pub fn build(device: &wgpu::Device) -> anyhow::Result<Self> {
        let mut meshes = Vec::with_capacity(MeshId::ALL.len());
        for id in MeshId::ALL {
            let vertices = match id {
                MeshId::Cube => interleave(&resources::load_mesh("unitcube.obj")?),
                MeshId::TexCube => texture_cube_vertices(),
                MeshId::Cylinder => interleave(&resources::load_mesh("cylinder.obj")?),
                MeshId::Cone => interleave(&resources::load_mesh("cone.obj")?),
                MeshId::Mug => interleave(&resources::load_mesh("mug.obj")?),
                MeshId::Frame => frame_vertices(),
                MeshId::Mirror => interleave(&resources::load_mesh("plane.obj")?),
            };
            meshes.push(Mesh::new(device, &format!("{:?}", id), &vertices));
        }
        Ok(Self { meshes })
    }

    pub fn mesh(&self, id: MeshId) -> &Mesh {
        &self.meshes[id as usize]
    }

    pub fn vertex_count(&self, id: MeshId) -> u32 {
        self.meshes[id as usize].num_vertices
    }
}

fn interleave(data: &MeshData) -> Vec<ModelVertex> {
    data.positions
        .iter()
        .zip(data.normals.iter())
        .zip(data.tex_coords.iter())
        .map(|((&position, &normal), &tex_coords)| ModelVertex {
            position,
            normal,
            tex_coords,
            tangent: [0.0; 3],
            bitangent: [0.0; 3],
        })
        .collect()
}

/// Unit cube with per-face uv coordinates, used by the textured and
/// bump-mapped objects. Authored as 36 vertices so each face gets its
/// own normals and tangent frame.
pub fn texture_cube_vertices() -> Vec<ModelVertex> {
    #[rustfmt::skip]
    let positions: [[f32; 3]; 36] = [
        // front (+z)
        [ 0.5, -0.5,  0.5], [ 0.5,  0.5,  0.5], [-0.5,  0.5,  0.5],
        [-0.5,  0.5,  0.5], [-0.5, -0.5,  0.5], [ 0.5, -0.5,  0.5],
        // back (-z)
        [-0.5, -0.5, -0.5], [-0.5,  0.5, -0.5], [ 0.5,  0.5, -0.5],
        [ 0.5,  0.5, -0.5], [ 0.5, -0.5, -0.5], [-0.5, -0.5, -0.5],
        // +x
        [ 0.5, -0.5, -0.5], [ 0.5,  0.5, -0.5], [ 0.5,  0.5,  0.5],
        [ 0.5,  0.5,  0.5], [ 0.5, -0.5,  0.5], [ 0.5, -0.5, -0.5],
        // -x
        [-0.5, -0.5, -0.5], [-0.5, -0.5,  0.5], [-0.5,  0.5,  0.5],
        [-0.5,  0.5,  0.5], [-0.5,  0.5, -0.5], [-0.5, -0.5, -0.5],
        // top
        [-0.5,  0.5, -0.5], [-0.5,  0.5,  0.5], [ 0.5,  0.5,  0.5],
        [ 0.5,  0.5,  0.5], [ 0.5,  0.5, -0.5], [-0.5,  0.5, -0.5],
        // bottom
        [-0.5, -0.5, -0.5], [ 0.5, -0.5, -0.5], [ 0.5, -0.5,  0.5],
        [ 0.5, -0.5,  0.5], [-0.5, -0.5,  0.5], [-0.5, -0.5, -0.5],
    ];
    #[rustfmt::skip]
    let face_normals: [[f32; 3]; 6] = [
        [0.0, 0.0, 1.0], [0.0, 0.0, -1.0], [1.0, 0.0, 0.0],
        [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, -1.0, 0.0],
    ];
    #[rustfmt::skip]
    let face_uvs: [[f32; 2]; 6] = [
        [1.0, 0.0], [1.0, 1.0], [0.0, 1.0],
        [0.0, 1.0], [0.0, 0.0], [1.0, 0.0],
    ];

    let mut vertices: Vec<ModelVertex> = positions
        .iter()
        .enumerate()
        .map(|(i, &[x, y, z])| ModelVertex {
            position: [x, y, z, 1.0],
            normal: face_normals[i / 6],
            tex_coords: face_uvs[i % 6],
            tangent: [0.0; 3],
            bitangent: [0.0; 3],
        })
        .collect();
    compute_tangent_basis(&mut vertices);
    vertices
}

/// Square outline drawn as a line strip (first corner repeated to close
/// the loop) at the mirror's location.
pub fn frame_vertices() -> Vec<ModelVertex> {
    #[rustfmt::skip]
    let corners: [[f32; 3]; 5] = [
        [ 1.0, 0.0, -1.0],
        [ 1.0, 0.0,  1.0],
        [-1.0, 0.0,  1.0],
        [-1.0, 0.0, -1.0],
        [ 1.0, 0.0, -1.0],
    ];
    corners
        .iter()
        .map(|&[x, y, z]| ModelVertex {
            position: [x, y, z, 1.0],
            normal: [0.0, 1.0, 0.0],
            tex_coords: [0.0, 0.0],
            tangent: [0.0; 3],
            bitangent: [0.0; 3],
        })
        .collect()
}

/// Per-triangle tangent frame from uv deltas, written to all three
/// vertices of the triangle. Degenerate uv mappings leave zeros.
pub fn compute_tangent_basis(vertices: &mut [ModelVertex]) {
    for tri in vertices.chunks_exact_mut(3) {
        let p0 = tri[0].position;
        let p1 = tri[1].position;
        let p2 = tri[2].position;
        let uv0 = tri[0].tex_coords;
        let uv1 = tri[1].tex_coords;
        let uv2 = tri[2].tex_coords;

        let e1 = [p1[0] - p0[0], p1[1] - p0[1], p1[2] - p0[2]];
        let e2 = [p2[0] - p0[0], p2[1] - p0[1], p2[2] - p0[2]];
        let duv1 = [uv1[0] - uv0[0], uv1[1] - uv0[1]];
        let duv2 = [uv2[0] - uv0[0], uv2[1] - uv0[1]];

        let det = duv1[0] * duv2[1] - duv1[1] * duv2[0];
        if det.abs() < 1e-8 {
            continue;
        }
        let r = 1.0 / det;
        let tangent = [
            (e1[0] * duv2[1] - e2[0] * duv1[1]) * r,
            (e1[1] * duv2[1] - e2[1] * duv1[1]) * r,
            (e1[2] * duv2[1] - e2[2] * duv1[1]) * r,
        ];
        let bitangent = [
            (e2[0] * duv1[0] - e1[0] * duv2[0]) * r,
            (e2[1] * duv1[0] - e1[1] * duv2[0]) * r,
            (e2[2] * duv1[0] - e1[2] * duv2[0]) * r,
        ];
        for v in tri {
            v.tangent = tangent;
            v.bitangent = bitangent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    #[test]
    fn texture_cube_has_36_vertices_with_tangents() {
        let verts = texture_cube_vertices();
        assert_eq!(verts.len(), 36);
        for v in &verts {
            // every face is uv-mapped, so no tangent should be left zeroed
            assert!(dot(v.tangent, v.tangent) > 1e-6);
            // tangent plane is orthogonal to the face normal
            assert!(dot(v.tangent, v.normal).abs() < 1e-4);
            assert!(dot(v.bitangent, v.normal).abs() < 1e-4);
        }
    }

    #[test]
    fn frame_is_a_closed_line_strip() {
        let verts = frame_vertices();
        assert_eq!(verts.len(), 5);
        assert_eq!(verts[0].position, verts[4].position);
    }
}
