use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn upload(&self, device: &wgpu::Device, label: &str) -> MeshBuffer {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} vertices")),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} indices")),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        }
    }

    /// Append one quad (counter-clockwise when seen from `normal`).
    fn push_quad(&mut self, corners: [[f32; 3]; 4], normal: [f32; 3]) {
        let base = self.vertices.len() as u32;
        self.vertices
            .extend(corners.iter().map(|&pos| Vertex { pos, normal }));
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// Axis-aligned cube centred on the origin, flat-shaded (4 vertices per face).
pub fn create_box_mesh(side: f32) -> Mesh {
    let h = side / 2.0;
    let mut mesh = Mesh { vertices: Vec::with_capacity(24), indices: Vec::with_capacity(36) };

    // +X / -X
    mesh.push_quad([[h, -h, h], [h, -h, -h], [h, h, -h], [h, h, h]], [1.0, 0.0, 0.0]);
    mesh.push_quad([[-h, -h, -h], [-h, -h, h], [-h, h, h], [-h, h, -h]], [-1.0, 0.0, 0.0]);
    // +Y / -Y
    mesh.push_quad([[-h, h, h], [h, h, h], [h, h, -h], [-h, h, -h]], [0.0, 1.0, 0.0]);
    mesh.push_quad([[-h, -h, -h], [h, -h, -h], [h, -h, h], [-h, -h, h]], [0.0, -1.0, 0.0]);
    // +Z / -Z
    mesh.push_quad([[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]], [0.0, 0.0, 1.0]);
    mesh.push_quad([[h, -h, -h], [-h, -h, -h], [-h, h, -h], [h, h, -h]], [0.0, 0.0, -1.0]);

    mesh
}

/// Square in the local XY plane facing +Z. Rotated -90 degrees about X it lies flat facing +Y.
/// Both faces are emitted so the ground stays visible from below.
pub fn create_plane_mesh(size: f32) -> Mesh {
    let h = size / 2.0;
    let mut mesh = Mesh { vertices: Vec::with_capacity(8), indices: Vec::with_capacity(12) };
    mesh.push_quad([[-h, -h, 0.0], [h, -h, 0.0], [h, h, 0.0], [-h, h, 0.0]], [0.0, 0.0, 1.0]);
    mesh.push_quad([[-h, h, 0.0], [h, h, 0.0], [h, -h, 0.0], [-h, -h, 0.0]], [0.0, 0.0, -1.0]);
    mesh
}

fn srgb_channel_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// 0xRRGGBB (sRGB) to linear RGBA with alpha 1.
pub fn hex_to_linear_rgba(hex: u32) -> [f32; 4] {
    let channel = |shift: u32| srgb_channel_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
    [channel(16), channel(8), channel(0), 1.0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn box_mesh_spans_half_side_on_every_axis() {
        let mesh = create_box_mesh(2.0);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        for v in &mesh.vertices {
            for c in v.pos {
                assert_eq!(c.abs(), 1.0);
            }
        }
    }

    #[test]
    fn box_faces_wind_counter_clockwise_outward() {
        let mesh = create_box_mesh(2.0);
        for tri in mesh.indices.chunks(3) {
            let a = Vec3::from(mesh.vertices[tri[0] as usize].pos);
            let b = Vec3::from(mesh.vertices[tri[1] as usize].pos);
            let c = Vec3::from(mesh.vertices[tri[2] as usize].pos);
            let normal = Vec3::from(mesh.vertices[tri[0] as usize].normal);
            let face = (b - a).cross(c - a).normalize();
            assert!(face.abs_diff_eq(normal, 1e-6), "face {face} vs normal {normal}");
        }
    }

    #[test]
    fn plane_lies_in_xy() {
        let mesh = create_plane_mesh(10.0);
        assert!(mesh.vertices.iter().all(|v| v.pos[2] == 0.0));
        assert_eq!(mesh.vertices[0].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn hex_colors_convert_to_linear() {
        assert_eq!(hex_to_linear_rgba(0xffffff), [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(hex_to_linear_rgba(0x000000), [0.0, 0.0, 0.0, 1.0]);
        let [r, g, b, _] = hex_to_linear_rgba(0x1c1c2b);
        assert!(r == g && b > r);
    }
}
