use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2], // NDC
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    /// One `Float32x2` attribute at location 0 (`in_position`).
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Two triangles covering the whole render target.
pub const QUAD_VERTICES: [QuadVertex; 6] = [
    QuadVertex { position: [-1.0, -1.0] },
    QuadVertex { position: [1.0, -1.0] },
    QuadVertex { position: [1.0, 1.0] },
    QuadVertex { position: [-1.0, 1.0] },
    QuadVertex { position: [-1.0, -1.0] },
    QuadVertex { position: [1.0, 1.0] },
];

/// The static fullscreen quad. Uploaded once, never mutated.
#[derive(Debug, Copy, Clone, Default)]
pub struct QuadMesh;

impl QuadMesh {
    pub fn vertices(&self) -> &'static [QuadVertex] {
        &QUAD_VERTICES
    }

    pub fn vertex_count(&self) -> u32 {
        QUAD_VERTICES.len() as u32
    }

    pub fn as_bytes(&self) -> &'static [u8] {
        bytemuck::cast_slice(&QUAD_VERTICES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(a: [f32; 2], b: [f32; 2], c: [f32; 2]) -> f32 {
        ((b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1])) / 2.0
    }

    #[test]
    fn quad_has_six_vertices_in_ndc() {
        let mesh = QuadMesh;
        assert_eq!(mesh.vertex_count(), 6);
        for v in mesh.vertices() {
            assert!(v.position.iter().all(|c| (-1.0..=1.0).contains(c)), "{v:?}");
        }
    }

    #[test]
    fn triangles_cover_the_full_target() {
        let total: f32 = QUAD_VERTICES
            .chunks_exact(3)
            .map(|t| area(t[0].position, t[1].position, t[2].position).abs())
            .sum();
        assert_eq!(total, 4.0);
    }

    #[test]
    fn bytes_are_tightly_packed_f32_pairs() {
        let bytes = QuadMesh.as_bytes();
        assert_eq!(bytes.len(), 6 * 2 * 4);
        assert_eq!(QuadVertex::layout().array_stride, 8);
    }
}
