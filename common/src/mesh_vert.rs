/// Vertex as uploaded to the GPU. Only the position takes part in simplification; the normal is
/// carried along untouched.
#[repr(C)]
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    bincode::Decode,
    bincode::Encode,
    bytemuck::Pod,
    bytemuck::Zeroable,
)]
pub struct MeshVert {
    pub pos: [f32; 4],
    pub normal: [f32; 4],
}

impl MeshVert {
    pub fn new(pos: glam::Vec3, normal: glam::Vec3) -> Self {
        Self {
            pos: pos.extend(1.0).to_array(),
            normal: normal.extend(0.0).to_array(),
        }
    }

    pub fn position(&self) -> glam::Vec3 {
        glam::Vec3::new(self.pos[0], self.pos[1], self.pos[2])
    }

    pub fn set_position(&mut self, pos: glam::Vec3) {
        self.pos[..3].copy_from_slice(&pos.to_array());
    }

    pub fn normal(&self) -> glam::Vec3 {
        glam::Vec3::new(self.normal[0], self.normal[1], self.normal[2])
    }
}
