use glam::Vec3;

use crate::{
    bounding_box::BoundingBox,
    bounding_sphere::BoundingSphere,
    ids::{CornerID, GroupID},
    mesh_vert::MeshVert,
};

/// A run of at most `cluster_size` triangles with its own local vertex buffer, at one level of the
/// hierarchy.
#[derive(Debug, Clone, PartialEq, bincode::Decode, bincode::Encode)]
pub struct Cluster {
    pub verts: Vec<MeshVert>,
    pub indices: Vec<u32>,
    /// Corners whose edge is shared with a triangle outside this cluster, or that lies on the
    /// outer boundary of the group this cluster was simplified from
    pub external_edges: Vec<CornerID>,
    pub box_bounds: BoundingBox,
    /// Tight bounds of this cluster's own triangles, for culling
    pub sphere_bounds: BoundingSphere,
    /// Contains the `lod_bounds` of every cluster this one was simplified from, so the projected
    /// error is monotonic through the hierarchy
    pub lod_bounds: BoundingSphere,
    pub lod_error: f32,
    /// 0 for clusters of the source mesh
    pub mip_level: u32,
    /// Group this cluster is a member of. `None` for the roots of the hierarchy.
    pub group_id: Option<GroupID>,
    /// Group of the finer level this cluster was simplified from. `None` for leaves.
    pub generating_group_id: Option<GroupID>,
}

impl Cluster {
    /// A leaf cluster, with bounds computed from `verts`.
    pub fn new(verts: Vec<MeshVert>, indices: Vec<u32>, external_edges: Vec<CornerID>) -> Self {
        let positions: Vec<Vec3> = verts.iter().map(MeshVert::position).collect();
        let sphere_bounds = BoundingSphere::from_points(&positions);

        Self {
            box_bounds: BoundingBox::from_points(positions),
            sphere_bounds,
            lod_bounds: sphere_bounds,
            lod_error: 0.0,
            mip_level: 0,
            group_id: None,
            generating_group_id: None,
            verts,
            indices,
            external_edges,
        }
    }

    pub fn num_tris(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn position(&self, corner: CornerID) -> Vec3 {
        self.verts[self.indices[corner.index()] as usize].position()
    }

    /// Endpoints of the directed edge starting at `corner`
    pub fn edge_positions(&self, corner: CornerID) -> (Vec3, Vec3) {
        (self.position(corner), self.position(corner.next()))
    }

    pub fn triangle_positions(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.verts[tri[0] as usize].position(),
                self.verts[tri[1] as usize].position(),
                self.verts[tri[2] as usize].position(),
            ]
        })
    }
}
