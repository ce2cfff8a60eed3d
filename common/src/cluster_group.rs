use crate::{
    bounding_sphere::BoundingSphere,
    ids::{ClusterID, CornerID},
};

/// Clusters of one level that are simplified together into their parents.
#[derive(Debug, Clone, PartialEq, Default, bincode::Decode, bincode::Encode)]
pub struct ClusterGroup {
    pub children: Vec<ClusterID>,
    /// Merged `lod_bounds` of the children
    pub bounds: BoundingSphere,
    /// Largest `lod_error` of the clusters generated from this group
    pub max_parent_lod_error: f32,
    pub mip_level: u32,
    /// Edges shared with clusters in other groups. Their endpoints stay fixed during
    /// simplification, so neighbouring groups still meet without cracks.
    pub external_edges: Vec<(ClusterID, CornerID)>,
}
