use common::{BoundingSphere, Cluster, ClusterGroup, GroupID};
use partition::Partitioner;

use super::{cluster::build_clusters, BuildError, DagConfig};
use crate::mesh::{simplifier::MeshSimplifier, PositionSet};

/// Simplify the members of `group` together to half their triangle budget, and split the result
/// into clusters one level up.
///
/// The group's external edges are locked, so the parents meet neighbouring groups exactly where
/// the children did.
pub fn build_parent_clusters(
    group: &ClusterGroup,
    group_id: GroupID,
    clusters: &[Cluster],
    partitioner: &Partitioner,
    config: &DagConfig,
) -> Result<Vec<Cluster>, BuildError> {
    let mut verts = Vec::new();
    let mut indices = Vec::new();
    let mut child_error = 0.0f32;
    let mut child_bounds = Vec::with_capacity(group.children.len());

    for &child in &group.children {
        let cluster = clusters
            .get(child.index())
            .ok_or(BuildError::MissingCluster(child))?;

        let base = verts.len() as u32;
        verts.extend_from_slice(&cluster.verts);
        indices.extend(cluster.indices.iter().map(|&i| base + i));

        child_error = child_error.max(cluster.lod_error);
        child_bounds.push(cluster.lod_bounds);
    }

    let target = group.children.len() * config.cluster_size / 2;
    if target < 4 {
        return Err(BuildError::TargetTooSmall { target });
    }

    let mut simplifier = MeshSimplifier::new(verts, indices)?;
    let initial_tris = simplifier.remaining_num_tri();

    let mut locked = PositionSet::default();
    for &(cluster_id, corner) in &group.external_edges {
        let cluster = clusters
            .get(cluster_id.index())
            .ok_or(BuildError::MissingCluster(cluster_id))?;

        let (p0, p1) = cluster.edge_positions(corner);
        for p in [p0, p1] {
            if locked.insert(p) {
                simplifier.lock_position(p);
            }
        }
    }

    let error = simplifier.simplify(target);

    log::debug!(
        "Group {group_id}: {initial_tris} -> {} triangles (target {target}), {} locked, error {error:.3e}",
        simplifier.remaining_num_tri(),
        locked.len(),
    );

    let (verts, indices) = simplifier.compact();
    if indices.is_empty() {
        return Err(BuildError::EmptyParent(group_id));
    }

    let mut parents = build_clusters(
        &verts,
        &indices,
        partitioner,
        config.cluster_size,
        |p0, p1| locked.contains(p0) && locked.contains(p1),
    )?;

    let lod_bounds = BoundingSphere::from_spheres(&child_bounds);
    let lod_error = child_error.max(error.sqrt() as f32);

    for parent in &mut parents {
        parent.mip_level = group.mip_level + 1;
        parent.lod_bounds = lod_bounds;
        parent.lod_error = lod_error;
        parent.generating_group_id = Some(group_id);
    }

    Ok(parents)
}
