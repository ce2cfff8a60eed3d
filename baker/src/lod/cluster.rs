use std::collections::HashMap;

use common::{BitArray, Cluster, CornerID, MeshVert};
use glam::Vec3;
use partition::{Graph, Partitioner};

use super::{part_size_range, BuildError, DagConfig};
use crate::mesh::{
    edge_hash::{cycle3, EdgeHash},
    validate_indices,
};

/// Split a triangle list into leaf clusters of at most `config.cluster_size` triangles, keeping
/// triangles that share edges together.
pub fn cluster_triangles(
    verts: &[MeshVert],
    indices: &[u32],
    config: &DagConfig,
) -> Result<Vec<Cluster>, BuildError> {
    build_clusters(
        verts,
        indices,
        &config.partitioner(),
        config.cluster_size,
        |_, _| false,
    )
}

/// Cluster `indices` by edge adjacency. A corner is external if its edge is shared with a triangle
/// in another cluster, or has no partner and `is_outer_boundary` accepts it.
pub(crate) fn build_clusters(
    verts: &[MeshVert],
    indices: &[u32],
    partitioner: &Partitioner,
    cluster_size: usize,
    is_outer_boundary: impl Fn(Vec3, Vec3) -> bool,
) -> Result<Vec<Cluster>, BuildError> {
    validate_indices(verts.len(), indices)?;

    let position = |c: u32| verts[indices[c as usize] as usize].position();
    let edge_of = |c: u32| (position(c), position(cycle3(c as usize) as u32));

    let mut edges = EdgeHash::with_capacity(indices.len());
    let mut graph = Graph::new(indices.len() / 3);
    let mut matched = BitArray::new(indices.len());
    let mut shared = Vec::new();

    for c in 0..indices.len() as u32 {
        let (p0, p1) = edge_of(c);
        if p0 == p1 {
            continue;
        }

        edges.for_all_matching(p0, p1, edge_of, |other| {
            graph.add_edge(c / 3, other / 3, 1);
            shared.push((c, other));
        });
        edges.add(c, p0, p1);
    }

    let (min, max) = part_size_range(cluster_size);
    let partitioning = partitioner.partition(&graph, min, max)?;
    let part_of = partitioning.part_of();

    let mut external = BitArray::new(indices.len());
    for (a, b) in shared {
        matched.set_true(a as usize);
        matched.set_true(b as usize);
        if part_of[(a / 3) as usize] != part_of[(b / 3) as usize] {
            external.set_true(a as usize);
            external.set_true(b as usize);
        }
    }
    for c in 0..indices.len() as u32 {
        if !matched[c as usize] {
            let (p0, p1) = edge_of(c);
            if p0 != p1 && is_outer_boundary(p0, p1) {
                external.set_true(c as usize);
            }
        }
    }

    let mut clusters = Vec::with_capacity(partitioning.ranges.len());

    for (part, tris) in partitioning.parts().enumerate() {
        let mut remap = HashMap::new();
        let mut cluster_verts = Vec::new();
        let mut cluster_indices = Vec::with_capacity(tris.len() * 3);
        let mut external_edges = Vec::new();

        for &t in tris {
            for c in 3 * t as usize..3 * t as usize + 3 {
                let v = indices[c];
                let local = *remap.entry(v).or_insert_with(|| {
                    cluster_verts.push(verts[v as usize]);
                    (cluster_verts.len() - 1) as u32
                });

                if external[c] {
                    external_edges.push(CornerID(cluster_indices.len() as u32));
                }
                cluster_indices.push(local);
            }
        }

        if cluster_indices.is_empty() {
            return Err(BuildError::EmptyCluster(part));
        }

        clusters.push(Cluster::new(cluster_verts, cluster_indices, external_edges));
    }

    Ok(clusters)
}

#[cfg(test)]
mod tests {
    use common::TriMesh;

    use super::*;

    #[test]
    fn test_plane_clusters() -> anyhow::Result<()> {
        let mesh = TriMesh::plane(16);
        let clusters = cluster_triangles(&mesh.verts, &mesh.indices, &DagConfig::default())?;

        // 512 triangles divide evenly into 4 full clusters
        assert_eq!(clusters.len(), 4);
        let total: usize = clusters.iter().map(Cluster::num_tris).sum();
        assert_eq!(total, 512);

        for cluster in &clusters {
            assert!((124..=128).contains(&cluster.num_tris()));
            assert_eq!(cluster.mip_level, 0);
            assert_eq!(cluster.lod_error, 0.0);
            assert_eq!(cluster.lod_bounds, cluster.sphere_bounds);
            // Every cluster borders another
            assert!(!cluster.external_edges.is_empty());
        }

        Ok(())
    }

    #[test]
    fn test_external_edges_are_shared() -> anyhow::Result<()> {
        let mesh = TriMesh::uv_sphere(16, 32);
        let clusters = cluster_triangles(&mesh.verts, &mesh.indices, &DagConfig::default())?;
        assert!(clusters.len() > 1);

        let mut edges = Vec::new();
        for cluster in &clusters {
            for &corner in &cluster.external_edges {
                edges.push(cluster.edge_positions(corner));
            }
        }

        // A closed mesh has no outer boundary, so every external edge has a reversed partner
        for &(p0, p1) in &edges {
            assert!(edges.contains(&(p1, p0)), "{p0} -> {p1} has no partner");
        }

        Ok(())
    }

    #[test]
    fn test_single_cluster() -> anyhow::Result<()> {
        let mesh = TriMesh::cube();
        let clusters = cluster_triangles(&mesh.verts, &mesh.indices, &DagConfig::default())?;

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].num_tris(), 12);
        assert!(clusters[0].external_edges.is_empty());
        assert_eq!(clusters[0].verts.len(), 8);

        Ok(())
    }

    #[test]
    fn test_outer_boundary_marked() -> anyhow::Result<()> {
        let mesh = TriMesh::plane(2);
        let clusters = build_clusters(
            &mesh.verts,
            &mesh.indices,
            &Partitioner::default(),
            128,
            |_, _| true,
        )?;

        // 2 by 2 grid has 8 outer edges
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].external_edges.len(), 8);

        Ok(())
    }

    #[test]
    fn test_bad_indices() {
        let mesh = TriMesh::plane(1);

        assert!(matches!(
            cluster_triangles(&mesh.verts, &[0, 1, 9], &DagConfig::default()),
            Err(BuildError::Mesh(_))
        ));
    }
}
