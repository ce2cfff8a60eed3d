use common::{BitArray, BoundingSphere, Cluster, ClusterGroup, ClusterID, CornerID, GroupID};
use partition::{Graph, Partitioner};

use super::{part_size_range, BuildError, DagConfig};
use crate::mesh::edge_hash::EdgeHash;

/// Group the `count` clusters starting at `offset`, all of `mip_level`, into sets of at most
/// `config.group_size` clusters joined by many shared edges.
///
/// Groups are numbered from `first_group_id` and every member has its `group_id` set. Edges a group
/// does not share between its own members are recorded as its `external_edges`.
pub fn group_clusters(
    clusters: &mut [Cluster],
    offset: usize,
    count: usize,
    mip_level: u32,
    first_group_id: GroupID,
    partitioner: &Partitioner,
    config: &DagConfig,
) -> Result<Vec<ClusterGroup>, BuildError> {
    if offset + count > clusters.len() {
        return Err(BuildError::ClusterRange {
            offset,
            count,
            len: clusters.len(),
        });
    }

    let level = &clusters[offset..offset + count];

    // Every external corner of the level, by local cluster index
    let external: Vec<(u32, CornerID)> = level
        .iter()
        .enumerate()
        .flat_map(|(i, c)| c.external_edges.iter().map(move |&e| (i as u32, e)))
        .collect();

    let edge_of = |k: u32| {
        let (i, corner) = external[k as usize];
        level[i as usize].edge_positions(corner)
    };

    let mut edges = EdgeHash::with_capacity(external.len());
    let mut graph = Graph::new(count);
    let mut shared = Vec::new();

    for k in 0..external.len() as u32 {
        let (p0, p1) = edge_of(k);
        if p0 == p1 {
            continue;
        }

        edges.for_all_matching(p0, p1, edge_of, |other| {
            // Each shared edge adds one to the weight between the two clusters
            graph.add_edge(external[k as usize].0, external[other as usize].0, 1);
            shared.push((k, other));
        });
        edges.add(k, p0, p1);
    }

    let (min, max) = part_size_range(config.group_size);
    let partitioning = partitioner.partition(&graph, min, max)?;
    let part_of = partitioning.part_of();

    let mut groups: Vec<ClusterGroup> = partitioning
        .parts()
        .map(|members| {
            let children: Vec<ClusterID> = members
                .iter()
                .map(|&i| ClusterID(offset as u32 + i))
                .collect();
            let bounds: Vec<BoundingSphere> = members
                .iter()
                .map(|&i| level[i as usize].lod_bounds)
                .collect();

            ClusterGroup {
                children,
                bounds: BoundingSphere::from_spheres(&bounds),
                mip_level,
                ..Default::default()
            }
        })
        .collect();

    let mut matched = BitArray::new(external.len());
    let mut crossing = BitArray::new(external.len());
    for (a, b) in shared {
        let (a, b) = (a as usize, b as usize);
        matched.set_true(a);
        matched.set_true(b);
        if part_of[external[a].0 as usize] != part_of[external[b].0 as usize] {
            crossing.set_true(a);
            crossing.set_true(b);
        }
    }

    for (k, &(i, corner)) in external.iter().enumerate() {
        if crossing[k] || !matched[k] {
            groups[part_of[i as usize] as usize]
                .external_edges
                .push((ClusterID(offset as u32 + i), corner));
        }
    }

    for (g, group) in groups.iter().enumerate() {
        let group_id = GroupID(first_group_id.0 + g as u32);
        for &child in &group.children {
            clusters[child.index()].group_id = Some(group_id);
        }
    }

    log::trace!(
        "Grouped {count} clusters of level {mip_level} into {} groups",
        groups.len()
    );

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use common::TriMesh;

    use super::*;
    use crate::lod::cluster_triangles;

    fn small_config() -> DagConfig {
        DagConfig {
            cluster_size: 8,
            group_size: 8,
            ..Default::default()
        }
    }

    #[test]
    fn test_group_plane() -> anyhow::Result<()> {
        let config = small_config();
        let mesh = TriMesh::plane(16);
        let mut clusters = cluster_triangles(&mesh.verts, &mesh.indices, &config)?;
        assert_eq!(clusters.len(), 64);

        let count = clusters.len();
        let groups = group_clusters(
            &mut clusters,
            0,
            count,
            0,
            GroupID(3),
            &config.partitioner(),
            &config,
        )?;

        assert_eq!(groups.len(), 8);

        let mut seen = vec![false; count];
        for (g, group) in groups.iter().enumerate() {
            assert!((4..=8).contains(&group.children.len()));
            assert_eq!(group.mip_level, 0);
            assert!(!group.external_edges.is_empty());

            for &child in &group.children {
                assert!(!seen[child.index()]);
                seen[child.index()] = true;

                let cluster = &clusters[child.index()];
                assert_eq!(cluster.group_id, Some(GroupID(3 + g as u32)));
                assert!(group.bounds.contains_sphere(&cluster.lod_bounds));
            }

            for &(cluster, _) in &group.external_edges {
                assert!(group.children.contains(&cluster));
            }
        }
        assert!(seen.into_iter().all(|s| s));

        Ok(())
    }

    #[test]
    fn test_group_offset() -> anyhow::Result<()> {
        let config = small_config();
        let mesh = TriMesh::plane(4);
        let mut clusters = cluster_triangles(&mesh.verts, &mesh.indices, &config)?;
        let count = clusters.len();

        // Leading clusters outside the range are untouched
        let mut all = clusters.clone();
        all.append(&mut clusters);

        let groups = group_clusters(
            &mut all,
            count,
            count,
            0,
            GroupID(0),
            &config.partitioner(),
            &config,
        )?;

        assert_eq!(groups.len(), 1);
        assert!(all[..count].iter().all(|c| c.group_id.is_none()));
        assert!(all[count..].iter().all(|c| c.group_id == Some(GroupID(0))));
        assert!(groups[0]
            .children
            .iter()
            .all(|c| (count..2 * count).contains(&c.index())));

        Ok(())
    }

    #[test]
    fn test_range_checked() {
        let config = small_config();

        assert!(matches!(
            group_clusters(&mut [], 0, 1, 0, GroupID(0), &config.partitioner(), &config),
            Err(BuildError::ClusterRange { .. })
        ));
    }
}
