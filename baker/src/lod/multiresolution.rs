use common::{Cluster, GroupID, MeshVert, MultiResMesh};
use rayon::prelude::*;

use super::{build_parent_clusters, cluster_triangles, group_clusters, BuildError, DagConfig};

/// Build the full cluster hierarchy of a mesh.
///
/// Leaf clusters cover the source triangles. Each level is grouped, every group simplified to
/// half its triangles and re-clustered, and the parents appended, until a level is a single
/// cluster, stops shrinking, or `config.max_levels` is reached. Clusters of the final level are the
/// roots, and are left ungrouped.
pub fn build_cluster_dag(
    name: impl Into<String>,
    verts: &[MeshVert],
    indices: &[u32],
    config: &DagConfig,
) -> Result<MultiResMesh, BuildError> {
    config.validate()?;

    let partitioner = config.partitioner();

    let mut clusters = cluster_triangles(verts, indices, config)?;
    if clusters.is_empty() {
        return Err(BuildError::EmptyMesh);
    }

    log::info!(
        "{} leaf clusters from {} triangles",
        clusters.len(),
        indices.len() / 3
    );

    let mut groups = Vec::new();
    let mut level_start = 0;

    #[cfg(feature = "progress")]
    let progress = level_progress(clusters.len(), config.max_levels);

    for mip_level in 0..config.max_levels {
        let level_count = clusters.len() - level_start;
        if level_count <= 1 {
            break;
        }

        let first_group = groups.len();
        let level_groups = group_clusters(
            &mut clusters,
            level_start,
            level_count,
            mip_level,
            GroupID(first_group as u32),
            &partitioner,
            config,
        )?;

        // Groups are independent, but parents are appended in group order
        let parents = level_groups
            .par_iter()
            .enumerate()
            .map(|(i, group)| {
                let group_id = GroupID((first_group + i) as u32);
                build_parent_clusters(group, group_id, &clusters, &partitioner, config)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let next_start = clusters.len();
        let group_count = level_groups.len();

        for (mut group, group_parents) in level_groups.into_iter().zip(parents) {
            group.max_parent_lod_error = group_parents
                .iter()
                .map(|c| c.lod_error)
                .fold(0.0, f32::max);

            groups.push(group);
            clusters.extend(group_parents);
        }

        let parent_count = clusters.len() - next_start;
        let parent_tris: usize = clusters[next_start..].iter().map(Cluster::num_tris).sum();

        log::info!(
            "Level {}: {level_count} clusters in {group_count} groups -> {parent_count} clusters, {parent_tris} triangles",
            mip_level + 1
        );

        #[cfg(feature = "progress")]
        progress.inc(1);

        level_start = next_start;

        if parent_count >= level_count {
            log::warn!(
                "Level {} did not shrink ({level_count} -> {parent_count} clusters), stopping",
                mip_level + 1
            );
            break;
        }
    }

    #[cfg(feature = "progress")]
    progress.finish_and_clear();

    let roots = clusters.len() - level_start;
    if roots > 1 {
        log::warn!("Hierarchy ends with {roots} root clusters");
    }

    Ok(MultiResMesh {
        name: name.into(),
        clusters,
        groups,
    })
}

/// Each level roughly halves the cluster count, which bounds the number of levels.
#[cfg(feature = "progress")]
fn level_progress(leaf_count: usize, max_levels: u32) -> indicatif::ProgressBar {
    let expected_levels = (usize::BITS - leaf_count.leading_zeros()).min(max_levels);

    let bar = indicatif::ProgressBar::new(expected_levels as u64);
    if let Ok(style) =
        indicatif::ProgressStyle::with_template("{spinner} Building levels [{bar:40}] {pos}/{len}")
    {
        bar.set_style(style);
    }
    bar
}

#[cfg(test)]
mod tests {
    use common::TriMesh;

    use super::*;

    #[test]
    fn test_single_cluster_mesh() -> anyhow::Result<()> {
        let mesh = TriMesh::cube();
        let dag = build_cluster_dag("cube", &mesh.verts, &mesh.indices, &DagConfig::default())?;

        assert_eq!(dag.name, "cube");
        assert_eq!(dag.clusters.len(), 1);
        assert!(dag.groups.is_empty());
        dag.validate(128)?;

        Ok(())
    }

    #[test]
    fn test_empty_mesh() {
        assert!(matches!(
            build_cluster_dag("empty", &[], &[], &DagConfig::default()),
            Err(BuildError::EmptyMesh)
        ));
    }

    #[test]
    fn test_levels_shrink() -> anyhow::Result<()> {
        let config = DagConfig {
            cluster_size: 16,
            group_size: 8,
            ..Default::default()
        };
        let mesh = TriMesh::uv_sphere(16, 32);
        let dag = build_cluster_dag("sphere", &mesh.verts, &mesh.indices, &config)?;

        dag.validate(config.cluster_size)?;

        let max_level = dag.max_mip_level();
        assert!(max_level >= 2);

        let count = |level| dag.clusters.iter().filter(|c| c.mip_level == level).count();
        for level in 0..=max_level {
            assert!(count(level) > 0);
        }
        assert!(count(max_level) < count(0) / 4);

        // Groups are numbered in order, and each records the level of its members
        for (g, group) in dag.groups.iter().enumerate() {
            for child in &group.children {
                let cluster = &dag.clusters[child.index()];
                assert_eq!(cluster.group_id, Some(GroupID(g as u32)));
                assert_eq!(cluster.mip_level, group.mip_level);
            }
        }

        Ok(())
    }
}
