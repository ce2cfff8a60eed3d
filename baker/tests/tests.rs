#![cfg(test)]
use std::collections::HashSet;

use baker::{build_cluster_dag, DagConfig, MeshSimplifier};
use common::{Asset, MultiResMesh, TriMesh};
use glam::Vec3;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Plane with randomly raised vertices, so simplification has real error to trade off
fn terrain(n: u32, seed: u64) -> TriMesh {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut mesh = TriMesh::plane(n);
    for v in &mut mesh.verts {
        let mut p = v.position();
        p.z = rng.gen_range(0.0..0.05);
        v.set_position(p);
    }
    mesh
}

/// Sorted triangles by position, rotated to start at their smallest corner
fn triangle_set(tris: impl Iterator<Item = [Vec3; 3]>) -> Vec<[[u32; 3]; 3]> {
    let mut out: Vec<_> = tris
        .map(|tri| {
            let key = tri.map(|p| p.to_array().map(f32::to_bits));
            let start = (0..3).min_by_key(|&i| key[i]).unwrap();
            [key[start], key[(start + 1) % 3], key[(start + 2) % 3]]
        })
        .collect();
    out.sort_unstable();
    out
}

fn build(mesh: &TriMesh) -> anyhow::Result<MultiResMesh> {
    Ok(build_cluster_dag(
        "test",
        &mesh.verts,
        &mesh.indices,
        &DagConfig::default(),
    )?)
}

#[test]
fn test_leaves_cover_source() -> anyhow::Result<()> {
    let mesh = TriMesh::plane(64);
    let dag = build(&mesh)?;

    let source = triangle_set(mesh.indices.chunks_exact(3).map(|t| {
        t.iter()
            .map(|&i| mesh.verts[i as usize].position())
            .collect::<Vec<_>>()
            .try_into()
            .unwrap()
    }));
    let leaves = triangle_set(dag.leaves().flat_map(|c| c.triangle_positions()));

    assert_eq!(source.len(), 8192);
    assert_eq!(leaves, source);

    Ok(())
}

#[test]
fn test_plane_hierarchy() -> anyhow::Result<()> {
    let mesh = TriMesh::plane(64);
    let dag = build(&mesh)?;

    dag.validate(128)?;

    // 8192 triangles make exactly 64 full leaves
    assert_eq!(dag.leaves().count(), 64);
    assert!(dag.max_mip_level() >= 1);

    for cluster in &dag.clusters {
        assert!((1..=128).contains(&cluster.num_tris()));
    }
    for group in &dag.groups {
        assert!(!group.children.is_empty());
        assert!(group.children.len() <= 32);
    }

    Ok(())
}

#[test]
fn test_terrain_error_monotonic() -> anyhow::Result<()> {
    let mesh = terrain(48, 7);
    let dag = build(&mesh)?;

    dag.validate(128)?;

    for cluster in &dag.clusters {
        if cluster.mip_level > 0 {
            assert!(cluster.generating_group_id.is_some());
        }
        if let Some(group) = cluster.group_id {
            let group = &dag.groups[group.index()];
            assert!(group.max_parent_lod_error >= cluster.lod_error);
        }
    }

    let top = dag
        .clusters
        .iter()
        .filter(|c| c.mip_level == dag.max_mip_level())
        .map(|c| c.lod_error)
        .fold(0.0, f32::max);
    assert!(top > 0.0);

    Ok(())
}

#[test]
fn test_sphere_reaches_single_root() -> anyhow::Result<()> {
    let mesh = TriMesh::uv_sphere(64, 128);
    let dag = build(&mesh)?;

    dag.validate(128)?;

    let roots: Vec<_> = dag.clusters.iter().filter(|c| c.group_id.is_none()).collect();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].mip_level, dag.max_mip_level());

    Ok(())
}

#[test]
fn test_deterministic() -> anyhow::Result<()> {
    let mesh = terrain(32, 3);

    assert_eq!(build(&mesh)?, build(&mesh)?);

    Ok(())
}

/// Directed edges of every cluster at `mip_level`, by position
fn level_edges(dag: &MultiResMesh, mip_level: u32) -> HashSet<[[u32; 3]; 2]> {
    let mut edges = HashSet::new();
    for cluster in dag.clusters.iter().filter(|c| c.mip_level == mip_level) {
        for [a, b, c] in cluster.triangle_positions() {
            for (p0, p1) in [(a, b), (b, c), (c, a)] {
                edges.insert([p0, p1].map(|p| p.to_array().map(f32::to_bits)));
            }
        }
    }
    edges
}

/// Every level of a closed mesh is closed: each directed edge has its reverse
fn assert_levels_closed(dag: &MultiResMesh) {
    for level in 0..=dag.max_mip_level() {
        let edges = level_edges(dag, level);
        for &[p0, p1] in &edges {
            assert!(
                edges.contains(&[p1, p0]),
                "Crack at level {level}: {p0:?} -> {p1:?}"
            );
        }
    }
}

#[test]
fn test_group_boundaries_match() -> anyhow::Result<()> {
    // Parents of neighbouring groups must still share every edge between them
    let mesh = TriMesh::uv_sphere(32, 64);
    let dag = build(&mesh)?;
    assert!(dag.max_mip_level() >= 1);

    assert_levels_closed(&dag);

    Ok(())
}

#[test]
fn test_small_clusters_stay_watertight() -> anyhow::Result<()> {
    // Small clusters often lose the triangles that first held a locked corner
    let config = DagConfig {
        cluster_size: 16,
        group_size: 8,
        ..Default::default()
    };
    let mesh = TriMesh::uv_sphere(24, 48);
    let dag = build_cluster_dag("sphere", &mesh.verts, &mesh.indices, &config)?;

    dag.validate(config.cluster_size)?;
    assert!(dag.max_mip_level() >= 2);
    assert_levels_closed(&dag);

    Ok(())
}

#[test]
fn test_asset_round_trip() -> anyhow::Result<()> {
    let mesh = TriMesh::uv_sphere(16, 32);
    let dag = build(&mesh)?;

    let path = std::env::temp_dir().join(format!("baker_round_trip_{}.bin", std::process::id()));
    dag.save(&path)?;
    let loaded = MultiResMesh::load(&path)?;
    std::fs::remove_file(&path)?;

    assert_eq!(loaded, dag);
    assert_eq!(loaded.gpu_clusters().len(), dag.clusters.len());

    Ok(())
}

#[test]
fn test_simplifier_on_sphere() -> anyhow::Result<()> {
    let mesh = TriMesh::uv_sphere(32, 64);
    let mut simplifier = MeshSimplifier::new(mesh.verts.clone(), mesh.indices.clone())?;

    let target = mesh.num_tris() / 8;
    simplifier.simplify(target);
    assert!(simplifier.remaining_num_tri() <= target);

    let (verts, indices) = simplifier.compact();
    assert_eq!(indices.len() % 3, 0);
    assert!(indices.iter().all(|&i| (i as usize) < verts.len()));
    for v in &verts {
        assert!((v.position().length() - 1.0).abs() < 0.1);
    }

    Ok(())
}
