use thiserror::Error;

use crate::{
    asset::Asset,
    cluster::Cluster,
    cluster_group::ClusterGroup,
    ids::{ClusterID, GroupID},
    mesh_vert::MeshVert,
};

/// The cluster DAG of one mesh. Clusters are stored level by level, leaves first.
#[derive(Debug, Clone, PartialEq, Default, bincode::Decode, bincode::Encode)]
pub struct MultiResMesh {
    pub name: String,
    pub clusters: Vec<Cluster>,
    pub groups: Vec<ClusterGroup>,
}

impl Asset for MultiResMesh {}

/// Per cluster data for GPU LOD selection and culling, indexing into [`MultiResMesh::flattened_buffers`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuCluster {
    /// xyz center, w radius
    pub sphere_bounds: [f32; 4],
    pub lod_bounds: [f32; 4],
    pub box_min: [f32; 4],
    pub box_max: [f32; 4],
    pub vertex_offset: u32,
    pub index_offset: u32,
    pub index_count: u32,
    pub mip_level: u32,
    /// `u32::MAX` for roots
    pub group_id: u32,
    /// `u32::MAX` for leaves
    pub generating_group_id: u32,
    pub lod_error: f32,
    /// Error of the clusters replacing this one, `f32::MAX` when there are none
    pub parent_lod_error: f32,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DagError {
    #[error("cluster {cluster} has {tris} triangles, expected 1..={max}")]
    ClusterSize {
        cluster: ClusterID,
        tris: usize,
        max: usize,
    },
    #[error("cluster {cluster} has a malformed index buffer")]
    Indices { cluster: ClusterID },
    #[error("cluster {cluster} references group {group}, which does not exist")]
    MissingGroup { cluster: ClusterID, group: GroupID },
    #[error("group {group} lists cluster {cluster}, which is not a member")]
    Membership { group: GroupID, cluster: ClusterID },
    #[error("group {group} at level {expected} contains cluster {cluster} at level {found}")]
    MixedLevels {
        group: GroupID,
        cluster: ClusterID,
        expected: u32,
        found: u32,
    },
    #[error("cluster {cluster} has no group but is not a root")]
    Ungrouped { cluster: ClusterID },
    #[error("cluster {parent} has lod error {parent_error} below child {child} ({child_error})")]
    ErrorNotMonotonic {
        parent: ClusterID,
        child: ClusterID,
        parent_error: f32,
        child_error: f32,
    },
    #[error("cluster {parent} lod bounds do not contain those of child {child}")]
    BoundsNotNested { parent: ClusterID, child: ClusterID },
}

impl MultiResMesh {
    pub fn leaves(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter().filter(|c| c.mip_level == 0)
    }

    pub fn max_mip_level(&self) -> u32 {
        self.clusters.iter().map(|c| c.mip_level).max().unwrap_or(0)
    }

    /// Check the structural invariants of the hierarchy.
    pub fn validate(&self, cluster_size: usize) -> Result<(), DagError> {
        let max_level = self.max_mip_level();

        for (i, cluster) in self.clusters.iter().enumerate() {
            let id = ClusterID::from(i);

            let tris = cluster.num_tris();
            if tris == 0 || tris > cluster_size {
                return Err(DagError::ClusterSize {
                    cluster: id,
                    tris,
                    max: cluster_size,
                });
            }
            if cluster.indices.len() % 3 != 0
                || cluster.indices.iter().any(|&v| v as usize >= cluster.verts.len())
                || cluster
                    .external_edges
                    .iter()
                    .any(|e| e.index() >= cluster.indices.len())
            {
                return Err(DagError::Indices { cluster: id });
            }

            match cluster.group_id {
                Some(group) if group.index() >= self.groups.len() => {
                    return Err(DagError::MissingGroup { cluster: id, group })
                }
                // Clusters below the top level all feed a coarser level
                None if cluster.mip_level < max_level => {
                    return Err(DagError::Ungrouped { cluster: id })
                }
                _ => (),
            }
        }

        for (g, group) in self.groups.iter().enumerate() {
            let group_id = GroupID::from(g);

            for &child in &group.children {
                let cluster = self.clusters.get(child.index()).ok_or(DagError::Membership {
                    group: group_id,
                    cluster: child,
                })?;
                if cluster.group_id != Some(group_id) {
                    return Err(DagError::Membership {
                        group: group_id,
                        cluster: child,
                    });
                }
                if cluster.mip_level != group.mip_level {
                    return Err(DagError::MixedLevels {
                        group: group_id,
                        cluster: child,
                        expected: group.mip_level,
                        found: cluster.mip_level,
                    });
                }
            }
        }

        for (i, parent) in self.clusters.iter().enumerate() {
            let Some(group) = parent.generating_group_id else {
                continue;
            };
            let parent_id = ClusterID::from(i);
            let group = self.groups.get(group.index()).ok_or(DagError::MissingGroup {
                cluster: parent_id,
                group,
            })?;

            for &child_id in &group.children {
                let child = &self.clusters[child_id.index()];

                if parent.lod_error < child.lod_error {
                    return Err(DagError::ErrorNotMonotonic {
                        parent: parent_id,
                        child: child_id,
                        parent_error: parent.lod_error,
                        child_error: child.lod_error,
                    });
                }
                if !parent.lod_bounds.contains_sphere(&child.lod_bounds) {
                    return Err(DagError::BoundsNotNested {
                        parent: parent_id,
                        child: child_id,
                    });
                }
            }
        }

        Ok(())
    }

    /// All cluster vertex and index buffers, concatenated in cluster order. Indices stay local to
    /// each cluster.
    pub fn flattened_buffers(&self) -> (Vec<MeshVert>, Vec<u32>) {
        let verts = self
            .clusters
            .iter()
            .flat_map(|c| c.verts.iter().copied())
            .collect();
        let indices = self
            .clusters
            .iter()
            .flat_map(|c| c.indices.iter().copied())
            .collect();
        (verts, indices)
    }

    /// One OBJ object per cluster, named by level and group, for inspecting the hierarchy in a
    /// modelling tool.
    pub fn to_obj(&self) -> obj::ObjData {
        let mut data = obj::ObjData::default();

        for (i, cluster) in self.clusters.iter().enumerate() {
            let base = data.position.len();
            data.position
                .extend(cluster.verts.iter().map(|v| v.position().to_array()));
            data.normal
                .extend(cluster.verts.iter().map(|v| v.normal().to_array()));

            let mut group = obj::Group::new("0".to_owned());
            for t in cluster.indices.chunks_exact(3) {
                let corner = |v: u32| {
                    let v = base + v as usize;
                    obj::IndexTuple(v, None, Some(v))
                };
                group.polys.push(obj::SimplePolygon(vec![
                    corner(t[0]),
                    corner(t[1]),
                    corner(t[2]),
                ]));
            }

            let group_name = cluster
                .group_id
                .map_or_else(|| "root".to_owned(), |g| g.to_string());
            let mut object = obj::Object::new(format!(
                "Cluster L{} - G{} - I{}",
                cluster.mip_level, group_name, i
            ));
            object.groups.push(group);
            data.objects.push(object);
        }

        data
    }

    pub fn gpu_clusters(&self) -> Vec<GpuCluster> {
        let mut vertex_offset = 0;
        let mut index_offset = 0;

        self.clusters
            .iter()
            .map(|c| {
                let parent_lod_error = c
                    .group_id
                    .map_or(f32::MAX, |g| self.groups[g.index()].max_parent_lod_error);

                let gpu = GpuCluster {
                    sphere_bounds: c.sphere_bounds.packed().to_array(),
                    lod_bounds: c.lod_bounds.packed().to_array(),
                    box_min: c.box_bounds.min().extend(0.0).to_array(),
                    box_max: c.box_bounds.max().extend(0.0).to_array(),
                    vertex_offset,
                    index_offset,
                    index_count: c.indices.len() as u32,
                    mip_level: c.mip_level,
                    group_id: c.group_id.map_or(u32::MAX, |g| g.0),
                    generating_group_id: c.generating_group_id.map_or(u32::MAX, |g| g.0),
                    lod_error: c.lod_error,
                    parent_lod_error,
                };

                vertex_offset += c.verts.len() as u32;
                index_offset += c.indices.len() as u32;
                gpu
            })
            .collect()
    }
}
