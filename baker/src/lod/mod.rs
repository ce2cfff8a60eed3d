pub mod cluster;
pub mod group;
pub mod multiresolution;
pub mod parent;

use common::{ClusterID, GroupID};
use partition::{BisectConfig, FmBisector, Partitioner, PartitioningError};
use thiserror::Error;

use crate::{mesh::MeshError, CLUSTER_SIZE, GROUP_SIZE};

pub use cluster::cluster_triangles;
pub use group::group_clusters;
pub use multiresolution::build_cluster_dag;
pub use parent::build_parent_clusters;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Invalid mesh: {0}")]
    Mesh(#[from] MeshError),
    #[error("Partitioning failed: {0}")]
    Partitioning(#[from] PartitioningError),
    #[error("Mesh has no triangles")]
    EmptyMesh,
    #[error("Partition {0} produced a cluster with no triangles")]
    EmptyCluster(usize),
    #[error("Group {0} simplified away every triangle")]
    EmptyParent(GroupID),
    #[error("Simplification target of {target} triangles is below the minimum of 4")]
    TargetTooSmall { target: usize },
    #[error("{count} clusters from {offset} exceeds the {len} clusters built")]
    ClusterRange {
        offset: usize,
        count: usize,
        len: usize,
    },
    #[error("Group references missing cluster {0}")]
    MissingCluster(ClusterID),
    #[error("Cluster size {cluster_size} and group size {group_size} must both be at least 8")]
    InvalidConfig {
        cluster_size: usize,
        group_size: usize,
    },
}

/// Shape of the hierarchy built by [`build_cluster_dag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DagConfig {
    /// Maximum triangles per cluster. Partitions aim for `cluster_size - 4..=cluster_size`.
    pub cluster_size: usize,
    /// Maximum clusters per group. Partitions aim for `group_size - 4..=group_size`.
    pub group_size: usize,
    /// Levels above the leaves before giving up on reaching a single root
    pub max_levels: u32,
    pub bisect: BisectConfig,
}

impl Default for DagConfig {
    fn default() -> Self {
        Self {
            cluster_size: CLUSTER_SIZE,
            group_size: GROUP_SIZE,
            max_levels: 32,
            bisect: BisectConfig::default(),
        }
    }
}

impl DagConfig {
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.cluster_size < 8 || self.group_size < 8 {
            return Err(BuildError::InvalidConfig {
                cluster_size: self.cluster_size,
                group_size: self.group_size,
            });
        }
        Ok(())
    }

    pub fn partitioner(&self) -> Partitioner {
        Partitioner::new(FmBisector::new(self.bisect))
    }
}

/// Parts of `size - 4..=size`, the slack the partitioner needs to cut along good edges.
pub(crate) fn part_size_range(size: usize) -> (usize, usize) {
    (size.saturating_sub(4).max(1), size)
}
