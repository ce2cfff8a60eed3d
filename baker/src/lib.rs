//! Offline builder for virtualized geometry: turns a triangle mesh into a hierarchy of small
//! clusters, where every group of clusters has a simplified set of parents that can be swapped in
//! without cracks.

pub mod lod;
pub mod mesh;

pub use lod::{build_cluster_dag, BuildError, DagConfig};
pub use mesh::{simplifier::MeshSimplifier, MeshError};

/// Default maximum triangles per cluster
pub const CLUSTER_SIZE: usize = 128;
/// Default maximum clusters per group
pub const GROUP_SIZE: usize = 32;
