pub mod asset;
pub mod bit_array;
pub mod bounding_box;
pub mod bounding_sphere;
pub mod cluster;
pub mod cluster_group;
pub mod graph;
pub mod hash_table;
pub mod heap;
pub mod ids;
pub mod mesh_vert;
pub mod multi_res_mesh;
pub mod tri_mesh;
mod vec3;

pub use asset::{Asset, AssetError};
pub use bit_array::{BitArray, IndexOutOfRange};
pub use bounding_box::BoundingBox;
pub use bounding_sphere::BoundingSphere;
pub use cluster::Cluster;
pub use cluster_group::ClusterGroup;
pub use hash_table::HashTable;
pub use heap::Heap;
pub use ids::{ClusterID, CornerID, EdgeID, GroupID, TriID, VertID};
pub use mesh_vert::MeshVert;
pub use multi_res_mesh::{DagError, GpuCluster, MultiResMesh};
pub use tri_mesh::TriMesh;
