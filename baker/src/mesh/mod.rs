pub mod edge_hash;
pub mod plane;
pub mod quadric;
pub mod simplifier;

use common::{hash_table::hash_position, HashTable, VertID};
use glam::Vec3;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    #[error("Index buffer length {0} is not a multiple of 3")]
    IndexCount(usize),
    #[error("Index {index} is out of range for {vert_count} vertices")]
    IndexOutOfBounds { index: VertID, vert_count: usize },
}

/// Check `indices` describes whole triangles over `vert_count` vertices.
pub fn validate_indices(vert_count: usize, indices: &[u32]) -> Result<(), MeshError> {
    if indices.len() % 3 != 0 {
        return Err(MeshError::IndexCount(indices.len()));
    }

    match indices.iter().find(|&&i| i as usize >= vert_count) {
        Some(&index) => Err(MeshError::IndexOutOfBounds {
            index: VertID(index),
            vert_count,
        }),
        None => Ok(()),
    }
}

/// Set of exact positions.
#[derive(Default)]
pub struct PositionSet {
    table: HashTable,
    positions: Vec<Vec3>,
}

impl PositionSet {
    /// Returns `false` if `p` was already present
    pub fn insert(&mut self, p: Vec3) -> bool {
        if self.contains(p) {
            return false;
        }
        self.table.add(hash_position(p), self.positions.len() as u32);
        self.positions.push(p);
        true
    }

    pub fn contains(&self, p: Vec3) -> bool {
        self.table
            .bucket(hash_position(p))
            .iter()
            .any(|&i| self.positions[i as usize] == p)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
