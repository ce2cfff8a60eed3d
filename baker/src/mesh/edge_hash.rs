use common::{hash_table::hash_edge, HashTable};
use glam::Vec3;

/// Next corner of the same triangle, in winding order.
pub(crate) fn cycle3(corner: usize) -> usize {
    corner - corner % 3 + (corner + 1) % 3
}

/// Pairs up directed edges by the positions of their endpoints, so triangles that share an edge
/// are found even when they index different vertices.
#[derive(Debug, Default)]
pub struct EdgeHash {
    table: HashTable,
}

impl EdgeHash {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: HashTable::with_capacity(capacity),
        }
    }

    /// Register the directed edge `p0 -> p1` under `id`.
    pub fn add(&mut self, id: u32, p0: Vec3, p1: Vec3) {
        self.table.add(hash_edge(p0, p1), id);
    }

    /// Call `f` with every registered id whose edge runs `p1 -> p0`, opposite the query.
    /// `edge_of` looks up the endpoints of a registered id, to reject hash collisions.
    pub fn for_all_matching(
        &self,
        p0: Vec3,
        p1: Vec3,
        edge_of: impl Fn(u32) -> (Vec3, Vec3),
        mut f: impl FnMut(u32),
    ) {
        for &id in self.table.bucket(hash_edge(p1, p0)) {
            if edge_of(id) == (p1, p0) {
                f(id);
            }
        }
    }
}
